pub mod tender_db;
