pub mod raw_record;
pub mod relevance;
pub mod source;
pub mod tender;
