pub mod app;
pub mod default_route;
pub mod scan_route;

pub use app::*;
