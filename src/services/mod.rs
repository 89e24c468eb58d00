pub mod droid;
pub mod extractor;
pub mod fetcher;
pub mod http_loader;
pub mod normalizer;
pub mod report;
pub mod scan_queue;
pub mod scanner;
pub mod sink;

pub use droid::*;
pub use extractor::*;
pub use fetcher::*;
pub use http_loader::*;
pub use normalizer::*;
pub use report::*;
pub use scan_queue::*;
pub use scanner::*;
pub use sink::*;
