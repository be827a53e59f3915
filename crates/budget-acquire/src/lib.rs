pub mod crawl;
pub mod error;
pub mod extract;
pub mod net;
pub mod options;
pub mod output;
pub mod repair;

pub use crawl::{CrawlConfig, CrawlSummary, Crawler};
pub use error::{AcquireError, Result};
pub use net::{Fetch, HttpFetcher};
