pub mod currency;
pub mod ebay;
pub mod extractor;
pub mod fetcher;
pub mod identity;
pub mod mock;
pub mod pacing;
pub mod query;
pub mod traits;
pub mod types;

pub use ebay::EbayScraper;
