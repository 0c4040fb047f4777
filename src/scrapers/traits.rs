use crate::scrapers::currency::ExchangeRate;
use crate::scrapers::pacing::RateBudget;
use crate::scrapers::types::{SearchFilter, SearchOptions, SearchReport};
use anyhow::Result;
use async_trait::async_trait;

/// Common trait for listing sources.
/// The live marketplace scraper and the mock source are interchangeable behind it.
#[async_trait]
pub trait ScraperTrait: Send + Sync {
    /// Run one search; `rate` converts prices for this search only
    async fn search(
        &mut self,
        filter: &SearchFilter,
        options: &SearchOptions,
        rate: ExchangeRate,
    ) -> Result<SearchReport>;

    /// Apply a new request budget; sources without network pacing ignore it
    fn set_rate_budget(&mut self, _budget: RateBudget) {}

    /// Get the name of the scraper source
    fn source_name(&self) -> &'static str;
}
