use crate::scrapers::currency::ExchangeRate;
use crate::scrapers::extractor::Extractor;
use crate::scrapers::fetcher::{FetchOutcome, FetchSettings, Fetcher};
use crate::scrapers::identity::IdentityRotator;
use crate::scrapers::mock::MockGenerator;
use crate::scrapers::pacing::{Jitter, Pacer, RateBudget};
use crate::scrapers::query::build_query;
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::{SearchFilter, SearchOptions, SearchReport, SearchStatus};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use rand::rngs::StdRng;
use rand::Rng;
use tracing::{info, warn};

/// Live marketplace scraper with mock fallback
pub struct EbayScraper<R = StdRng> {
    fetcher: Fetcher<R>,
    extractor: Extractor,
    mock: MockGenerator<R>,
}

impl EbayScraper<StdRng> {
    /// Create a scraper with entropy-seeded pacing, identities and mock data
    pub fn new(settings: FetchSettings, budget: RateBudget, jitter: Jitter) -> Result<Self> {
        let extractor = Extractor::new(settings.site_root.clone())?;
        let fetcher = Fetcher::new(settings, Pacer::new(budget, jitter), IdentityRotator::new())?;
        Ok(Self::from_parts(fetcher, extractor, MockGenerator::new()))
    }
}

impl<R: Rng + Send + Sync> EbayScraper<R> {
    pub fn from_parts(fetcher: Fetcher<R>, extractor: Extractor, mock: MockGenerator<R>) -> Self {
        Self {
            fetcher,
            extractor,
            mock,
        }
    }

    async fn run(
        &mut self,
        filter: &SearchFilter,
        options: &SearchOptions,
        rate: ExchangeRate,
        today: NaiveDate,
    ) -> SearchReport {
        let keyword = filter.keyword();

        if options.mock_mode {
            info!("Mock mode enabled, skipping network");
            return SearchReport {
                listings: self.mock.generate(keyword, options.limit, rate, today),
                status: SearchStatus::Mock,
                warnings: Vec::new(),
            };
        }

        info!("Starting search for '{}'", keyword);
        let params = build_query(filter);
        let mut warnings = Vec::new();

        match self.fetcher.fetch(&params).await {
            FetchOutcome::Challenge => {
                warn!("Bot verification page served, falling back to mock data");
                warnings.push(
                    "The marketplace served a bot-verification page. Showing mock data instead."
                        .to_string(),
                );
                SearchReport {
                    listings: self.mock.generate(keyword, options.limit, rate, today),
                    status: SearchStatus::ChallengeFallback,
                    warnings,
                }
            }
            FetchOutcome::Success { html, nodes } => {
                let listings = self.extractor.extract(&html, options.limit, rate, today);
                if listings.is_empty() {
                    warn!("{} listing nodes found but none could be extracted", nodes);
                    self.empty(keyword, options, rate, today, warnings)
                } else {
                    info!("✅ Successfully scraped {} listings", listings.len());
                    SearchReport {
                        listings,
                        status: SearchStatus::Live,
                        warnings,
                    }
                }
            }
            FetchOutcome::Empty => self.empty(keyword, options, rate, today, warnings),
            FetchOutcome::TransportError(e) => {
                let error = format!("{:#}", e);
                warn!("Search failed: {}", error);
                warnings.push(format!("Search failed: {}", error));
                let fell_back = options.fallback_to_mock;
                let listings = if fell_back {
                    warnings.push("Showing mock data instead.".to_string());
                    self.mock.generate(keyword, options.limit, rate, today)
                } else {
                    Vec::new()
                };
                SearchReport {
                    listings,
                    status: SearchStatus::TransportFailed { error, fell_back },
                    warnings,
                }
            }
        }
    }

    fn empty(
        &mut self,
        keyword: &str,
        options: &SearchOptions,
        rate: ExchangeRate,
        today: NaiveDate,
        mut warnings: Vec<String>,
    ) -> SearchReport {
        warnings.push(format!("No listings found for '{}'.", keyword));
        let fell_back = options.fallback_to_mock;
        let listings = if fell_back {
            warnings.push("Showing mock data instead.".to_string());
            self.mock.generate(keyword, options.limit, rate, today)
        } else {
            Vec::new()
        };
        SearchReport {
            listings,
            status: SearchStatus::Empty { fell_back },
            warnings,
        }
    }
}

#[async_trait]
impl<R: Rng + Send + Sync> ScraperTrait for EbayScraper<R> {
    async fn search(
        &mut self,
        filter: &SearchFilter,
        options: &SearchOptions,
        rate: ExchangeRate,
    ) -> Result<SearchReport> {
        let today = Local::now().date_naive();
        Ok(self.run(filter, options, rate, today).await)
    }

    fn set_rate_budget(&mut self, budget: RateBudget) {
        self.fetcher.pacer_mut().set_budget(budget);
    }

    fn source_name(&self) -> &'static str {
        "eBay"
    }
}

/// Offline source producing only synthetic listings
#[cfg(test)]
pub struct MockScraper<R = StdRng> {
    mock: MockGenerator<R>,
}

#[cfg(test)]
impl<R: Rng> MockScraper<R> {
    pub fn with_generator(mock: MockGenerator<R>) -> Self {
        Self { mock }
    }
}

#[cfg(test)]
#[async_trait]
impl<R: Rng + Send + Sync> ScraperTrait for MockScraper<R> {
    async fn search(
        &mut self,
        filter: &SearchFilter,
        options: &SearchOptions,
        rate: ExchangeRate,
    ) -> Result<SearchReport> {
        let today = Local::now().date_naive();
        Ok(SearchReport {
            listings: self.mock.generate(filter.keyword(), options.limit, rate, today),
            status: SearchStatus::Mock,
            warnings: Vec::new(),
        })
    }

    fn source_name(&self) -> &'static str {
        "Mock"
    }
}
