use crate::models::{Condition, Listing, Source};
use crate::scrapers::currency::ExchangeRate;
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

/// Upper bound on synthetic records per call
pub const MAX_MOCK_RECORDS: usize = 20;

pub const MOCK_LINK: &str = "https://www.ebay.com/";
pub const MOCK_IMAGE: &str = "https://via.placeholder.com/150";

const SHIPPING: &[&str] = &["Free shipping", "+$5.99 shipping", "+$12.50 shipping", "+$25.00 shipping"];
const CONDITIONS: &[Condition] = &[Condition::New, Condition::Used, Condition::Unknown];
const LOCATIONS: &[&str] = &["Japan", "United States", "United Kingdom", "Germany", "China", "Canada"];
const SELLERS: &[&str] = &["camera_depot", "tokyo_finds", "retro_gear_uk", "bargain_bin", "lens_house"];
const SHOPS: &[&str] = &["Camera Depot", "Tokyo Finds", "Retro Gear", "N/A"];
const TITLE_TAGS: &[&str] = &["Excellent", "Near Mint", "Tested", "Boxed", "Rare", "Working"];

/// Produces synthetic listings with the same schema as live extraction
#[derive(Debug)]
pub struct MockGenerator<R = StdRng> {
    rng: R,
}

impl MockGenerator<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl<R: Rng> MockGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Generate up to `MAX_MOCK_RECORDS` listings for a keyword
    pub fn generate(
        &mut self,
        keyword: &str,
        count: usize,
        rate: ExchangeRate,
        today: NaiveDate,
    ) -> Vec<Listing> {
        let count = count.min(MAX_MOCK_RECORDS);
        info!("📋 Generating {} mock listings for '{}'", count, keyword);

        (1..=count)
            .map(|i| {
                let cents = self.rng.gen_range(2_000..=50_000);
                let price = cents as f64 / 100.0;
                let tag = pick(&mut self.rng, TITLE_TAGS);
                Listing {
                    title: format!("{} {} #{}", keyword, tag, i),
                    price,
                    price_display: format!("${:.2}", price),
                    price_converted: rate.convert(price),
                    shipping: pick(&mut self.rng, SHIPPING).to_string(),
                    condition: pick(&mut self.rng, CONDITIONS),
                    location: pick(&mut self.rng, LOCATIONS).to_string(),
                    seller: pick(&mut self.rng, SELLERS).to_string(),
                    shop_name: pick(&mut self.rng, SHOPS).to_string(),
                    listed_date: today,
                    link: MOCK_LINK.to_string(),
                    image_url: MOCK_IMAGE.to_string(),
                    source: Source::Mock,
                }
            })
            .collect()
    }
}

fn pick<R: Rng, T: Copy>(rng: &mut R, pool: &[T]) -> T {
    // Pools are non-empty constants
    *pool.choose(rng).unwrap_or(&pool[0])
}
