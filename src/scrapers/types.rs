use crate::errors::{ScoutError, ScoutResult};
use crate::models::Listing;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Top-level marketplace categories and their numeric ids
pub const CATEGORIES: &[(&str, &str)] = &[
    ("All Categories", ""),
    ("Antiques", "20081"),
    ("Art", "550"),
    ("Baby", "2984"),
    ("Books & Magazines", "267"),
    ("Business & Industrial", "12576"),
    ("Cameras & Photo", "625"),
    ("Cell Phones & Accessories", "15032"),
    ("Clothing, Shoes & Accessories", "11450"),
    ("Coins & Paper Money", "11116"),
    ("Collectibles", "1"),
    ("Computers/Tablets & Networking", "58058"),
    ("Consumer Electronics", "293"),
    ("Crafts", "14339"),
    ("Dolls & Bears", "237"),
    ("Movies & TV", "11232"),
    ("eBay Motors", "6000"),
    ("Entertainment Memorabilia", "45100"),
    ("Gift Cards & Coupons", "172008"),
    ("Health & Beauty", "26395"),
    ("Home & Garden", "11700"),
    ("Jewelry & Watches", "281"),
    ("Music", "11233"),
    ("Musical Instruments & Gear", "619"),
    ("Pet Supplies", "1281"),
    ("Pottery & Glass", "870"),
    ("Real Estate", "10542"),
    ("Sporting Goods", "888"),
    ("Sports Mem, Cards & Fan Shop", "64482"),
    ("Toys & Hobbies", "220"),
    ("Travel", "3252"),
    ("Video Games & Consoles", "1249"),
];

/// Resolve a category given by name (case-insensitive) or numeric id.
/// Returns the id; the empty string means all categories.
pub fn resolve_category(input: &str) -> ScoutResult<String> {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("all") {
        return Ok(String::new());
    }
    CATEGORIES
        .iter()
        .find(|(name, id)| name.eq_ignore_ascii_case(input) || *id == input)
        .map(|(_, id)| id.to_string())
        .ok_or_else(|| ScoutError::UnknownCategory(input.to_string()))
}

/// Countries usable as item origin or shipping destination
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Country {
    UnitedStates,
    Canada,
    UnitedKingdom,
    Australia,
    China,
    France,
    Germany,
    HongKong,
    Japan,
}

impl Country {
    /// Numeric marketplace country id used by the location filters
    pub fn site_id(&self) -> u32 {
        match self {
            Country::UnitedStates => 1,
            Country::Canada => 2,
            Country::UnitedKingdom => 3,
            Country::Australia => 15,
            Country::China => 45,
            Country::France => 71,
            Country::Germany => 77,
            Country::HongKong => 92,
            Country::Japan => 104,
        }
    }
}

impl FromStr for Country {
    type Err = ScoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let country = match s.trim().to_lowercase().as_str() {
            "us" | "usa" | "united states" => Country::UnitedStates,
            "ca" | "canada" => Country::Canada,
            "uk" | "gb" | "united kingdom" => Country::UnitedKingdom,
            "au" | "australia" => Country::Australia,
            "cn" | "china" => Country::China,
            "fr" | "france" => Country::France,
            "de" | "germany" => Country::Germany,
            "hk" | "hong kong" => Country::HongKong,
            "jp" | "japan" => Country::Japan,
            _ => return Err(ScoutError::UnknownCountry(s.to_string())),
        };
        Ok(country)
    }
}

/// Condition filter; `None` on the filter means "all"
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConditionFilter {
    New,
    Used,
}

impl ConditionFilter {
    /// Parse user input; "all" (or empty) yields no filter
    pub fn parse_optional(s: &str) -> ScoutResult<Option<Self>> {
        match s.trim().to_lowercase().as_str() {
            "" | "all" | "any" => Ok(None),
            "new" => Ok(Some(ConditionFilter::New)),
            "used" => Ok(Some(ConditionFilter::Used)),
            _ => Err(ScoutError::UnknownCondition(s.to_string())),
        }
    }
}

/// Search filter for one search submission
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchFilter {
    keyword: String,
    /// Category id, empty for all categories
    category: String,
    /// Minimum price (source currency)
    min_price: Option<f64>,
    /// Maximum price (source currency)
    max_price: Option<f64>,
    condition: Option<ConditionFilter>,
    /// Where the item ships from
    origin: Option<Country>,
    /// Where the item must ship to
    destination: Option<Country>,
}

impl SearchFilter {
    /// Create a keyword-only filter
    #[cfg(test)]
    pub fn new(keyword: impl Into<String>) -> ScoutResult<Self> {
        Self::builder(keyword).build()
    }

    pub fn builder(keyword: impl Into<String>) -> SearchFilterBuilder {
        SearchFilterBuilder {
            keyword: keyword.into(),
            category: String::new(),
            min_price: None,
            max_price: None,
            condition: None,
            origin: None,
            destination: None,
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn min_price(&self) -> Option<f64> {
        self.min_price
    }

    pub fn max_price(&self) -> Option<f64> {
        self.max_price
    }

    pub fn condition(&self) -> Option<ConditionFilter> {
        self.condition
    }

    pub fn origin(&self) -> Option<Country> {
        self.origin
    }

    pub fn destination(&self) -> Option<Country> {
        self.destination
    }
}

#[derive(Debug, Clone)]
pub struct SearchFilterBuilder {
    keyword: String,
    category: String,
    min_price: Option<f64>,
    max_price: Option<f64>,
    condition: Option<ConditionFilter>,
    origin: Option<Country>,
    destination: Option<Country>,
}

impl SearchFilterBuilder {
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn min_price(mut self, price: Option<f64>) -> Self {
        self.min_price = price;
        self
    }

    pub fn max_price(mut self, price: Option<f64>) -> Self {
        self.max_price = price;
        self
    }

    pub fn condition(mut self, condition: Option<ConditionFilter>) -> Self {
        self.condition = condition;
        self
    }

    pub fn origin(mut self, country: Option<Country>) -> Self {
        self.origin = country;
        self
    }

    pub fn destination(mut self, country: Option<Country>) -> Self {
        self.destination = country;
        self
    }

    pub fn build(self) -> ScoutResult<SearchFilter> {
        if self.keyword.trim().is_empty() {
            return Err(ScoutError::EmptyKeyword);
        }
        for bound in [self.min_price, self.max_price].into_iter().flatten() {
            if !bound.is_finite() || bound < 0.0 {
                return Err(ScoutError::InvalidPrice(bound));
            }
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(ScoutError::InvertedPriceRange { min, max });
            }
        }

        Ok(SearchFilter {
            keyword: self.keyword,
            category: self.category.trim().to_string(),
            min_price: self.min_price,
            max_price: self.max_price,
            condition: self.condition,
            origin: self.origin,
            destination: self.destination,
        })
    }
}

/// Per-search options passed explicitly by the caller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Maximum number of records to return
    pub limit: usize,
    /// Skip the network and synthesize records
    pub mock_mode: bool,
    /// Substitute mock records when the live search is empty or fails
    pub fallback_to_mock: bool,
}

/// How a search ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    /// Records were extracted from the live page
    Live,
    /// Mock mode was requested
    Mock,
    /// A bot challenge was served; records are synthetic
    ChallengeFallback,
    /// The page had no listings
    Empty { fell_back: bool },
    /// The request failed
    TransportFailed { error: String, fell_back: bool },
}

/// Result of one search invocation
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub listings: Vec<Listing>,
    pub status: SearchStatus,
    pub warnings: Vec<String>,
}

impl SearchReport {
    pub fn is_synthetic(&self) -> bool {
        matches!(
            self.status,
            SearchStatus::Mock
                | SearchStatus::ChallengeFallback
                | SearchStatus::Empty { fell_back: true }
                | SearchStatus::TransportFailed { fell_back: true, .. }
        )
    }
}
