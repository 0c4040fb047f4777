use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a listing came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Ebay,
    Mock,
}

/// Item condition as shown on the results page
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    New,
    Used,
    #[default]
    Unknown,
}

impl Condition {
    /// Classify the free-form condition text of a listing
    pub fn from_listing_text(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("pre-owned") || lower.contains("used") || lower.contains("refurbished") {
            Condition::Used
        } else if lower.contains("new") {
            Condition::New
        } else {
            Condition::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::New => "new",
            Condition::Used => "used",
            Condition::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One product listing, either extracted from a results page or synthesized
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub title: String,
    pub price: f64,
    pub price_display: String,
    pub price_converted: i64,
    pub shipping: String,
    pub condition: Condition,
    pub location: String,
    pub seller: String,
    pub shop_name: String,
    pub listed_date: NaiveDate,
    pub link: String,
    pub image_url: String,
    pub source: Source,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn condition_text_is_classified() {
        assert_eq!(Condition::from_listing_text("Brand New"), Condition::New);
        assert_eq!(Condition::from_listing_text("New (Other)"), Condition::New);
        assert_eq!(Condition::from_listing_text("Pre-Owned"), Condition::Used);
        assert_eq!(Condition::from_listing_text("Seller refurbished"), Condition::Used);
        assert_eq!(Condition::from_listing_text("For parts or not working"), Condition::Unknown);
        assert_eq!(Condition::from_listing_text(""), Condition::Unknown);
    }

    #[test]
    fn condition_serializes_lowercase() {
        let json = serde_json::to_string(&Condition::Used).unwrap();
        assert_eq!(json, "\"used\"");
    }
}
