use crate::scrapers::types::{ConditionFilter, SearchFilter};

/// Sort order code: best match
const SORT_BEST_MATCH: &str = "12";
/// Largest page size the results page accepts
const ITEMS_PER_PAGE: &str = "200";
/// Preferred-location mode: items located in a specific country
const PREF_LOC_COUNTRY: &str = "98";

/// Map a search filter onto the marketplace's search query parameters.
///
/// Keyword text is passed through untouched; encoding happens when the
/// request URL is built.
pub fn build_query(filter: &SearchFilter) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("_nkw", filter.keyword().to_string()),
        ("_sacat", filter.category().to_string()),
        ("_sop", SORT_BEST_MATCH.to_string()),
        ("_ipg", ITEMS_PER_PAGE.to_string()),
    ];

    if let (Some(min), Some(max)) = (filter.min_price(), filter.max_price()) {
        if min > 0.0 && max > 0.0 {
            params.push(("_udlo", format_price(min)));
            params.push(("_udhi", format_price(max)));
        }
    }

    match filter.condition() {
        Some(ConditionFilter::New) => params.push(("LH_ItemCondition", "1000".to_string())),
        Some(ConditionFilter::Used) => params.push(("LH_ItemCondition", "3000".to_string())),
        None => {}
    }

    if let Some(origin) = filter.origin() {
        params.push(("LH_PrefLoc", PREF_LOC_COUNTRY.to_string()));
        params.push(("_salic", origin.site_id().to_string()));
    }

    if let Some(destination) = filter.destination() {
        params.push(("_fcid", destination.site_id().to_string()));
    }

    params
}

fn format_price(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}
