use crate::models::{Condition, Listing, Source};
use crate::scrapers::currency::ExchangeRate;
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};
use url::Url;

/// Container of one search result
pub const ITEM_SELECTOR: &str = "li.s-item";
/// Title of the promotional tile mixed into the results
pub const PROMO_MARKER: &str = "Shop on eBay";
pub const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/150";

const UNKNOWN: &str = "unknown";
const NO_SHOP: &str = "N/A";

/// Parse a CSS selector, reporting the offending text on failure
pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid CSS selector '{}': {:?}", css, e))
}

struct ListingSelectors {
    item: Selector,
    title: Selector,
    price: Selector,
    link: Selector,
    shipping: Selector,
    location: Selector,
    seller: Selector,
    condition: Selector,
    image: Selector,
}

impl ListingSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            item: selector(ITEM_SELECTOR)?,
            title: selector(".s-item__title")?,
            price: selector(".s-item__price")?,
            link: selector("a.s-item__link")?,
            shipping: selector(".s-item__shipping, .s-item__logisticsCost")?,
            location: selector(".s-item__location, .s-item__itemLocation")?,
            seller: selector(".s-item__seller-info-text, .s-item__seller-info")?,
            condition: selector(".SECONDARY_INFO")?,
            image: selector(".s-item__image-img")?,
        })
    }
}

/// Turns a results page into listing records
pub struct Extractor {
    selectors: ListingSelectors,
    decimal: Regex,
    integer: Regex,
    site_root: Url,
}

impl Extractor {
    /// Create an extractor resolving relative links against `site_root`
    pub fn new(site_root: Url) -> Result<Self> {
        Ok(Self {
            selectors: ListingSelectors::new()?,
            decimal: Regex::new(r"\d+\.\d+").context("Failed to compile price pattern")?,
            integer: Regex::new(r"\d+").context("Failed to compile price pattern")?,
            site_root,
        })
    }

    /// Extract up to `limit` listings in page order. Nodes that lack a
    /// required field are skipped; this never fails.
    pub fn extract(
        &self,
        html: &str,
        limit: usize,
        rate: ExchangeRate,
        today: NaiveDate,
    ) -> Vec<Listing> {
        let document = Html::parse_document(html);
        let nodes: Vec<_> = document.select(&self.selectors.item).take(limit).collect();
        info!("Found {} listing nodes in HTML", nodes.len());

        let listings: Vec<Listing> = nodes
            .iter()
            .enumerate()
            .filter_map(|(idx, node)| {
                let listing = self.extract_listing(*node, rate, today);
                if listing.is_none() {
                    debug!("Skipped listing node {}", idx);
                }
                listing
            })
            .collect();

        info!("Extracted {} listings", listings.len());
        listings
    }

    fn extract_listing(
        &self,
        node: ElementRef,
        rate: ExchangeRate,
        today: NaiveDate,
    ) -> Option<Listing> {
        let s = &self.selectors;

        let title = first_text(node, &s.title)?;
        let title = title.strip_prefix("New Listing").unwrap_or(&title).trim().to_string();
        if title.is_empty() || title.contains(PROMO_MARKER) {
            return None;
        }

        let price_display = first_text(node, &s.price)?;
        let href = node.select(&s.link).next()?.value().attr("href")?;

        let price = self.parse_price(&price_display);
        let shipping = first_text(node, &s.shipping).unwrap_or_else(|| UNKNOWN.to_string());
        let location = first_text(node, &s.location)
            .map(|loc| loc.strip_prefix("from ").unwrap_or(&loc).trim().to_string())
            .filter(|loc| !loc.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string());
        let condition = first_text(node, &s.condition)
            .map(|text| Condition::from_listing_text(&text))
            .unwrap_or_default();
        let (seller, shop_name) = first_text(node, &s.seller)
            .map(|info| parse_seller_info(&info))
            .unwrap_or_else(|| (UNKNOWN.to_string(), NO_SHOP.to_string()));
        let image_src = node.select(&s.image).next().and_then(|img| {
            let el = img.value();
            el.attr("src")
                .filter(|src| !src.trim().is_empty())
                .or_else(|| el.attr("data-src"))
        });

        Some(Listing {
            title,
            price,
            price_converted: rate.convert(price),
            price_display,
            shipping,
            condition,
            location,
            seller,
            shop_name,
            listed_date: today,
            link: normalize_link(&self.site_root, href),
            image_url: normalize_image(&self.site_root, image_src),
            source: Source::Ebay,
        })
    }

    /// Decimal number first, integer second, 0.0 otherwise.
    /// Thousands separators are dropped before matching.
    pub fn parse_price(&self, text: &str) -> f64 {
        let cleaned = text.replace(',', "");
        self.decimal
            .find(&cleaned)
            .or_else(|| self.integer.find(&cleaned))
            .and_then(|m| m.as_str().parse::<f64>().ok())
            .filter(|price| price.is_finite())
            .unwrap_or(0.0)
    }
}

fn first_text(node: ElementRef, selector: &Selector) -> Option<String> {
    node.select(selector).next().map(|el| collapse_whitespace(&el.text().collect::<String>()))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split "handle (label) 99.5% positive" into the handle and the parenthetical label
pub fn parse_seller_info(info: &str) -> (String, String) {
    let info = info.trim();
    let paren = info.find('(');
    let seller = info[..paren.unwrap_or(info.len())]
        .split_whitespace()
        .next()
        .unwrap_or(UNKNOWN)
        .to_string();

    let shop_name = paren
        .and_then(|start| {
            let rest = &info[start + 1..];
            rest.find(')').map(|end| rest[..end].trim().to_string())
        })
        .filter(|label| !label.is_empty())
        .unwrap_or_else(|| NO_SHOP.to_string());

    (seller, shop_name)
}

/// Absolute listing URL without its tracking query; site root when malformed
pub fn normalize_link(site_root: &Url, href: &str) -> String {
    let href = href.split('?').next().unwrap_or("").trim();
    if href.is_empty() {
        return site_root.to_string();
    }
    resolve_http(site_root, href).unwrap_or_else(|| site_root.to_string())
}

/// Absolute image URL; placeholder when absent or malformed
pub fn normalize_image(site_root: &Url, src: Option<&str>) -> String {
    src.map(str::trim)
        .filter(|src| !src.is_empty())
        .and_then(|src| resolve_http(site_root, src))
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string())
}

fn resolve_http(site_root: &Url, raw: &str) -> Option<String> {
    let url = site_root.join(raw).ok()?;
    match url.scheme() {
        "http" | "https" if url.host().is_some() => Some(url.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extractor() -> Extractor {
        Extractor::new(Url::parse("https://www.ebay.com/").unwrap()).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn item(title: Option<&str>, price: Option<&str>, link: Option<&str>, extra: &str) -> String {
        let mut html = String::from("<li class=\"s-item\">");
        if let Some(link) = link {
            html.push_str(&format!("<a class=\"s-item__link\" href=\"{}\">", link));
        }
        if let Some(title) = title {
            html.push_str(&format!("<div class=\"s-item__title\"><span>{}</span></div>", title));
        }
        if link.is_some() {
            html.push_str("</a>");
        }
        if let Some(price) = price {
            html.push_str(&format!("<span class=\"s-item__price\">{}</span>", price));
        }
        html.push_str(extra);
        html.push_str("</li>");
        html
    }

    fn page(items: &[String]) -> String {
        format!("<html><body><ul class=\"srp-results\">{}</ul></body></html>", items.concat())
    }

    #[test]
    fn node_missing_price_is_dropped() {
        let html = page(&[
            item(Some("Canon AE-1"), Some("$120.00"), Some("https://www.ebay.com/itm/1?hash=x"), ""),
            item(Some("Nikon F3"), None, Some("https://www.ebay.com/itm/2"), ""),
            item(Some("Pentax K1000"), Some("$89.50"), Some("https://www.ebay.com/itm/3"), ""),
        ]);
        let listings = extractor().extract(&html, 50, ExchangeRate::DEFAULT, today());
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].title, "Canon AE-1");
        assert_eq!(listings[1].title, "Pentax K1000");
    }

    #[test]
    fn nodes_missing_required_fields_never_survive() {
        let html = page(&[
            item(None, Some("$1.00"), Some("/itm/1"), ""),
            item(Some("No link"), Some("$1.00"), None, ""),
            item(Some("No price"), None, Some("/itm/3"), ""),
            item(Some("   "), Some("$1.00"), Some("/itm/4"), ""),
        ]);
        let listings = extractor().extract(&html, 50, ExchangeRate::DEFAULT, today());
        assert!(listings.is_empty());
    }

    #[test]
    fn promotional_tile_is_skipped() {
        let html = page(&[
            item(Some("Shop on eBay"), Some("$20.00"), Some("https://ebay.com/b/x"), ""),
            item(Some("Leica M3"), Some("$1,450.00"), Some("https://www.ebay.com/itm/9"), ""),
        ]);
        let listings = extractor().extract(&html, 50, ExchangeRate::DEFAULT, today());
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].price, 1450.0);
    }

    #[test]
    fn limit_caps_nodes_in_page_order() {
        let items: Vec<String> = (1..=5)
            .map(|i| item(Some(&format!("Item {i}")), Some("$5.00"), Some(&format!("/itm/{i}")), ""))
            .collect();
        let listings = extractor().extract(&page(&items), 3, ExchangeRate::DEFAULT, today());
        let titles: Vec<_> = listings.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["Item 1", "Item 2", "Item 3"]);
    }

    #[test]
    fn full_record_is_extracted() {
        let extra = r#"
            <span class="SECONDARY_INFO">Pre-Owned</span>
            <span class="s-item__shipping">+$15.00 shipping</span>
            <span class="s-item__location">from Japan</span>
            <span class="s-item__seller-info-text">tokyo_cameras (Tokyo Camera Shop) 99.8% positive</span>
            <img class="s-item__image-img" src="//i.ebayimg.com/images/g/abc/s-l140.jpg">
        "#;
        let html = page(&[item(
            Some("Olympus OM-1"),
            Some("$99.99"),
            Some("https://www.ebay.com/itm/12345?_trkparms=abc"),
            extra,
        )]);
        let rate = ExchangeRate::new(150.0).unwrap();
        let listings = extractor().extract(&html, 50, rate, today());

        assert_eq!(
            listings,
            vec![Listing {
                title: "Olympus OM-1".to_string(),
                price: 99.99,
                price_display: "$99.99".to_string(),
                price_converted: 14998,
                shipping: "+$15.00 shipping".to_string(),
                condition: Condition::Used,
                location: "Japan".to_string(),
                seller: "tokyo_cameras".to_string(),
                shop_name: "Tokyo Camera Shop".to_string(),
                listed_date: today(),
                link: "https://www.ebay.com/itm/12345".to_string(),
                image_url: "https://i.ebayimg.com/images/g/abc/s-l140.jpg".to_string(),
                source: Source::Ebay,
            }]
        );
    }

    #[test]
    fn optional_fields_degrade_to_defaults() {
        let html = page(&[item(Some("Bare item"), Some("Price on request"), Some("/itm/7"), "")]);
        let listing = &extractor().extract(&html, 50, ExchangeRate::DEFAULT, today())[0];
        assert_eq!(listing.price, 0.0);
        assert_eq!(listing.price_converted, 0);
        assert_eq!(listing.shipping, "unknown");
        assert_eq!(listing.location, "unknown");
        assert_eq!(listing.seller, "unknown");
        assert_eq!(listing.shop_name, "N/A");
        assert_eq!(listing.condition, Condition::Unknown);
        assert_eq!(listing.link, "https://www.ebay.com/itm/7");
        assert_eq!(listing.image_url, PLACEHOLDER_IMAGE);
    }

    #[test]
    fn new_listing_badge_is_stripped_from_title() {
        let html = page(&[item(
            Some("New Listing</span><span>Minolta X-700"),
            Some("$60.00"),
            Some("/itm/8"),
            "",
        )]);
        let listings = extractor().extract(&html, 50, ExchangeRate::DEFAULT, today());
        assert_eq!(listings[0].title, "Minolta X-700");
    }

    #[test]
    fn image_falls_back_to_data_src() {
        let extra = r#"<img class="s-item__image-img" src="" data-src="https://i.ebayimg.com/x.jpg">"#;
        let html = page(&[item(Some("Lazy image"), Some("$1.00"), Some("/itm/1"), extra)]);
        let listings = extractor().extract(&html, 50, ExchangeRate::DEFAULT, today());
        assert_eq!(listings[0].image_url, "https://i.ebayimg.com/x.jpg");
    }

    #[test]
    fn price_parsing_prefers_decimal() {
        let ex = extractor();
        assert_eq!(ex.parse_price("$99.99"), 99.99);
        assert_eq!(ex.parse_price("$1,299.00"), 1299.0);
        assert_eq!(ex.parse_price("$10.00 to $25.00"), 10.0);
        assert_eq!(ex.parse_price("USD 45"), 45.0);
        assert_eq!(ex.parse_price("See price"), 0.0);
        assert_eq!(ex.parse_price(&format!("${}", "9".repeat(400))), 0.0);
    }

    #[test]
    fn links_are_always_absolute() {
        let root = Url::parse("https://www.ebay.com/").unwrap();
        assert_eq!(normalize_link(&root, "/itm/1?x=y"), "https://www.ebay.com/itm/1");
        assert_eq!(normalize_link(&root, ""), "https://www.ebay.com/");
        assert_eq!(normalize_link(&root, "?only=query"), "https://www.ebay.com/");
        assert_eq!(normalize_link(&root, "javascript:void(0)"), "https://www.ebay.com/");
        assert_eq!(normalize_link(&root, "http://[::1"), "https://www.ebay.com/");
    }

    #[test]
    fn images_are_always_absolute() {
        let root = Url::parse("https://www.ebay.com/").unwrap();
        assert_eq!(normalize_image(&root, None), PLACEHOLDER_IMAGE);
        assert_eq!(normalize_image(&root, Some("  ")), PLACEHOLDER_IMAGE);
        assert_eq!(normalize_image(&root, Some("data:image/gif;base64,R0lGOD")), PLACEHOLDER_IMAGE);
        assert_eq!(
            normalize_image(&root, Some("//i.ebayimg.com/a.jpg")),
            "https://i.ebayimg.com/a.jpg"
        );
    }

    #[test]
    fn seller_info_is_split() {
        assert_eq!(
            parse_seller_info("camera_depot (12,345) 99.5%"),
            ("camera_depot".to_string(), "12,345".to_string())
        );
        assert_eq!(
            parse_seller_info("solo_seller 100% positive"),
            ("solo_seller".to_string(), "N/A".to_string())
        );
        assert_eq!(parse_seller_info("()"), ("unknown".to_string(), "N/A".to_string()));
    }
}
