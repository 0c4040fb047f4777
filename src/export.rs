use crate::models::Listing;
use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const HEADERS: &[&str] = &[
    "Product Name",
    "Price",
    "Converted Price",
    "Shipping",
    "Condition",
    "Location",
    "Seller",
    "Shop Name",
    "Listing Date",
    "Link",
    "Image URL",
];

/// `ebay_search_<keyword>_<YYYYmmdd_HHMMSS>.csv`, keyword reduced to filename-safe characters
pub fn export_filename(keyword: &str, at: NaiveDateTime) -> String {
    let safe: String = keyword
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let safe = if safe.is_empty() { "results".to_string() } else { safe };
    format!("ebay_search_{}_{}.csv", safe, at.format("%Y%m%d_%H%M%S"))
}

/// Write listings as UTF-8 CSV with a header row
pub fn write_csv<W: Write>(writer: W, listings: &[Listing]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADERS).context("Failed to write CSV header")?;
    for l in listings {
        let record = [
            l.title.clone(),
            format!("{:.2}", l.price),
            l.price_converted.to_string(),
            l.shipping.clone(),
            l.condition.to_string(),
            l.location.clone(),
            l.seller.clone(),
            l.shop_name.clone(),
            l.listed_date.format("%Y-%m-%d").to_string(),
            l.link.clone(),
            l.image_url.clone(),
        ];
        wtr.write_record(&record).context("Failed to write CSV row")?;
    }
    wtr.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// Export to a new timestamped file in `dir`, returning its path
pub fn export_to_dir(dir: &Path, keyword: &str, listings: &[Listing]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create export directory {}", dir.display()))?;
    let path = dir.join(export_filename(keyword, Local::now().naive_local()));
    let file = std::fs::File::create(&path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(file, listings)?;
    info!("💾 Saved {} listings to {}", listings.len(), path.display());
    Ok(path)
}
