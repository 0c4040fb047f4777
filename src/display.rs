//! Terminal views of a result set: table, cards and price statistics.

use crate::config::View;
use crate::models::Listing;
use crate::scrapers::types::SearchReport;
use std::fmt::Write as _;
use std::io::Write;
use tracing::error;

const TITLE_WIDTH: usize = 50;
const HISTOGRAM_BINS: usize = 20;
const BAR_WIDTH: usize = 40;

/// Summary of the price column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceStats {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

pub fn price_stats(listings: &[Listing]) -> Option<PriceStats> {
    if listings.is_empty() {
        return None;
    }
    let prices = listings.iter().map(|l| l.price);
    let min = prices.clone().fold(f64::INFINITY, f64::min);
    let max = prices.clone().fold(f64::NEG_INFINITY, f64::max);
    let sum: f64 = prices.sum();
    Some(PriceStats {
        mean: sum / listings.len() as f64,
        min,
        max,
        count: listings.len(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub low: f64,
    pub high: f64,
    pub count: usize,
}

/// Equal-width bins over [min, max]; the top edge belongs to the last bin
pub fn histogram(prices: &[f64], bins: usize) -> Vec<Bin> {
    if prices.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == min {
        return vec![Bin { low: min, high: max, count: prices.len() }];
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<Bin> = (0..bins)
        .map(|i| Bin {
            low: min + width * i as f64,
            high: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for price in prices {
        let idx = (((price - min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    }
}

pub fn render_table(listings: &[Listing]) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    writeln!(
        out,
        "{:<4} {:<53} {:>14} {:>12} {:<22} {}",
        "#", "Title", "Price", "Converted", "Shipping", "Link"
    )?;
    for (i, l) in listings.iter().enumerate() {
        writeln!(
            out,
            "{:<4} {:<53} {:>14} {:>12} {:<22} {}",
            i + 1,
            truncate(&l.title, TITLE_WIDTH),
            l.price_display,
            l.price_converted,
            truncate(&l.shipping, 19),
            l.link
        )?;
    }
    Ok(out)
}

pub fn render_cards(listings: &[Listing]) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    for (i, l) in listings.iter().enumerate() {
        writeln!(out, "[{}] {}", i + 1, truncate(&l.title, TITLE_WIDTH))?;
        writeln!(out, "    Price: {} ({} converted)", l.price_display, l.price_converted)?;
        writeln!(out, "    Shipping: {}", l.shipping)?;
        writeln!(out, "    Condition: {}  Location: {}", l.condition, l.location)?;
        writeln!(out, "    Seller: {} ({})", l.seller, l.shop_name)?;
        writeln!(out, "    Image: {}", l.image_url)?;
        writeln!(out, "    Link: {}", l.link)?;
        writeln!(out)?;
    }
    Ok(out)
}

pub fn render_stats(listings: &[Listing]) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    let Some(stats) = price_stats(listings) else {
        writeln!(out, "No prices to summarize")?;
        return Ok(out);
    };
    writeln!(out, "Average price: ${:.2}", stats.mean)?;
    writeln!(out, "Lowest price:  ${:.2}", stats.min)?;
    writeln!(out, "Highest price: ${:.2}", stats.max)?;
    writeln!(out, "Listings:      {}", stats.count)?;
    writeln!(out)?;
    writeln!(out, "Price distribution")?;

    let prices: Vec<f64> = listings.iter().map(|l| l.price).collect();
    let bins = histogram(&prices, HISTOGRAM_BINS);
    let tallest = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    for bin in bins {
        let bar = "#".repeat(bin.count * BAR_WIDTH / tallest);
        writeln!(out, "{:>10.2} - {:<10.2} | {:<40} {}", bin.low, bin.high, bar, bin.count)?;
    }
    Ok(out)
}

type Renderer = fn(&[Listing]) -> Result<String, std::fmt::Error>;

fn sections(view: View) -> Vec<(&'static str, Renderer)> {
    let table: (&'static str, Renderer) = ("Table", render_table);
    let cards: (&'static str, Renderer) = ("Cards", render_cards);
    let stats: (&'static str, Renderer) = ("Statistics", render_stats);
    match view {
        View::Table => vec![table],
        View::Cards => vec![cards],
        View::Stats => vec![stats],
        View::All => vec![table, cards, stats],
    }
}

/// Print warnings and the requested views. A section that fails to render is
/// reported and skipped; the remaining sections still print.
pub fn present<W: Write>(report: &SearchReport, view: View, out: &mut W) -> std::io::Result<()> {
    for warning in &report.warnings {
        writeln!(out, "⚠️  {}", warning)?;
    }
    if report.listings.is_empty() {
        writeln!(out, "No listings found. Try different search terms.")?;
        return Ok(());
    }
    if report.is_synthetic() {
        writeln!(out, "(showing mock data)")?;
    }

    for (name, render) in sections(view) {
        writeln!(out, "\n=== {} ===", name)?;
        match render(&report.listings) {
            Ok(text) => out.write_all(text.as_bytes())?,
            Err(e) => {
                error!("Failed to render {} view: {}", name, e);
                writeln!(out, "({} view unavailable)", name)?;
            }
        }
    }
    Ok(())
}
