use crate::errors::ScoutResult;
use crate::scrapers::currency::ExchangeRate;
use crate::scrapers::fetcher::{FetchSettings, DEFAULT_SITE_ROOT};
use crate::scrapers::pacing::{Jitter, RateBudget};
use crate::scrapers::types::{resolve_category, ConditionFilter, Country, SearchFilter};
use anyhow::{Context, Result};
use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Search marketplace listings from the terminal, then browse and export them
#[derive(Parser, Debug)]
#[command(name = "market-scout", version, long_about = None)]
pub struct Cli {
    /// Search keyword; omit to start an interactive session
    pub keyword: Vec<String>,

    #[command(flatten)]
    pub filters: FilterArgs,

    /// Requests-per-minute budget used to pace network calls
    #[arg(long, default_value_t = 10.0)]
    pub rpm: f64,

    /// Random extra delay added before each request
    #[arg(long, value_enum, default_value_t = JitterPreset::Cautious)]
    pub jitter: JitterPreset,

    /// Multiplier from listing currency to display currency
    #[arg(long, default_value_t = 150.0)]
    pub exchange_rate: f64,

    /// Use synthetic listings instead of the live site
    #[arg(long)]
    pub mock: bool,

    /// Show synthetic listings when the live search is empty or fails
    #[arg(long)]
    pub fallback_mock: bool,

    /// Verbose logging
    #[arg(long)]
    pub debug: bool,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 20)]
    pub timeout: u64,

    /// Skip the cookie warm-up visit to the site root
    #[arg(long)]
    pub no_warm_up: bool,

    /// Do not retry a failed request with a fresh session
    #[arg(long)]
    pub no_retry: bool,

    /// Which result views to print
    #[arg(long, value_enum, default_value_t = View::All)]
    pub view: View,

    /// Write results to a timestamped CSV file
    #[arg(long)]
    pub export: bool,

    /// Directory for CSV exports
    #[arg(long, default_value = ".")]
    pub export_dir: PathBuf,

    /// Print results as JSON instead of the terminal views
    #[arg(long)]
    pub json: bool,

    /// Start an interactive session even when a keyword is given
    #[arg(short, long)]
    pub interactive: bool,

    /// Marketplace root URL
    #[arg(long, default_value = DEFAULT_SITE_ROOT, hide = true)]
    pub site_root: String,
}

/// Filters accepted on the command line and on interactive search lines
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Category name or numeric id
    #[arg(short, long, default_value = "")]
    pub category: String,

    /// Minimum price (only used together with --max-price)
    #[arg(long)]
    pub min_price: Option<f64>,

    /// Maximum price (only used together with --min-price)
    #[arg(long)]
    pub max_price: Option<f64>,

    /// new, used or all
    #[arg(long, default_value = "all")]
    pub condition: String,

    /// Country the item ships from
    #[arg(long)]
    pub origin: Option<String>,

    /// Country the item must ship to
    #[arg(long)]
    pub destination: Option<String>,

    /// Maximum number of listings
    #[arg(short, long, default_value_t = 50)]
    pub limit: usize,
}

impl FilterArgs {
    pub fn to_filter(&self, keyword: &str) -> ScoutResult<SearchFilter> {
        let origin = self.origin.as_deref().map(str::parse::<Country>).transpose()?;
        let destination = self
            .destination
            .as_deref()
            .map(str::parse::<Country>)
            .transpose()?;

        SearchFilter::builder(keyword)
            .category(resolve_category(&self.category)?)
            .min_price(self.min_price)
            .max_price(self.max_price)
            .condition(ConditionFilter::parse_optional(&self.condition)?)
            .origin(origin)
            .destination(destination)
            .build()
    }
}

/// One search line typed in the interactive session
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_help_flag = true, disable_version_flag = true)]
pub struct SearchLine {
    pub keyword: Vec<String>,

    #[command(flatten)]
    pub filters: FilterArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JitterPreset {
    None,
    Moderate,
    Cautious,
}

impl JitterPreset {
    pub fn jitter(&self) -> Jitter {
        match self {
            JitterPreset::None => Jitter::NONE,
            JitterPreset::Moderate => Jitter::MODERATE,
            JitterPreset::Cautious => Jitter::CAUTIOUS,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Table,
    Cards,
    Stats,
    All,
}

/// Validated runtime settings
#[derive(Debug, Clone)]
pub struct ScoutConfig {
    pub budget: RateBudget,
    pub jitter: Jitter,
    pub exchange_rate: ExchangeRate,
    pub fetch: FetchSettings,
    pub mock_mode: bool,
    pub fallback_to_mock: bool,
    pub view: View,
    pub export_dir: PathBuf,
}

impl ScoutConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let site_root = Url::parse(&cli.site_root)
            .with_context(|| format!("Invalid site root: {}", cli.site_root))?;
        anyhow::ensure!(cli.timeout > 0, "Timeout must be at least one second");

        let mut fetch = FetchSettings::new(site_root);
        fetch.timeout = Duration::from_secs(cli.timeout);
        fetch.warm_up = !cli.no_warm_up;
        fetch.retry_fresh = !cli.no_retry;

        Ok(Self {
            budget: RateBudget::new(cli.rpm)?,
            jitter: cli.jitter.jitter(),
            exchange_rate: ExchangeRate::new(cli.exchange_rate)?,
            fetch,
            mock_mode: cli.mock,
            fallback_to_mock: cli.fallback_mock,
            view: cli.view,
            export_dir: cli.export_dir.clone(),
        })
    }
}
