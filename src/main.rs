mod config;
mod display;
mod errors;
mod export;
mod models;
mod scrapers;
mod session;

use anyhow::Result;
use clap::Parser;
use config::{Cli, ScoutConfig};
use scrapers::EbayScraper;
use session::Session;
use tracing::{error, info, Level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    info!("🛒 Market Scout - eBay listing search");

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        eprintln!("Something went wrong: {:#}", e);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = ScoutConfig::from_cli(&cli)?;
    let scraper = EbayScraper::new(config.fetch.clone(), config.budget, config.jitter)?;
    let mut session = Session::new(scraper, &config);
    let mut stdout = std::io::stdout();

    let keyword = cli.keyword.join(" ");
    if keyword.trim().is_empty() || cli.interactive {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        return session.run(stdin, &mut stdout).await;
    }

    let filter = cli.filters.to_filter(&keyword)?;
    let report = session.search(&filter, cli.filters.limit).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report.listings)?);
    } else {
        display::present(report, config.view, &mut stdout)?;
    }

    if cli.export {
        if let Err(e) = session.export_last() {
            error!("Export failed: {:#}", e);
            eprintln!("Export failed: {:#}", e);
        }
    }

    Ok(())
}
