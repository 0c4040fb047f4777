use crate::config::{ScoutConfig, SearchLine, View};
use crate::display;
use crate::export;
use crate::scrapers::currency::ExchangeRate;
use crate::scrapers::pacing::RateBudget;
use crate::scrapers::traits::ScraperTrait;
use crate::scrapers::types::{SearchFilter, SearchOptions, SearchReport, SearchStatus};
use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{error, info, warn};

const HELP: &str = "\
Commands:
  <keyword> [--category C] [--min-price N --max-price N] [--condition new|used|all]
            [--origin CC] [--destination CC] [--limit N]    search
  :mock on|off        toggle mock data
  :rate <number>      set exchange rate
  :rpm <number>       set requests per minute
  :view table|cards|stats|all
  :export             save the last results as CSV
  :help               show this help
  :quit               leave
";

#[derive(Debug)]
pub enum Command {
    Search(SearchLine),
    Mock(bool),
    Rate(f64),
    Rpm(f64),
    View(View),
    Export,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Parse one input line; blank lines yield `None`
pub fn parse_command(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let Some(rest) = line.strip_prefix(':') else {
        let words: Vec<&str> = line.split_whitespace().collect();
        let search = SearchLine::try_parse_from(words).map_err(|e| anyhow!("{}", e.render()))?;
        return Ok(Some(Command::Search(search)));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or("");
    let arg = parts.next();
    let command = match (name, arg) {
        ("mock", Some("on")) => Command::Mock(true),
        ("mock", Some("off")) => Command::Mock(false),
        ("rate", Some(value)) => Command::Rate(value.parse().context("Exchange rate must be a number")?),
        ("rpm", Some(value)) => Command::Rpm(value.parse().context("Requests per minute must be a number")?),
        ("view", Some(value)) => Command::View(View::from_str(value, true).map_err(|e| anyhow!(e))?),
        ("export", None) => Command::Export,
        ("help", _) => Command::Help,
        ("quit" | "q" | "exit", _) => Command::Quit,
        _ => bail!("Unknown command ':{}'. Type :help for a list.", rest),
    };
    Ok(Some(command))
}

/// Interactive search state; settings only change between searches
pub struct Session<S> {
    scraper: S,
    exchange_rate: ExchangeRate,
    mock_mode: bool,
    fallback_to_mock: bool,
    view: View,
    export_dir: PathBuf,
    last: Option<(String, SearchReport)>,
}

impl<S: ScraperTrait> Session<S> {
    pub fn new(scraper: S, config: &ScoutConfig) -> Self {
        Self {
            scraper,
            exchange_rate: config.exchange_rate,
            mock_mode: config.mock_mode,
            fallback_to_mock: config.fallback_to_mock,
            view: config.view,
            export_dir: config.export_dir.clone(),
            last: None,
        }
    }

    #[cfg(test)]
    pub fn exchange_rate(&self) -> ExchangeRate {
        self.exchange_rate
    }

    pub fn last_report(&self) -> Option<&SearchReport> {
        self.last.as_ref().map(|(_, report)| report)
    }

    /// Run one search and keep its report for export
    pub async fn search(&mut self, filter: &SearchFilter, limit: usize) -> Result<&SearchReport> {
        let options = SearchOptions {
            limit,
            mock_mode: self.mock_mode,
            fallback_to_mock: self.fallback_to_mock,
        };
        let report = self.scraper.search(filter, &options, self.exchange_rate).await?;

        if report.status == SearchStatus::ChallengeFallback && !self.mock_mode {
            warn!("Switching to mock mode after bot challenge");
            self.mock_mode = true;
        }

        let (_, report) = self.last.insert((filter.keyword().to_string(), report));
        Ok(report)
    }

    /// Export the last results; `None` when nothing has been searched yet
    pub fn export_last(&self) -> Result<Option<PathBuf>> {
        match &self.last {
            Some((keyword, report)) => {
                export::export_to_dir(&self.export_dir, keyword, &report.listings).map(Some)
            }
            None => Ok(None),
        }
    }

    pub async fn handle<W: Write>(&mut self, command: Command, out: &mut W) -> Result<Flow> {
        match command {
            Command::Search(line) => {
                let keyword = line.keyword.join(" ");
                let filter = line.filters.to_filter(&keyword)?;
                let view = self.view;
                let report = self.search(&filter, line.filters.limit).await?;
                display::present(report, view, out)?;
                if self.mock_mode && report_was_challenge(self.last_report()) {
                    writeln!(out, "Mock mode is now on. Use ':mock off' to try the live site again.")?;
                }
            }
            Command::Mock(on) => {
                self.mock_mode = on;
                writeln!(out, "Mock data {}", if on { "enabled" } else { "disabled" })?;
            }
            Command::Rate(rate) => {
                self.exchange_rate = ExchangeRate::new(rate)?;
                writeln!(out, "Exchange rate set to {}", self.exchange_rate.value())?;
            }
            Command::Rpm(rpm) => {
                let budget = RateBudget::new(rpm)?;
                self.scraper.set_rate_budget(budget);
                writeln!(out, "Request budget set to {} per minute", budget.requests_per_minute())?;
            }
            Command::View(view) => {
                self.view = view;
                writeln!(out, "View set to {:?}", view)?;
            }
            Command::Export => match self.export_last()? {
                Some(path) => writeln!(out, "Saved {}", path.display())?,
                None => writeln!(out, "Nothing to export yet")?,
            },
            Command::Help => out.write_all(HELP.as_bytes())?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Read commands until EOF or `:quit`. A failing command is reported and
    /// the session carries on.
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        info!("Interactive session started ({} source)", self.scraper.source_name());
        writeln!(out, "Type a keyword to search, or :help")?;
        let mut lines = input.lines();
        loop {
            write!(out, "> ")?;
            out.flush()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            let outcome = match parse_command(&line) {
                Ok(Some(command)) => self.handle(command, out).await,
                Ok(None) => Ok(Flow::Continue),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => {
                    error!("Command failed: {:#}", e);
                    writeln!(out, "Error: {:#}", e)?;
                }
            }
        }
        Ok(())
    }
}

fn report_was_challenge(report: Option<&SearchReport>) -> bool {
    matches!(report, Some(r) if r.status == SearchStatus::ChallengeFallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Cli;
    use crate::scrapers::ebay::MockScraper;
    use crate::scrapers::mock::MockGenerator;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Live source that is always challenged; records the mock flag of each call
    #[derive(Default)]
    struct ChallengedScraper {
        mock_flags: Vec<bool>,
    }

    #[async_trait]
    impl ScraperTrait for ChallengedScraper {
        async fn search(
            &mut self,
            _filter: &SearchFilter,
            options: &SearchOptions,
            _rate: ExchangeRate,
        ) -> Result<SearchReport> {
            self.mock_flags.push(options.mock_mode);
            let status = if options.mock_mode {
                SearchStatus::Mock
            } else {
                SearchStatus::ChallengeFallback
            };
            Ok(SearchReport {
                listings: Vec::new(),
                status,
                warnings: Vec::new(),
            })
        }

        fn source_name(&self) -> &'static str {
            "Challenged"
        }
    }

    fn config(dir: &std::path::Path) -> ScoutConfig {
        let cli = Cli::parse_from(["market-scout", "--mock", "--export-dir", dir.to_str().unwrap()]);
        ScoutConfig::from_cli(&cli).unwrap()
    }

    fn session(dir: &std::path::Path) -> Session<MockScraper<StdRng>> {
        let scraper = MockScraper::with_generator(MockGenerator::with_rng(StdRng::seed_from_u64(5)));
        Session::new(scraper, &config(dir))
    }

    #[test]
    fn parses_commands() {
        assert!(parse_command("   ").unwrap().is_none());
        assert!(matches!(parse_command(":mock on").unwrap(), Some(Command::Mock(true))));
        assert!(matches!(parse_command(":rate 140.5").unwrap(), Some(Command::Rate(r)) if r == 140.5));
        assert!(matches!(parse_command(":view cards").unwrap(), Some(Command::View(View::Cards))));
        assert!(matches!(parse_command(":q").unwrap(), Some(Command::Quit)));
        assert!(parse_command(":rate lots").is_err());
        assert!(parse_command(":teleport").is_err());

        match parse_command("vintage camera --limit 5").unwrap() {
            Some(Command::Search(line)) => {
                assert_eq!(line.keyword.join(" "), "vintage camera");
                assert_eq!(line.filters.limit, 5);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn search_then_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        let filter = SearchFilter::new("lens").unwrap();

        let report = session.search(&filter, 5).await.unwrap();
        assert_eq!(report.listings.len(), 5);

        let path = session.export_last().unwrap().unwrap();
        assert!(path.starts_with(dir.path()));
    }

    #[tokio::test]
    async fn export_before_search_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        assert!(session(dir.path()).export_last().unwrap().is_none());
    }

    #[tokio::test]
    async fn rate_change_applies_to_next_search() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        let mut out = Vec::new();
        session.handle(Command::Rate(100.0), &mut out).await.unwrap();
        assert_eq!(session.exchange_rate().value(), 100.0);

        let filter = SearchFilter::new("lens").unwrap();
        let report = session.search(&filter, 3).await.unwrap();
        for l in &report.listings {
            assert_eq!(l.price_converted, (l.price * 100.0).floor() as i64);
        }
    }

    #[tokio::test]
    async fn invalid_settings_leave_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        let mut out = Vec::new();
        assert!(session.handle(Command::Rate(0.0), &mut out).await.is_err());
        assert_eq!(session.exchange_rate(), ExchangeRate::DEFAULT);
        assert!(session.handle(Command::Rpm(-1.0), &mut out).await.is_err());
    }

    #[tokio::test]
    async fn challenge_switches_session_to_mock_mode() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from(["market-scout", "--export-dir", dir.path().to_str().unwrap()]);
        let config = ScoutConfig::from_cli(&cli).unwrap();
        let mut session = Session::new(ChallengedScraper::default(), &config);
        let mut out = Vec::new();

        let search = parse_command("lens").unwrap().unwrap();
        session.handle(search, &mut out).await.unwrap();
        let text = String::from_utf8(out.clone()).unwrap();
        assert!(text.contains(":mock off"), "{text}");

        let filter = SearchFilter::new("lens").unwrap();
        let report = session.search(&filter, 5).await.unwrap();
        assert_eq!(report.status, SearchStatus::Mock);
        assert_eq!(session.scraper.mock_flags, vec![false, true]);

        session.handle(Command::Mock(false), &mut out).await.unwrap();
        session.search(&filter, 5).await.unwrap();
        assert_eq!(session.scraper.mock_flags, vec![false, true, false]);
    }

    #[tokio::test]
    async fn run_loop_survives_bad_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(dir.path());
        let input = b"\n:bogus\nlens --limit 2 --condition mint\nlens --limit 2 --view\n:mock off\n:mock on\nlens --limit 2\n:quit\nlens\n";
        let mut out = Vec::new();
        session.run(&input[..], &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Unknown command ':bogus'"));
        assert!(text.contains("unknown condition: mint"));
        assert!(text.contains("Mock data disabled"));
        assert!(text.contains("=== Table ==="));
        assert_eq!(session.last_report().unwrap().listings.len(), 2);
    }
}
