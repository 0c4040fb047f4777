use crate::scrapers::extractor::{selector, ITEM_SELECTOR};
use crate::scrapers::identity::IdentityRotator;
use crate::scrapers::pacing::Pacer;
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::Rng;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_SITE_ROOT: &str = "https://www.ebay.com/";
pub const SEARCH_PATH: &str = "sch/i.html";

/// Lowercase fragments that only appear on anti-automation interstitials
pub const CHALLENGE_MARKERS: &[&str] = &[
    "pardon our interruption",
    "checking your browser",
    "verify you are a human",
    "captcha",
    "splashui/challenge",
];

/// Network settings for the results-page fetch
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub site_root: Url,
    pub timeout: Duration,
    /// Visit the site root first to collect session cookies
    pub warm_up: bool,
    /// Retry once with a fresh, cookie-less client after a transport failure
    pub retry_fresh: bool,
}

impl FetchSettings {
    /// Defaults: 20s timeout, warm-up and a single fresh retry enabled
    pub fn new(site_root: Url) -> Self {
        Self {
            site_root,
            timeout: Duration::from_secs(20),
            warm_up: true,
            retry_fresh: true,
        }
    }

    pub fn search_url(&self) -> Result<Url> {
        self.site_root
            .join(SEARCH_PATH)
            .context("Failed to build search URL")
    }
}

/// What a page turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Challenge,
    Empty,
    Listings(usize),
}

/// Terminal result of one fetch
#[derive(Debug)]
pub enum FetchOutcome {
    /// A bot-verification page was served instead of results
    Challenge,
    /// The page loaded but held no listings
    Empty,
    /// The page holds listing nodes
    Success { html: String, nodes: usize },
    /// The request or response failed
    TransportError(anyhow::Error),
}

pub fn is_challenge(body: &str) -> bool {
    let lower = body.to_lowercase();
    CHALLENGE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Challenge markers win over any listing nodes present
pub fn classify(body: &str, item: &Selector) -> PageKind {
    if is_challenge(body) {
        return PageKind::Challenge;
    }
    match Html::parse_document(body).select(item).count() {
        0 => PageKind::Empty,
        n => PageKind::Listings(n),
    }
}

/// Issues the paced search request and classifies the response
pub struct Fetcher<R = StdRng> {
    settings: FetchSettings,
    pacer: Pacer<R>,
    identity: IdentityRotator<R>,
    item: Selector,
}

impl<R: Rng> Fetcher<R> {
    pub fn new(settings: FetchSettings, pacer: Pacer<R>, identity: IdentityRotator<R>) -> Result<Self> {
        Ok(Self {
            settings,
            pacer,
            identity,
            item: selector(ITEM_SELECTOR)?,
        })
    }

    pub fn pacer_mut(&mut self) -> &mut Pacer<R> {
        &mut self.pacer
    }

    /// Fetch one results page for the given query parameters
    pub async fn fetch(&mut self, params: &[(&'static str, String)]) -> FetchOutcome {
        let url = match self.settings.search_url() {
            Ok(url) => url,
            Err(e) => return FetchOutcome::TransportError(e),
        };

        let session = match self.build_client(true) {
            Ok(client) => client,
            Err(e) => return FetchOutcome::TransportError(e),
        };

        if self.settings.warm_up {
            if let Err(e) = self.warm_up(&session).await {
                warn!("Session warm-up failed, continuing without cookies: {:#}", e);
            }
        }

        let mut result = self.get_page(&session, &url, params).await;

        if result.is_err() && self.settings.retry_fresh {
            if let Err(e) = &result {
                warn!("Search request failed ({:#}), retrying once with a fresh session", e);
            }
            result = match self.build_client(false) {
                Ok(fresh) => self.get_page(&fresh, &url, params).await,
                Err(e) => Err(e),
            };
        }

        let (status, body) = match result {
            Ok(response) => response,
            Err(e) => return FetchOutcome::TransportError(e),
        };

        match classify(&body, &self.item) {
            PageKind::Challenge => {
                warn!("Bot challenge detected (HTTP {})", status);
                FetchOutcome::Challenge
            }
            _ if !status.is_success() => FetchOutcome::TransportError(anyhow::anyhow!(
                "Search page returned status: {}",
                status
            )),
            PageKind::Empty => {
                info!("Search page loaded but contained no listings");
                FetchOutcome::Empty
            }
            PageKind::Listings(nodes) => {
                debug!("Downloaded {} bytes of HTML with {} listing nodes", body.len(), nodes);
                FetchOutcome::Success { html: body, nodes }
            }
        }
    }

    fn build_client(&self, with_cookies: bool) -> Result<Client> {
        Client::builder()
            .timeout(self.settings.timeout)
            .cookie_store(with_cookies)
            .build()
            .context("Failed to create HTTP client")
    }

    async fn warm_up(&mut self, client: &Client) -> Result<()> {
        self.pacer.pause().await;
        let headers = self.identity.next_headers()?;
        debug!("Warming up session at {}", self.settings.site_root);
        client
            .get(self.settings.site_root.clone())
            .headers(headers)
            .send()
            .await
            .context("Failed to reach site root")?
            .bytes()
            .await
            .context("Failed to read site root")?;
        Ok(())
    }

    async fn get_page(
        &mut self,
        client: &Client,
        url: &Url,
        params: &[(&'static str, String)],
    ) -> Result<(reqwest::StatusCode, String)> {
        self.pacer.pause().await;
        let headers = self.identity.next_headers()?;
        debug!("Fetching URL: {} with {} params", url, params.len());

        let response = client
            .get(url.clone())
            .headers(headers)
            .query(params)
            .send()
            .await
            .context("Failed to fetch search page")?;
        let status = response.status();
        let body = response.text().await.context("Failed to read response body")?;
        Ok((status, body))
    }
}
