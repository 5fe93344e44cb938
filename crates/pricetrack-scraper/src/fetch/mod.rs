//! Page-fetch strategies.
//!
//! A strategy opens a URL into a [`PageSession`], answers element queries
//! against it, and releases it on [`PageSession::close`]. The strategy is
//! chosen once per open from the site profile; [`AnySession`] carries the
//! closed set of variants.

mod browser;
pub mod rendered;
mod retry;
pub mod static_html;

use std::path::PathBuf;
use std::time::Duration;

use pricetrack_core::{AppConfig, FetchStrategy, Locator, LocatorChain};
use reqwest::Client;

use crate::error::ScraperError;
use crate::locator::{locate_chain, Element, Located, SearchRoot};

pub use rendered::RenderedPage;
pub use static_html::StaticPage;

/// An open page. Owns whatever the strategy needed to open it (a browser
/// process, a parsed document) until [`close`](Self::close) consumes it.
#[allow(async_fn_in_trait)]
pub trait PageSession {
    fn url(&self) -> &str;

    /// Run one locator beneath `root`. Matches come back in document order;
    /// no match is an empty vector, not an error.
    async fn query(&self, root: &SearchRoot, locator: &Locator)
        -> Result<Vec<Element>, ScraperError>;

    /// Resolve a fallback chain beneath `root`.
    ///
    /// # Errors
    ///
    /// See [`locate_chain`].
    async fn locate(
        &self,
        root: &SearchRoot,
        chain: &LocatorChain,
    ) -> Result<Located, ScraperError> {
        locate_chain(self, root, chain).await
    }

    /// Release every resource the session holds.
    async fn close(self);
}

/// Produces sessions for a strategy. The orchestrator is generic over this so
/// tests can substitute scripted pages.
#[allow(async_fn_in_trait)]
pub trait PageOpener {
    type Session: PageSession;

    async fn open(&self, strategy: FetchStrategy, url: &str)
        -> Result<Self::Session, ScraperError>;
}

/// Settings shared by both strategies.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Bound on navigation and on every DOM query.
    pub page_load_timeout_secs: u64,
    /// Total open attempts, including the first.
    pub open_attempts: u32,
    pub open_retry_delay: Duration,
    pub chromium_path: Option<PathBuf>,
    pub headless: bool,
}

impl FetchSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            request_timeout_secs: config.request_timeout_secs,
            page_load_timeout_secs: config.page_load_timeout_secs,
            open_attempts: config.open_attempts,
            open_retry_delay: Duration::from_millis(config.open_retry_delay_ms),
            chromium_path: config.chromium_path.clone(),
            headless: config.headless,
        }
    }

    pub(crate) fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }
}

/// A session opened by either strategy.
pub enum AnySession {
    Rendered(RenderedPage),
    Static(StaticPage),
}

impl PageSession for AnySession {
    fn url(&self) -> &str {
        match self {
            AnySession::Rendered(page) => page.url(),
            AnySession::Static(page) => page.url(),
        }
    }

    async fn query(
        &self,
        root: &SearchRoot,
        locator: &Locator,
    ) -> Result<Vec<Element>, ScraperError> {
        match self {
            AnySession::Rendered(page) => page.query(root, locator).await,
            AnySession::Static(page) => page.query(root, locator).await,
        }
    }

    async fn close(self) {
        match self {
            AnySession::Rendered(page) => page.close().await,
            AnySession::Static(page) => page.close().await,
        }
    }
}

/// Opens pages with the strategy a profile names, retrying failed opens.
pub struct StrategyOpener {
    client: Client,
    settings: FetchSettings,
}

impl StrategyOpener {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: FetchSettings) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self { client, settings })
    }

    #[must_use]
    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    async fn open_once(
        &self,
        strategy: FetchStrategy,
        url: &str,
    ) -> Result<AnySession, ScraperError> {
        match strategy {
            FetchStrategy::Rendered => RenderedPage::open(url, &self.settings)
                .await
                .map(AnySession::Rendered),
            FetchStrategy::StaticHtml => StaticPage::open(&self.client, url)
                .await
                .map(AnySession::Static),
        }
    }
}

impl PageOpener for StrategyOpener {
    type Session = AnySession;

    async fn open(&self, strategy: FetchStrategy, url: &str) -> Result<AnySession, ScraperError> {
        retry::retry_open(
            self.settings.open_attempts,
            self.settings.open_retry_delay,
            url,
            |_attempt| self.open_once(strategy, url),
        )
        .await
    }
}
