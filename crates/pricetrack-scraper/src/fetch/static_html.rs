//! Static-HTML strategy: one GET, parsed once, no scripts.

use pricetrack_core::{FetchStrategy, Locator};
use reqwest::Client;
use scraper::{Html, Selector};

use super::PageSession;
use crate::error::ScraperError;
use crate::locator::{Element, SearchRoot};

/// A page fetched over plain HTTP and parsed into a DOM tree.
///
/// Element queries are not offered by this strategy; [`PageSession::query`]
/// always reports [`ScraperError::NotSupported`].
pub struct StaticPage {
    url: String,
    document: Html,
}

impl StaticPage {
    /// Fetch `url` and parse the body.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::Http`] on network failure.
    /// - [`ScraperError::UnexpectedStatus`] for any non-2xx response.
    pub async fn open(client: &Client, url: &str) -> Result<Self, ScraperError> {
        let response = client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let body = response.text().await?;
        let page = Self {
            url: url.to_owned(),
            document: Html::parse_document(&body),
        };
        tracing::debug!(url, title = ?page.title(), bytes = body.len(), "static page parsed");
        Ok(page)
    }

    #[must_use]
    pub fn document(&self) -> &Html {
        &self.document
    }

    /// Trimmed `<title>` text, if the page has a non-empty one.
    #[must_use]
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        let title = self
            .document
            .select(&selector)
            .next()?
            .text()
            .collect::<String>();
        let title = title.trim();
        (!title.is_empty()).then(|| title.to_owned())
    }
}

impl PageSession for StaticPage {
    fn url(&self) -> &str {
        &self.url
    }

    async fn query(
        &self,
        _root: &SearchRoot,
        _locator: &Locator,
    ) -> Result<Vec<Element>, ScraperError> {
        Err(ScraperError::NotSupported {
            strategy: FetchStrategy::StaticHtml,
            operation: "locate",
        })
    }

    async fn close(self) {
        tracing::debug!(url = %self.url, "static page released");
    }
}
