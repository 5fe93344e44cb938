//! One scrape, end to end: profile → open → locate → normalize → close →
//! acquire.

use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use pricetrack_core::{AppConfig, PriceRecord};
use serde::Serialize;

use crate::error::ScraperError;
use crate::fetch::{FetchSettings, PageOpener, PageSession, StrategyOpener};
use crate::image::{ImageAcquirer, ImageReference, ImageSettings, StoredImage};
use crate::locator::SearchRoot;
use crate::profile::SiteProfile;
use crate::registry::SiteRegistry;

/// Result of a scrape that reached the page.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeOutcome {
    pub url: String,
    /// Name of the profile that handled the URL.
    pub site: String,
    pub price: Option<u64>,
    /// Present when a photo reference was found, whether or not the download
    /// succeeded.
    pub photo: Option<StoredImage>,
}

impl ScrapeOutcome {
    /// Stored photo path: the written file, or the placeholder when the
    /// download failed. `None` when the page had no photo reference.
    #[must_use]
    pub fn photo_path(&self) -> Option<&Path> {
        self.photo.as_ref().map(|p| p.path.as_path())
    }

    /// Price record to append for this scrape, if a price was found.
    #[must_use]
    pub fn price_record(&self, observed_at: DateTime<Utc>) -> Option<PriceRecord> {
        self.price.map(|price| PriceRecord::new(price, observed_at))
    }
}

/// Drives scrapes against a fixed registry.
pub struct Extractor<O = StrategyOpener> {
    registry: SiteRegistry,
    opener: O,
    images: ImageAcquirer,
}

impl Extractor<StrategyOpener> {
    /// Build an extractor with the real strategies from application config.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if an HTTP client cannot be built.
    pub fn from_config(config: &AppConfig, registry: SiteRegistry) -> Result<Self, ScraperError> {
        let opener = StrategyOpener::new(FetchSettings::from_config(config))?;
        let images = ImageAcquirer::new(ImageSettings::from_config(config))?;
        Ok(Self::new(registry, opener, images))
    }
}

impl<O: PageOpener> Extractor<O> {
    #[must_use]
    pub fn new(registry: SiteRegistry, opener: O, images: ImageAcquirer) -> Self {
        Self {
            registry,
            opener,
            images,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &SiteRegistry {
        &self.registry
    }

    /// Scrape `url` for its price and photo.
    ///
    /// A missing price or photo degrades to `None`; the page session is closed
    /// before any image is downloaded.
    ///
    /// # Errors
    ///
    /// - [`ScraperError::UnsupportedSite`] if no profile matches the URL's host.
    /// - [`ScraperError::PageOpenFailed`] if the page could not be opened
    ///   within the retry budget.
    pub async fn extract(&self, url: &str) -> Result<ScrapeOutcome, ScraperError> {
        let started = Instant::now();
        let profile = self.registry.get_profile(url)?;
        tracing::info!(
            url,
            site = profile.name(),
            strategy = %profile.strategy(),
            "scrape started"
        );

        let session = self.opener.open(profile.strategy(), url).await?;
        let (price, reference) = read_page(&session, profile).await;
        session.close().await;

        let photo = match reference {
            Some(reference) => Some(self.images.acquire(Some(&reference)).await),
            None => None,
        };

        tracing::info!(
            url,
            site = profile.name(),
            price = ?price,
            photo = ?photo.as_ref().map(|p| p.path.display().to_string()),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "scrape finished"
        );

        Ok(ScrapeOutcome {
            url: url.to_owned(),
            site: profile.name().to_owned(),
            price,
            photo,
        })
    }
}

/// Locate and read both data points. Never fails; each missing datum is
/// logged and comes back as `None`.
async fn read_page<S: PageSession>(
    session: &S,
    profile: &SiteProfile,
) -> (Option<u64>, Option<ImageReference>) {
    let root = SearchRoot::Document;

    let price = match session.locate(&root, profile.price_chain()).await {
        Ok(located) => {
            let price = profile.normalize_price(&located);
            if price.is_none() {
                tracing::warn!(
                    url = session.url(),
                    locator = %located.locator(),
                    text = %located.first().text,
                    "price element could not be read as a number"
                );
            }
            price
        }
        Err(err) => {
            tracing::warn!(url = session.url(), error = %err, "price not found");
            None
        }
    };

    let reference = match session.locate(&root, profile.photo_chain()).await {
        Ok(located) => {
            let reference = profile.resolve_photo(&located, session.url());
            if reference.is_none() {
                tracing::warn!(
                    url = session.url(),
                    locator = %located.locator(),
                    "photo element has no usable reference"
                );
            }
            reference
        }
        Err(err) => {
            tracing::warn!(url = session.url(), error = %err, "photo not found");
            None
        }
    };

    (price, reference)
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
