//! `extract` handler.
//!
//! URLs are scraped one after another. A failed URL is logged and reported
//! but does not stop the run; the command fails at the end if any URL did.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use pricetrack_core::{AppConfig, PriceRecord};
use pricetrack_scraper::{Extractor, ScrapeOutcome, ScraperError};
use serde::Serialize;

use crate::sites::load_registry;

/// One line of `extract` output.
#[derive(Debug, Serialize)]
pub(crate) struct ExtractReport {
    pub url: String,
    pub site: Option<String>,
    pub price: Option<u64>,
    pub photo_path: Option<PathBuf>,
    pub photo_error: Option<String>,
    /// What the caller should append to the site's price history.
    pub record: Option<PriceRecord>,
    pub error: Option<String>,
}

impl ExtractReport {
    pub(crate) fn from_outcome(outcome: &ScrapeOutcome, observed_at: DateTime<Utc>) -> Self {
        Self {
            url: outcome.url.clone(),
            site: Some(outcome.site.clone()),
            price: outcome.price,
            photo_path: outcome.photo_path().map(PathBuf::from),
            photo_error: outcome.photo.as_ref().and_then(|p| p.error.clone()),
            record: outcome.price_record(observed_at),
            error: None,
        }
    }

    pub(crate) fn from_error(url: &str, err: &ScraperError) -> Self {
        Self {
            url: url.to_owned(),
            site: None,
            price: None,
            photo_path: None,
            photo_error: None,
            record: None,
            error: Some(err.to_string()),
        }
    }
}

pub(crate) async fn run_extract(config: &AppConfig, urls: &[String]) -> anyhow::Result<()> {
    let registry = load_registry(config)?;
    let extractor = Extractor::from_config(config, registry)?;

    let mut failed = 0usize;
    for url in urls {
        let report = match extractor.extract(url).await {
            Ok(outcome) => ExtractReport::from_outcome(&outcome, Utc::now()),
            Err(err) => {
                failed += 1;
                tracing::error!(url = %url, error = %err, "extraction failed");
                ExtractReport::from_error(url, &err)
            }
        };
        println!("{}", serde_json::to_string(&report)?);
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} URL(s) failed", urls.len());
    }
    Ok(())
}
