use pricetrack_core::{FetchStrategy, LocatorChain};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("no site profile registered for {url}")]
    UnsupportedSite { url: String },

    #[error("failed to open {url} after {attempts} attempt(s): {reason}")]
    PageOpenFailed {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("no element matched any locator in {attempted}")]
    ElementNotFound { attempted: LocatorChain },

    #[error("{operation} is not supported by the {strategy} strategy")]
    NotSupported {
        strategy: FetchStrategy,
        operation: &'static str,
    },

    #[error("failed to launch browser: {0}")]
    BrowserLaunch(String),

    #[error("browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("{operation} timed out after {secs}s for {url}")]
    Timeout {
        operation: &'static str,
        url: String,
        secs: u64,
    },

    #[error("unsupported image format for {reference}; expected jpg, jpeg or png")]
    UnsupportedFileFormat { reference: String },

    #[error("image {url} was not downloaded: {reason}")]
    FileNotDownloaded { url: String, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
