pub mod app_config;
pub mod config;
pub mod locator;
pub mod records;
pub mod sites;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use locator::{Locator, LocatorChain, LocatorKind};
pub use records::PriceRecord;
pub use sites::{
    builtin_sites, canonical_host, load_sites, parse_sites, resolve_sites, FetchStrategy,
    PhotoRule, PriceRule, ResolvedSites, SiteConfig, SitesFile, SitesSource,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read sites file {path}: {source}")]
    SitesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("sites file {path} does not exist")]
    SitesFileMissing { path: String },

    #[error("failed to parse sites file: {0}")]
    SitesFileParse(#[from] serde_yaml::Error),

    #[error("sites validation error: {0}")]
    Validation(String),
}
