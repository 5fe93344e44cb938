use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// Location of the YAML site definitions.
    pub sites_path: PathBuf,
    /// `true` when `sites_path` came from the environment rather than the
    /// default. An explicit path must exist; the default may be absent.
    pub sites_path_explicit: bool,
    pub image_dir: PathBuf,
    /// Image path handed back whenever a real image cannot be stored.
    pub default_image_path: PathBuf,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Total number of attempts made to open a page, including the first.
    pub open_attempts: u32,
    pub open_retry_delay_ms: u64,
    pub page_load_timeout_secs: u64,
    pub chromium_path: Option<PathBuf>,
    pub headless: bool,
}
