use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app_config::AppConfig;
use crate::locator::{Locator, LocatorChain};
use crate::ConfigError;

/// Page-fetching mechanism used for a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStrategy {
    /// Scripted headless browser; the page's scripts run before queries.
    Rendered,
    /// One HTTP GET, markup parsed without executing scripts.
    StaticHtml,
}

impl std::fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchStrategy::Rendered => write!(f, "rendered"),
            FetchStrategy::StaticHtml => write!(f, "static_html"),
        }
    }
}

/// Which located element carries the price, and where on it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRule {
    /// Index into the ordered matches of the locator that resolved.
    #[serde(default)]
    pub element: usize,
    /// Read this attribute instead of the element's visible text.
    #[serde(default)]
    pub attribute: Option<String>,
}

/// Which located element carries the photo URL, and in which attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoRule {
    #[serde(default)]
    pub element: usize,
    #[serde(default = "default_photo_attribute")]
    pub attribute: String,
}

fn default_photo_attribute() -> String {
    "src".to_string()
}

impl Default for PhotoRule {
    fn default() -> Self {
        Self {
            element: 0,
            attribute: default_photo_attribute(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    /// Bare host compared for exact equality, e.g. `"www.lamoda.ru"`.
    pub host: String,
    pub strategy: FetchStrategy,
    pub price: LocatorChain,
    pub photo: LocatorChain,
    #[serde(default)]
    pub price_rule: PriceRule,
    #[serde(default)]
    pub photo_rule: PhotoRule,
}

#[derive(Debug, Deserialize)]
pub struct SitesFile {
    pub sites: Vec<SiteConfig>,
}

/// Where a resolved set of site definitions came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitesSource {
    File(PathBuf),
    Builtin,
}

impl std::fmt::Display for SitesSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SitesSource::File(path) => write!(f, "{}", path.display()),
            SitesSource::Builtin => write!(f, "built-in profiles"),
        }
    }
}

#[derive(Debug)]
pub struct ResolvedSites {
    pub sites: Vec<SiteConfig>,
    pub source: SitesSource,
}

/// Load and validate site definitions from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_sites(path: &Path) -> Result<SitesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SitesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_sites(&content)
}

/// Parse and validate site definitions from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the text does not parse or fails validation.
pub fn parse_sites(content: &str) -> Result<SitesFile, ConfigError> {
    let sites_file: SitesFile = serde_yaml::from_str(content)?;
    validate_sites(&sites_file.sites)?;
    Ok(sites_file)
}

/// Resolve the site definitions for a run.
///
/// The configured file wins when it exists. A missing file is an error only
/// when the path was set explicitly; otherwise the built-in profiles are used.
///
/// # Errors
///
/// Returns `ConfigError` if an explicit path is missing or the file is invalid.
pub fn resolve_sites(config: &AppConfig) -> Result<ResolvedSites, ConfigError> {
    if config.sites_path.exists() {
        let file = load_sites(&config.sites_path)?;
        return Ok(ResolvedSites {
            sites: file.sites,
            source: SitesSource::File(config.sites_path.clone()),
        });
    }
    if config.sites_path_explicit {
        return Err(ConfigError::SitesFileMissing {
            path: config.sites_path.display().to_string(),
        });
    }
    Ok(ResolvedSites {
        sites: builtin_sites(),
        source: SitesSource::Builtin,
    })
}

/// Profiles shipped with the binary.
#[must_use]
pub fn builtin_sites() -> Vec<SiteConfig> {
    vec![
        SiteConfig {
            name: "Wildberries".to_string(),
            host: "www.wildberries.ru".to_string(),
            strategy: FetchStrategy::Rendered,
            price: LocatorChain::single(Locator::class_name("final-cost")),
            photo: LocatorChain::single(Locator::xpath(r#"//*[@id="Azoom"]"#)),
            price_rule: PriceRule::default(),
            photo_rule: PhotoRule {
                element: 0,
                attribute: "href".to_string(),
            },
        },
        SiteConfig {
            name: "Lamoda".to_string(),
            host: "www.lamoda.ru".to_string(),
            strategy: FetchStrategy::Rendered,
            price: LocatorChain::with_fallbacks(
                Locator::class_name("ii-product__price-current_red"),
                [
                    Locator::class_name("ii-product__price-discount_second"),
                    Locator::class_name("ii-product__price-discount_first"),
                ],
            ),
            photo: LocatorChain::single(Locator::class_name("gallery-image")),
            price_rule: PriceRule::default(),
            photo_rule: PhotoRule::default(),
        },
    ]
}

fn validate_sites(sites: &[SiteConfig]) -> Result<(), ConfigError> {
    let mut seen_hosts = HashSet::new();

    for site in sites {
        if site.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site name must be non-empty".to_string(),
            ));
        }

        let Some(host) = canonical_host(&site.host) else {
            return Err(ConfigError::Validation(format!(
                "site '{}' has invalid host '{}'; expected a bare host such as www.example.com",
                site.name, site.host
            )));
        };

        if !seen_hosts.insert(host) {
            return Err(ConfigError::Validation(format!(
                "duplicate site host: '{}' (from site '{}')",
                site.host, site.name
            )));
        }

        if site.photo_rule.attribute.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "site '{}' has an empty photo attribute",
                site.name
            )));
        }

        if site
            .price_rule
            .attribute
            .as_deref()
            .is_some_and(|a| a.trim().is_empty())
        {
            return Err(ConfigError::Validation(format!(
                "site '{}' has an empty price attribute",
                site.name
            )));
        }

        for locator in site.price.iter().chain(site.photo.iter()) {
            if locator.value.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "site '{}' has a {} locator with an empty value",
                    site.name, locator.by
                )));
            }
        }
    }

    Ok(())
}

/// The form a request URL's host takes once parsed: lowercase, with
/// internationalized labels in punycode (`магазин.рф` becomes
/// `xn--80aa0agaebmd.xn--p1ai`).
///
/// Returns `None` unless `host` is a bare host name that parses as one.
#[must_use]
pub fn canonical_host(host: &str) -> Option<String> {
    if !is_bare_host(host) {
        return None;
    }
    let parsed = url::Url::parse(&format!("http://{host}/")).ok()?;
    parsed.host_str().map(str::to_owned)
}

fn is_bare_host(host: &str) -> bool {
    !host.is_empty()
        && !host.contains("://")
        && !host.contains(['/', ':', '?', '#'])
        && !host.chars().any(char::is_whitespace)
}

#[cfg(test)]
#[path = "sites_test.rs"]
mod tests;
