use crate::app_config::AppConfig;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every setting has a default, so an empty environment yields a usable
/// configuration. Decoupled from the process environment so tests can use a
/// plain `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        parse_flag(&or_default(var, default))
            .ok_or_else(|| invalid(var, "expected true/false, 1/0 or yes/no".to_string()))
    };

    let log_level = or_default("PRICETRACK_LOG_LEVEL", "info");

    let sites_path_var = lookup("PRICETRACK_SITES_PATH").ok();
    let sites_path_explicit = sites_path_var.is_some();
    let sites_path = PathBuf::from(sites_path_var.unwrap_or_else(|| "./config/sites.yaml".into()));

    let image_dir = PathBuf::from(or_default("PRICETRACK_IMAGE_DIR", "./static/goods_images"));
    let default_image_path = lookup("PRICETRACK_DEFAULT_IMAGE_PATH")
        .map_or_else(|_| image_dir.join("default.jpg"), PathBuf::from);

    let request_timeout_secs = parse_u64("PRICETRACK_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("PRICETRACK_USER_AGENT", "pricetrack/0.1 (price-history)");

    let open_attempts = parse_u32("PRICETRACK_OPEN_ATTEMPTS", "2")?;
    if open_attempts == 0 {
        return Err(invalid(
            "PRICETRACK_OPEN_ATTEMPTS",
            "must be at least 1".to_string(),
        ));
    }
    let open_retry_delay_ms = parse_u64("PRICETRACK_OPEN_RETRY_DELAY_MS", "1000")?;
    let page_load_timeout_secs = parse_u64("PRICETRACK_PAGE_LOAD_TIMEOUT_SECS", "30")?;

    let chromium_path = lookup("PRICETRACK_CHROMIUM_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);
    let headless = parse_bool("PRICETRACK_HEADLESS", "true")?;

    Ok(AppConfig {
        log_level,
        sites_path,
        sites_path_explicit,
        image_dir,
        default_image_path,
        request_timeout_secs,
        user_agent,
        open_attempts,
        open_retry_delay_ms,
        page_load_timeout_secs,
        chromium_path,
        headless,
    })
}

/// Parse a boolean flag. Accepts `true`/`false`, `1`/`0` and `yes`/`no`,
/// case-insensitively.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
