//! Headless browser discovery and launch.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use futures::StreamExt;
use rand::Rng;
use tokio::task::JoinHandle;

use super::FetchSettings;
use crate::error::ScraperError;

const WINDOW_WIDTH: u32 = 1366;
const WINDOW_HEIGHT: u32 = 768;

/// Locate a Chrome/Chromium executable.
///
/// A configured path wins when it exists; otherwise well-known install
/// locations are checked, then `which` on Unix.
pub(crate) fn find_browser_executable(configured: Option<&Path>) -> Result<PathBuf, ScraperError> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        tracing::warn!(
            path = %path.display(),
            "configured chromium path does not exist; searching default locations"
        );
    }

    let candidates: &[&str] = if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        &[
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/snap/bin/chromium",
            "/usr/local/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    };

    if let Some(path) = candidates.iter().map(PathBuf::from).find(|p| p.exists()) {
        return Ok(path);
    }

    if !cfg!(target_os = "windows") {
        for cmd in ["chromium", "chromium-browser", "google-chrome", "chrome"] {
            let Ok(output) = Command::new("which").arg(cmd).output() else {
                continue;
            };
            if !output.status.success() {
                continue;
            }
            let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !found.is_empty() {
                return Ok(PathBuf::from(found));
            }
        }
    }

    Err(ScraperError::BrowserLaunch(
        "Chrome/Chromium executable not found; set PRICETRACK_CHROMIUM_PATH".to_owned(),
    ))
}

/// Launch a browser with its own throwaway profile directory.
///
/// Returns the browser, the task driving its CDP connection, and the profile
/// directory the caller must remove after the browser exits.
pub(crate) async fn launch_browser(
    settings: &FetchSettings,
) -> Result<(Browser, JoinHandle<()>, PathBuf), ScraperError> {
    let executable = find_browser_executable(settings.chromium_path.as_deref())?;

    let user_data_dir = std::env::temp_dir().join(format!(
        "pricetrack_chrome_{}_{:08x}",
        std::process::id(),
        rand::rng().random::<u32>()
    ));
    std::fs::create_dir_all(&user_data_dir).map_err(|e| ScraperError::Io {
        path: user_data_dir.display().to_string(),
        source: e,
    })?;

    let mut builder = BrowserConfigBuilder::default()
        .request_timeout(Duration::from_secs(settings.page_load_timeout_secs))
        .window_size(WINDOW_WIDTH, WINDOW_HEIGHT)
        .user_data_dir(user_data_dir.clone())
        .chrome_executable(executable);

    builder = if settings.headless {
        builder.headless_mode(HeadlessMode::default())
    } else {
        builder.with_head()
    };

    let config = builder
        .arg(format!("--user-agent={}", settings.user_agent))
        .arg("--no-sandbox")
        .arg("--disable-dev-shm-usage")
        .arg("--disable-gpu")
        .arg("--disable-extensions")
        .arg("--disable-notifications")
        .arg("--no-first-run")
        .arg("--no-default-browser-check")
        .arg("--mute-audio")
        .build()
        .map_err(|e| {
            remove_profile_dir(&user_data_dir);
            ScraperError::BrowserLaunch(format!("invalid browser config: {e}"))
        })?;

    let (browser, mut handler) = match Browser::launch(config).await {
        Ok(launched) => launched,
        Err(err) => {
            remove_profile_dir(&user_data_dir);
            return Err(ScraperError::BrowserLaunch(err.to_string()));
        }
    };

    let handler_task = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(err) = event {
                tracing::trace!(error = %err, "browser handler event error");
            }
        }
    });

    Ok((browser, handler_task, user_data_dir))
}

pub(crate) fn remove_profile_dir(path: &Path) {
    if let Err(err) = std::fs::remove_dir_all(path) {
        if err.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "failed to remove browser profile dir"
            );
        }
    }
}
