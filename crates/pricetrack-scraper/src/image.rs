//! Image acquisition: validate, download, and store a product photo.
//!
//! Acquisition never fails outward. Every handled problem is logged and
//! reported through [`StoredImage`], whose path then points at the
//! configured placeholder.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use pricetrack_core::AppConfig;
use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::ScraperError;

const SUPPORTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Guard against a name source that never yields a free name.
const MAX_NAME_ATTEMPTS: usize = 10_000;

/// URL of a candidate image, not yet validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ImageReference(String);

impl ImageReference {
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-cased extension of the reference's last path segment.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let path = reqwest::Url::parse(&self.0).map_or_else(
            |_| self.0.split(['?', '#']).next().unwrap_or_default().to_owned(),
            |url| url.path().to_owned(),
        );
        let file_name = path.rsplit('/').next()?;
        let (_, ext) = file_name.rsplit_once('.')?;
        (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
    }
}

impl std::fmt::Display for ImageReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of one acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredImage {
    pub success: bool,
    /// Freshly written file on success, the placeholder otherwise.
    pub path: PathBuf,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ImageSettings {
    pub image_dir: PathBuf,
    pub placeholder: PathBuf,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl ImageSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            image_dir: config.image_dir.clone(),
            placeholder: config.default_image_path.clone(),
            request_timeout_secs: config.request_timeout_secs,
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Source of the numeric part of stored file names.
pub trait NameSource: Send + Sync {
    fn next_number(&self) -> u32;
}

/// Uniform six-digit numbers.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomNames;

impl NameSource for RandomNames {
    fn next_number(&self) -> u32 {
        rand::rng().random_range(100_000..=999_999)
    }
}

pub struct ImageAcquirer {
    client: Client,
    settings: ImageSettings,
    names: Arc<dyn NameSource>,
}

impl ImageAcquirer {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(settings: ImageSettings) -> Result<Self, ScraperError> {
        Self::with_name_source(settings, Arc::new(RandomNames))
    }

    /// Like [`new`](Self::new) with a caller-supplied name source.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn with_name_source(
        settings: ImageSettings,
        names: Arc<dyn NameSource>,
    ) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            settings,
            names,
        })
    }

    #[must_use]
    pub fn settings(&self) -> &ImageSettings {
        &self.settings
    }

    /// Download and store the image behind `reference`.
    ///
    /// Absent or blank references, unsupported formats, failed downloads and
    /// write errors all yield the placeholder with `success: false`.
    pub async fn acquire(&self, reference: Option<&ImageReference>) -> StoredImage {
        let Some(reference) = reference.filter(|r| !r.as_str().trim().is_empty()) else {
            tracing::debug!("no image reference to acquire");
            return self.placeholder("no reference".to_owned());
        };

        match self.download_and_store(reference).await {
            Ok(path) => {
                tracing::info!(reference = %reference, path = %path.display(), "image stored");
                StoredImage {
                    success: true,
                    path,
                    error: None,
                }
            }
            Err(err) => {
                tracing::warn!(reference = %reference, error = %err, "image acquisition failed");
                self.placeholder(err.to_string())
            }
        }
    }

    fn placeholder(&self, error: String) -> StoredImage {
        StoredImage {
            success: false,
            path: self.settings.placeholder.clone(),
            error: Some(error),
        }
    }

    async fn download_and_store(
        &self,
        reference: &ImageReference,
    ) -> Result<PathBuf, ScraperError> {
        let ext = reference
            .extension()
            .filter(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| ScraperError::UnsupportedFileFormat {
                reference: reference.to_string(),
            })?;

        let bytes = self.download(reference).await?;
        self.store(&bytes, &ext).await
    }

    async fn download(&self, reference: &ImageReference) -> Result<Vec<u8>, ScraperError> {
        let not_downloaded = |reason: String| ScraperError::FileNotDownloaded {
            url: reference.to_string(),
            reason,
        };

        let response = self
            .client
            .get(reference.as_str())
            .send()
            .await
            .map_err(|e| not_downloaded(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(not_downloaded(format!("HTTP status {}", status.as_u16())));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        if !content_type.starts_with("image") {
            return Err(not_downloaded(format!(
                "content type {content_type:?} is not an image"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| not_downloaded(e.to_string()))?;
        if bytes.is_empty() {
            return Err(not_downloaded("empty body".to_owned()));
        }
        Ok(bytes.to_vec())
    }

    /// Write `bytes` under a fresh `img_<n>.<ext>` name, never replacing an
    /// existing file.
    async fn store(&self, bytes: &[u8], ext: &str) -> Result<PathBuf, ScraperError> {
        let dir = &self.settings.image_dir;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| io_error(dir, e))?;

        for _ in 0..MAX_NAME_ATTEMPTS {
            let path = dir.join(format!("img_{}.{ext}", self.names.next_number()));
            if tokio::fs::try_exists(&path).await.unwrap_or(true) {
                tracing::debug!(path = %path.display(), "image name taken; regenerating");
                continue;
            }

            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(io_error(&path, e)),
            };

            let written = async {
                file.write_all(bytes).await?;
                file.flush().await
            }
            .await;
            if let Err(e) = written {
                drop(file);
                if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                    tracing::warn!(
                        path = %path.display(),
                        error = %cleanup,
                        "failed to remove partial image"
                    );
                }
                return Err(io_error(&path, e));
            }
            return Ok(path);
        }

        Err(ScraperError::Io {
            path: dir.display().to_string(),
            source: std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "no free image file name found",
            ),
        })
    }
}

fn io_error(path: &Path, source: std::io::Error) -> ScraperError {
    ScraperError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased_and_ignores_query() {
        let r = ImageReference::new("https://cdn.example.com/a/b/Photo.JPG?w=800#top");
        assert_eq!(r.extension().as_deref(), Some("jpg"));
    }

    #[test]
    fn extension_uses_last_path_segment_only() {
        let r = ImageReference::new("https://cdn.example.com/v1.2/photo");
        assert_eq!(r.extension(), None);

        let r = ImageReference::new("https://cdn.example.com/img/photo.webp");
        assert_eq!(r.extension().as_deref(), Some("webp"));
    }

    #[test]
    fn extension_of_unparseable_reference() {
        let r = ImageReference::new("images/photo.png?x=1");
        assert_eq!(r.extension().as_deref(), Some("png"));
    }

    #[test]
    fn random_names_are_six_digits() {
        for _ in 0..100 {
            let n = RandomNames.next_number();
            assert!((100_000..=999_999).contains(&n), "got {n}");
        }
    }
}
