//! Screenshot sources and hosted-reference resolution.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

use crate::backend::ModelBackend;
use crate::errors::{BackendError, ScreenshotError};

/// A captured screenshot, either raw bytes or an already-hosted URL.
#[derive(Debug, Clone)]
pub enum Screenshot {
    Bytes(Vec<u8>),
    Url(String),
}

/// Produces the screenshot for the next step.
#[async_trait]
pub trait ScreenshotProvider: Send + Sync {
    async fn capture(&self) -> Result<Screenshot, ScreenshotError>;
}

/// A screenshot reference the model API can consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedScreenshot {
    pub url: String,
    pub uuid: Option<String>,
}

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .expect("valid uuid regex")
});

/// First UUID embedded in a hosted screenshot URL, if any.
pub fn extract_image_uuid(url: &str) -> Option<String> {
    UUID_RE.find(url).map(|m| m.as_str().to_ascii_lowercase())
}

/// Turn a captured screenshot into a hosted reference.
///
/// Raw bytes are uploaded; URLs pass through untouched, so resolving an
/// already-resolved reference never uploads twice.
pub async fn resolve_screenshot(
    backend: &dyn ModelBackend,
    screenshot: Screenshot,
) -> Result<ResolvedScreenshot, BackendError> {
    match screenshot {
        Screenshot::Url(url) => {
            let uuid = extract_image_uuid(&url);
            debug!(url = %url, reused = uuid.is_some(), "using hosted screenshot");
            Ok(ResolvedScreenshot { url, uuid })
        }
        Screenshot::Bytes(bytes) => {
            let image = backend.upload_screenshot(bytes).await?;
            Ok(ResolvedScreenshot {
                url: image.url,
                uuid: Some(image.uuid),
            })
        }
    }
}

/// Provider serving a fixed list of screenshots, cycling when exhausted.
///
/// Intended for tests, offline development, and the CLI replay mode.
pub struct StaticScreenshots {
    shots: Vec<Screenshot>,
    cursor: AtomicUsize,
}

impl StaticScreenshots {
    pub fn new(shots: Vec<Screenshot>) -> Self {
        Self {
            shots,
            cursor: AtomicUsize::new(0),
        }
    }

    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(urls.into_iter().map(|u| Screenshot::Url(u.into())).collect())
    }
}

#[async_trait]
impl ScreenshotProvider for StaticScreenshots {
    async fn capture(&self) -> Result<Screenshot, ScreenshotError> {
        if self.shots.is_empty() {
            return Err(ScreenshotError::Exhausted);
        }
        let index = self.cursor.fetch_add(1, Ordering::SeqCst) % self.shots.len();
        Ok(self.shots[index].clone())
    }
}
