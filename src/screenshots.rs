//! Screenshot sources backed by the local filesystem.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::fs;
use tracing::debug;

use lux_agent::{Screenshot, ScreenshotError, ScreenshotProvider};

/// Provider reading raw image bytes from a fixed list of files, cycling
/// through the list when it is exhausted.
///
/// Each capture re-reads from disk, so a path that is overwritten between
/// steps serves fresh pixels. Pairs with `lux run --screenshot-file`.
pub struct FileScreenshots {
    paths: Vec<PathBuf>,
    cursor: AtomicUsize,
}

impl FileScreenshots {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            cursor: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ScreenshotProvider for FileScreenshots {
    async fn capture(&self) -> Result<Screenshot, ScreenshotError> {
        if self.paths.is_empty() {
            return Err(ScreenshotError::Exhausted);
        }
        let index = self.cursor.fetch_add(1, Ordering::SeqCst) % self.paths.len();
        let path = &self.paths[index];
        let bytes = fs::read(path).await.map_err(|err| {
            ScreenshotError::capture(format!("reading {}: {err}", path.display()))
        })?;
        debug!(path = %path.display(), bytes = bytes.len(), "loaded screenshot from disk");
        Ok(Screenshot::Bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;

    #[tokio::test]
    async fn files_are_served_in_rotation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = dir.path().join("a.png");
        let second = dir.path().join("b.png");
        stdfs::write(&first, [1u8, 2, 3]).expect("write a");
        stdfs::write(&second, [4u8, 5]).expect("write b");

        let provider = FileScreenshots::new(vec![first, second]);
        let mut sizes = Vec::new();
        for _ in 0..3 {
            match provider.capture().await.expect("capture") {
                Screenshot::Bytes(bytes) => sizes.push(bytes.len()),
                Screenshot::Url(url) => panic!("expected bytes, got url {url}"),
            }
        }
        assert_eq!(sizes, vec![3, 2, 3]);
    }

    #[tokio::test]
    async fn missing_file_is_a_capture_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let provider = FileScreenshots::new(vec![dir.path().join("gone.png")]);
        match provider.capture().await {
            Err(ScreenshotError::Capture(message)) => assert!(message.contains("gone.png")),
            other => panic!("expected capture error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_list_is_exhausted() {
        let provider = FileScreenshots::new(Vec::new());
        assert!(matches!(
            provider.capture().await,
            Err(ScreenshotError::Exhausted)
        ));
    }
}
