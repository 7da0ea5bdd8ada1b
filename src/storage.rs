use async_trait::async_trait;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::AppError;

/// Upload size ceiling for profile images.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Tagged failure kinds produced directly by the storage layer; callers
/// branch on the variant, never on message text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("Only image files are allowed!")]
    UnsupportedMediaType,
    #[error("File too large. Maximum size is 5MB.")]
    PayloadTooLarge,
    #[error("storage I/O failure: {0}")]
    Io(String),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::UnsupportedMediaType => AppError::UnsupportedMediaType,
            StorageError::PayloadTooLarge => AppError::PayloadTooLarge,
            StorageError::Io(detail) => AppError::internal(detail),
        }
    }
}

/// StorageService
///
/// Contract for profile-image persistence. The returned path is opaque to
/// the core; it is stored on the account and later served verbatim.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Persist an uploaded image and return its retrievable path.
    /// Rejects non-image content types and payloads above 5 MB.
    async fn store_image(
        &self,
        original_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, StorageError>;
}

pub type StorageState = Arc<dyn StorageService>;

/// Keep only a plain alphanumeric extension from the client-supplied name;
/// anything else (traversal attempts, odd suffixes) is dropped.
fn safe_extension(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 8 && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

/// LocalDiskStorage
///
/// Writes uploads beneath a configured directory which the router serves
/// under `/uploads`.
pub struct LocalDiskStorage {
    root: PathBuf,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl StorageService for LocalDiskStorage {
    async fn store_image(
        &self,
        original_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, StorageError> {
        if !content_type.starts_with("image/") {
            return Err(StorageError::UnsupportedMediaType);
        }
        if data.len() > MAX_IMAGE_BYTES {
            return Err(StorageError::PayloadTooLarge);
        }

        let suffix: u32 = rand::rng().random();
        let filename = format!(
            "profileImage-{}-{}{}",
            chrono::Utc::now().timestamp_millis(),
            suffix,
            safe_extension(original_name)
        );

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;
        tokio::fs::write(self.root.join(&filename), data)
            .await
            .map_err(|e| StorageError::Io(e.to_string()))?;

        Ok(format!("/uploads/{filename}"))
    }
}

/// MockStorageService
///
/// Test double: either hands back a deterministic path or fails with the
/// configured kind, without touching the filesystem.
#[derive(Clone, Default)]
pub struct MockStorageService {
    failure: Option<StorageError>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self { failure: None }
    }

    pub fn failing(kind: StorageError) -> Self {
        Self {
            failure: Some(kind),
        }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn store_image(
        &self,
        original_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<String, StorageError> {
        if let Some(kind) = &self.failure {
            return Err(kind.clone());
        }
        if !content_type.starts_with("image/") {
            return Err(StorageError::UnsupportedMediaType);
        }
        if data.len() > MAX_IMAGE_BYTES {
            return Err(StorageError::PayloadTooLarge);
        }
        Ok(format!("/uploads/mock-{}", safe_extension(original_name)))
    }
}
