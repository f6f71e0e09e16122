//! Artifact storage
//!
//! Provides:
//! - `ArtifactStore`, the persistence seam used by the generator
//! - Local filesystem store (served by the API under `/generated-images`)
//! - S3 object store with optional CDN rewriting

mod local;
mod s3;
mod sigv4;

use std::fmt;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{StorageBackend, StorageConfig};

pub use local::LocalStore;
pub use s3::S3Store;

/// Key prefix / path segment under which images are published
pub const ARTIFACT_PREFIX: &str = "generated-images";

/// Content type of every persisted artifact
pub const ARTIFACT_CONTENT_TYPE: &str = "image/png";

/// Opaque reference to a persisted artifact: root-relative path or URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactReference(String);

impl ArtifactReference {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// The `<uuid>.png` file name embedded in the reference, if any
    pub fn artifact_name(&self) -> Option<&str> {
        artifact_name_pattern()
            .find_iter(&self.0)
            .last()
            .map(|m| m.as_str())
    }
}

impl fmt::Display for ArtifactReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fresh `<uuid>.png` artifact name
pub fn new_artifact_name() -> (Uuid, String) {
    let id = Uuid::new_v4();
    (id, format!("{}.png", id))
}

/// Matches `<uuid>.png` anywhere in a string
pub fn artifact_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\.png")
            .expect("artifact name pattern is valid")
    })
}

/// True when `name` is exactly a `<uuid>.png` file name
pub fn is_artifact_name(name: &str) -> bool {
    artifact_name_pattern()
        .find(name)
        .is_some_and(|m| m.start() == 0 && m.end() == name.len())
}

/// Artifact store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid artifact name: {0}")]
    InvalidName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("upload request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upload rejected with status {status}: {body}")]
    Upload { status: u16, body: String },
}

/// Durable storage for rendered images
#[async_trait]
pub trait ArtifactStore: Send + Sync + fmt::Debug {
    /// Persist `local_file` under `file_name` and return its public reference
    async fn persist(
        &self,
        local_file: &Path,
        file_name: &str,
    ) -> Result<ArtifactReference, StoreError>;

    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;
}

/// Construct the store selected by configuration
pub async fn build_store(config: &StorageConfig) -> Result<Arc<dyn ArtifactStore>, StoreError> {
    match config.backend {
        StorageBackend::Local => {
            let store = LocalStore::open(&config.public_dir, &config.url_prefix).await?;
            Ok(Arc::new(store))
        }
        StorageBackend::S3 => Ok(Arc::new(S3Store::new(&config.s3)?)),
    }
}

/// Reject names that could escape the target directory or key prefix
fn validate_name(file_name: &str) -> Result<(), StoreError> {
    if file_name.is_empty()
        || file_name.contains('/')
        || file_name.contains('\\')
        || file_name.contains("..")
    {
        return Err(StoreError::InvalidName(file_name.to_string()));
    }
    Ok(())
}
