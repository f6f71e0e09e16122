//! Local filesystem artifact store
//!
//! Copies artifacts into a public directory that the API serves under the
//! configured URL prefix.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use super::{validate_name, ArtifactReference, ArtifactStore, StoreError};

#[derive(Debug, Clone)]
pub struct LocalStore {
    public_dir: PathBuf,
    url_prefix: String,
}

impl LocalStore {
    /// Open the store, creating the public directory if needed
    pub async fn open(public_dir: &Path, url_prefix: &str) -> Result<Self, StoreError> {
        tokio::fs::create_dir_all(public_dir).await?;
        info!("Local artifact store at {}", public_dir.display());
        Ok(Self {
            public_dir: public_dir.to_path_buf(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        })
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    /// Absolute path of a stored artifact
    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.public_dir.join(file_name)
    }
}

#[async_trait]
impl ArtifactStore for LocalStore {
    async fn persist(
        &self,
        local_file: &Path,
        file_name: &str,
    ) -> Result<ArtifactReference, StoreError> {
        validate_name(file_name)?;
        let target = self.path_for(file_name);
        let bytes = tokio::fs::copy(local_file, &target).await?;
        debug!("Copied {} bytes to {}", bytes, target.display());

        Ok(ArtifactReference::new(format!(
            "{}/{}",
            self.url_prefix, file_name
        )))
    }

    fn backend(&self) -> &'static str {
        "local"
    }
}
