//! Per-call scratch directories
//!
//! A workspace is removed by `close` on the normal path and by `Drop` when the
//! owning future is cancelled.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

const WORKSPACE_PREFIX: &str = "codeshot-";

#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a uniquely named directory under `root`
    pub fn create(root: &Path) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(root)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `contents` to `file_name` inside the workspace
    pub async fn write_input(&self, file_name: &str, contents: &str) -> io::Result<PathBuf> {
        let path = self.dir.path().join(file_name);
        tokio::fs::write(&path, contents).await?;
        Ok(path)
    }

    /// Remove the directory, reporting failures
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
}
