//! Code screenshot renderer
//!
//! Invokes `<tool> <input> --save-to <dir> -p <preset> [--config <style>]`.
//! The tool picks its own output file name, so success is judged by any
//! `*.png` appearing in the save directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use super::process::{run_tool, ToolCommand};
use super::RenderError;
use crate::config::RendererConfig;

/// Code renderer settings
#[derive(Debug, Clone)]
pub struct CodeRenderer {
    tool: PathBuf,
    style_config: Option<PathBuf>,
    timeout: Duration,
}

impl CodeRenderer {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            tool: config.code_tool.clone(),
            style_config: config.code_style_config.clone(),
            timeout: config.timeout(),
        }
    }

    /// Build the command line for one render
    pub fn command(&self, input: &Path, save_to: &Path, preset: &str) -> ToolCommand {
        let mut cmd = ToolCommand::new(&self.tool, save_to, self.timeout)
            .arg(input)
            .arg("--save-to")
            .arg(save_to)
            .arg("-p")
            .arg(preset);
        if let Some(style) = &self.style_config {
            cmd = cmd.arg("--config").arg(style);
        }
        cmd
    }

    /// Render `input` into `workspace`, returning the produced image
    pub async fn render(
        &self,
        input: &Path,
        workspace: &Path,
        preset: &str,
    ) -> Result<PathBuf, RenderError> {
        let cmd = self.command(input, workspace, preset);
        run_tool(&cmd).await?;

        let image = find_png(workspace)
            .await?
            .ok_or_else(|| RenderError::NoArtifactProduced {
                dir: workspace.to_path_buf(),
            })?;
        debug!("Code snapshot written to {}", image.display());
        Ok(image)
    }
}

/// First `*.png` in `dir` by file name
async fn find_png(dir: &Path) -> Result<Option<PathBuf>, RenderError> {
    let read_err = |source| RenderError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_err)?;

    let mut found = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        let path = entry.path();
        let is_png = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("png"));
        if is_png && path.is_file() {
            found.push(path);
        }
    }
    found.sort();
    Ok(found.into_iter().next())
}
