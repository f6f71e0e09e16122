//! Diagram renderer
//!
//! Writes a JSON theme config into the workspace, then invokes
//! `<tool> -w 2048 -i <input> -o <output> -c <config> -b transparent`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use super::process::{run_tool, ToolCommand};
use super::RenderError;
use crate::config::RendererConfig;

/// Canvas width passed on the command line
pub const DIAGRAM_WIDTH: u32 = 2048;

/// Canvas height written to the config file
pub const DIAGRAM_CANVAS_HEIGHT: u32 = 1200;

const CONFIG_FILE_NAME: &str = "mermaid-config.json";
const OUTPUT_FILE_NAME: &str = "output.png";

/// Renderer theme config, serialized as camelCase JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramConfig {
    pub theme: String,
    pub background: String,
    pub output_format: String,
    pub height: u32,
    pub background_color: String,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            theme: "default".to_string(),
            background: "#ffffff".to_string(),
            output_format: "png".to_string(),
            height: DIAGRAM_CANVAS_HEIGHT,
            background_color: "#ffffff".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiagramRenderer {
    tool: PathBuf,
    timeout: Duration,
}

impl DiagramRenderer {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            tool: config.diagram_tool.clone(),
            timeout: config.timeout(),
        }
    }

    pub fn command(
        &self,
        input: &Path,
        output: &Path,
        config: &Path,
        workspace: &Path,
    ) -> ToolCommand {
        ToolCommand::new(&self.tool, workspace, self.timeout)
            .arg("-w")
            .arg(DIAGRAM_WIDTH.to_string())
            .arg("-i")
            .arg(input)
            .arg("-o")
            .arg(output)
            .arg("-c")
            .arg(config)
            .arg("-b")
            .arg("transparent")
    }

    /// Render `input` into `workspace/output.png`
    pub async fn render(&self, input: &Path, workspace: &Path) -> Result<PathBuf, RenderError> {
        let config_path = workspace.join(CONFIG_FILE_NAME);
        write_config(&config_path, &DiagramConfig::default()).await?;

        let output = workspace.join(OUTPUT_FILE_NAME);
        let cmd = self.command(input, &output, &config_path, workspace);
        run_tool(&cmd).await?;

        let produced = tokio::fs::try_exists(&output)
            .await
            .map_err(|source| RenderError::Io {
                path: output.clone(),
                source,
            })?;
        if !produced {
            return Err(RenderError::NoArtifactProduced {
                dir: workspace.to_path_buf(),
            });
        }
        debug!("Diagram written to {}", output.display());
        Ok(output)
    }
}

async fn write_config(path: &Path, config: &DiagramConfig) -> Result<(), RenderError> {
    let io_err = |source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    };
    let json = serde_json::to_vec_pretty(config).map_err(|e| io_err(e.into()))?;
    tokio::fs::write(path, json).await.map_err(io_err)
}
