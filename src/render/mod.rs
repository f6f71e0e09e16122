//! External renderer invocation
//!
//! Provides:
//! - Code screenshot rendering (`carbon-now` style CLI)
//! - Diagram rendering (`mmdc` style CLI)
//! - A shared process runner with timeout and kill-on-drop

mod code;
mod diagram;
mod process;
#[cfg(test)]
pub(crate) mod test_utils;

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub use code::CodeRenderer;
pub use diagram::{DiagramConfig, DiagramRenderer, DIAGRAM_CANVAS_HEIGHT, DIAGRAM_WIDTH};
pub use process::{run_tool, ToolCommand, ToolOutput};

/// What kind of image a request produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    Code,
    Diagram,
}

impl RenderKind {
    /// File name the source text is written to inside a workspace
    pub fn input_file_name(&self) -> &'static str {
        match self {
            RenderKind::Code => "snippet.txt",
            RenderKind::Diagram => "diagram.mmd",
        }
    }
}

/// A single render job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    pub kind: RenderKind,
    pub source_text: String,
    pub preset_name: Option<String>,
}

impl RenderRequest {
    pub fn code(source_text: impl Into<String>, preset_name: Option<String>) -> Self {
        Self {
            kind: RenderKind::Code,
            source_text: source_text.into(),
            preset_name,
        }
    }

    pub fn diagram(source_text: impl Into<String>) -> Self {
        Self {
            kind: RenderKind::Diagram,
            source_text: source_text.into(),
            preset_name: None,
        }
    }
}

/// Renderer errors
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("could not launch {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {}: {stderr}", describe_exit(.exit_code))]
    ToolFailed {
        tool: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("{tool} did not finish within {timeout:?}")]
    Timeout { tool: String, timeout: Duration },

    #[error("renderer produced no image in {}", .dir.display())]
    NoArtifactProduced { dir: PathBuf },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {}", code),
        None => "signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_constructors() {
        let code = RenderRequest::code("const x = 1;", Some("nord".to_string()));
        assert_eq!(code.kind, RenderKind::Code);
        assert_eq!(code.preset_name.as_deref(), Some("nord"));

        let diagram = RenderRequest::diagram("graph TD; A-->B;");
        assert_eq!(diagram.kind, RenderKind::Diagram);
        assert!(diagram.preset_name.is_none());
    }

    #[test]
    fn test_tool_failure_message() {
        let err = RenderError::ToolFailed {
            tool: "mmdc".to_string(),
            exit_code: Some(1),
            stderr: "Parse error".to_string(),
        };
        assert_eq!(err.to_string(), "mmdc exited with code 1: Parse error");

        let killed = RenderError::ToolFailed {
            tool: "mmdc".to_string(),
            exit_code: None,
            stderr: String::new(),
        };
        assert!(killed.to_string().contains("signal"));
    }
}
