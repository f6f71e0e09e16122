//! Generator error types

use thiserror::Error;

use crate::artifacts::StoreError;
use crate::render::RenderError;

/// Which public operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CodeImage,
    DiagramImage,
}

impl Operation {
    /// Stable prefix of error messages for this operation
    pub fn failure_prefix(&self) -> &'static str {
        match self {
            Operation::CodeImage => "Failed to generate code snapshot",
            Operation::DiagramImage => "Failed to generate diagram",
        }
    }
}

/// Failures inside a single pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to prepare workspace: {0}")]
    WorkspaceCreation(#[source] std::io::Error),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to persist artifact: {0}")]
    Persist(#[from] StoreError),
}

/// Error returned by `ContentGenerator`, prefixed with the failed operation
#[derive(Debug, Error)]
#[error("{}: {source}", .operation.failure_prefix())]
pub struct GenerateError {
    pub operation: Operation,
    #[source]
    pub source: PipelineError,
}

impl GenerateError {
    pub fn new(operation: Operation, source: PipelineError) -> Self {
        Self { operation, source }
    }

    pub fn is_launch_failure(&self) -> bool {
        matches!(self.source, PipelineError::Render(RenderError::Launch { .. }))
    }

    pub fn is_tool_failure(&self) -> bool {
        matches!(
            self.source,
            PipelineError::Render(RenderError::ToolFailed { .. })
        )
    }

    pub fn is_no_artifact(&self) -> bool {
        matches!(
            self.source,
            PipelineError::Render(RenderError::NoArtifactProduced { .. })
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.source, PipelineError::Render(RenderError::Timeout { .. }))
    }
}
