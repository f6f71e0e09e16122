//! Image generation pipeline
//!
//! Each call:
//! 1. Creates a fresh workspace and writes the source text into it
//! 2. Runs the matching external renderer
//! 3. Persists the produced PNG under a new `<uuid>.png` name
//! 4. Removes the workspace, whatever happened above

mod error;
mod workspace;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::artifacts::{new_artifact_name, ArtifactReference, ArtifactStore};
use crate::config::RendererConfig;
use crate::render::{CodeRenderer, DiagramRenderer, RenderKind, RenderRequest};

pub use error::{GenerateError, Operation, PipelineError};
pub use workspace::Workspace;

/// A rendered image still inside its workspace
#[derive(Debug, Clone)]
pub struct RenderedArtifact {
    pub local_path: PathBuf,
    pub id: Uuid,
    pub file_name: String,
}

/// Renders snippets and diagrams and hands the images to an artifact store
///
/// Holds no mutable state; clones share the store.
#[derive(Debug, Clone)]
pub struct ContentGenerator {
    config: RendererConfig,
    code: CodeRenderer,
    diagram: DiagramRenderer,
    store: Arc<dyn ArtifactStore>,
}

impl ContentGenerator {
    pub fn new(config: RendererConfig, store: Arc<dyn ArtifactStore>) -> Self {
        Self {
            code: CodeRenderer::new(&config),
            diagram: DiagramRenderer::new(&config),
            config,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    /// Render a code snippet screenshot
    pub async fn generate_code_image(
        &self,
        source_text: &str,
        preset_name: Option<&str>,
    ) -> Result<ArtifactReference, GenerateError> {
        self.generate(&RenderRequest::code(
            source_text,
            preset_name.map(str::to_string),
        ))
        .await
    }

    /// Render a diagram
    pub async fn generate_diagram_image(
        &self,
        source_text: &str,
    ) -> Result<ArtifactReference, GenerateError> {
        self.generate(&RenderRequest::diagram(source_text)).await
    }

    /// Run one request through the pipeline
    pub async fn generate(
        &self,
        request: &RenderRequest,
    ) -> Result<ArtifactReference, GenerateError> {
        let operation = match request.kind {
            RenderKind::Code => Operation::CodeImage,
            RenderKind::Diagram => Operation::DiagramImage,
        };

        let workspace = Workspace::create(&self.config.scratch_root())
            .map_err(|e| GenerateError::new(operation, PipelineError::WorkspaceCreation(e)))?;
        debug!("Created workspace {}", workspace.path().display());

        let result = self.run_in(&workspace, request).await;

        let path = workspace.path().to_path_buf();
        if let Err(e) = workspace.close() {
            warn!("Failed to remove workspace {}: {}", path.display(), e);
        }

        result.map_err(|e| GenerateError::new(operation, e))
    }

    async fn run_in(
        &self,
        workspace: &Workspace,
        request: &RenderRequest,
    ) -> Result<ArtifactReference, PipelineError> {
        let input = workspace
            .write_input(request.kind.input_file_name(), &request.source_text)
            .await
            .map_err(PipelineError::WorkspaceCreation)?;

        let artifact = self.render(workspace, &input, request).await?;

        let reference = self
            .store
            .persist(&artifact.local_path, &artifact.file_name)
            .await?;
        info!(
            "Generated {:?} image {} via {} store",
            request.kind,
            artifact.id,
            self.store.backend()
        );
        Ok(reference)
    }

    async fn render(
        &self,
        workspace: &Workspace,
        input: &Path,
        request: &RenderRequest,
    ) -> Result<RenderedArtifact, PipelineError> {
        // Public name is independent of whatever the tool called its output
        let (id, file_name) = new_artifact_name();

        let local_path = match request.kind {
            RenderKind::Code => {
                let preset = self.config.resolve_preset(request.preset_name.as_deref());
                self.code.render(input, workspace.path(), preset).await?
            }
            RenderKind::Diagram => self.diagram.render(input, workspace.path()).await?,
        };

        Ok(RenderedArtifact {
            local_path,
            id,
            file_name,
        })
    }
}
