//! Agent tool adapter
//!
//! Renders each planned selection one at a time. A failed render is logged
//! and skipped so the rest of the request still completes.

use tracing::{debug, warn};

use super::{CodeSnippet, DiagramSpec, GeneratedDiagram, GeneratedSnippet};
use crate::generator::ContentGenerator;

/// Render every snippet, keeping the ones that succeeded in input order
pub async fn generate_snippet_images(
    generator: &ContentGenerator,
    snippets: &[CodeSnippet],
) -> Vec<GeneratedSnippet> {
    let mut generated = Vec::with_capacity(snippets.len());
    for (index, snippet) in snippets.iter().enumerate() {
        match generator.generate_code_image(&snippet.snippet, None).await {
            Ok(image_reference) => {
                debug!("Snippet {} rendered to {}", index, image_reference);
                generated.push(GeneratedSnippet {
                    snippet: snippet.clone(),
                    image_reference,
                });
            }
            Err(e) => warn!("Skipping snippet {}: {}", index, e),
        }
    }
    generated
}

/// Render every diagram, skipping failures
pub async fn generate_diagram_images(
    generator: &ContentGenerator,
    diagrams: &[DiagramSpec],
) -> Vec<GeneratedDiagram> {
    let mut generated = Vec::with_capacity(diagrams.len());
    for (index, diagram) in diagrams.iter().enumerate() {
        match generator.generate_diagram_image(&diagram.source).await {
            Ok(image_reference) => generated.push(GeneratedDiagram {
                diagram: diagram.clone(),
                image_reference,
            }),
            Err(e) => warn!("Skipping diagram {}: {}", index, e),
        }
    }
    generated
}
