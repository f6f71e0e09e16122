//! Chat agent
//!
//! Provides:
//! - Snippet planning via a hosted OpenAI-compatible model
//! - The tool adapter that turns planned snippets into images
//! - `Agent`, which ties both together for one chat message

mod llm;
mod tools;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::artifacts::ArtifactReference;
use crate::generator::ContentGenerator;

pub use llm::{ChatMessage, LlmPlanner};
pub use tools::{generate_diagram_images, generate_snippet_images};

/// A code snippet the model chose to illustrate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeSnippet {
    pub snippet: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub importance_score: f64,
}

/// A diagram the model chose to draw
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagramSpec {
    pub source: String,
    #[serde(default)]
    pub description: String,
}

/// Snippet paired with the reference of its rendered image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedSnippet {
    pub snippet: CodeSnippet,
    pub image_reference: ArtifactReference,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDiagram {
    pub diagram: DiagramSpec,
    pub image_reference: ArtifactReference,
}

/// What the model wants to say and render for one message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatPlan {
    pub reply: String,
    pub snippets: Vec<CodeSnippet>,
    pub diagrams: Vec<DiagramSpec>,
}

/// Final answer for one chat message; images travel as data, not inside the text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentReply {
    pub reply: String,
    pub images: Vec<GeneratedSnippet>,
    pub diagrams: Vec<GeneratedDiagram>,
}

/// Agent errors
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("model API key not configured")]
    NotConfigured,

    #[error("model request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("model API error: {status}")]
    Api { status: u16 },

    #[error("model returned an unusable plan: {0}")]
    InvalidPlan(String),
}

/// Decides what to render for a user message
#[async_trait]
pub trait SnippetPlanner: Send + Sync {
    async fn plan(&self, message: &str) -> Result<ChatPlan, AgentError>;
}

/// Runs one chat message: plan, then render each selection
#[derive(Clone)]
pub struct Agent {
    planner: Arc<dyn SnippetPlanner>,
    generator: ContentGenerator,
    max_snippets: usize,
}

impl Agent {
    pub fn new(
        planner: Arc<dyn SnippetPlanner>,
        generator: ContentGenerator,
        max_snippets: usize,
    ) -> Self {
        Self {
            planner,
            generator,
            max_snippets,
        }
    }

    pub fn generator(&self) -> &ContentGenerator {
        &self.generator
    }

    /// Handle one user message
    pub async fn run(&self, message: &str) -> Result<AgentReply, AgentError> {
        let mut plan = self.planner.plan(message).await?;

        // Most important first, bounded per request
        plan.snippets
            .sort_by(|a, b| b.importance_score.total_cmp(&a.importance_score));
        plan.snippets.truncate(self.max_snippets);

        info!(
            "Plan has {} snippets and {} diagrams",
            plan.snippets.len(),
            plan.diagrams.len()
        );

        let images = generate_snippet_images(&self.generator, &plan.snippets).await;
        let diagrams = generate_diagram_images(&self.generator, &plan.diagrams).await;

        Ok(AgentReply {
            reply: plan.reply,
            images,
            diagrams,
        })
    }
}
