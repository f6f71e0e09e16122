//! Hosted model client
//!
//! Talks to an OpenAI-compatible chat completions endpoint and asks for a
//! JSON plan describing which snippets and diagrams to render.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{AgentError, ChatPlan, SnippetPlanner};
use crate::config::AgentConfig;

const SYSTEM_PROMPT: &str = r#"You help developers turn code into shareable image threads.

Given the user's message, pick the code snippets worth turning into images
(usually 2 to 4) and, when a flow or architecture is described, Mermaid
diagrams that explain it.

Respond with ONLY a JSON object of this shape:
{
  "reply": "short message to the user",
  "snippets": [
    {"snippet": "exact code", "description": "what it shows", "importanceScore": 0.0}
  ],
  "diagrams": [
    {"source": "graph TD; A-->B;", "description": "what it shows"}
  ]
}

importanceScore ranges from 0 to 1. Keep each snippet under 40 lines.
Do not include image URLs in the reply."#;

/// Chat message for the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Planner backed by a hosted model
#[derive(Debug)]
pub struct LlmPlanner {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl LlmPlanner {
    pub fn new(config: &AgentConfig) -> Result<Self, AgentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            base_url: config.api_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    /// Check if API key is configured
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send a chat completion request and return the assistant text
    pub async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String, AgentError> {
        let api_key = self.api_key.as_ref().ok_or(AgentError::NotConfigured)?;

        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: 0.2,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        debug!("Sending chat request for model {}", request.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Model API error: {} - {}", status, body);
            return Err(AgentError::Api {
                status: status.as_u16(),
            });
        }

        let chat_response: ChatResponse = response.json().await?;
        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AgentError::InvalidPlan("no choices in response".to_string()))
    }
}

#[async_trait]
impl SnippetPlanner for LlmPlanner {
    async fn plan(&self, message: &str) -> Result<ChatPlan, AgentError> {
        let content = self
            .chat(vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(message),
            ])
            .await?;
        parse_plan(&content)
    }
}

/// Parse the model's JSON, tolerating a surrounding markdown fence
fn parse_plan(content: &str) -> Result<ChatPlan, AgentError> {
    let trimmed = content.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(json.trim()).map_err(|e| AgentError::InvalidPlan(e.to_string()))
}
