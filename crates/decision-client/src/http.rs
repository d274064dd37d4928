//! HTTP provider for the vision decision service.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::DecisionError;
use crate::prompt::build_prompt;
use crate::provider::DecisionProvider;
use crate::types::{ActionDecision, ActionKind, DecisionContext};

/// Connection settings for the decision service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VisionServiceConfig {
    /// Full endpoint URL, e.g. `https://vision.internal/v1/decide`.
    pub endpoint: String,

    /// Bearer token, if the service requires one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model identifier forwarded to the service, if it multiplexes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for VisionServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8700/v1/decide".to_string(),
            api_key: None,
            model: None,
            request_timeout: Duration::from_secs(60),
        }
    }
}

/// Provider speaking JSON-over-HTTP to the reasoning service.
pub struct HttpVisionProvider {
    cfg: VisionServiceConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct WireRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    prompt: String,
    image: WireImage,
}

#[derive(Serialize)]
struct WireImage {
    media_type: &'static str,
    data: String,
}

#[derive(Deserialize)]
struct WireResponse {
    content: String,
}

/// The JSON object the service embeds in its reply text.
#[derive(Deserialize)]
struct WireDecision {
    action: ActionKind,
    #[serde(default)]
    target_selector: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    goal_achieved: bool,
    confidence: f32,
    #[serde(default)]
    reasoning: String,
}

impl From<WireDecision> for ActionDecision {
    fn from(wire: WireDecision) -> Self {
        Self {
            kind: wire.action,
            target: wire.target_selector,
            text: wire.text,
            goal_achieved: wire.goal_achieved,
            confidence: wire.confidence,
            reasoning: wire.reasoning,
        }
    }
}

impl HttpVisionProvider {
    pub fn new(cfg: VisionServiceConfig) -> Result<Self, DecisionError> {
        let client = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .build()
            .map_err(|e| DecisionError::transport(e.to_string()))?;
        Ok(Self { cfg, client })
    }
}

#[async_trait]
impl DecisionProvider for HttpVisionProvider {
    async fn request_decision(
        &self,
        ctx: &DecisionContext,
        hint: Option<&str>,
    ) -> Result<ActionDecision, DecisionError> {
        let body = WireRequest {
            model: self.cfg.model.as_deref(),
            prompt: build_prompt(ctx, hint),
            image: WireImage {
                media_type: ctx.screenshot.format.media_type(),
                data: base64::engine::general_purpose::STANDARD.encode(&ctx.screenshot.bytes),
            },
        };

        let mut request = self.client.post(&self.cfg.endpoint).json(&body);
        if let Some(key) = &self.cfg.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DecisionError::transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DecisionError::transport(format!(
                "decision service returned {status}"
            )));
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| DecisionError::transport(e.to_string()))?;
        debug!(bytes = wire.content.len(), "decision response received");
        parse_decision_text(&wire.content)
    }
}

/// Parse the service's reply text into a decision.
///
/// The service wraps its JSON in markdown code fences more often than not;
/// strip them before parsing. Parse failures are transient faults so the
/// client can retry with a hint.
pub fn parse_decision_text(content: &str) -> Result<ActionDecision, DecisionError> {
    let stripped = strip_code_fences(content);
    let wire: WireDecision = serde_json::from_str(stripped)
        .map_err(|e| DecisionError::invalid(format!("unparseable decision JSON: {e}")))?;
    Ok(wire.into())
}

fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}
