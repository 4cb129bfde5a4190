//! Vision judge backed by the Anthropic Messages API.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use crate::errors::VisionError;
use crate::judge::VisionJudge;
use crate::models::{TokenUsage, VisionJudgment};

const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnthropicConfig {
    pub endpoint: String,
    pub model: String,
    pub prompt_version: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub max_tokens: u32,
    /// USD per million input tokens.
    pub input_cost_per_mtok: f64,
    /// USD per million output tokens.
    pub output_cost_per_mtok: f64,
    pub request_timeout_ms: u64,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.anthropic.com".to_string(),
            model: "claude-3-5-sonnet-20241022".to_string(),
            prompt_version: "v1".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            max_tokens: 1024,
            input_cost_per_mtok: 3.0,
            output_cost_per_mtok: 15.0,
            request_timeout_ms: 60_000,
        }
    }
}

impl AnthropicConfig {
    pub fn cost(&self, tokens: TokenUsage) -> f64 {
        (tokens.input as f64 * self.input_cost_per_mtok
            + tokens.output as f64 * self.output_cost_per_mtok)
            / 1_000_000.0
    }
}

pub struct AnthropicVisionJudge {
    config: AnthropicConfig,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicVisionJudge {
    /// Build a judge, reading the API key from `config.api_key_env`.
    pub fn from_env(config: AnthropicConfig) -> Result<Self, VisionError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| VisionError::MissingApiKey(config.api_key_env.clone()))?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(config: AnthropicConfig, api_key: impl Into<String>) -> Result<Self, VisionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;
        info!(model = %config.model, prompt_version = %config.prompt_version, "vision judge ready");
        Ok(Self {
            config,
            api_key: api_key.into(),
            client,
        })
    }

    fn request_body(&self, screenshot_png: &[u8], assertion: &str) -> serde_json::Value {
        json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": [{
                "role": "user",
                "content": [
                    {
                        "type": "image",
                        "source": {
                            "type": "base64",
                            "media_type": "image/png",
                            "data": STANDARD.encode(screenshot_png),
                        }
                    },
                    { "type": "text", "text": render_prompt(assertion) }
                ]
            }]
        })
    }
}

#[async_trait]
impl VisionJudge for AnthropicVisionJudge {
    fn model(&self) -> &str {
        &self.config.model
    }

    fn prompt_version(&self) -> &str {
        &self.config.prompt_version
    }

    async fn judge(&self, screenshot_png: &[u8], assertion: &str) -> Result<VisionJudgment, VisionError> {
        let url = format!("{}/v1/messages", self.config.endpoint.trim_end_matches('/'));
        debug!(model = %self.config.model, bytes = screenshot_png.len(), "requesting vision judgment");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.request_body(screenshot_png, assertion))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let message: MessagesResponse = response.json().await?;
        parse_judgment(&message, &self.config)
    }
}

/// The prompt sent with every screenshot. Bump `prompt_version` in the
/// config whenever this text changes so old verdicts stop matching.
pub fn render_prompt(assertion: &str) -> String {
    format!(
        "You are verifying a web page screenshot.\n\
         Assertion: {assertion}\n\n\
         Decide whether the assertion holds for what is visible in the screenshot. \
         Reply with a single JSON object and nothing else:\n\
         {{\"verdict\": true|false, \"confidence\": <0-100>, \"reasoning\": \"<one or two sentences>\"}}"
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct VerdictPayload {
    verdict: bool,
    confidence: f64,
    #[serde(default)]
    reasoning: String,
}

pub(crate) fn parse_judgment(
    message: &MessagesResponse,
    config: &AnthropicConfig,
) -> Result<VisionJudgment, VisionError> {
    let text: String = message
        .content
        .iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text.as_deref())
        .collect::<Vec<_>>()
        .join("\n");

    let (start, end) = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => {
            return Err(VisionError::InvalidResponse(format!(
                "no JSON object in reply: {text}"
            )))
        }
    };
    let payload: VerdictPayload = serde_json::from_str(&text[start..=end])
        .map_err(|err| VisionError::InvalidResponse(err.to_string()))?;

    let tokens = TokenUsage {
        input: message.usage.input_tokens,
        output: message.usage.output_tokens,
    };
    Ok(VisionJudgment {
        verdict: payload.verdict,
        confidence: payload.confidence.clamp(0.0, 100.0),
        reasoning: payload.reasoning,
        tokens,
        cost: config.cost(tokens),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> MessagesResponse {
        serde_json::from_value(json!({
            "content": [{ "type": "text", "text": text }],
            "usage": { "input_tokens": 1_000_000, "output_tokens": 2_000 }
        }))
        .unwrap()
    }

    #[test]
    fn parses_fenced_json_reply() {
        let reply = "```json\n{\"verdict\": true, \"confidence\": 92, \"reasoning\": \"Cart shows 1 item\"}\n```";
        let judgment = parse_judgment(&message(reply), &AnthropicConfig::default()).unwrap();
        assert!(judgment.verdict);
        assert_eq!(judgment.confidence, 92.0);
        assert_eq!(judgment.tokens.total(), 1_002_000);
        assert!((judgment.cost - (3.0 + 0.03)).abs() < 1e-9);
    }

    #[test]
    fn clamps_confidence() {
        let judgment = parse_judgment(
            &message(r#"{"verdict": false, "confidence": 140}"#),
            &AnthropicConfig::default(),
        )
        .unwrap();
        assert_eq!(judgment.confidence, 100.0);
        assert!(judgment.reasoning.is_empty());
    }

    #[test]
    fn rejects_prose_reply() {
        let err = parse_judgment(&message("Looks fine to me."), &AnthropicConfig::default())
            .unwrap_err();
        assert!(matches!(err, VisionError::InvalidResponse(_)));
    }

    #[test]
    fn request_carries_image_and_assertion() {
        let judge =
            AnthropicVisionJudge::with_api_key(AnthropicConfig::default(), "test-key").unwrap();
        let body = judge.request_body(b"png", "the cart is empty");
        assert_eq!(body["model"], "claude-3-5-sonnet-20241022");
        let content = &body["messages"][0]["content"];
        assert_eq!(content[0]["source"]["data"], "cG5n");
        assert!(content[1]["text"]
            .as_str()
            .unwrap()
            .contains("the cart is empty"));
    }
}
