use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::ScoreSubmission;

/// Name of the forced tool the model answers through
pub const SUBMIT_SCORES_TOOL: &str = "submit_scores";

/// Configuration for the Anthropic API client
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key (from ANTHROPIC_API_KEY env var)
    pub api_key: String,
    /// Model to use (e.g., "claude-sonnet-4-20250514")
    pub model: String,
    /// Temperature (0-1, lower = more deterministic)
    pub temperature: f64,
    /// Maximum tokens in response
    pub max_tokens: u32,
}

impl AnthropicConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .context("ANTHROPIC_API_KEY environment variable not set")?;
        let model = std::env::var("ANTHROPIC_MODEL")
            .unwrap_or_else(|_| "claude-sonnet-4-20250514".to_string());

        Ok(Self {
            api_key,
            model,
            temperature: 0.0,
            max_tokens: 4096,
        })
    }

    /// Create with custom settings
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            temperature: 0.0,
            max_tokens: 4096,
        }
    }
}

/// Anthropic API client
pub struct AnthropicClient {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a scoring request, forcing the `submit_scores` tool for
    /// structured output
    pub async fn send_with_tool(&self, system: &str, user: &str) -> Result<ScoreSubmission> {
        let request = AnthropicToolRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            system: Some(system.to_string()),
            messages: vec![Message {
                role: "user".to_string(),
                content: user.to_string(),
            }],
            tools: vec![submit_scores_tool()],
            tool_choice: Some(ToolChoice {
                choice_type: "tool".to_string(),
                name: SUBMIT_SCORES_TOOL.to_string(),
            }),
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Anthropic API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic API error: {} - {}", status, body);
        }

        let response: AnthropicResponse = response
            .json()
            .await
            .context("Failed to parse Anthropic API response")?;

        extract_submission(&response)
    }
}

fn submit_scores_tool() -> Tool {
    let dimension = |description: &str| {
        serde_json::json!({
            "type": "number",
            "minimum": 0,
            "maximum": 10,
            "description": description
        })
    };

    Tool {
        name: SUBMIT_SCORES_TOOL.to_string(),
        description: "Submit competitive scores for every candidate clip".to_string(),
        input_schema: serde_json::json!({
            "type": "object",
            "properties": {
                "scores": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "candidate_id": {"type": "string"},
                            "scroll_stop_probability": dimension("Would a viewer stop scrolling?"),
                            "share_trigger": dimension("Likelihood of being shared"),
                            "clarity": dimension("Is the message clear and punchy?"),
                            "debate_potential": dimension("Will it spark comments or discussion?"),
                            "ending_strength": dimension("Does it end in a memorable way?"),
                            "rationale": {"type": "string"}
                        },
                        "required": [
                            "candidate_id",
                            "scroll_stop_probability",
                            "share_trigger",
                            "clarity",
                            "debate_potential",
                            "ending_strength"
                        ]
                    }
                }
            },
            "required": ["scores"]
        }),
    }
}

/// Find the `submit_scores` tool_use block and parse its input
fn extract_submission(response: &AnthropicResponse) -> Result<ScoreSubmission> {
    for content in &response.content {
        if content.content_type == "tool_use" && content.name.as_deref() == Some(SUBMIT_SCORES_TOOL) {
            if let Some(input) = &content.input {
                return serde_json::from_value(input.clone())
                    .context("Failed to parse tool input as ScoreSubmission");
            }
        }
    }

    anyhow::bail!("No tool_use response found")
}

#[derive(Debug, Serialize)]
struct AnthropicToolRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct Tool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice {
    #[serde(rename = "type")]
    choice_type: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    input: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_tool_input() {
        let json = r#"{"content": [
            {"type": "text", "text": "Scoring now."},
            {"type": "tool_use", "name": "submit_scores", "input": {"scores": [
                {"candidate_id": "c_0", "scroll_stop_probability": 7, "share_trigger": 5,
                 "clarity": 6, "debate_potential": 2, "ending_strength": 8}
            ]}}
        ]}"#;
        let response: AnthropicResponse = serde_json::from_str(json).unwrap();
        let submission = extract_submission(&response).unwrap();

        assert_eq!(submission.scores.len(), 1);
        assert_eq!(submission.scores[0].candidate_id, "c_0");
        assert_eq!(submission.scores[0].ending_strength, 8.0);
    }

    #[test]
    fn test_missing_tool_use_is_error() {
        let json = r#"{"content": [{"type": "text", "text": "I cannot help."}]}"#;
        let response: AnthropicResponse = serde_json::from_str(json).unwrap();
        assert!(extract_submission(&response).is_err());
    }

    #[test]
    fn test_request_forces_tool() {
        let tool = submit_scores_tool();
        assert_eq!(tool.name, SUBMIT_SCORES_TOOL);
        assert_eq!(tool.input_schema["required"][0], "scores");
    }
}
