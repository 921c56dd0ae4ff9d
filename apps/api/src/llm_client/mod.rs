/// LLM Client: the single point of entry for all Claude API calls in the assessment service.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// Evaluator adapters go through this module.
///
/// Model is hardcoded; scoring runs at temperature 0 so that re-evaluating the
/// same answer is as repeatable as the model allows.
use std::time::Duration;

use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The model used for all evaluator calls.
pub const MODEL: &str = "claude-sonnet-4-5";
/// A score plus a few sentences of rationale fits comfortably.
const MAX_TOKENS: u32 = 1024;
const TEMPERATURE: f32 = 0.0;
const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Concatenates every text block; the model occasionally splits long replies.
    pub fn text(&self) -> Option<String> {
        let text: String = self
            .content
            .iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Wraps the Anthropic Messages API with retry logic and structured output helpers.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
        })
    }

    /// Makes a raw call to the Claude API, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(&self, prompt: &str, system: &str) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model: MODEL,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let llm_response: LlmResponse = response.json().await?;

            debug!(
                "LLM call succeeded: input_tokens={}, output_tokens={}",
                llm_response.usage.input_tokens, llm_response.usage.output_tokens
            );

            return Ok(llm_response);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    /// Calls the LLM and deserializes the JSON object in its reply.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: &str,
    ) -> Result<T, LlmError> {
        let response = self.call(prompt, system).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        serde_json::from_str(extract_json_object(&text)).map_err(LlmError::Parse)
    }
}

/// 1s, 2s, 4s, ...
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(1000 * (1 << (attempt.saturating_sub(1))))
}

/// Pulls the JSON object out of a model reply.
///
/// Handles ```json fences and stray prose around the object by taking the span
/// from the first `{` to the last `}`. Text without braces is returned as-is so
/// the parse error surfaces.
fn extract_json_object(text: &str) -> &str {
    let text = strip_json_fences(text);
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start()),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"score\": 7}\n```";
        assert_eq!(strip_json_fences(input), "{\"score\": 7}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"score\": 7}\n```";
        assert_eq!(strip_json_fences(input), "{\"score\": 7}");
    }

    #[test]
    fn test_extract_json_object_ignores_surrounding_prose() {
        let input = "Here is my evaluation:\n{\"score\": 6, \"rationale\": \"ok\"}\nThanks.";
        assert_eq!(
            extract_json_object(input),
            "{\"score\": 6, \"rationale\": \"ok\"}"
        );
    }

    #[test]
    fn test_extract_json_object_without_braces_passes_through() {
        assert_eq!(extract_json_object("  no json here "), "no json here");
    }

    #[test]
    fn test_response_text_joins_text_blocks() {
        let response: LlmResponse = serde_json::from_value(serde_json::json!({
            "content": [
                {"type": "text", "text": "{\"score\": "},
                {"type": "tool_use"},
                {"type": "text", "text": "5}"}
            ],
            "usage": {"input_tokens": 10, "output_tokens": 4}
        }))
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("{\"score\": 5}"));
    }

    #[test]
    fn test_response_text_empty_is_none() {
        let response: LlmResponse = serde_json::from_value(serde_json::json!({
            "content": [],
            "usage": {"input_tokens": 1, "output_tokens": 0}
        }))
        .unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(2), Duration::from_secs(2));
        assert_eq!(backoff_delay(3), Duration::from_secs(4));
    }
}
