use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::llm::config::{LlmConfig, LlmProvider};

/// Role of a message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single message in the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Request to the LLM.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub system: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f64,
    /// Ask the provider to constrain output to a single JSON object.
    pub json_output: bool,
}

impl LlmRequest {
    /// A single user turn under `system`, asking for JSON output.
    pub fn single_turn(
        system: impl Into<String>,
        user: impl Into<String>,
        max_tokens: u32,
        temperature: f64,
    ) -> Self {
        Self {
            system: system.into(),
            messages: vec![Message::user(user)],
            max_tokens,
            temperature,
            json_output: true,
        }
    }
}

/// Response from the LLM.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Trait for LLM clients, enabling mocking in tests.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse>;
}

/// Build the client for the provider named in `config`.
pub fn build_llm_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>> {
    let client: Arc<dyn LlmClient> = match config.provider {
        LlmProvider::OpenAi => Arc::new(OpenAiClient::new(config)?),
        LlmProvider::Anthropic => Arc::new(AnthropicClient::new(config)?),
    };
    Ok(client)
}

fn build_http(config: &LlmConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(PipelineError::LlmApiRequest)
}

#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.retry_base_delay,
        }
    }

    /// Exponential backoff: base, 2x base, 4x base, ...
    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: Option<ApiErrorDetail>,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn api_error_message(body: String) -> String {
    serde_json::from_str::<ApiErrorResponse>(&body)
        .ok()
        .and_then(|r| r.error)
        .map(|e| e.message)
        .unwrap_or(body)
}

/// Send a request, retrying transport errors, 5xx responses and empty
/// completions. Any other non-success status fails immediately.
async fn send_with_retries<B, P>(policy: RetryPolicy, build: B, parse: P) -> Result<LlmResponse>
where
    B: Fn() -> reqwest::RequestBuilder,
    P: Fn(&str) -> Result<LlmResponse>,
{
    let mut last_error: Option<PipelineError> = None;

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            let delay = policy.delay_for(attempt);
            debug!(attempt, "retrying LLM request after {:?}", delay);
            tokio::time::sleep(delay).await;
        }

        let resp = match build().send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(attempt, error = %e, "LLM request failed");
                last_error = Some(PipelineError::LlmApiRequest(e));
                continue;
            }
        };

        let status = resp.status().as_u16();
        let body = match resp.text().await {
            Ok(body) => body,
            Err(e) => {
                warn!(attempt, error = %e, "failed to read LLM response body");
                last_error = Some(PipelineError::LlmApiRequest(e));
                continue;
            }
        };

        if status >= 500 {
            warn!(attempt, status, body = %body, "LLM server error");
            last_error = Some(PipelineError::LlmApiError {
                status,
                message: body,
            });
            continue;
        }

        if !(200..300).contains(&status) {
            return Err(PipelineError::LlmApiError {
                status,
                message: api_error_message(body),
            });
        }

        match parse(&body) {
            Ok(response) => return Ok(response),
            Err(PipelineError::LlmEmptyResponse) => {
                warn!(attempt, "LLM returned empty response");
                last_error = Some(PipelineError::LlmEmptyResponse);
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error.unwrap_or(PipelineError::LlmEmptyResponse))
}

/// OpenAI chat-completions client.
///
/// NOTE: Do NOT derive `Debug` on this struct, `api_key` would be exposed.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    model: String,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<OpenAiMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<OpenAiResponseFormat>,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct OpenAiResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Deserialize)]
struct OpenAiChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

impl OpenAiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            http: build_http(config)?,
            api_key: config.api_key.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            retry: RetryPolicy::from_config(config),
        })
    }
}

fn parse_openai_response(body: &str) -> Result<LlmResponse> {
    let api_response: OpenAiResponse =
        serde_json::from_str(body).map_err(|e| PipelineError::LlmResponseParse(e.to_string()))?;

    let content = api_response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();

    if content.trim().is_empty() {
        return Err(PipelineError::LlmEmptyResponse);
    }

    let (input_tokens, output_tokens) = api_response
        .usage
        .map(|u| (u.prompt_tokens, u.completion_tokens))
        .unwrap_or_default();

    Ok(LlmResponse {
        content,
        input_tokens,
        output_tokens,
    })
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let url = format!("{}/v1/chat/completions", self.api_base_url);

        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(OpenAiMessage {
            role: "system",
            content: &request.system,
        });
        messages.extend(request.messages.iter().map(|m| OpenAiMessage {
            role: match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
            },
            content: &m.content,
        }));

        let body = OpenAiRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages,
            response_format: request.json_output.then_some(OpenAiResponseFormat {
                kind: "json_object",
            }),
        };

        send_with_retries(
            self.retry,
            || {
                self.http
                    .post(&url)
                    .bearer_auth(&self.api_key)
                    .header("content-type", "application/json")
                    .json(&body)
            },
            parse_openai_response,
        )
        .await
    }
}

/// Anthropic API client implementation.
///
/// NOTE: Do NOT derive `Debug` on this struct, `api_key` would be exposed.
pub struct AnthropicClient {
    http: reqwest::Client,
    api_key: String,
    api_base_url: String,
    model: String,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    system: &'a str,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: AnthropicUsage,
}

#[derive(Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u64,
    output_tokens: u64,
}

impl AnthropicClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            http: build_http(config)?,
            api_key: config.api_key.clone(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            retry: RetryPolicy::from_config(config),
        })
    }
}

fn parse_anthropic_response(body: &str) -> Result<LlmResponse> {
    let api_response: AnthropicResponse =
        serde_json::from_str(body).map_err(|e| PipelineError::LlmResponseParse(e.to_string()))?;

    let content = api_response
        .content
        .into_iter()
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("");

    if content.trim().is_empty() {
        return Err(PipelineError::LlmEmptyResponse);
    }

    Ok(LlmResponse {
        content,
        input_tokens: api_response.usage.input_tokens,
        output_tokens: api_response.usage.output_tokens,
    })
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let url = format!("{}/v1/messages", self.api_base_url);

        // The messages API has no JSON mode; the prompts ask for a bare object.
        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: &request.system,
            messages: &request.messages,
        };

        send_with_retries(
            self.retry,
            || {
                self.http
                    .post(&url)
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", "2023-06-01")
                    .header("content-type", "application/json")
                    .json(&body)
            },
            parse_anthropic_response,
        )
        .await
    }
}

/// Test utilities for the LLM client.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// Mock LLM client for testing. Returns pre-configured responses in order
    /// and records every request it receives.
    pub struct MockLlmClient {
        responses: Mutex<Vec<Result<LlmResponse>>>,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl MockLlmClient {
        pub fn new(responses: Vec<Result<LlmResponse>>) -> Self {
            // Reverse so we can pop from the end
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn with_response(content: &str) -> Self {
            Self::with_responses(vec![content])
        }

        pub fn with_responses(contents: Vec<&str>) -> Self {
            Self::new(
                contents
                    .into_iter()
                    .map(|c| {
                        Ok(LlmResponse {
                            content: c.to_string(),
                            input_tokens: 100,
                            output_tokens: 200,
                        })
                    })
                    .collect(),
            )
        }

        pub fn with_error(error: PipelineError) -> Self {
            Self::new(vec![Err(error)])
        }

        /// Requests received so far, oldest first.
        pub fn requests(&self) -> Vec<LlmRequest> {
            self.requests
                .lock()
                .map(|r| r.clone())
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl LlmClient for MockLlmClient {
        async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request.clone());
            }
            let mut responses = self.responses.lock().map_err(|e| {
                PipelineError::LlmResponseParse(format!("mock lock poisoned: {e}"))
            })?;
            responses.pop().unwrap_or(Err(PipelineError::LlmEmptyResponse))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
    }

    #[test]
    fn test_parse_openai_response() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"a\":1}"}}],"usage":{"prompt_tokens":12,"completion_tokens":3}}"#;
        let response = parse_openai_response(body).unwrap();
        assert_eq!(response.content, r#"{"a":1}"#);
        assert_eq!(response.input_tokens, 12);
        assert_eq!(response.output_tokens, 3);
    }

    #[test]
    fn test_parse_openai_empty_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert!(matches!(
            parse_openai_response(body),
            Err(PipelineError::LlmEmptyResponse)
        ));
    }

    #[test]
    fn test_parse_anthropic_joins_text_blocks() {
        let body = r#"{"content":[{"type":"text","text":"{\"a\":"},{"type":"text","text":"1}"}],"usage":{"input_tokens":5,"output_tokens":2}}"#;
        let response = parse_anthropic_response(body).unwrap();
        assert_eq!(response.content, r#"{"a":1}"#);
    }

    #[test]
    fn test_api_error_message_extracted() {
        let body = r#"{"error":{"type":"invalid_request_error","message":"Invalid model"}}"#;
        assert_eq!(api_error_message(body.to_string()), "Invalid model");
        assert_eq!(api_error_message("plain".to_string()), "plain");
    }

    #[tokio::test]
    async fn test_mock_client_records_requests() {
        let mock = test_support::MockLlmClient::with_response("{}");
        let request = LlmRequest::single_turn("system", "hello", 1024, 0.0);

        let response = mock.complete(&request).await.unwrap();
        assert_eq!(response.content, "{}");
        assert!(mock.complete(&request).await.is_err());
        assert_eq!(mock.requests().len(), 2);
        assert_eq!(mock.requests()[0].messages[0].content, "hello");
    }
}
