use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::assist::prompt;
use crate::config::AssistConfig;
use crate::error::{PipelineError, Result, MENTION_CONTEXT_REQUIRED};
use crate::llm::{parse_json_response, LlmClient, LlmConfig, LlmRequest};
use crate::models::{AssistResult, MentionContext};

/// Body of an assist request as received at the boundary.
///
/// Only `mentionContext.text` decides whether the request is usable; any
/// other field that is missing or wrongly typed is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "Value")]
pub struct AssistRequest {
    pub mention_id: Option<String>,
    pub mention_context: Option<MentionContext>,
}

impl From<Value> for AssistRequest {
    fn from(value: Value) -> Self {
        let mention_id = match value.get("mentionId") {
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        };
        let mention_context = value
            .get("mentionContext")
            .filter(|context| context.is_object())
            .cloned()
            .map(MentionContext::from);

        Self {
            mention_id,
            mention_context,
        }
    }
}

impl AssistRequest {
    /// Split into mention id and context, rejecting a missing context or
    /// blank text before any outbound call is made.
    pub fn into_parts(self) -> Result<(String, MentionContext)> {
        let context = self
            .mention_context
            .filter(|c| c.text().is_some())
            .ok_or_else(|| PipelineError::validation(MENTION_CONTEXT_REQUIRED))?;
        Ok((self.mention_id.unwrap_or_default(), context))
    }
}

/// Generates a reply suggestion and engagement strategy for one mention.
///
/// Single-shot and stateless: one generation call per request, no fallback
/// when the call fails or its output cannot be parsed.
pub struct ResponseAssistant {
    client: Arc<dyn LlmClient>,
    max_tokens: u32,
    temperature: f64,
    timeout: Duration,
}

impl ResponseAssistant {
    pub fn new(client: Arc<dyn LlmClient>, llm: &LlmConfig, config: &AssistConfig) -> Self {
        Self {
            client,
            max_tokens: llm.max_tokens,
            temperature: llm.temperature,
            timeout: config.timeout,
        }
    }

    #[tracing::instrument(skip_all, fields(mention_id = %mention_id))]
    pub async fn assist(&self, context: &MentionContext, mention_id: &str) -> Result<AssistResult> {
        let text = context
            .text()
            .ok_or_else(|| PipelineError::validation(MENTION_CONTEXT_REQUIRED))?;

        info!("generating response suggestion");

        let request = LlmRequest::single_turn(
            prompt::build_system_prompt(),
            prompt::build_assist_prompt(text, context),
            self.max_tokens,
            self.temperature,
        );

        let response = tokio::time::timeout(self.timeout, self.client.complete(&request))
            .await
            .unwrap_or(Err(PipelineError::Timeout {
                operation: "response suggestion",
                after: self.timeout,
            }))?;

        let result = parse_assist_result(&response.content)?;

        info!(
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            strategy = %result.strategy,
            "response suggestion generated"
        );

        Ok(result)
    }

    /// Validate a boundary request and run [`ResponseAssistant::assist`].
    pub async fn assist_request(&self, request: AssistRequest) -> Result<AssistResult> {
        let (mention_id, context) = request.into_parts()?;
        self.assist(&context, &mention_id).await
    }
}

#[derive(Deserialize)]
struct AssistPayload {
    suggestion: Option<String>,
    strategy: Option<String>,
}

/// Parse generator output into exactly `suggestion` and `strategy`, both
/// non-empty.
pub fn parse_assist_result(content: &str) -> Result<AssistResult> {
    let payload: AssistPayload = parse_json_response(content)?;

    let suggestion = payload.suggestion.map(|s| s.trim().to_string());
    let strategy = payload.strategy.map(|s| s.trim().to_string());

    match (suggestion, strategy) {
        (Some(suggestion), Some(strategy)) if !suggestion.is_empty() && !strategy.is_empty() => {
            Ok(AssistResult {
                suggestion,
                strategy,
            })
        }
        _ => Err(PipelineError::LlmResponseParse(
            "response missing non-empty 'suggestion' or 'strategy'".into(),
        )),
    }
}
