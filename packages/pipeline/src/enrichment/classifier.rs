use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::enrichment::prompt;
use crate::error::Result;
use crate::llm::{parse_json_response, LlmClient, LlmConfig, LlmRequest};
use crate::models::{ClassificationResult, RawMention, Sentiment};

/// Upper bound on key phrases kept per mention.
const MAX_KEY_PHRASES: usize = 5;

/// Text-classification service: sentiment, tone, intent and key phrases.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, mention: &RawMention) -> Result<ClassificationResult>;
}

/// Classifier backed by a chat-completion model.
pub struct LlmClassifier {
    client: Arc<dyn LlmClient>,
    max_tokens: u32,
    temperature: f64,
}

impl LlmClassifier {
    pub fn new(client: Arc<dyn LlmClient>, config: &LlmConfig) -> Self {
        Self {
            client,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    async fn classify(&self, mention: &RawMention) -> Result<ClassificationResult> {
        let request = LlmRequest::single_turn(
            prompt::build_classification_system_prompt(),
            prompt::build_mention_prompt(mention),
            self.max_tokens,
            self.temperature,
        );

        let response = self.client.complete(&request).await?;
        debug!(
            mention_id = %mention.id,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "classification response"
        );

        parse_classification(&response.content)
    }
}

/// Wire shape of the classifier output. Every field is optional so a
/// partially filled answer still produces a usable result.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ClassificationPayload {
    sentiment: Option<String>,
    tone: Option<String>,
    intent: Option<String>,
    #[serde(alias = "key_phrases")]
    key_phrases: Option<Vec<String>>,
}

impl From<ClassificationPayload> for ClassificationResult {
    fn from(payload: ClassificationPayload) -> Self {
        let fallback = ClassificationResult::fallback();

        let sentiment = payload
            .sentiment
            .and_then(|s| s.trim().parse::<Sentiment>().ok())
            .unwrap_or(fallback.sentiment);

        let key_phrases = payload
            .key_phrases
            .unwrap_or_default()
            .into_iter()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .take(MAX_KEY_PHRASES)
            .collect();

        Self {
            sentiment,
            tone: non_blank(payload.tone).unwrap_or(fallback.tone),
            intent: non_blank(payload.intent).unwrap_or(fallback.intent),
            key_phrases,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse a classifier response. Missing fields take their fallback value;
/// output that is not a JSON object is an error.
pub fn parse_classification(content: &str) -> Result<ClassificationResult> {
    let payload: ClassificationPayload = parse_json_response(content)?;
    Ok(payload.into())
}

/// Test utilities for classifiers.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use super::*;
    use crate::error::PipelineError;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Scripted classifier keyed by mention id.
    pub struct MockClassifier {
        default: ClassificationResult,
        overrides: HashMap<String, ClassificationResult>,
        failing: HashSet<String>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl MockClassifier {
        pub fn returning(result: ClassificationResult) -> Self {
            Self {
                default: result,
                overrides: HashMap::new(),
                failing: HashSet::new(),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn with_result_for(mut self, mention_id: &str, result: ClassificationResult) -> Self {
            self.overrides.insert(mention_id.to_string(), result);
            self
        }

        pub fn failing_for(mut self, mention_id: &str) -> Self {
            self.failing.insert(mention_id.to_string());
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Classifier for MockClassifier {
        async fn classify(&self, mention: &RawMention) -> Result<ClassificationResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.failing.contains(&mention.id) {
                return Err(PipelineError::LlmApiError {
                    status: 503,
                    message: "classifier unavailable".into(),
                });
            }
            Ok(self
                .overrides
                .get(&mention.id)
                .cloned()
                .unwrap_or_else(|| self.default.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::llm::{LlmProvider, MockLlmClient};
    use chrono::Utc;

    #[test]
    fn test_parse_full_classification() {
        let result = parse_classification(
            r#"{"sentiment": "negative", "tone": "Angry", "intent": "Complaint", "keyPhrases": ["broke", " refund "]}"#,
        )
        .unwrap();

        assert_eq!(result.sentiment, Sentiment::Negative);
        assert_eq!(result.tone, "Angry");
        assert_eq!(result.intent, "Complaint");
        assert_eq!(result.key_phrases, vec!["broke", "refund"]);
    }

    #[test]
    fn test_missing_fields_take_fallbacks() {
        let result = parse_classification(r#"{"tone": "  "}"#).unwrap();
        assert_eq!(result, ClassificationResult::fallback());
    }

    #[test]
    fn test_unknown_sentiment_is_neutral() {
        let result = parse_classification(r#"{"sentiment": "Mixed", "tone": "Wry"}"#).unwrap();
        assert_eq!(result.sentiment, Sentiment::Neutral);
        assert_eq!(result.tone, "Wry");
    }

    #[test]
    fn test_key_phrases_capped() {
        let result = parse_classification(
            r#"{"key_phrases": ["a", "b", "c", "d", "e", "f", "g"]}"#,
        )
        .unwrap();
        assert_eq!(result.key_phrases.len(), MAX_KEY_PHRASES);
    }

    #[test]
    fn test_non_json_is_error() {
        assert!(matches!(
            parse_classification("Sorry, I can't classify this."),
            Err(PipelineError::LlmResponseParse(_))
        ));
    }

    #[tokio::test]
    async fn test_llm_classifier_sends_mention_text() {
        let mock = Arc::new(MockLlmClient::with_response(
            r#"{"sentiment": "Positive", "tone": "Excited", "intent": "Compliment", "keyPhrases": ["love it"]}"#,
        ));
        let config = LlmConfig::builder(LlmProvider::OpenAi, "key").build();
        let classifier = LlmClassifier::new(mock.clone(), &config);

        let mention = RawMention::new("m1", "I love it", "reddit", Utc::now());
        let result = classifier.classify(&mention).await.unwrap();

        assert_eq!(result.sentiment, Sentiment::Positive);
        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].json_output);
        assert!(requests[0].messages[0].content.contains("I love it"));
    }
}
