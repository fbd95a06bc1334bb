use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::enrichment::prompt;
use crate::error::{PipelineError, Result};
use crate::llm::{parse_json_response, LlmClient, LlmConfig, LlmRequest};
use crate::models::{RawMention, RiskAssessment, RiskLevel, RiskScore};

/// Independent risk-scoring service.
#[async_trait]
pub trait RiskAssessor: Send + Sync {
    async fn assess(&self, mention: &RawMention) -> Result<RiskAssessment>;
}

/// Risk assessor backed by a chat-completion model.
pub struct LlmRiskAssessor {
    client: Arc<dyn LlmClient>,
    max_tokens: u32,
    temperature: f64,
}

impl LlmRiskAssessor {
    pub fn new(client: Arc<dyn LlmClient>, config: &LlmConfig) -> Self {
        Self {
            client,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }
}

#[async_trait]
impl RiskAssessor for LlmRiskAssessor {
    async fn assess(&self, mention: &RawMention) -> Result<RiskAssessment> {
        let request = LlmRequest::single_turn(
            prompt::build_risk_system_prompt(),
            prompt::build_mention_prompt(mention),
            self.max_tokens,
            self.temperature,
        );

        let response = self.client.complete(&request).await?;
        debug!(
            mention_id = %mention.id,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "risk assessment response"
        );

        parse_risk_assessment(&response.content)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RiskPayload {
    #[serde(alias = "risk_level")]
    risk_level: String,
    #[serde(alias = "risk_score")]
    risk_score: f64,
}

/// Parse a risk assessor response. Both fields are required; an unknown
/// level is an error rather than a guess.
pub fn parse_risk_assessment(content: &str) -> Result<RiskAssessment> {
    let payload: RiskPayload = parse_json_response(content)?;

    let risk_level = payload
        .risk_level
        .trim()
        .parse::<RiskLevel>()
        .map_err(|_| {
            PipelineError::LlmResponseParse(format!("unknown risk level '{}'", payload.risk_level))
        })?;

    Ok(RiskAssessment {
        risk_level,
        risk_score: RiskScore::from(payload.risk_score),
    })
}

/// Test utilities for risk assessors.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Scripted risk assessor keyed by mention id.
    pub struct MockRiskAssessor {
        default: RiskAssessment,
        overrides: HashMap<String, RiskAssessment>,
        failing: HashSet<String>,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl MockRiskAssessor {
        pub fn returning(assessment: RiskAssessment) -> Self {
            Self {
                default: assessment,
                overrides: HashMap::new(),
                failing: HashSet::new(),
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn with_result_for(mut self, mention_id: &str, assessment: RiskAssessment) -> Self {
            self.overrides.insert(mention_id.to_string(), assessment);
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
    impl RiskAssessor for MockRiskAssessor {
        async fn assess(&self, mention: &RawMention) -> Result<RiskAssessment> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.failing.contains(&mention.id) {
                return Err(PipelineError::LlmApiError {
                    status: 503,
                    message: "risk assessor unavailable".into(),
                });
            }
            Ok(self
                .overrides
                .get(&mention.id)
                .copied()
                .unwrap_or(self.default))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_risk_assessment() {
        let assessment =
            parse_risk_assessment(r#"{"riskLevel": "high", "riskScore": 78}"#).unwrap();
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert_eq!(assessment.risk_score.value(), 78);
    }

    #[test]
    fn test_score_is_clamped() {
        let assessment =
            parse_risk_assessment(r#"{"risk_level": "Critical", "risk_score": 140.2}"#).unwrap();
        assert_eq!(assessment.risk_score.value(), 100);
    }

    #[test]
    fn test_unknown_level_is_error() {
        let result = parse_risk_assessment(r#"{"riskLevel": "Spicy", "riskScore": 50}"#);
        assert!(matches!(result, Err(PipelineError::LlmResponseParse(_))));
    }

    #[test]
    fn test_missing_score_is_error() {
        let result = parse_risk_assessment(r#"{"riskLevel": "Low"}"#);
        assert!(matches!(result, Err(PipelineError::LlmResponseParse(_))));
    }
}
