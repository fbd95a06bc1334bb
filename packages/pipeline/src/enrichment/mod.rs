mod classifier;
mod enricher;
mod pipeline;
mod prompt;
mod risk;

pub use classifier::{parse_classification, Classifier, LlmClassifier};
#[cfg(any(test, feature = "test-utils"))]
pub use classifier::test_support::MockClassifier;
pub use enricher::MentionEnricher;
pub use pipeline::EnrichmentPipeline;
pub use risk::{parse_risk_assessment, LlmRiskAssessor, RiskAssessor};
#[cfg(any(test, feature = "test-utils"))]
pub use risk::test_support::MockRiskAssessor;
