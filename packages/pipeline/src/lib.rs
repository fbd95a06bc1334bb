//! Mention enrichment and response assistance.
//!
//! Raw public mentions of a brand are retrieved from [`sources`], annotated
//! by the [`enrichment`] pipeline with classification and risk signals, and
//! can be turned into a drafted reply by the [`assist`] module.

pub mod assist;
pub mod brand;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod llm;
pub mod mentions;
pub mod models;
pub mod sources;

pub use assist::{AssistRequest, ResponseAssistant};
pub use brand::{BrandVerifier, VerifyBrandRequest};
pub use config::{AssistConfig, EnrichmentConfig, RedditConfig};
pub use enrichment::{EnrichmentPipeline, LlmClassifier, LlmRiskAssessor, MentionEnricher};
pub use error::{ErrorKind, PipelineError, Result};
pub use mentions::MentionService;
pub use models::{
    AssistResult, BrandVerification, EnrichedMention, MentionContext, RawMention, RiskLevel,
    RiskScore, Sentiment,
};
pub use sources::{MentionSource, RedditSource, SourceRegistry};
