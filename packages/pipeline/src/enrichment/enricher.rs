use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::config::EnrichmentConfig;
use crate::enrichment::classifier::Classifier;
use crate::enrichment::risk::RiskAssessor;
use crate::error::{PipelineError, Result};
use crate::models::{
    ClassificationResult, Degradation, EnrichedMention, RawMention, RiskAssessment,
};

/// Merges classifier and risk-assessor output into one [`EnrichedMention`].
///
/// Both services are called concurrently for every mention. A failure or
/// timeout of either is absorbed by substituting its fallback values, so
/// [`MentionEnricher::enrich`] never fails. The two signals are kept side by
/// side and are not reconciled with each other.
///
/// All outbound calls made through one enricher share a permit pool of
/// `max_concurrent_calls`; calls beyond the cap wait for a permit before
/// their timeout starts.
#[derive(Clone)]
pub struct MentionEnricher {
    classifier: Arc<dyn Classifier>,
    risk_assessor: Arc<dyn RiskAssessor>,
    permits: Arc<Semaphore>,
    call_timeout: Duration,
}

impl MentionEnricher {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        risk_assessor: Arc<dyn RiskAssessor>,
        config: &EnrichmentConfig,
    ) -> Self {
        Self {
            classifier,
            risk_assessor,
            permits: Arc::new(Semaphore::new(config.max_concurrent_calls.max(1))),
            call_timeout: config.call_timeout,
        }
    }

    /// Enrich a single mention.
    pub async fn enrich(&self, raw: RawMention) -> EnrichedMention {
        let (classification, risk) = tokio::join!(
            self.bounded_call("classification", self.classifier.classify(&raw)),
            self.bounded_call("risk assessment", self.risk_assessor.assess(&raw)),
        );

        let mut degradation = Degradation::default();

        let classification = classification.unwrap_or_else(|e| {
            warn!(
                mention_id = %raw.id,
                stage = "classification",
                error = %e,
                "classification failed, using fallback"
            );
            degradation.classification_failed = true;
            ClassificationResult::fallback()
        });

        let risk = risk.unwrap_or_else(|e| {
            warn!(
                mention_id = %raw.id,
                stage = "risk",
                error = %e,
                "risk assessment failed, mention unassessed"
            );
            degradation.risk_unassessed = true;
            RiskAssessment::fallback()
        });

        debug!(
            mention_id = %raw.id,
            sentiment = %classification.sentiment,
            risk_level = %risk.risk_level,
            risk_score = risk.risk_score.value(),
            degraded = degradation.is_degraded(),
            "mention enriched"
        );

        EnrichedMention::merge(raw, classification, risk, degradation)
    }

    /// Run one outbound call under the shared concurrency cap and the
    /// per-call timeout. Expiry is reported as [`PipelineError::Timeout`].
    async fn bounded_call<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| PipelineError::Cancelled)?;

        tokio::time::timeout(self.call_timeout, call)
            .await
            .unwrap_or(Err(PipelineError::Timeout {
                operation,
                after: self.call_timeout,
            }))
    }
}
