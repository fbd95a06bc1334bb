use std::time::Instant;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::EnrichmentConfig;
use crate::enrichment::enricher::MentionEnricher;
use crate::error::{PipelineError, Result};
use crate::models::{EnrichedMention, RawMention};

/// Fans a batch of raw mentions through the [`MentionEnricher`].
///
/// Output has the same length and order as the input regardless of which
/// mention finishes first. No work is spawned: dropping the returned future
/// cancels every outstanding upstream call.
#[derive(Clone)]
pub struct EnrichmentPipeline {
    enricher: MentionEnricher,
    max_in_flight: usize,
}

impl EnrichmentPipeline {
    pub fn new(enricher: MentionEnricher, config: &EnrichmentConfig) -> Self {
        Self {
            enricher,
            max_in_flight: config.max_concurrent_calls.max(1),
        }
    }

    /// Enrich every mention in `raws`. Never fails; degraded mentions carry
    /// fallback values.
    #[tracing::instrument(skip_all, fields(batch_size = raws.len()))]
    pub async fn enrich_batch(&self, raws: Vec<RawMention>) -> Vec<EnrichedMention> {
        if raws.is_empty() {
            return Vec::new();
        }

        let started = Instant::now();

        let enriched: Vec<EnrichedMention> = stream::iter(raws)
            .map(|raw| self.enricher.enrich(raw))
            .buffered(self.max_in_flight)
            .collect()
            .await;

        let degraded = enriched
            .iter()
            .filter(|m| m.degradation.is_degraded())
            .count();

        info!(
            enriched = enriched.len(),
            degraded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "enrichment batch complete"
        );

        enriched
    }

    /// Like [`EnrichmentPipeline::enrich_batch`], but stops as soon as
    /// `cancel` fires, dropping all in-flight work.
    pub async fn enrich_batch_cancellable(
        &self,
        raws: Vec<RawMention>,
        cancel: &CancellationToken,
    ) -> Result<Vec<EnrichedMention>> {
        let batch_size = raws.len();
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                warn!(batch_size, "enrichment batch cancelled");
                Err(PipelineError::Cancelled)
            }
            enriched = self.enrich_batch(raws) => Ok(enriched),
        }
    }
}
