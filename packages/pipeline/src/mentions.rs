//! Fetch-mentions operation: retrieve raw mentions, enrich them and
//! order them for triage.

use std::cmp::Reverse;

use tracing::info;

use crate::enrichment::EnrichmentPipeline;
use crate::error::{PipelineError, Result, BRAND_QUERY_REQUIRED};
use crate::models::EnrichedMention;
use crate::sources::SourceRegistry;

#[derive(Clone)]
pub struct MentionService {
    registry: SourceRegistry,
    pipeline: EnrichmentPipeline,
}

impl MentionService {
    pub fn new(registry: SourceRegistry, pipeline: EnrichmentPipeline) -> Self {
        Self { registry, pipeline }
    }

    /// Enriched mentions for `brand_query`, highest risk first.
    ///
    /// A missing or blank query is rejected before any source is contacted.
    /// Mentions with equal risk keep their retrieval (newest-first) order.
    #[tracing::instrument(skip(self, sources))]
    pub async fn fetch_mentions(
        &self,
        brand_query: Option<&str>,
        sources: Option<&[String]>,
    ) -> Result<Vec<EnrichedMention>> {
        let brand_query = brand_query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| PipelineError::validation(BRAND_QUERY_REQUIRED))?;

        let raws = self.registry.fetch(brand_query, sources).await?;
        info!(retrieved = raws.len(), "retrieved raw mentions");

        let mut enriched = self.pipeline.enrich_batch(raws).await;
        enriched.sort_by_key(|m| Reverse(m.risk_score));

        Ok(enriched)
    }
}
