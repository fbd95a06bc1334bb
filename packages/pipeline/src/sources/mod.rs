//! Raw-mention retrieval from external platforms.

mod reddit;

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{info, warn};

use crate::error::{PipelineError, Result};
use crate::models::RawMention;

pub use reddit::RedditSource;

/// A platform that can be searched for mentions of a brand.
#[async_trait]
pub trait MentionSource: Send + Sync {
    /// Stable lowercase identifier used in the `sources` query parameter.
    fn name(&self) -> &str;

    async fn fetch_mentions(&self, brand_query: &str) -> Result<Vec<RawMention>>;
}

/// The set of configured mention sources.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn MentionSource>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, source: Arc<dyn MentionSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Query the requested sources (all when `requested` is `None`)
    /// concurrently and merge their mentions newest-first.
    ///
    /// A failing source contributes nothing. Fails only when every queried
    /// source failed.
    #[tracing::instrument(skip(self, requested))]
    pub async fn fetch(
        &self,
        brand_query: &str,
        requested: Option<&[String]>,
    ) -> Result<Vec<RawMention>> {
        let selected: Vec<&Arc<dyn MentionSource>> = match requested {
            Some(names) => {
                for name in names {
                    if !self.sources.iter().any(|s| s.name().eq_ignore_ascii_case(name)) {
                        warn!(source = %name, "ignoring unknown mention source");
                    }
                }
                self.sources
                    .iter()
                    .filter(|s| names.iter().any(|n| s.name().eq_ignore_ascii_case(n)))
                    .collect()
            }
            None => self.sources.iter().collect(),
        };

        if selected.is_empty() {
            warn!("no mention sources selected");
            return Ok(Vec::new());
        }

        let results = join_all(
            selected
                .iter()
                .map(|source| async move {
                    (source.name(), source.fetch_mentions(brand_query).await)
                }),
        )
        .await;

        let queried = results.len();
        let mut failures = Vec::new();
        let mut mentions = Vec::new();

        for (name, result) in results {
            match result {
                Ok(found) => {
                    info!(source = name, count = found.len(), "fetched mentions");
                    mentions.extend(found);
                }
                Err(e) => {
                    warn!(source = name, error = %e, "mention source failed");
                    failures.push(format!("{name}: {e}"));
                }
            }
        }

        if failures.len() == queried {
            return Err(PipelineError::MentionSource(failures.join("; ")));
        }

        mentions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(mentions)
    }
}

/// Test utilities for mention sources.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use super::*;

    /// Source that returns a fixed set of mentions, or always fails.
    pub struct StaticMentionSource {
        name: String,
        mentions: Vec<RawMention>,
        fail: bool,
    }

    impl StaticMentionSource {
        pub fn new(name: impl Into<String>, mentions: Vec<RawMention>) -> Self {
            Self {
                name: name.into(),
                mentions,
                fail: false,
            }
        }

        pub fn failing(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                mentions: Vec::new(),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl MentionSource for StaticMentionSource {
        fn name(&self) -> &str {
            &self.name
        }

        async fn fetch_mentions(&self, _brand_query: &str) -> Result<Vec<RawMention>> {
            if self.fail {
                return Err(PipelineError::MentionSource(format!(
                    "{} unavailable",
                    self.name
                )));
            }
            Ok(self.mentions.clone())
        }
    }
}
