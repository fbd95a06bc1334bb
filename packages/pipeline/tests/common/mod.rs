#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use brandpulse_pipeline::enrichment::{Classifier, RiskAssessor};
use brandpulse_pipeline::models::{ClassificationResult, RiskAssessment};
use brandpulse_pipeline::{PipelineError, RawMention, RiskLevel, RiskScore, Sentiment};

pub fn mention(id: &str, text: &str) -> RawMention {
    RawMention::new(
        id,
        text,
        "reddit",
        Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap(),
    )
}

/// Counts calls currently running across every service sharing it.
#[derive(Default)]
pub struct InFlightGauge {
    current: AtomicUsize,
    peak: AtomicUsize,
    total: AtomicUsize,
    completed: AtomicUsize,
}

/// Held for the lifetime of one call; released on completion or when the
/// call's future is dropped.
struct InFlight<'a>(&'a InFlightGauge);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.current.fetch_sub(1, Ordering::SeqCst);
    }
}

impl InFlightGauge {
    fn enter(&self) -> InFlight<'_> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        InFlight(self)
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    /// Calls that ran to the end rather than being dropped.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

/// Upstream double usable as both classifier and risk assessor.
pub struct ScriptedService {
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    default_delay: Duration,
    gauge: Arc<InFlightGauge>,
}

impl ScriptedService {
    pub fn new(gauge: Arc<InFlightGauge>) -> Self {
        Self {
            failing: HashSet::new(),
            delays: HashMap::new(),
            default_delay: Duration::ZERO,
            gauge,
        }
    }

    pub fn failing_for(mut self, mention_id: &str) -> Self {
        self.failing.insert(mention_id.to_string());
        self
    }

    pub fn delay_for(mut self, mention_id: &str, delay: Duration) -> Self {
        self.delays.insert(mention_id.to_string(), delay);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    async fn run(&self, mention: &RawMention) -> Result<(), PipelineError> {
        let _in_flight = self.gauge.enter();
        let delay = self
            .delays
            .get(&mention.id)
            .copied()
            .unwrap_or(self.default_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.gauge.completed.fetch_add(1, Ordering::SeqCst);

        if self.failing.contains(&mention.id) {
            return Err(PipelineError::LlmApiError {
                status: 503,
                message: "service unavailable".into(),
            });
        }
        Ok(())
    }
}

pub fn positive() -> ClassificationResult {
    ClassificationResult {
        sentiment: Sentiment::Positive,
        tone: "Appreciative".into(),
        intent: "Compliment".into(),
        key_phrases: vec!["great service".into()],
    }
}

pub fn low_risk() -> RiskAssessment {
    RiskAssessment {
        risk_level: RiskLevel::Low,
        risk_score: RiskScore::new(12),
    }
}

#[async_trait]
impl Classifier for ScriptedService {
    async fn classify(
        &self,
        mention: &RawMention,
    ) -> brandpulse_pipeline::Result<ClassificationResult> {
        self.run(mention).await?;
        Ok(positive())
    }
}

#[async_trait]
impl RiskAssessor for ScriptedService {
    async fn assess(&self, mention: &RawMention) -> brandpulse_pipeline::Result<RiskAssessment> {
        self.run(mention).await?;
        Ok(low_risk())
    }
}
