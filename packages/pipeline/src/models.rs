use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// A single public mention as returned by a mention source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMention {
    pub id: String,
    pub text: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl RawMention {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        source: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            source: source.into(),
            created_at,
            author: None,
            url: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

/// Composite severity in `0..=100`. Out-of-range input is clamped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "f64", into = "u8")]
pub struct RiskScore(u8);

impl RiskScore {
    pub const MAX: u8 = 100;

    pub fn new(value: i64) -> Self {
        Self(value.clamp(0, i64::from(Self::MAX)) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl From<f64> for RiskScore {
    fn from(value: f64) -> Self {
        if value.is_nan() {
            return Self::default();
        }
        Self(value.round().clamp(0.0, f64::from(Self::MAX)) as u8)
    }
}

impl From<RiskScore> for u8 {
    fn from(score: RiskScore) -> Self {
        score.0
    }
}

/// Output of the classification service for one mention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationResult {
    pub sentiment: Sentiment,
    pub tone: String,
    pub intent: String,
    pub key_phrases: Vec<String>,
}

impl ClassificationResult {
    pub const UNKNOWN: &'static str = "Unknown";

    /// Values substituted when classification fails or times out.
    pub fn fallback() -> Self {
        Self {
            sentiment: Sentiment::Neutral,
            tone: Self::UNKNOWN.to_string(),
            intent: Self::UNKNOWN.to_string(),
            key_phrases: Vec::new(),
        }
    }
}

/// Output of the risk-assessment service for one mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    pub risk_score: RiskScore,
}

impl RiskAssessment {
    /// Values substituted when risk assessment fails or times out.
    pub fn fallback() -> Self {
        Self {
            risk_level: RiskLevel::Low,
            risk_score: RiskScore::new(0),
        }
    }
}

/// Which upstream signals were replaced by fallbacks. Never serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Degradation {
    pub classification_failed: bool,
    pub risk_unassessed: bool,
}

impl Degradation {
    pub fn is_degraded(&self) -> bool {
        self.classification_failed || self.risk_unassessed
    }
}

/// A raw mention annotated with classification and risk signals.
///
/// Every field is always populated; failed upstream calls are represented by
/// fallback values and recorded in [`Degradation`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedMention {
    #[serde(flatten)]
    pub mention: RawMention,
    pub sentiment: Sentiment,
    pub tone: String,
    pub intent: String,
    pub key_phrases: Vec<String>,
    pub risk_score: RiskScore,
    pub gemini_risk_level: RiskLevel,
    #[serde(skip)]
    pub degradation: Degradation,
}

impl EnrichedMention {
    pub fn merge(
        mention: RawMention,
        classification: ClassificationResult,
        risk: RiskAssessment,
        degradation: Degradation,
    ) -> Self {
        Self {
            mention,
            sentiment: classification.sentiment,
            tone: classification.tone,
            intent: classification.intent,
            key_phrases: classification.key_phrases,
            risk_score: risk.risk_score,
            gemini_risk_level: risk.risk_level,
            degradation,
        }
    }

    pub fn id(&self) -> &str {
        &self.mention.id
    }
}

/// Situational context supplied with an assist request.
///
/// Shaped like [`EnrichedMention`] but every field is optional. Client records
/// vary, so each field is read on its own and a missing or wrongly typed value
/// only drops that field. `sourceType` and `authorName` are read when `source`
/// and `author` are absent, and an `author` object contributes its `name`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Value")]
pub struct MentionContext {
    pub text: Option<String>,
    pub source: Option<String>,
    pub url: Option<String>,
    pub author: Option<String>,
    pub sentiment: Option<String>,
    pub tone: Option<String>,
    pub intent: Option<String>,
    pub key_phrases: Option<Vec<String>>,
    pub risk_score: Option<RiskScore>,
    pub gemini_risk_level: Option<String>,
}

impl MentionContext {
    /// The mention text, if present and not blank.
    pub fn text(&self) -> Option<&str> {
        self.text
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

impl From<Value> for MentionContext {
    fn from(value: Value) -> Self {
        let string = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);

        Self {
            text: string("text"),
            source: string("source").or_else(|| string("sourceType")),
            url: string("url"),
            author: value
                .get("author")
                .and_then(author_name)
                .or_else(|| string("authorName")),
            sentiment: string("sentiment"),
            tone: string("tone"),
            intent: string("intent"),
            key_phrases: value.get("keyPhrases").and_then(Value::as_array).map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            }),
            risk_score: value.get("riskScore").and_then(risk_score),
            gemini_risk_level: string("geminiRiskLevel"),
        }
    }
}

fn author_name(author: &Value) -> Option<String> {
    match author {
        Value::String(name) => Some(name.clone()),
        Value::Object(fields) => fields.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn risk_score(score: &Value) -> Option<RiskScore> {
    match score {
        Value::Number(n) => n.as_f64().map(RiskScore::from),
        Value::String(s) => s.trim().parse::<f64>().ok().map(RiskScore::from),
        _ => None,
    }
}

impl From<&EnrichedMention> for MentionContext {
    fn from(enriched: &EnrichedMention) -> Self {
        Self {
            text: Some(enriched.mention.text.clone()),
            source: Some(enriched.mention.source.clone()),
            url: enriched.mention.url.clone(),
            author: enriched.mention.author.clone(),
            sentiment: Some(enriched.sentiment.to_string()),
            tone: Some(enriched.tone.clone()),
            intent: Some(enriched.intent.clone()),
            key_phrases: Some(enriched.key_phrases.clone()),
            risk_score: Some(enriched.risk_score),
            gemini_risk_level: Some(enriched.gemini_risk_level.to_string()),
        }
    }
}

/// A drafted reply plus the recommended engagement approach.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistResult {
    pub suggestion: String,
    pub strategy: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandVerification {
    pub is_brand: bool,
    pub brand_name: String,
}
