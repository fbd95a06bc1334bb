use std::time::Duration;

use thiserror::Error;

/// Literal message returned when the fetch-mentions boundary gets no brand query.
pub const BRAND_QUERY_REQUIRED: &str = "Brand query is required";

/// Literal message returned when an assist request lacks mention context or text.
pub const MENTION_CONTEXT_REQUIRED: &str = "Mention context (including text) is required";

/// Literal message returned when a brand verification query is too short.
pub const VERIFY_QUERY_REQUIRED: &str = "A valid search query is required.";

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller input violates a precondition. The message is surfaced verbatim.
    #[error("{0}")]
    Validation(String),

    #[error("LLM API request failed: {0}")]
    LlmApiRequest(#[from] reqwest::Error),

    #[error("LLM API error (status {status}): {message}")]
    LlmApiError { status: u16, message: String },

    #[error("failed to parse LLM response: {0}")]
    LlmResponseParse(String),

    #[error("LLM returned empty response")]
    LlmEmptyResponse,

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("mention source error: {0}")]
    MentionSource(String),

    #[error("enrichment batch cancelled")]
    Cancelled,
}

/// Boundary-facing classification of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-supplied input was rejected before any outbound call.
    Validation,
    /// An external collaborator failed for an operation without a fallback.
    Upstream,
}

impl PipelineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            _ => ErrorKind::Upstream,
        }
    }

    /// Whether a retry of the same outbound call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::LlmApiRequest(_) | Self::LlmEmptyResponse | Self::Timeout { .. } => true,
            Self::LlmApiError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = PipelineError::validation(BRAND_QUERY_REQUIRED);
        assert_eq!(err.to_string(), "Brand query is required");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_upstream_kinds() {
        let errors = [
            PipelineError::LlmEmptyResponse,
            PipelineError::LlmResponseParse("bad".into()),
            PipelineError::MentionSource("reddit down".into()),
            PipelineError::Cancelled,
            PipelineError::Timeout {
                operation: "assist",
                after: Duration::from_secs(1),
            },
        ];
        for err in errors {
            assert_eq!(err.kind(), ErrorKind::Upstream, "{err}");
        }
    }

    #[test]
    fn test_transient_statuses() {
        let server = PipelineError::LlmApiError {
            status: 503,
            message: "unavailable".into(),
        };
        let client = PipelineError::LlmApiError {
            status: 429,
            message: "slow down".into(),
        };
        assert!(server.is_transient());
        assert!(!client.is_transient());
    }
}
