use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use brandpulse_pipeline::{
    AssistRequest, AssistResult, BrandVerification, EnrichedMention, VerifyBrandRequest,
};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MentionsQuery {
    pub brand_query: Option<String>,
    /// Comma-separated source names, e.g. `reddit`. All sources when absent.
    pub sources: Option<String>,
}

impl MentionsQuery {
    fn source_names(&self) -> Option<Vec<String>> {
        let names: Vec<String> = self
            .sources
            .as_deref()?
            .split(',')
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
        (!names.is_empty()).then_some(names)
    }
}

pub async fn list_mentions(
    State(state): State<AppState>,
    Query(params): Query<MentionsQuery>,
) -> Result<Json<Vec<EnrichedMention>>, ApiError> {
    let sources = params.source_names();
    let mentions = state
        .mentions
        .fetch_mentions(params.brand_query.as_deref(), sources.as_deref())
        .await?;
    Ok(Json(mentions))
}

/// Malformed or wrongly typed JSON is treated as a request with no fields, so
/// the caller gets the operation's own validation message.
fn parse_body<T: for<'de> Deserialize<'de> + Default>(body: &Bytes) -> T {
    serde_json::from_slice(body).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "unreadable request body");
        T::default()
    })
}

pub async fn assist(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AssistResult>, ApiError> {
    let request: AssistRequest = parse_body(&body);
    let result = state.assistant.assist_request(request).await?;
    Ok(Json(result))
}

pub async fn verify_brand(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<BrandVerification>, ApiError> {
    let request: VerifyBrandRequest = parse_body(&body);
    let verification = state.verifier.verify_request(request).await?;
    Ok(Json(verification))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_names_are_normalised() {
        let query = MentionsQuery {
            brand_query: Some("acme".into()),
            sources: Some(" Reddit, ,forum ".into()),
        };
        assert_eq!(
            query.source_names(),
            Some(vec!["reddit".to_string(), "forum".to_string()])
        );
    }

    #[test]
    fn empty_sources_means_all() {
        let query = MentionsQuery {
            brand_query: None,
            sources: Some(" , ".into()),
        };
        assert_eq!(query.source_names(), None);
        assert_eq!(MentionsQuery::default().source_names(), None);
    }

    #[test]
    fn malformed_body_becomes_empty_request() {
        let request: AssistRequest = parse_body(&Bytes::from_static(b"{not json"));
        assert!(request.mention_context.is_none());

        let request: VerifyBrandRequest =
            parse_body(&Bytes::from_static(br#"{"query": 42}"#));
        assert!(request.query.is_none());
    }
}
