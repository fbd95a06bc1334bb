use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use brandpulse_pipeline::{ErrorKind, PipelineError};

/// Boundary error: caller mistakes become 400, collaborator failures 500.
/// The body is always `{"error": "<message>"}`.
#[derive(Debug)]
pub struct ApiError(pub PipelineError);

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Upstream => {
                tracing::error!(error = %self.0, "request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(serde_json::json!({ "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brandpulse_pipeline::error::BRAND_QUERY_REQUIRED;

    #[test]
    fn validation_maps_to_bad_request() {
        let response = ApiError(PipelineError::validation(BRAND_QUERY_REQUIRED)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn upstream_maps_to_internal_error() {
        let response = ApiError(PipelineError::LlmEmptyResponse).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response =
            ApiError(PipelineError::MentionSource("reddit: down".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
