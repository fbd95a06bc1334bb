//! Brand verification: decide whether a search term names a real brand
//! before it is used as a mention query.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::error::{PipelineError, Result, VERIFY_QUERY_REQUIRED};
use crate::llm::{parse_json_response, LlmClient, LlmConfig, LlmRequest};
use crate::models::BrandVerification;

const SYSTEM_VERIFY_BRAND: &str = include_str!("../prompts/system_verify_brand.txt");

/// Shortest query (in characters, after trimming) accepted for verification.
const MIN_QUERY_CHARS: usize = 2;

/// Body of a verification request as received at the boundary.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VerifyBrandRequest {
    pub query: Option<String>,
}

pub struct BrandVerifier {
    client: Arc<dyn LlmClient>,
    max_tokens: u32,
    temperature: f64,
}

impl BrandVerifier {
    pub fn new(client: Arc<dyn LlmClient>, config: &LlmConfig) -> Self {
        Self {
            client,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn verify(&self, query: &str) -> Result<BrandVerification> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Err(PipelineError::validation(VERIFY_QUERY_REQUIRED));
        }

        let request = LlmRequest::single_turn(
            SYSTEM_VERIFY_BRAND,
            format!("Term: \"{query}\""),
            self.max_tokens,
            self.temperature,
        );

        let response = self.client.complete(&request).await?;
        let verification = parse_brand_verification(&response.content, query)?;

        info!(
            is_brand = verification.is_brand,
            brand_name = %verification.brand_name,
            "brand verified"
        );

        Ok(verification)
    }

    pub async fn verify_request(&self, request: VerifyBrandRequest) -> Result<BrandVerification> {
        self.verify(request.query.as_deref().unwrap_or_default())
            .await
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerificationPayload {
    is_brand: Option<bool>,
    brand_name: Option<String>,
}

/// Parse verifier output. `isBrand` is required; a missing or blank
/// `brandName` falls back to the query.
pub fn parse_brand_verification(content: &str, query: &str) -> Result<BrandVerification> {
    let payload: VerificationPayload = parse_json_response(content)?;

    let is_brand = payload.is_brand.ok_or_else(|| {
        PipelineError::LlmResponseParse("response missing boolean 'isBrand'".into())
    })?;

    let brand_name = payload
        .brand_name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| query.to_string());

    Ok(BrandVerification {
        is_brand,
        brand_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::llm::{LlmProvider, MockLlmClient};
    use pretty_assertions::assert_eq;

    fn verifier(client: Arc<MockLlmClient>) -> BrandVerifier {
        let config = LlmConfig::builder(LlmProvider::OpenAi, "test-key")
            .temperature(0.1)
            .build();
        BrandVerifier::new(client, &config)
    }

    #[test]
    fn test_parse_brand_name_falls_back_to_query() {
        let verification =
            parse_brand_verification(r#"{"isBrand": false}"#, "a funny saying").unwrap();
        assert_eq!(
            verification,
            BrandVerification {
                is_brand: false,
                brand_name: "a funny saying".into(),
            }
        );
    }

    #[test]
    fn test_parse_requires_is_brand() {
        let err = parse_brand_verification(r#"{"brandName": "Olipop"}"#, "olipop").unwrap_err();
        assert!(matches!(err, PipelineError::LlmResponseParse(_)));
    }

    #[tokio::test]
    async fn test_verify_known_brand() {
        let client = Arc::new(MockLlmClient::with_response(
            r#"{"isBrand": true, "brandName": "Olipop"}"#,
        ));
        let verification = verifier(client.clone()).verify("  olipop ").await.unwrap();

        assert!(verification.is_brand);
        assert_eq!(verification.brand_name, "Olipop");

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[0].content, "Term: \"olipop\"");
    }

    #[tokio::test]
    async fn test_short_query_is_rejected_without_call() {
        let client = Arc::new(MockLlmClient::with_response("{}"));
        let verifier = verifier(client.clone());

        for query in ["", " ", "a", " b "] {
            let err = verifier.verify(query).await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
            assert_eq!(err.to_string(), VERIFY_QUERY_REQUIRED);
        }
        let err = verifier
            .verify_request(VerifyBrandRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), VERIFY_QUERY_REQUIRED);

        assert!(client.requests().is_empty());
    }
}
