mod client;
mod config;
mod json;

pub use client::{
    build_llm_client, AnthropicClient, LlmClient, LlmRequest, LlmResponse, Message, OpenAiClient,
    Role,
};
#[cfg(any(test, feature = "test-utils"))]
pub use client::test_support::MockLlmClient;
pub use config::{LlmConfig, LlmConfigBuilder, LlmProvider};
pub use json::{extract_json_from_response, parse_json_response};
