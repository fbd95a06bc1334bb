use std::sync::Arc;

use brandpulse_pipeline::{BrandVerifier, MentionService, ResponseAssistant};

#[derive(Clone)]
pub struct AppState {
    pub mentions: Arc<MentionService>,
    pub assistant: Arc<ResponseAssistant>,
    pub verifier: Arc<BrandVerifier>,
}
