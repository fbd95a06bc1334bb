use std::sync::Arc;

use brandpulse_pipeline::llm::{build_llm_client, LlmConfig};
use brandpulse_pipeline::{
    AssistConfig, BrandVerifier, EnrichmentConfig, EnrichmentPipeline, LlmClassifier,
    LlmRiskAssessor, MentionEnricher, MentionService, PipelineError, RedditConfig, RedditSource,
    ResponseAssistant, SourceRegistry,
};
use tracing_subscriber::EnvFilter;

use brandpulse_api::{router, AppConfig, AppState};

const ASSIST_TEMPERATURE: f64 = 0.7;
const VERIFY_TEMPERATURE: f64 = 0.1;

fn exit_on_error<T>(result: Result<T, PipelineError>, what: &str) -> T {
    result.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to configure {what}");
        std::process::exit(1);
    })
}

fn build_state() -> AppState {
    let classifier_llm = exit_on_error(LlmConfig::from_env("CLASSIFIER"), "classifier");
    let risk_llm = exit_on_error(LlmConfig::from_env("RISK"), "risk assessor");
    let assist_llm = exit_on_error(
        LlmConfig::from_env_with_temperature("ASSIST", ASSIST_TEMPERATURE),
        "response assistant",
    );
    let verify_llm = exit_on_error(
        LlmConfig::from_env_with_temperature("VERIFY", VERIFY_TEMPERATURE),
        "brand verifier",
    );

    let enrichment_config = EnrichmentConfig::from_env();
    tracing::info!(
        max_concurrent_calls = enrichment_config.max_concurrent_calls,
        call_timeout_secs = enrichment_config.call_timeout.as_secs(),
        "enrichment configured"
    );

    let classifier = LlmClassifier::new(
        exit_on_error(build_llm_client(&classifier_llm), "classifier"),
        &classifier_llm,
    );
    let risk_assessor = LlmRiskAssessor::new(
        exit_on_error(build_llm_client(&risk_llm), "risk assessor"),
        &risk_llm,
    );
    let enricher = MentionEnricher::new(
        Arc::new(classifier),
        Arc::new(risk_assessor),
        &enrichment_config,
    );
    let pipeline = EnrichmentPipeline::new(enricher, &enrichment_config);

    let mut registry = SourceRegistry::new();
    match RedditConfig::from_env() {
        Some(reddit_config) => {
            let source = exit_on_error(RedditSource::new(reddit_config), "reddit source");
            registry = registry.register(Arc::new(source));
        }
        None => tracing::warn!("REDDIT_CLIENT_ID not set, reddit source disabled"),
    }
    if registry.is_empty() {
        tracing::warn!("no mention sources configured, /api/mentions will return empty lists");
    } else {
        tracing::info!(sources = ?registry.names(), "mention sources configured");
    }

    let assistant = ResponseAssistant::new(
        exit_on_error(build_llm_client(&assist_llm), "response assistant"),
        &assist_llm,
        &AssistConfig::from_env(),
    );
    let verifier = BrandVerifier::new(
        exit_on_error(build_llm_client(&verify_llm), "brand verifier"),
        &verify_llm,
    );

    AppState {
        mentions: Arc::new(MentionService::new(registry, pipeline)),
        assistant: Arc::new(assistant),
        verifier: Arc::new(verifier),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let app_config = AppConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "invalid configuration");
        std::process::exit(1);
    });

    let app = router(build_state());

    let addr = app_config.bind_addr;
    tracing::info!("listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to bind on {addr}");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
