use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use atelier_api::config::ServerConfig;
use atelier_api::router::build_app_router;
use atelier_api::state::AppState;
use atelier_core::reward::RewardWeights;
use atelier_llm::{LlmConfig, OpenAiClient};
use atelier_pipeline::generator::SYSTEM_PROMPT;
use atelier_pipeline::{
    BatchNotifier, BatchRunner, IdeaGenerator, Lifecycle, Provenance, SelectorConfig,
    WebhookNotifier,
};
use atelier_render::{RenderClient, RenderConfig};
use atelier_store::{RecordStore, RecordStoreClient, StoreSchema};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "atelier_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // Fail fast: a schema error lists every missing variable at once.
    let schema = StoreSchema::from_env().unwrap_or_else(|e| panic!("{e}"));
    let weights = RewardWeights::from_env();
    let store: Arc<dyn RecordStore> = Arc::new(RecordStoreClient::new(schema, weights));
    tracing::info!(?weights, "Record store client ready");

    let llm_config = LlmConfig::from_env().unwrap_or_else(|e| panic!("{e}"));
    let provenance = Provenance {
        model_used: Some(llm_config.model.clone()),
        system_prompt: Some(SYSTEM_PROMPT.to_string()),
    };
    let generator = IdeaGenerator::new(
        Arc::new(OpenAiClient::new(llm_config.clone())),
        llm_config.temperature,
        llm_config.max_tokens,
    );
    tracing::info!(model = %llm_config.model, "Language model client ready");

    let render_config = RenderConfig::from_env().unwrap_or_else(|e| panic!("{e}"));
    let render = Arc::new(RenderClient::new(render_config));

    let notifier = WebhookNotifier::from_env()
        .map(|n| Arc::new(n) as Arc<dyn BatchNotifier>);
    if notifier.is_some() {
        tracing::info!("Batch completion webhook configured");
    }

    let runner = BatchRunner::new(
        store.clone(),
        generator,
        notifier,
        SelectorConfig::from_env(),
    );

    let state = AppState {
        lifecycle: Arc::new(Lifecycle::new(store.clone())),
        runner: Arc::new(runner),
        render,
        provenance,
        store,
        config: Arc::new(config.clone()),
    };

    let app = build_app_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid HOST/PORT combination");
    tracing::info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind server address");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
