mod assessment;
mod config;
mod db;
mod errors;
mod llm_client;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::assessment::evaluator::LlmEvaluator;
use crate::assessment::store::PgSubmissionStore;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing or out-of-range env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log,
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Assessment API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL-backed submission store
    let db = create_pool(&config.database_url).await?;
    let store = Arc::new(PgSubmissionStore::new(db));

    // Initialize evaluator (Claude via the single LLM client)
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    let evaluator = Arc::new(LlmEvaluator(llm));
    info!("LLM evaluator initialized (model: {})", llm_client::MODEL);

    info!(
        "Scoring policy: follow-up penalty {}%, strength threshold {:.1}, concurrency {}, timeout {}s",
        config.scoring.follow_up_penalty_percent,
        config.scoring.thresholds.strength,
        config.scoring.evaluator_concurrency,
        config.scoring.evaluation_timeout.as_secs()
    );

    let state = AppState {
        store,
        evaluator,
        scoring: config.scoring.clone(),
    };

    // TODO: restrict CORS origins once the web client's domain is fixed
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
