use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tailor_api::config::Config;
use tailor_api::llm_client::{self, AnthropicInvoker};
use tailor_api::render::pdf::HttpPdfRenderer;
use tailor_api::render::template::TemplateCache;
use tailor_api::routes::build_router;
use tailor_api::state::AppState;
use tailor_api::store::FsProfileStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.rust_log.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tailor-api v{}", env!("CARGO_PKG_VERSION"));

    let llm = Arc::new(AnthropicInvoker::new(config.anthropic_api_key.clone()));
    info!("model client initialized (model: {})", llm_client::MODEL);

    let profiles = Arc::new(FsProfileStore::new(config.profiles_dir.clone()));
    info!("profile store: {}", config.profiles_dir);

    let templates = Arc::new(TemplateCache::new(
        config.template_path.clone().map(PathBuf::from),
    ));
    let pdf = Arc::new(HttpPdfRenderer::new(config.pdf_renderer_url.clone()));
    info!("pdf renderer: {}", config.pdf_renderer_url);

    let state = AppState {
        llm,
        profiles,
        templates,
        pdf,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
