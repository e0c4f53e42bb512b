mod config;
mod connectors;
mod documents;
mod errors;
mod llm_client;
mod mail;
mod models;
mod recovery;
mod routes;
mod state;
mod tasks;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::sync::Arc;

use crate::config::{Config, ConfigSource, EnvSource};
use crate::connectors::{ClientCache, ClientFactory, Registry};
use crate::documents::{PdfLatexRenderer, PdfTextExtractor};
use crate::mail::{GmailSender, MailSender};
use crate::recovery::{DecisionEngine, RetryOrchestrator};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (also loads .env for the connector keys)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting GenApply API v{}", env!("CARGO_PKG_VERSION"));

    // Connector parameters are read from the environment on every build
    let source: Arc<dyn ConfigSource> = Arc::new(EnvSource);
    let factory = ClientFactory::new(Registry::with_builtins(), source.clone());
    let cache = Arc::new(ClientCache::new(factory));
    info!("Connector cache initialized");

    // Without a decision engine, failures are reported without recovery
    let engine = match DecisionEngine::from_config(source.as_ref()) {
        Ok(engine) => {
            info!("Diagnostic engine initialized");
            Some(Arc::new(engine))
        }
        Err(e) => {
            error!("Failed to initialize diagnostic engine, automatic recovery disabled: {e}");
            None
        }
    };
    let orchestrator = Arc::new(RetryOrchestrator::new(
        cache.clone(),
        engine,
        config.diagnostic_delay,
    ));
    info!(
        "Retry orchestrator ready (default delay: {}s)",
        config.diagnostic_delay.as_secs()
    );

    let mailer: Option<Arc<dyn MailSender>> = match GmailSender::from_config(&config)? {
        Some(sender) => {
            info!("Gmail sender initialized");
            Some(Arc::new(sender))
        }
        None => {
            warn!("GMAIL_ACCESS_TOKEN not set, the email task will fail");
            None
        }
    };

    // Build app state
    let state = AppState {
        config: config.clone(),
        cache,
        orchestrator,
        renderer: Arc::new(PdfLatexRenderer::new(config.pdflatex_bin.clone())),
        extractor: Arc::new(PdfTextExtractor),
        mailer,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
