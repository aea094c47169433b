use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ocrd::api::{create_router, AppState};
use ocrd::config::Config;
use ocrd::egress::EgressPolicy;
use ocrd::ocr::{RecognitionEngine, TesseractEngine};

#[derive(Parser)]
#[command(name = "ocrd")]
#[command(about = "Stateless HTTP text recognition service")]
struct Args {
    /// Listen address, overrides OCRD_HOST
    #[arg(long)]
    host: Option<String>,

    /// Listen port, overrides OCRD_PORT
    #[arg(long)]
    port: Option<u16>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ocrd=info,tower_http=debug".into());
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let mut config = Config::from_env();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing::info!(
        trusted_domains = config.egress.trusted_domains.len(),
        proxied = config.egress.proxy_url.is_some(),
        "Initializing egress policy..."
    );
    let egress = Arc::new(EgressPolicy::from_config(&config.egress)?);

    tracing::info!("Initializing tesseract...");
    let engine = TesseractEngine::new(&config.ocr);
    if !engine.is_available() {
        tracing::warn!("OCR unavailable - every item will fail with Recognition Failed");
    }
    let engine: Arc<dyn RecognitionEngine> = Arc::new(engine);
    tracing::info!(
        revisions = ?engine.revisions(),
        default = %engine.default_revision(),
        "Recognition engine ready"
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(config, egress, engine);
    let app = create_router(state);

    tracing::info!("ocrd starting on http://{}", addr);
    tracing::info!("  API docs:     http://{}/docs", addr);
    tracing::info!("  OpenAPI spec: http://{}/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("ocrd stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
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

    tracing::info!("Shutdown signal received, draining connections...");
}
