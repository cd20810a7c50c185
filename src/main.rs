use dotenvy::dotenv;
use grammar_analyzer::config::AppConfig;
use grammar_analyzer::infrastructure::{qa, staging};
use grammar_analyzer::services::session::AnalysisService;
use grammar_analyzer::{AppState, create_app};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing with EnvFilter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grammar_analyzer=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Grammar Analyzer...");

    let config = AppConfig::from_env();
    info!(
        "📄 Upload Config: Max Size={}MB, Types={}",
        config.max_file_size / 1024 / 1024,
        config.allowed_extensions.join(",")
    );

    // Setup Infrastructure
    let staging_store = staging::setup_staging(&config);
    let qa_service = qa::setup_qa_service(&config.qa)?;

    let analysis = Arc::new(AnalysisService::new(
        staging_store.clone(),
        qa_service,
        &config,
    ));

    // Leftovers from a previous run are not part of any session
    for notice in analysis.clear_staging().await {
        warn!("🧹 {}", notice.message);
    }

    let addr = config.bind_addr;
    let state = AppState {
        staging: staging_store,
        analysis,
        config,
    };

    let app = create_app(state);

    info!("✅ Server ready at http://{}", addr);
    info!("📖 Swagger UI: http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
