mod api;
mod middleware;
mod scheduler;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use leadscout_engine::{FileExporter, HttpExtractor, JobOrchestrator};
use leadscout_store::{MemoryStore, Store};

use crate::{
    api::{build_app, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(leadscout_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    let extractor = Arc::new(HttpExtractor::new(
        &config.extractor_base_url,
        config.extractor_timeout_secs,
        &config.extractor_user_agent,
    )?);
    let exporter = Arc::new(FileExporter::new(config.reports_dir.clone()));
    let orchestrator = JobOrchestrator::new(Arc::clone(&store), extractor, exporter);

    let _scheduler = scheduler::build_scheduler(
        Arc::clone(&store),
        orchestrator.clone(),
        &config.sweep_schedule,
    )
    .await?;

    let auth = AuthState::from_env(matches!(
        config.env,
        leadscout_core::Environment::Development
    ))?;
    let app = build_app(
        AppState {
            store,
            orchestrator,
        },
        auth,
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "leadscout server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
