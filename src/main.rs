use anyhow::Context;
use dotenvy::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use sanjeevani::app_state::AppState;
use sanjeevani::config::Config;
use sanjeevani::db::pool::open_store;
use sanjeevani::utils::logging::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let config = Config::from_env()?;
    let _log_guard = init_tracing(&config);

    let store = open_store(&config).await.context("Failed to open the booking store")?;
    if config.slot_guard {
        info!("🔒 Slot guard enabled: bookings and approvals are serialized per slot");
    } else {
        warn!("Slot guard disabled: concurrent approvals can double-book a slot");
    }

    let addr = config.bind_addr;
    let state = AppState::new(store.clone(), config);
    let app = sanjeevani::app(state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(backend = store.backend(), "🚀 Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server encountered an error")?;

    info!("🛠️ Closing booking store...");
    store.close().await;
    info!("✅ Shutdown complete.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down...");
}
