//! Server entry point.
//!
//! # Responsibility
//! - Load configuration, start logging, and open the database once.
//! - Serve the router until Ctrl-C, then drain in-flight requests.

use anyhow::{Context, Result};
use log::{info, warn};
use todo_core::db::open_db;
use todo_core::init_logging;
use todo_server::{build_router, AppState, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env().context("invalid server configuration")?;

    init_logging(&config.log_level, &config.log_dir.to_string_lossy())
        .map_err(anyhow::Error::msg)
        .context("failed to initialize logging")?;

    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open database `{}`", config.db_path.display()))?;
    let app = build_router(AppState::new(conn));

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("event=server_start module=server status=ok addr={addr}");
    println!("todo_server running on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("event=shutdown_signal module=server status=error error={err}");
        std::future::pending::<()>().await;
    }
}
