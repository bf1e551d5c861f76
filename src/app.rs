use std::sync::{Arc, Mutex};

use actix_web::web;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::session_store::SessionStore;
use crate::interfaces::http::{add_log, start_server, HttpState};

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Periodically drop sessions idle past their TTL
fn spawn_session_sweeper(store: Arc<SessionStore>, every: std::time::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            store.sweep_expired();
        }
    });
}

pub async fn run() -> Result<()> {
    let config = match AppConfig::load_with_dotenv() {
        Ok(config) => config,
        Err(err) => {
            init_tracing("info");
            error!("{}", err);
            return Err(err);
        }
    };
    init_tracing(config.log_filter());

    let store = Arc::new(SessionStore::new(config.session_ttl()));
    info!(ttl_secs = store.ttl().as_secs(), "Session store ready");
    spawn_session_sweeper(store.clone(), config.sweep_interval());

    let logs = Arc::new(Mutex::new(Vec::new()));
    let (host, port) = config.bind_address();
    add_log(
        &logs,
        "INFO",
        "Server",
        &format!("Listening on http://{}:{}", host, port),
    );

    let state = web::Data::new(HttpState::new(config, store, logs));
    let server = start_server(state)
        .map_err(|e| AppError::Internal(format!("Failed to bind {}:{}: {}", host, port, e)))?;

    server.await?;
    info!("Server stopped");
    Ok(())
}
