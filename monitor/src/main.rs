mod config;
mod error_log;
mod handlers;
mod monitor;
mod notifier;
mod source;
mod state;
mod store;
mod tracker;

#[cfg(test)]
mod testing;

use std::{env, sync::Arc};

use anyhow::{Context, Result};
use reqwest::Client;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::{MonitorConfig, Settings};
use crate::error_log::JsonlErrorLog;
use crate::notifier::{AlertDispatcher, HttpNotifier};
use crate::source::HttpTableSource;
use crate::state::AppState;

const DEFAULT_LOG_FILTER: &str = "monitor=debug,axum=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string()))
        .init();

    info!("arrancando monitor de daemons...");

    let config = MonitorConfig::from_env();
    let settings = Settings::from_env();
    let client = Client::builder()
        .timeout(monitor::FETCH_TIMEOUT)
        .build()
        .context("no se pudo crear el cliente HTTP")?;

    let error_log = JsonlErrorLog::new(config.error_log_path.clone(), config.error_log_max_bytes);
    info!(
        "fuente={} intervalo={:?} capacidad={} log de errores={}",
        settings.data_url,
        settings.interval,
        config.fleet_capacity,
        error_log.path().display()
    );

    let dispatcher = AlertDispatcher::new(
        Arc::new(HttpNotifier::new(client.clone())),
        Arc::new(error_log),
    );

    let state = AppState::new(
        settings,
        config.fleet_capacity,
        Arc::new(HttpTableSource::new(client)),
        dispatcher,
    );

    // router HTTP
    let app = handlers::build_router(state.clone());

    // polling en segundo plano
    let poll_state = state.clone();
    tokio::spawn(async move {
        monitor::run_poll_loop(poll_state).await;
    });

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("no se pudo escuchar en {}", config.bind_addr))?;
    info!("monitor escuchando en {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
