use std::time::Duration;

use chrono::Local;
use common::parse_rows;
use tokio::time::{sleep, sleep_until, timeout, Instant};
use tracing::{info, warn};

use crate::config::Settings;
use crate::source::FetchError;
use crate::state::AppState;
use crate::store::Snapshot;

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DISABLED_BACKOFF: Duration = Duration::from_secs(90);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub rows: usize,
    pub records: usize,
    pub alerts: usize,
}

/// Loop principal de polling. No termina nunca:
/// - fetch deshabilitado → espera DISABLED_BACKOFF
/// - fetch fallido → log y se conserva el snapshot anterior
/// - el intervalo se cuenta desde el inicio del ciclo
pub async fn run_poll_loop(state: AppState) {
    loop {
        let settings = state.settings.current();

        if !settings.fetch_enabled {
            info!("fetch deshabilitado, reintento en {:?}", DISABLED_BACKOFF);
            sleep(DISABLED_BACKOFF).await;
            continue;
        }

        let started = Instant::now();
        match poll_once(&state, &settings).await {
            Ok(report) => info!(
                "ciclo ok: {} filas, {} registros, {} alertas",
                report.rows, report.records, report.alerts
            ),
            Err(e) => warn!("ciclo de polling fallido ({}): {}", settings.data_url, e),
        }

        sleep_until(started + settings.interval).await;
    }
}

/// Un ciclo: fetch → parse → tracker → snapshot.
/// Si el fetch falla no se toca ni el tracker ni el snapshot.
pub async fn poll_once(state: &AppState, settings: &Settings) -> Result<CycleReport, FetchError> {
    info!("buscando datos nuevos en {}", settings.data_url);

    let rows = timeout(FETCH_TIMEOUT, state.source.fetch_rows(&settings.data_url))
        .await
        .map_err(|_| FetchError::Timeout)??;

    let captured_at = Local::now().format("%H:%M:%S").to_string();
    let records = parse_rows(&rows, &captured_at);

    let mut alerts = 0;
    for record in &records {
        let fired = state.tracker.observe(record);
        alerts += fired.len();
        state.dispatcher.dispatch(&fired, settings);
    }

    let report = CycleReport {
        rows: rows.len(),
        records: records.len(),
        alerts,
    };

    let error_list = state.tracker.error_listing();
    state.snapshot.replace(Snapshot::build(
        records,
        state.fleet_capacity,
        error_list,
        captured_at,
    ));

    Ok(report)
}
