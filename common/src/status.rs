use serde::{Deserialize, Serialize};

use crate::daemon::DaemonRecord;
use crate::settings::SettingsView;

/// Capacidad por defecto de la flota (slots de simulador).
pub const DEFAULT_FLEET_CAPACITY: u32 = 83;

/// Sesiones activas: la tabla de origen muestra dos filas por sesión,
/// así que se cuenta la mitad de las filas con session id.
pub fn count_active_sessions(records: &[DaemonRecord]) -> u32 {
    let with_session = records.iter().filter(|r| r.has_session()).count() as u32;
    with_session / 2
}

pub fn count_idle_slots(capacity: u32, active: u32) -> u32 {
    capacity.saturating_sub(active)
}

/// Resumen que expone GET /api/v1/status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSummary {
    pub active: u32,
    pub idle: u32,
    pub records: usize,
    /// Hora del último fetch exitoso, None si todavía no hubo ninguno
    pub fetched_at: Option<String>,
    pub error_list: String,
    pub settings: SettingsView,
}
