use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Separador entre celdas de una fila de la tabla de daemons.
pub const CELL_DELIMITER: char = '|';

/// Cantidad mínima de columnas para aceptar una fila.
pub const MIN_CELLS: usize = 15;

/// Estado de un daemon tal como se vio en un ciclo de polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonRecord {
    pub number: i64,
    pub hostname: String,
    pub status: String,
    pub session_id: String,
    pub ui_path: String,
    pub server: String,
    pub client: String,
    /// Estado del motor de simulación
    pub r_factor: String,
    pub difficulty: String,
    pub track: String,
    pub phase: String,
    pub applied: String,
    pub error: String,
    pub state: String,
    pub last: String,
    /// Hora de captura (HH:MM:SS), la misma para todo el ciclo
    pub timestamp: String,
}

impl DaemonRecord {
    pub fn has_session(&self) -> bool {
        !self.session_id.is_empty()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("fila con {found} columnas (mínimo {min})", min = MIN_CELLS)]
    TooFewCells { found: usize },

    #[error("celda de hostname sin coma: {0:?}")]
    MissingHostname(String),
}

/// Convierte una fila cruda (celdas separadas por `|`) en un `DaemonRecord`.
///
/// - menos de 15 celdas → `RowError::TooFewCells`
/// - número inválido → 0, no aborta la fila
/// - hostname: todo lo que sigue a la primera coma de la celda compuesta
pub fn parse_row(row: &str, captured_at: &str) -> Result<DaemonRecord, RowError> {
    let cells: Vec<&str> = row.split(CELL_DELIMITER).collect();
    parse_cells(&cells, captured_at)
}

pub fn parse_cells(cells: &[&str], captured_at: &str) -> Result<DaemonRecord, RowError> {
    if cells.len() < MIN_CELLS {
        return Err(RowError::TooFewCells { found: cells.len() });
    }

    Ok(DaemonRecord {
        number: parse_number(cells[0]),
        hostname: trim_hostname(cells[1])?,
        status: cells[2].to_string(),
        session_id: cells[3].to_string(),
        ui_path: cells[4].to_string(),
        server: cells[5].to_string(),
        client: cells[6].to_string(),
        r_factor: cells[7].to_string(),
        difficulty: cells[8].to_string(),
        track: cells[9].to_string(),
        phase: cells[10].to_string(),
        applied: cells[11].to_string(),
        error: cells[12].to_string(),
        state: cells[13].to_string(),
        last: cells[14].to_string(),
        timestamp: captured_at.to_string(),
    })
}

/// Parsea todas las filas de un ciclo descartando las mal formadas.
pub fn parse_rows<S: AsRef<str>>(rows: &[S], captured_at: &str) -> Vec<DaemonRecord> {
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match parse_row(row.as_ref(), captured_at) {
            Ok(rec) => records.push(rec),
            Err(e) => debug!("descartando fila: {}", e),
        }
    }
    records
}

fn parse_number(value: &str) -> i64 {
    value.trim().parse::<i64>().unwrap_or(0)
}

fn trim_hostname(compound: &str) -> Result<String, RowError> {
    compound
        .split_once(',')
        .map(|(_, host)| host.to_string())
        .ok_or_else(|| RowError::MissingHostname(compound.to_string()))
}
