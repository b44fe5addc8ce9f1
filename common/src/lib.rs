pub mod daemon;
pub mod settings;
pub mod status;

pub use daemon::{parse_cells, parse_row, parse_rows, DaemonRecord, RowError, CELL_DELIMITER, MIN_CELLS};
pub use settings::{SettingsResponse, SettingsUpdate, SettingsView};
pub use status::{count_active_sessions, count_idle_slots, StatusSummary, DEFAULT_FLEET_CAPACITY};
