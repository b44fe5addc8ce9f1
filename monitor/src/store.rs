use std::sync::Arc;

use common::{count_active_sessions, count_idle_slots, DaemonRecord};
use parking_lot::RwLock;
use serde::Serialize;

/// Vista completa de un ciclo exitoso. Nunca se modifica, se reemplaza entera.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub records: Vec<DaemonRecord>,
    pub active: u32,
    pub idle: u32,
    pub error_list: String,
    pub fetched_at: Option<String>,
}

impl Snapshot {
    pub fn build(
        records: Vec<DaemonRecord>,
        fleet_capacity: u32,
        error_list: String,
        fetched_at: String,
    ) -> Self {
        let active = count_active_sessions(&records);
        Self {
            idle: count_idle_slots(fleet_capacity, active),
            active,
            records,
            error_list,
            fetched_at: Some(fetched_at),
        }
    }
}

/// Último snapshot. Los lectores se quedan con un `Arc` y nunca ven uno a medias.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Arc<Snapshot>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, snapshot: Snapshot) {
        *self.current.write() = Arc::new(snapshot);
    }

    pub fn read(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }
}
