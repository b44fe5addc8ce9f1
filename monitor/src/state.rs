// monitor/src/state.rs

use std::sync::Arc;

use crate::{
    config::{Settings, SettingsStore},
    notifier::AlertDispatcher,
    source::DataSource,
    store::SnapshotStore,
    tracker::SharedTracker,
};

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<SettingsStore>,
    pub snapshot: Arc<SnapshotStore>,
    // solo lo toca el poll loop; los handlers leen el snapshot
    pub tracker: Arc<SharedTracker>,
    pub source: Arc<dyn DataSource>,
    pub dispatcher: AlertDispatcher,
    pub fleet_capacity: u32,
}

impl AppState {
    pub fn new(
        settings: Settings,
        fleet_capacity: u32,
        source: Arc<dyn DataSource>,
        dispatcher: AlertDispatcher,
    ) -> Self {
        Self {
            settings: Arc::new(SettingsStore::new(settings)),
            snapshot: Arc::new(SnapshotStore::new()),
            tracker: Arc::new(SharedTracker::new()),
            source,
            dispatcher,
            fleet_capacity,
        }
    }
}
