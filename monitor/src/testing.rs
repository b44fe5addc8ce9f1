// Dobles de prueba compartidos por los tests del crate.

use std::{
    io,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::Router;
use common::DaemonRecord;
use parking_lot::Mutex;
use tokio::net::TcpListener;

use crate::config::Settings;
use crate::error_log::{ErrorLogError, ErrorSink};
use crate::notifier::{AlertDispatcher, Notifier};
use crate::source::{DataSource, FetchError};
use crate::state::AppState;

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, url: &str) {
        self.sent.lock().push((message.to_string(), url.to_string()));
    }
}

#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<DaemonRecord>>,
}

impl MemorySink {
    pub fn hosts(&self) -> Vec<String> {
        self.records.lock().iter().map(|r| r.hostname.clone()).collect()
    }
}

impl ErrorSink for MemorySink {
    fn append(&self, record: &DaemonRecord) -> Result<(), ErrorLogError> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

pub struct FailingSink;

impl ErrorSink for FailingSink {
    fn append(&self, _record: &DaemonRecord) -> Result<(), ErrorLogError> {
        Err(ErrorLogError::Io {
            path: "/sin/permiso".into(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denegado"),
        })
    }
}

/// Fuente que devuelve lo que se le cargue en cada ciclo.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    next: Mutex<Option<Result<Vec<String>, String>>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn set_rows(&self, rows: &[&str]) {
        *self.next.lock() = Some(Ok(rows.iter().map(|r| r.to_string()).collect()));
    }

    pub fn set_failure(&self, reason: &str) {
        *self.next.lock() = Some(Err(reason.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataSource for ScriptedSource {
    async fn fetch_rows(&self, _url: &str) -> Result<Vec<String>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.next.lock().clone();
        match next {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(reason)) => Err(FetchError::Http(reason)),
            None => Err(FetchError::MissingTable),
        }
    }
}

/// AppState con fuente, notificador y log de errores falsos.
pub fn test_state(
    source: Arc<dyn DataSource>,
) -> (AppState, Arc<RecordingNotifier>, Arc<MemorySink>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let sink = Arc::new(MemorySink::default());
    let dispatcher = AlertDispatcher::new(notifier.clone(), sink.clone());
    let state = AppState::new(Settings::default(), 83, source, dispatcher);
    (state, notifier, sink)
}

/// Levanta un router en 127.0.0.1 con puerto libre y devuelve su URL base.
pub async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

/// URL de un puerto que quedó cerrado: cualquier conexión se rechaza.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
