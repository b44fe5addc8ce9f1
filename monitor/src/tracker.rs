use std::collections::{BTreeMap, BTreeSet};

use common::DaemonRecord;
use parking_lot::RwLock;
use tracing::debug;

/// Substring del campo `state` que indica parada de emergencia.
pub const ESTOP_MARKER: &str = "estop";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    ServerFailed,
    Crashed,
    Dns,
}

impl ErrorCategory {
    /// Orden fijo de evaluación. Si hay varias a la vez, la última gana.
    pub const CHECK_ORDER: [ErrorCategory; 3] = [
        ErrorCategory::ServerFailed,
        ErrorCategory::Crashed,
        ErrorCategory::Dns,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::ServerFailed => "server failed",
            ErrorCategory::Crashed => "crashed",
            ErrorCategory::Dns => "dns",
        }
    }

    fn marker(self) -> &'static str {
        match self {
            ErrorCategory::ServerFailed => "failedtostart",
            ErrorCategory::Crashed => "crashed",
            ErrorCategory::Dns => "fail",
        }
    }

    fn field(self, record: &DaemonRecord) -> &str {
        match self {
            ErrorCategory::ServerFailed => &record.server,
            ErrorCategory::Crashed => &record.r_factor,
            ErrorCategory::Dns => &record.client,
        }
    }

    fn notice(self) -> &'static str {
        match self {
            ErrorCategory::ServerFailed => "Server Failed",
            ErrorCategory::Crashed => "Crashed",
            ErrorCategory::Dns => "DNS",
        }
    }

    fn is_present(self, record: &DaemonRecord) -> bool {
        self.field(record).to_lowercase().contains(self.marker())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertChannel {
    Estop,
    Error,
}

/// Entrada a una condición: hay que notificar y guardar el registro.
#[derive(Debug, Clone)]
pub struct Alert {
    pub channel: AlertChannel,
    pub message: String,
    pub record: DaemonRecord,
}

/// Condiciones activas por host.
///
/// Que un host esté en un mapa significa que ya se notificó la entrada y
/// todavía no se vio la salida; se borra al despejarse, así la próxima
/// entrada vuelve a notificar.
#[derive(Debug, Default)]
pub struct ConditionTracker {
    estop_active: BTreeSet<String>,
    error_category: BTreeMap<String, ErrorCategory>,
}

impl ConditionTracker {
    #[cfg(test)]
    pub fn new() -> Self {
        Self::default()
    }

    /// Evalúa un registro y devuelve las alertas por transiciones de entrada.
    pub fn observe(&mut self, record: &DaemonRecord) -> Vec<Alert> {
        let mut alerts = Vec::new();
        self.check_estop(record, &mut alerts);
        self.check_errors(record, &mut alerts);
        alerts
    }

    fn check_estop(&mut self, record: &DaemonRecord, alerts: &mut Vec<Alert>) {
        let host = &record.hostname;
        let has_estop = record.state.contains(ESTOP_MARKER);
        let already = self.estop_active.contains(host);

        if has_estop && !already {
            alerts.push(Alert {
                channel: AlertChannel::Estop,
                message: format!("Sim {} | ESTOP", record.number),
                record: record.clone(),
            });
            self.estop_active.insert(host.clone());
        } else if !has_estop && already {
            debug!("estop despejado en {}", host);
            self.estop_active.remove(host);
        }
    }

    // Los tres chequeos comparan contra la categoría que había antes de
    // empezar, no contra la que deja el chequeo anterior.
    fn check_errors(&mut self, record: &DaemonRecord, alerts: &mut Vec<Alert>) {
        let host = &record.hostname;
        let previous = self.error_category.get(host).copied();

        for category in ErrorCategory::CHECK_ORDER {
            let present = category.is_present(record);
            let recorded = previous == Some(category);

            if present && !recorded {
                alerts.push(Alert {
                    channel: AlertChannel::Error,
                    message: format!("{} | {}", host, category.notice()),
                    record: record.clone(),
                });
                self.error_category.insert(host.clone(), category);
            } else if !present && recorded {
                debug!("{} despejado en {}", category.label(), host);
                self.error_category.remove(host);
            }
        }
    }

    #[cfg(test)]
    pub fn is_estop_active(&self, host: &str) -> bool {
        self.estop_active.contains(host)
    }

    #[cfg(test)]
    pub fn error_category(&self, host: &str) -> Option<ErrorCategory> {
        self.error_category.get(host).copied()
    }

    /// Listado legible: primero los estops, después los errores.
    pub fn error_listing(&self) -> String {
        let mut out = String::new();
        for host in &self.estop_active {
            out.push_str(&format!("{} | ESTOP\n", host));
        }
        for (host, category) in &self.error_category {
            out.push_str(&format!("{} | {}\n", host, category.label().to_uppercase()));
        }
        out
    }
}

/// Tracker compartido por todo el proceso.
/// Escritura exclusiva por registro, lectura compartida para el listado.
#[derive(Debug, Default)]
pub struct SharedTracker {
    inner: RwLock<ConditionTracker>,
}

impl SharedTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self, record: &DaemonRecord) -> Vec<Alert> {
        self.inner.write().observe(record)
    }

    pub fn error_listing(&self) -> String {
        self.inner.read().error_listing()
    }

    #[cfg(test)]
    pub fn with<R>(&self, f: impl FnOnce(&ConditionTracker) -> R) -> R {
        f(&self.inner.read())
    }
}
