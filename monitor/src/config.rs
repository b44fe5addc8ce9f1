use std::{env, path::PathBuf, str::FromStr, time::Duration};

use common::{SettingsResponse, SettingsUpdate, SettingsView, DEFAULT_FLEET_CAPACITY};
use parking_lot::RwLock;
use tracing::{info, warn};

pub const DEFAULT_DATA_URL: &str = "http://10.101.20.10:3000/game-servers/daemon-states";
pub const DEFAULT_ESTOP_URL: &str = "https://ntfy.sh/ethandaemonalerts555";
pub const DEFAULT_ERROR_URL: &str = "https://ntfy.sh/ethandaemonalerts556";

/// Los tópicos sin esquema se publican en ntfy.sh
pub const NTFY_BASE_URL: &str = "https://ntfy.sh/";

pub const DEFAULT_INTERVAL_SECS: u64 = 40;
pub const MIN_INTERVAL_SECS: u64 = 5;

pub const DEFAULT_ERROR_LOG: &str = "assets/sim-errors.json";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:1234";

/// Configuración que se puede cambiar en caliente desde el formulario.
/// El poll loop la relee al principio de cada ciclo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub data_url: String,
    pub estop_url: String,
    pub error_url: String,
    pub interval: Duration,
    pub fetch_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_url: DEFAULT_DATA_URL.to_string(),
            estop_url: DEFAULT_ESTOP_URL.to_string(),
            error_url: DEFAULT_ERROR_URL.to_string(),
            interval: Duration::from_secs(DEFAULT_INTERVAL_SECS),
            fetch_enabled: true,
        }
    }
}

impl Settings {
    /// Defaults pisados por MONITOR_* si están definidas.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let interval_secs: u64 = env_or("MONITOR_INTERVAL_SECS", DEFAULT_INTERVAL_SECS);
        let interval_secs = if interval_secs < MIN_INTERVAL_SECS {
            warn!(
                "MONITOR_INTERVAL_SECS={} por debajo del mínimo, usando {}s",
                interval_secs, DEFAULT_INTERVAL_SECS
            );
            DEFAULT_INTERVAL_SECS
        } else {
            interval_secs
        };

        let fetch_enabled = env::var("MONITOR_FETCH_ENABLED")
            .ok()
            .and_then(|v| parse_flag(&v))
            .unwrap_or(defaults.fetch_enabled);

        Self {
            data_url: env::var("MONITOR_DATA_URL").unwrap_or(defaults.data_url),
            estop_url: env::var("MONITOR_ESTOP_URL")
                .map(|v| notification_url(&v))
                .unwrap_or(defaults.estop_url),
            error_url: env::var("MONITOR_ERROR_URL")
                .map(|v| notification_url(&v))
                .unwrap_or(defaults.error_url),
            interval: Duration::from_secs(interval_secs),
            fetch_enabled,
        }
    }

    pub fn view(&self) -> SettingsView {
        SettingsView {
            data_url: self.data_url.clone(),
            estop_url: self.estop_url.clone(),
            error_url: self.error_url.clone(),
            interval_secs: self.interval.as_secs(),
            fetch_enabled: self.fetch_enabled,
        }
    }

    /// Aplica un cambio y devuelve los campos rechazados.
    pub fn apply(&mut self, update: &SettingsUpdate) -> Vec<String> {
        let mut rejected = Vec::new();

        if let Some(url) = non_empty(&update.dataurl) {
            self.data_url = if url.eq_ignore_ascii_case("default") {
                DEFAULT_DATA_URL.to_string()
            } else {
                url.to_string()
            };
        }

        if let Some(topic) = non_empty(&update.estopurl) {
            self.estop_url = notification_url(topic);
        }

        if let Some(topic) = non_empty(&update.errorurl) {
            self.error_url = notification_url(topic);
        }

        if let Some(raw) = non_empty(&update.interval) {
            match raw.parse::<u64>() {
                Ok(secs) if secs >= MIN_INTERVAL_SECS => {
                    self.interval = Duration::from_secs(secs);
                }
                Ok(secs) => rejected.push(format!(
                    "interval: {}s está por debajo del mínimo de {}s",
                    secs, MIN_INTERVAL_SECS
                )),
                Err(_) => rejected.push(format!("interval: valor inválido {:?}", raw)),
            }
        }

        if let Some(raw) = non_empty(&update.fetch) {
            match parse_flag(raw) {
                Some(enabled) => self.fetch_enabled = enabled,
                None => rejected.push(format!("fetch: valor inválido {:?}", raw)),
            }
        }

        rejected
    }
}

/// Settings compartidos entre el poll loop y los handlers HTTP.
#[derive(Debug, Default)]
pub struct SettingsStore {
    inner: RwLock<Settings>,
}

impl SettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    /// Copia de la configuración vigente.
    pub fn current(&self) -> Settings {
        self.inner.read().clone()
    }

    pub fn view(&self) -> SettingsView {
        self.inner.read().view()
    }

    pub fn update(&self, update: &SettingsUpdate) -> SettingsResponse {
        let mut settings = self.inner.write();
        let rejected = settings.apply(update);

        info!(
            "configuración actualizada: data_url={} interval={:?} fetch={}",
            settings.data_url, settings.interval, settings.fetch_enabled
        );
        for reason in &rejected {
            warn!("cambio de configuración rechazado: {}", reason);
        }

        SettingsResponse {
            settings: settings.view(),
            rejected,
        }
    }
}

/// Parámetros fijos del proceso, leídos una sola vez al arrancar.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub bind_addr: String,
    pub fleet_capacity: u32,
    pub error_log_path: PathBuf,
    pub error_log_max_bytes: Option<u64>,
}

impl MonitorConfig {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env::var("MONITOR_BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            fleet_capacity: env_or("MONITOR_FLEET_CAPACITY", DEFAULT_FLEET_CAPACITY),
            error_log_path: env::var("MONITOR_ERROR_LOG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_ERROR_LOG)),
            error_log_max_bytes: env::var("MONITOR_ERROR_LOG_MAX_BYTES")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|n| *n > 0),
        }
    }
}

/// URL completa tal cual, o tópico suelto colgado de ntfy.sh.
pub fn notification_url(value: &str) -> String {
    let value = value.trim();
    if value.starts_with("http://") || value.starts_with("https://") {
        value.to_string()
    } else {
        format!("{}{}", NTFY_BASE_URL, value)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update() -> SettingsUpdate {
        SettingsUpdate::default()
    }

    #[test]
    fn campos_vacios_no_cambian_nada() {
        let mut s = Settings::default();
        let rejected = s.apply(&SettingsUpdate {
            dataurl: Some("".into()),
            estopurl: Some("   ".into()),
            ..update()
        });
        assert!(rejected.is_empty());
        assert_eq!(s, Settings::default());
    }

    #[test]
    fn topico_suelto_se_cuelga_de_ntfy() {
        let mut s = Settings::default();
        s.apply(&SettingsUpdate {
            estopurl: Some("mis-estops".into()),
            errorurl: Some("https://alerts.local/err".into()),
            ..update()
        });
        assert_eq!(s.estop_url, "https://ntfy.sh/mis-estops");
        assert_eq!(s.error_url, "https://alerts.local/err");
    }

    #[test]
    fn dataurl_default_restaura_la_url_original() {
        let mut s = Settings {
            data_url: "http://otro/tabla".into(),
            ..Settings::default()
        };
        s.apply(&SettingsUpdate {
            dataurl: Some("DEFAULT".into()),
            ..update()
        });
        assert_eq!(s.data_url, DEFAULT_DATA_URL);
    }

    #[test]
    fn interval_por_debajo_del_minimo_se_rechaza() {
        let mut s = Settings::default();
        let rejected = s.apply(&SettingsUpdate {
            interval: Some("4".into()),
            ..update()
        });
        assert_eq!(rejected.len(), 1);
        assert_eq!(s.interval, Duration::from_secs(DEFAULT_INTERVAL_SECS));

        let rejected = s.apply(&SettingsUpdate {
            interval: Some("5".into()),
            ..update()
        });
        assert!(rejected.is_empty());
        assert_eq!(s.interval, Duration::from_secs(5));
    }

    #[test]
    fn interval_no_numerico_se_rechaza() {
        let mut s = Settings::default();
        let rejected = s.apply(&SettingsUpdate {
            interval: Some("rápido".into()),
            ..update()
        });
        assert_eq!(rejected.len(), 1);
        assert_eq!(s.interval, Duration::from_secs(DEFAULT_INTERVAL_SECS));
    }

    #[test]
    fn fetch_se_puede_apagar_y_prender() {
        let store = SettingsStore::new(Settings::default());

        let resp = store.update(&SettingsUpdate {
            fetch: Some("off".into()),
            ..update()
        });
        assert!(!resp.settings.fetch_enabled);
        assert!(!store.current().fetch_enabled);

        let resp = store.update(&SettingsUpdate {
            fetch: Some("tal vez".into()),
            ..update()
        });
        assert_eq!(resp.rejected.len(), 1);
        assert!(!store.current().fetch_enabled);

        store.update(&SettingsUpdate {
            fetch: Some("ON".into()),
            ..update()
        });
        assert!(store.current().fetch_enabled);
    }
}
