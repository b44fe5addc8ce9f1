use std::sync::Arc;

use reqwest::{header::CONTENT_TYPE, Client};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error_log::ErrorSink;
use crate::tracker::{Alert, AlertChannel};

/// Entrega best-effort: no bloquea al que llama, no reintenta.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, url: &str);
}

/// POST text/plain a un tópico tipo ntfy, en una tarea aparte.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: Client,
}

impl HttpNotifier {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl Notifier for HttpNotifier {
    fn notify(&self, message: &str, url: &str) {
        info!("enviando notificación {:?} a {}", message, url);

        let client = self.client.clone();
        let message = message.to_string();
        let url = url.to_string();

        tokio::spawn(async move {
            deliver(&client, &url, message).await;
        });
    }
}

/// Un solo intento de entrega; el resultado solo se loguea.
async fn deliver(client: &Client, url: &str, message: String) -> bool {
    let res = client
        .post(url)
        .header(CONTENT_TYPE, "text/plain")
        .body(message)
        .send()
        .await;

    match res {
        Ok(resp) if resp.status().is_success() => {
            debug!("notificación entregada en {}", url);
            true
        }
        Ok(resp) => {
            warn!("{} respondió {} a la notificación", url, resp.status());
            false
        }
        Err(e) => {
            warn!("no se pudo notificar a {}: {:?}", url, e);
            false
        }
    }
}

/// Reparte las alertas del tracker: notificación + registro en el log.
#[derive(Clone)]
pub struct AlertDispatcher {
    notifier: Arc<dyn Notifier>,
    error_log: Arc<dyn ErrorSink>,
}

impl AlertDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, error_log: Arc<dyn ErrorSink>) -> Self {
        Self {
            notifier,
            error_log,
        }
    }

    pub fn dispatch(&self, alerts: &[Alert], settings: &Settings) {
        for alert in alerts {
            let url = match alert.channel {
                AlertChannel::Estop => &settings.estop_url,
                AlertChannel::Error => &settings.error_url,
            };
            self.notifier.notify(&alert.message, url);

            if let Err(e) = self.error_log.append(&alert.record) {
                warn!(
                    "no se pudo guardar el registro de {} en el log de errores: {}",
                    alert.record.hostname, e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{closed_port_url, spawn_server, FailingSink, MemorySink, RecordingNotifier};
    use axum::{http::StatusCode, routing::post, Router};
    use parking_lot::Mutex;
    use std::time::{Duration, Instant};
    use crate::tracker::ConditionTracker;
    use common::parse_row;

    fn settings() -> Settings {
        Settings {
            estop_url: "https://ntfy.sh/estops".into(),
            error_url: "https://ntfy.sh/errores".into(),
            ..Settings::default()
        }
    }

    fn alerts_for(row: &str) -> Vec<Alert> {
        let rec = parse_row(row, "09:00:00").unwrap();
        ConditionTracker::new().observe(&rec)
    }

    #[test]
    fn cada_canal_va_a_su_url() {
        let notifier = Arc::new(RecordingNotifier::default());
        let sink = Arc::new(MemorySink::default());
        let dispatcher = AlertDispatcher::new(notifier.clone(), sink.clone());

        let alerts = alerts_for("4|x,hostZ|running|s|/ui|up|up|crashed|e|t|p|a||estop|ok");
        dispatcher.dispatch(&alerts, &settings());

        assert_eq!(
            notifier.sent(),
            vec![
                ("Sim 4 | ESTOP".to_string(), "https://ntfy.sh/estops".to_string()),
                ("hostZ | Crashed".to_string(), "https://ntfy.sh/errores".to_string()),
            ]
        );
        assert_eq!(sink.hosts(), vec!["hostZ", "hostZ"]);
    }

    #[test]
    fn fallo_del_log_no_corta_las_notificaciones() {
        let notifier = Arc::new(RecordingNotifier::default());
        let dispatcher = AlertDispatcher::new(notifier.clone(), Arc::new(FailingSink));

        let alerts = alerts_for("4|x,hostZ|running|s|/ui|failedtostart|fail|crashed|e|t|p|a||estop|ok");
        dispatcher.dispatch(&alerts, &settings());

        assert_eq!(notifier.sent().len(), 4);
    }

    type Received = Arc<Mutex<Vec<String>>>;

    async fn topic_server(status: StatusCode) -> (String, Received) {
        let received: Received = Arc::default();
        let log = received.clone();
        let app = Router::new().route(
            "/topic",
            post(move |body: String| {
                let log = log.clone();
                async move {
                    log.lock().push(body);
                    status
                }
            }),
        );
        (format!("{}/topic", spawn_server(app).await), received)
    }

    #[tokio::test]
    async fn deliver_manda_el_mensaje_como_texto() {
        let (url, received) = topic_server(StatusCode::OK).await;

        assert!(deliver(&Client::new(), &url, "Sim 4 | ESTOP".into()).await);
        assert_eq!(*received.lock(), vec!["Sim 4 | ESTOP".to_string()]);
    }

    #[tokio::test]
    async fn respuesta_no_exitosa_se_loguea_sin_reintentar() {
        let (url, received) = topic_server(StatusCode::INTERNAL_SERVER_ERROR).await;

        assert!(!deliver(&Client::new(), &url, "hostZ | Crashed".into()).await);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(received.lock().len(), 1);
    }

    #[tokio::test]
    async fn puerto_cerrado_no_rompe_la_entrega() {
        let url = closed_port_url().await;
        assert!(!deliver(&Client::new(), &url, "hostZ | DNS".into()).await);
    }

    #[tokio::test]
    async fn notify_vuelve_sin_esperar_la_entrega() {
        let url = closed_port_url().await;
        let notifier = HttpNotifier::new(Client::new());

        let started = Instant::now();
        notifier.notify("hostZ | DNS", &url);
        assert!(started.elapsed() < Duration::from_millis(50));

        // la tarea de entrega termina sola, sin panic
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
