use axum::{
    extract::State,
    response::Html,
    routing::get,
    Form, Json, Router,
};
use common::{DaemonRecord, SettingsResponse, SettingsUpdate, SettingsView, StatusSummary};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::store::Snapshot;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index).post(update_settings_form))
        .route("/settings", get(settings_page))
        .route("/health", get(health))
        .route("/data", get(get_data))
        .route("/api/v1/status", get(get_status))
        .route(
            "/api/v1/settings",
            get(get_settings).post(update_settings_json),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/* ---------------- handlers HTTP ---------------- */

async fn health() -> &'static str {
    "ok"
}

// Registros del último ciclo exitoso
async fn get_data(State(state): State<AppState>) -> Json<Vec<DaemonRecord>> {
    Json(state.snapshot.read().records.clone())
}

async fn get_status(State(state): State<AppState>) -> Json<StatusSummary> {
    let snap = state.snapshot.read();
    Json(StatusSummary {
        active: snap.active,
        idle: snap.idle,
        records: snap.records.len(),
        fetched_at: snap.fetched_at.clone(),
        error_list: snap.error_list.clone(),
        settings: state.settings.view(),
    })
}

async fn get_settings(State(state): State<AppState>) -> Json<SettingsView> {
    Json(state.settings.view())
}

async fn update_settings_json(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Json<SettingsResponse> {
    Json(state.settings.update(&update))
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render_index(&state.snapshot.read(), &state.settings.view(), &[]))
}

async fn settings_page(State(state): State<AppState>) -> Html<String> {
    Html(render_settings(&state.settings.view()))
}

// POST del formulario de settings; vuelve a mostrar el dashboard
async fn update_settings_form(
    State(state): State<AppState>,
    Form(update): Form<SettingsUpdate>,
) -> Html<String> {
    let resp = state.settings.update(&update);
    Html(render_index(&state.snapshot.read(), &resp.settings, &resp.rejected))
}

/* ---------------- HTML ---------------- */

fn render_index(snap: &Snapshot, settings: &SettingsView, notices: &[String]) -> String {
    let mut notices_html = String::new();
    for n in notices {
        notices_html.push_str(&format!("<p class=\"notice\">{}</p>\n", escape(n)));
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Daemon Monitor</title></head>
<body>
<h1>Daemon Monitor</h1>
{notices}<ul>
  <li>Activos: <span id="active">{active}</span></li>
  <li>Libres: <span id="idle">{idle}</span></li>
  <li>Último fetch: <span id="datatime">{datatime}</span></li>
</ul>
<h2>Errores</h2>
<pre id="errorlist">{errors}</pre>
<h2>Configuración</h2>
<ul>
  <li>Datos: {data_url}</li>
  <li>Estop: {estop_url}</li>
  <li>Errores: {error_url}</li>
  <li>Intervalo: {interval}s</li>
  <li>Fetch: {fetch}</li>
</ul>
<p><a href="/settings">Cambiar configuración</a> · <a href="/data">JSON</a></p>
</body>
</html>
"#,
        notices = notices_html,
        active = snap.active,
        idle = snap.idle,
        datatime = escape(snap.fetched_at.as_deref().unwrap_or("-")),
        errors = escape(&snap.error_list),
        data_url = escape(&settings.data_url),
        estop_url = escape(&settings.estop_url),
        error_url = escape(&settings.error_url),
        interval = settings.interval_secs,
        fetch = if settings.fetch_enabled { "on" } else { "off" },
    )
}

fn render_settings(settings: &SettingsView) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Daemon Monitor - Configuración</title></head>
<body>
<h1>Configuración</h1>
<form method="post" action="/">
  <label>URL de datos (o "default") <input name="dataurl" placeholder="{data_url}"></label><br>
  <label>Tópico o URL de estops <input name="estopurl" placeholder="{estop_url}"></label><br>
  <label>Tópico o URL de errores <input name="errorurl" placeholder="{error_url}"></label><br>
  <label>Intervalo en segundos (mínimo 5) <input name="interval" placeholder="{interval}"></label><br>
  <label>Fetch <select name="fetch">
    <option value="">sin cambios ({fetch})</option>
    <option value="on">on</option>
    <option value="off">off</option>
  </select></label><br>
  <button type="submit">Guardar</button>
</form>
</body>
</html>
"#,
        data_url = escape(&settings.data_url),
        estop_url = escape(&settings.estop_url),
        error_url = escape(&settings.error_url),
        interval = settings.interval_secs,
        fetch = if settings.fetch_enabled { "on" } else { "off" },
    )
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
