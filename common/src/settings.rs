use serde::{Deserialize, Serialize};

/// Configuración actual del monitor, tal como la ven los clientes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsView {
    pub data_url: String,
    pub estop_url: String,
    pub error_url: String,
    pub interval_secs: u64,
    pub fetch_enabled: bool,
}

/// Cambios pedidos desde el formulario o desde la CLI.
///
/// Los nombres de campo son los del formulario HTML (`dataurl`, `estopurl`...).
/// Un campo ausente o vacío deja el valor actual.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsUpdate {
    #[serde(default)]
    pub dataurl: Option<String>,
    #[serde(default)]
    pub estopurl: Option<String>,
    #[serde(default)]
    pub errorurl: Option<String>,
    /// Segundos, como texto (viene así del formulario)
    #[serde(default)]
    pub interval: Option<String>,
    /// "on" / "off" / "true" / "false"
    #[serde(default)]
    pub fetch: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsResponse {
    pub settings: SettingsView,
    /// Campos que no se aplicaron y por qué
    pub rejected: Vec<String>,
}
