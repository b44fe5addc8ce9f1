use async_trait::async_trait;
use common::CELL_DELIMITER;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timeout esperando la tabla")]
    Timeout,

    #[error("fallo HTTP: {0}")]
    Http(String),

    #[error("conexión fallida: {0}")]
    Connection(String),

    #[error("la fuente respondió status {0}")]
    Status(u16),

    #[error("la página no tiene filas en table tbody")]
    MissingTable,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else {
            FetchError::Http(err.to_string())
        }
    }
}

/// Origen de la tabla de estados: devuelve una fila por daemon, celdas unidas con `|`.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_rows(&self, url: &str) -> Result<Vec<String>, FetchError>;
}

/// Baja la página por HTTP y saca las filas de `table tbody tr`.
/// No ejecuta JavaScript: la tabla tiene que venir en el HTML.
#[derive(Debug, Clone)]
pub struct HttpTableSource {
    client: Client,
}

impl HttpTableSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for HttpTableSource {
    async fn fetch_rows(&self, url: &str) -> Result<Vec<String>, FetchError> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        let body = resp.text().await?;
        let rows = extract_table_rows(&body);
        if rows.is_empty() {
            return Err(FetchError::MissingTable);
        }
        Ok(rows)
    }
}

/// Filas de `table tbody tr`, cada una con el texto recortado de sus celdas
/// directas (`td`/`th`) unido con `|`. El parser resuelve entidades, tags
/// opcionales sin cerrar y tablas anidadas igual que un navegador.
pub fn extract_table_rows(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(row_selector) = Selector::parse("table tbody tr") else {
        return Vec::new();
    };

    let delimiter = CELL_DELIMITER.to_string();
    document
        .select(&row_selector)
        .map(|row| {
            row_cells(row)
                .map(|cell| cell.text().collect::<String>().trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .map(|cells| cells.join(delimiter.as_str()))
        .collect()
}

// Solo hijos directos: las celdas de una tabla anidada quedan dentro del
// texto de la celda que la contiene.
fn row_cells(row: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|el| matches!(el.value().name(), "td" | "th"))
}
