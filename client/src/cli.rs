use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use common::{DaemonRecord, SettingsResponse, SettingsUpdate, StatusSummary};
use reqwest::Client;

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "CLI simple para consultar y configurar el monitor de daemons")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Contadores, último fetch y listado de errores
    Status,

    /// Registros del último ciclo
    Data {
        /// Filtra por substring del hostname
        #[arg(long)]
        host: Option<String>,
    },

    /// Cambia la configuración del monitor
    Settings {
        /// URL de la tabla de daemons ("default" para la original)
        #[arg(long, value_name = "URL")]
        data_url: Option<String>,

        /// Tópico ntfy o URL completa para estops
        #[arg(long, value_name = "TOPICO")]
        estop: Option<String>,

        /// Tópico ntfy o URL completa para errores
        #[arg(long, value_name = "TOPICO")]
        error: Option<String>,

        /// Segundos entre ciclos (mínimo 5)
        #[arg(long, value_name = "SEGUNDOS")]
        interval: Option<u64>,

        /// on / off
        #[arg(long, value_name = "on|off")]
        fetch: Option<String>,
    },
}

impl Commands {
    pub async fn run(self, client: &Client, base_url: &str) -> Result<()> {
        match self {
            Commands::Status => {
                let url = format!("{}/api/v1/status", base_url);
                let resp = client.get(&url).send().await?;
                if !resp.status().is_success() {
                    bail!("el monitor respondió {}", resp.status());
                }
                let summary: StatusSummary = resp.json().await?;

                println!("Monitor:");
                println!("  activos: {}", summary.active);
                println!("  libres: {}", summary.idle);
                println!("  registros: {}", summary.records);
                println!(
                    "  último fetch: {}",
                    summary.fetched_at.as_deref().unwrap_or("(ninguno)")
                );
                println!(
                    "  fetch: {}",
                    if summary.settings.fetch_enabled { "on" } else { "off" }
                );
                if summary.error_list.is_empty() {
                    println!("Sin errores activos");
                } else {
                    println!("Errores:");
                    for line in summary.error_list.lines() {
                        println!("  {}", line);
                    }
                }
            }
            Commands::Data { host } => {
                let url = format!("{}/data", base_url);
                let resp = client.get(&url).send().await?;
                if !resp.status().is_success() {
                    bail!("el monitor respondió {}", resp.status());
                }
                let records: Vec<DaemonRecord> = resp.json().await?;

                for rec in filter_records(&records, host.as_deref()) {
                    println!("{}", format_record(rec));
                }
            }
            Commands::Settings {
                data_url,
                estop,
                error,
                interval,
                fetch,
            } => {
                let update = SettingsUpdate {
                    dataurl: data_url,
                    estopurl: estop,
                    errorurl: error,
                    interval: interval.map(|s| s.to_string()),
                    fetch,
                };

                let url = format!("{}/api/v1/settings", base_url);
                let resp = client
                    .post(&url)
                    .json(&update)
                    .send()
                    .await
                    .context("no se pudo enviar la configuración")?;
                let out: SettingsResponse = resp.json().await?;

                println!("Configuración:");
                println!("  datos: {}", out.settings.data_url);
                println!("  estop: {}", out.settings.estop_url);
                println!("  errores: {}", out.settings.error_url);
                println!("  intervalo: {}s", out.settings.interval_secs);
                println!(
                    "  fetch: {}",
                    if out.settings.fetch_enabled { "on" } else { "off" }
                );
                for reason in out.rejected {
                    println!("  rechazado: {}", reason);
                }
            }
        }

        Ok(())
    }
}

pub fn filter_records<'a>(records: &'a [DaemonRecord], host: Option<&str>) -> Vec<&'a DaemonRecord> {
    records
        .iter()
        .filter(|r| host.map_or(true, |h| r.hostname.contains(h)))
        .collect()
}

pub fn format_record(rec: &DaemonRecord) -> String {
    format!(
        "{:>3} {:<16} {:<10} server={} client={} sim={} state={} [{}]",
        rec.number, rec.hostname, rec.status, rec.server, rec.client, rec.r_factor, rec.state, rec.timestamp
    )
}
