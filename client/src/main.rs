mod cli;

use anyhow::Result;
use clap::Parser;
use reqwest::Client;
use std::env;

use crate::cli::Cli;

/// - En Docker: MONITOR_URL=http://monitor:1234
/// - Local: default http://localhost:1234
fn monitor_base_url() -> String {
    env::var("MONITOR_URL").unwrap_or_else(|_| "http://localhost:1234".to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = Client::new();
    let base_url = monitor_base_url();

    cli.command.run(&client, base_url.trim_end_matches('/')).await
}
