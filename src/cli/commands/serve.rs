//! `serve` command: run the dashboard API server.

use crate::config::Settings;
use crate::server;

pub async fn run(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    server::serve(settings, host, port).await
}
