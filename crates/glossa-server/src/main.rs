//! The `glossa-server` binary.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use glossa_telemetry::{LogConfig, LogFormat, setup_logging};
use tracing::info;

/// Glossa translation server: one language pair over WebSocket.
#[derive(Debug, Parser)]
#[command(name = "glossa-server", version, about)]
struct Cli {
    /// Path of the server configuration file.
    #[arg(long, env = "GLOSSA_SERVER_CONFIG")]
    config: PathBuf,

    /// Default log level directive.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit JSON log lines instead of human-readable output.
    #[arg(long)]
    log_json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    setup_logging(&LogConfig::new(&cli.log_level).with_format(format))
        .context("logging setup failed")?;

    let config =
        glossa_config::load_server_config(&cli.config).context("server configuration")?;

    let runtime = tokio::runtime::Runtime::new().context("tokio runtime")?;
    runtime.block_on(async move {
        let running = glossa_server::start(config).await.context("server startup")?;
        info!(addr = %running.local_addr, "translation server running");

        tokio::signal::ctrl_c().await.context("signal handler")?;
        info!("shutdown requested");
        running.shutdown.cancel();
        running.task.await?.map_err(anyhow::Error::from)
    })
}
