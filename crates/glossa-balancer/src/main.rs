//! The `glossa-balancer` binary.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use glossa_telemetry::{LogConfig, LogFormat, setup_logging};
use tracing::info;

/// Glossa load balancer: fans translation jobs out over servers.
#[derive(Debug, Parser)]
#[command(name = "glossa-balancer", version, about)]
struct Cli {
    /// Path of the balancer configuration file.
    #[arg(long, env = "GLOSSA_BALANCER_CONFIG")]
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
        glossa_config::load_balancer_config(&cli.config).context("balancer configuration")?;

    let runtime = tokio::runtime::Runtime::new().context("tokio runtime")?;
    runtime.block_on(async move {
        let running = glossa_balancer::start(config)
            .await
            .context("balancer startup")?;
        info!(addr = %running.local_addr, "balancer running");

        tokio::signal::ctrl_c().await.context("signal handler")?;
        info!("shutdown requested");
        running.shutdown.cancel();
        running.task.await?.map_err(anyhow::Error::from)
    })
}
