//! The `glossa-client` binary.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::Parser;
use glossa_client::{ClientManager, ClientParams, process_text};
use glossa_core::StatusCode;
use glossa_messaging::{ProcKind, TlsMode};
use glossa_telemetry::{LogConfig, LogFormat, setup_logging};
use tracing::{info, warn};

/// Glossa translation client.
#[derive(Debug, Parser)]
#[command(name = "glossa-client", version, about)]
struct Cli {
    /// Input text file, one sentence per line.
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Input (source) language.
    #[arg(short = 'I', long)]
    input_lang: String,

    /// Output file for the translations.
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Output (target) language.
    #[arg(short = 'O', long)]
    output_lang: String,

    /// Translation endpoint (balancer or server).
    #[arg(short = 't', long, default_value = "ws://localhost:9002")]
    trans_uri: String,

    /// TLS mode of the translation endpoint.
    #[arg(long, default_value = "undefined")]
    trans_tls: String,

    /// Pre-processor endpoint.
    #[arg(long)]
    pre_uri: Option<String>,

    /// TLS mode of the pre-processor endpoint.
    #[arg(long, default_value = "undefined")]
    pre_tls: String,

    /// Post-processor endpoint.
    #[arg(long)]
    post_uri: Option<String>,

    /// TLS mode of the post-processor endpoint.
    #[arg(long, default_value = "undefined")]
    post_tls: String,

    /// Smallest number of sentences per job.
    #[arg(long, default_value_t = 1)]
    min_sent: usize,

    /// Largest number of sentences per job.
    #[arg(long, default_value_t = 100)]
    max_sent: usize,

    /// Job priority; larger is more urgent.
    #[arg(long, default_value_t = 0)]
    priority: i32,

    /// Request per-stack search statistics.
    #[arg(long)]
    trans_info: bool,

    /// Default log level directive.
    #[arg(short = 'd', long, default_value = "warn")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(&LogConfig::new(&cli.log_level).with_format(LogFormat::Pretty))
        .context("logging setup failed")?;

    let runtime = tokio::runtime::Runtime::new().context("tokio runtime")?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let trans_tls = TlsMode::from_str(&cli.trans_tls).context("translation TLS mode")?;

    let mut text = tokio::fs::read_to_string(&cli.input)
        .await
        .with_context(|| format!("reading {}", cli.input.display()))?;

    if let Some(pre_uri) = &cli.pre_uri {
        let tls = TlsMode::from_str(&cli.pre_tls).context("pre-processor TLS mode")?;
        text = process_text(pre_uri, tls, ProcKind::Pre, &cli.input_lang, &text)
            .await
            .context("pre-processing")?;
        info!("input pre-processed");
    }

    let sentences: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect();
    info!(sentences = sentences.len(), "input read");

    let manager = ClientManager::new(ClientParams {
        trans_uri: cli.trans_uri.clone(),
        trans_tls,
        source_lang: cli.input_lang.clone(),
        target_lang: cli.output_lang.clone(),
        min_sentences: cli.min_sent,
        max_sentences: cli.max_sent,
        priority: cli.priority,
        is_trans_info: cli.trans_info,
    });
    let outcomes = manager.translate(&sentences).await.context("translation")?;

    let failed = outcomes
        .iter()
        .filter(|o| o.status != StatusCode::Ok)
        .count();
    for outcome in outcomes.iter().filter(|o| o.status != StatusCode::Ok) {
        warn!(status = %outcome.status, detail = %outcome.detail, text = %outcome.text, "sentence failed");
    }

    let mut output: String = outcomes
        .iter()
        .map(|o| o.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    output.push('\n');

    if let Some(post_uri) = &cli.post_uri {
        let tls = TlsMode::from_str(&cli.post_tls).context("post-processor TLS mode")?;
        output = process_text(post_uri, tls, ProcKind::Post, &cli.output_lang, &output)
            .await
            .context("post-processing")?;
        info!("output post-processed");
    }

    tokio::fs::write(&cli.output, output)
        .await
        .with_context(|| format!("writing {}", cli.output.display()))?;

    if failed > 0 {
        anyhow::bail!("{failed} of {} sentences failed", outcomes.len());
    }
    info!(sentences = outcomes.len(), "translation complete");
    Ok(())
}
