//! Configuration types.

use std::path::PathBuf;

use glossa_decoder::DecoderParams;
use glossa_models::TM_NUM_FEATURES;
use serde::Deserialize;

/// Decoder tuning section, all fields optional over the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecoderSection {
    /// Longest source span submitted to the translation model.
    pub max_source_phrase_len: Option<usize>,
    /// Reordering distortion limit.
    pub distortion_limit: Option<usize>,
    /// Histogram pruning bound (hypotheses per stack).
    pub stack_capacity: Option<usize>,
    /// Threshold pruning bound (log-score distance from the stack best).
    pub pruning_threshold: Option<f32>,
    /// Language-model weight.
    pub lm_weight: Option<f32>,
    /// Reordering-model weight.
    pub rm_weight: Option<f32>,
    /// Per-word penalty.
    pub word_penalty: Option<f32>,
    /// Unknown-token identity-translation score.
    pub unknown_penalty: Option<f32>,
}

impl DecoderSection {
    /// Materialise full decoder parameters over the defaults.
    #[must_use]
    pub fn to_params(&self) -> DecoderParams {
        let defaults = DecoderParams::default();
        DecoderParams {
            max_source_phrase_len: self
                .max_source_phrase_len
                .unwrap_or(defaults.max_source_phrase_len),
            distortion_limit: self.distortion_limit.unwrap_or(defaults.distortion_limit),
            stack_capacity: self.stack_capacity.unwrap_or(defaults.stack_capacity),
            pruning_threshold: self.pruning_threshold.unwrap_or(defaults.pruning_threshold),
            lm_weight: self.lm_weight.unwrap_or(defaults.lm_weight),
            rm_weight: self.rm_weight.unwrap_or(defaults.rm_weight),
            word_penalty: self.word_penalty.unwrap_or(defaults.word_penalty),
            unknown_penalty: self.unknown_penalty.unwrap_or(defaults.unknown_penalty),
        }
    }
}

fn default_workers() -> usize {
    4
}

fn default_tm_weights() -> [f32; TM_NUM_FEATURES] {
    [1.0; TM_NUM_FEATURES]
}

/// Configuration of one translation-server process.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to listen on, e.g. `127.0.0.1:9001`.
    pub listen_addr: String,
    /// Sentence-decoder worker count.
    #[serde(default = "default_workers")]
    pub num_workers: usize,
    /// Source language served by this process.
    pub source_lang: String,
    /// Target language served by this process.
    pub target_lang: String,
    /// Language-model file.
    pub lm_file: PathBuf,
    /// Translation-model (phrase table) file.
    pub tm_file: PathBuf,
    /// Reordering-model file.
    pub rm_file: PathBuf,
    /// Translation feature weights.
    #[serde(default = "default_tm_weights")]
    pub tm_weights: [f32; TM_NUM_FEATURES],
    /// Decoder tuning.
    #[serde(default)]
    pub decoder: DecoderSection,
}

/// One outbound translator link of the balancer.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslatorConfig {
    /// Translator `ws://`/`wss://` URI.
    pub uri: String,
    /// TLS mode name for `wss://` links.
    #[serde(default)]
    pub tls_mode: Option<String>,
    /// Optional free-form cipher list.
    #[serde(default)]
    pub ciphers: Option<String>,
}

fn default_backoff_base_ms() -> u64 {
    1_000
}

fn default_backoff_max_ms() -> u64 {
    60_000
}

/// Reconnection backoff of the balancer's translator adapters.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReconnectConfig {
    /// Base delay in milliseconds.
    #[serde(default = "default_backoff_base_ms")]
    pub base_ms: u64,
    /// Delay cap in milliseconds.
    #[serde(default = "default_backoff_max_ms")]
    pub max_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_ms: default_backoff_base_ms(),
            max_ms: default_backoff_max_ms(),
        }
    }
}

/// Configuration of one balancer process.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BalancerConfig {
    /// Address to listen on for clients.
    pub listen_addr: String,
    /// Balancer job worker count.
    #[serde(default = "default_workers")]
    pub num_workers: usize,
    /// The translation servers to dispatch to.
    #[serde(default)]
    pub translators: Vec<TranslatorConfig>,
    /// Adapter reconnection backoff.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}
