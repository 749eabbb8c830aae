//! Process-global model state.

use glossa_config::ServerConfig;
use glossa_lm::{HashMapTrie, load_lm};
use glossa_models::{ReorderingModel, RmEntry, TranslationModel, load_rm, load_tm};

use crate::error::ServerError;

/// The three models of one language pair, read-only after load.
pub struct LoadedModels {
    /// Source language of this process.
    pub source_lang: String,
    /// Target language of this process.
    pub target_lang: String,
    /// The language model.
    pub lm: HashMapTrie,
    /// The translation model.
    pub tm: TranslationModel,
    /// The reordering model.
    pub rm: ReorderingModel,
}

impl LoadedModels {
    /// Load all models named by the configuration.
    ///
    /// # Errors
    ///
    /// Any load failure is fatal; the process must not serve without its
    /// models.
    pub fn load(config: &ServerConfig) -> Result<Self, ServerError> {
        let lm = load_lm(&config.lm_file)?;
        let tm = load_tm(&config.tm_file, config.tm_weights, &lm)?;
        let rm = load_rm(&config.rm_file, RmEntry::default())?;
        Ok(Self {
            source_lang: config.source_lang.clone(),
            target_lang: config.target_lang.clone(),
            lm,
            tm,
            rm,
        })
    }

    /// Whether this process serves the requested pair.
    #[must_use]
    pub fn supports(&self, source: &str, target: &str) -> bool {
        self.source_lang.eq_ignore_ascii_case(source)
            && self.target_lang.eq_ignore_ascii_case(target)
    }
}
