//! Glossa Models - translation and reordering model query.
//!
//! Both models are process-global and read-only after load; the decoder
//! talks to them through per-sentence query proxies. Translation-model
//! lookups are pure; reordering entries are pre-resolved for the sentence's
//! source-target pairs before the search consumes them.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

mod error;
mod loader;
mod rm;
mod tm;

pub use error::ModelsError;
pub use loader::{load_rm, load_tm};
pub use rm::{Orientation, ReorderingModel, RmEntry, RmQueryProxy};
pub use tm::{
    TM_MAX_TARGET_PHRASE_LEN, TM_NUM_FEATURES, TmQueryProxy, TmSourceEntry, TmTarget,
    TranslationModel,
};
