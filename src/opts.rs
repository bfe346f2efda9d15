//! Runtime configuration for the transcription engine.
//!
//! This struct represents *library-level configuration*, not a settings UI.
//! The host application maps its own settings store into this type, so the
//! engine stays reusable outside any particular front-end. Options can change
//! at runtime; the model selection takes effect on the next model
//! acquisition.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Source URL of the bundled small English model (~40 MB).
pub const SMALL_MODEL_URL: &str =
    "https://ccoreilly.github.io/vosk-browser/models/vosk-model-small-en-us-0.15.tar.gz";

/// Which recognition model to load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelSelection {
    /// The small default model.
    Small,
    /// A custom model archive URL supplied by the user.
    Custom { url: String },
}

impl Default for ModelSelection {
    fn default() -> Self {
        Self::Small
    }
}

/// Options that control how transcriptions are performed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Opts {
    /// Model selection: the small default, or a custom URL.
    #[serde(flatten)]
    pub model: ModelSelection,
}

impl Opts {
    /// Resolve the configured model source URL.
    ///
    /// Fails with [`Error::ModelLoad`] when a custom model is selected but no
    /// URL has been provided.
    pub fn resolve_model_url(&self) -> Result<&str> {
        match &self.model {
            ModelSelection::Small => Ok(SMALL_MODEL_URL),
            ModelSelection::Custom { url } => {
                let url = url.trim();
                if url.is_empty() {
                    Err(Error::ModelLoad("no model URL configured".to_owned()))
                } else {
                    Ok(url)
                }
            }
        }
    }
}
