// Tag predictor abstraction
// The enricher only sees this trait; the prototype tagger is the shipped backend

use std::path::Path;
use thiserror::Error;

use crate::audio::AudioError;
use crate::tagging::types::TagExtraction;

/// Errors that can occur during tagging
#[derive(Debug, Error)]
pub enum TagError {
    #[error("Audio loading failed: {0}")]
    Audio(#[from] AudioError),

    #[error("Audio file contains no samples")]
    EmptySignal,

    #[error("Model loading failed: {0}")]
    ModelLoadError(String),

    #[error("Model parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid tag model: {0}")]
    InvalidModel(String),

    #[error("Tagging failed: {0}")]
    TaggingError(String),
}

/// Predicts semantic tags for an audio file
///
/// The two entry points are independent: each one reads the file itself.
pub trait TagPredictor {
    /// Short ranked list of the most likely tags
    fn predict_top_tags(&self, path: &Path) -> Result<Vec<String>, TagError>;

    /// Full analysis: segment descriptors, full tag list and the raw taggram
    fn predict_all_tags(&self, path: &Path) -> Result<TagExtraction, TagError>;
}
