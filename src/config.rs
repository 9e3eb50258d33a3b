// Run configuration
// Explicit paths and tagging options for one enrichment run

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::pipeline::DEFAULT_AUDIO_COLUMN;
use crate::tagging::DEFAULT_TOP_N;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichConfig {
    /// Metadata table to read
    pub input_table: PathBuf,

    /// Directory that table audio references are relative to
    pub audio_dir: PathBuf,

    /// Where the enriched table is written
    pub output_table: PathBuf,

    #[serde(default = "default_audio_column")]
    pub audio_column: String,

    /// JSON tag model; the built-in vocabulary is used when absent
    #[serde(default)]
    pub tag_model: Option<PathBuf>,

    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// JSONL trace destination
    #[serde(default)]
    pub trace_path: Option<PathBuf>,
}

fn default_audio_column() -> String {
    DEFAULT_AUDIO_COLUMN.to_string()
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

impl EnrichConfig {
    pub fn new(
        input_table: impl Into<PathBuf>,
        audio_dir: impl Into<PathBuf>,
        output_table: impl Into<PathBuf>,
    ) -> Self {
        EnrichConfig {
            input_table: input_table.into(),
            audio_dir: audio_dir.into(),
            output_table: output_table.into(),
            audio_column: default_audio_column(),
            tag_model: None,
            top_n: default_top_n(),
            trace_path: None,
        }
    }

    pub fn with_audio_column(mut self, column: impl Into<String>) -> Self {
        self.audio_column = column.into();
        self
    }

    pub fn with_tag_model(mut self, path: impl Into<PathBuf>) -> Self {
        self.tag_model = Some(path.into());
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_trace(mut self, path: impl Into<PathBuf>) -> Self {
        self.trace_path = Some(path.into());
        self
    }
}
