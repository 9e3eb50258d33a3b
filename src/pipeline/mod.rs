// Pipeline execution and monitoring module
// Drives the read, enrich and write pass over a metadata table

pub mod enricher;
pub mod trace;

pub use enricher::{
    resolve_audio_path, EnrichError, EnrichSummary, Enricher, DEFAULT_AUDIO_COLUMN,
    RMS_COLUMN, TAGS_LIST_COLUMN, TEMPO_COLUMN, TOP_TAGS_COLUMN,
};
pub use trace::{read_trace_file, TraceEntry, TraceError, TraceWriter};
