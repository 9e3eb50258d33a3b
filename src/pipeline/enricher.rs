// Table enricher
// Reads the metadata table, tags and measures every referenced file, writes the table once

use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analysis::{FeatureResult, SignalAnalyzer};
use crate::pipeline::trace::{TraceEntry, TraceWriter, STAGE_LOAD, STAGE_ROW, STAGE_WRITE};
use crate::table::{MetadataTable, TableError};
use crate::tagging::{TagError, TagPredictor, TagResult};

/// Column holding the audio file reference unless configured otherwise
pub const DEFAULT_AUDIO_COLUMN: &str = "audio";

pub const TOP_TAGS_COLUMN: &str = "Top_Tags";
pub const TAGS_LIST_COLUMN: &str = "Tags_List";
pub const RMS_COLUMN: &str = "RMS";
pub const TEMPO_COLUMN: &str = "Tempo";

/// Fatal enrichment errors; per-row failures never surface here
#[derive(Debug, Error)]
pub enum EnrichError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("Table has no '{0}' column")]
    MissingColumn(String),

    #[error("Tag model unavailable: {0}")]
    TagModel(#[from] TagError),
}

/// Counts for one pass over the table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichSummary {
    pub rows: usize,
    pub enriched: usize,
    pub missing: usize,
    pub tag_failures: usize,
    pub feature_failures: usize,
}

/// Column positions of the four enrichment outputs
struct OutputColumns {
    top_tags: usize,
    tags_list: usize,
    rms: usize,
    tempo: usize,
}

pub struct Enricher<T: TagPredictor, A: SignalAnalyzer> {
    tagger: T,
    analyzer: A,
    audio_column: String,
    trace: Option<TraceWriter>,
}

impl<T: TagPredictor, A: SignalAnalyzer> Enricher<T, A> {
    pub fn new(tagger: T, analyzer: A) -> Self {
        Enricher {
            tagger,
            analyzer,
            audio_column: DEFAULT_AUDIO_COLUMN.to_string(),
            trace: None,
        }
    }

    pub fn with_audio_column(mut self, column: impl Into<String>) -> Self {
        self.audio_column = column.into();
        self
    }

    pub fn with_trace(mut self, trace: TraceWriter) -> Self {
        self.trace = Some(trace);
        self
    }

    pub fn audio_column(&self) -> &str {
        &self.audio_column
    }

    /// Read `input`, enrich every row against `audio_dir`, write the result to `output`
    pub fn enrich(
        &self,
        input: &Path,
        audio_dir: &Path,
        output: &Path,
    ) -> Result<EnrichSummary, EnrichError> {
        self.trace_entry(|| {
            TraceEntry::new(STAGE_LOAD, 0.0, format!("Loading {}", input.display()))
        });

        let mut table = MetadataTable::read(input)?;
        log::info!(
            "Loaded {} rows ({} columns) from {}",
            table.len(),
            table.headers().len(),
            input.display()
        );

        let summary = self.enrich_table(&mut table, audio_dir)?;

        table.write(output)?;
        log::info!(
            "Wrote {} rows to {} ({} enriched, {} missing, {} tag failures, {} feature failures)",
            summary.rows,
            output.display(),
            summary.enriched,
            summary.missing,
            summary.tag_failures,
            summary.feature_failures
        );

        self.trace_entry(|| {
            TraceEntry::new(STAGE_WRITE, 1.0, format!("Wrote {}", output.display()))
                .with_data(json!(summary))
        });

        Ok(summary)
    }

    /// In-memory pass: add the output columns and fill them row by row
    pub fn enrich_table(
        &self,
        table: &mut MetadataTable,
        audio_dir: &Path,
    ) -> Result<EnrichSummary, EnrichError> {
        let audio_index = table
            .column_index(&self.audio_column)
            .ok_or_else(|| EnrichError::MissingColumn(self.audio_column.clone()))?;

        let columns = OutputColumns {
            top_tags: table.ensure_column(TOP_TAGS_COLUMN, ""),
            tags_list: table.ensure_column(TAGS_LIST_COLUMN, ""),
            rms: table.ensure_column(RMS_COLUMN, &format_float(0.0f32)),
            tempo: table.ensure_column(TEMPO_COLUMN, &format_float(0.0f64)),
        };

        let total = table.len();
        let mut summary = EnrichSummary {
            rows: total,
            ..Default::default()
        };

        for row in 0..total {
            let reference = table.cell(row, audio_index).unwrap_or_default().to_string();
            let path = resolve_audio_path(audio_dir, &reference);
            let progress = (row + 1) as f32 / total as f32;

            if reference.is_empty() || !path.exists() {
                log::warn!("Row {}: file not found: {}", row, path.display());
                summary.missing += 1;
                self.trace_entry(|| {
                    TraceEntry::new(STAGE_ROW, progress, format!("{} not found", reference))
                        .with_row(row)
                        .with_data(json!({ "audio": reference, "status": "missing" }))
                });
                continue;
            }

            let tags = match self.predict_tags(&path) {
                Ok(tags) => tags,
                Err(e) => {
                    log::error!("Row {}: tagging {} failed: {}", row, path.display(), e);
                    summary.tag_failures += 1;
                    TagResult::default()
                }
            };

            let features = match self.analyzer.analyze(&path) {
                Ok(features) => features,
                Err(e) => {
                    log::error!(
                        "Row {}: feature extraction for {} failed: {}",
                        row,
                        path.display(),
                        e
                    );
                    summary.feature_failures += 1;
                    FeatureResult::default()
                }
            };

            table.set_cell(row, columns.top_tags, tags.top_tags_cell());
            table.set_cell(row, columns.tags_list, tags.tags_list_cell());
            table.set_cell(row, columns.rms, format_float(features.rms));
            table.set_cell(row, columns.tempo, format_float(features.tempo));
            summary.enriched += 1;

            log::info!(
                "Row {}: {} -> [{}] rms={:?} tempo={:?}",
                row,
                reference,
                tags.top_tags_cell(),
                features.rms,
                features.tempo
            );

            self.trace_entry(|| {
                TraceEntry::new(STAGE_ROW, progress, format!("{} enriched", reference))
                    .with_row(row)
                    .with_data(json!({
                        "audio": reference,
                        "status": "enriched",
                        "top_tags": tags.top_tags,
                        "tags_list": tags.tags_list,
                        "rms": features.rms,
                        "tempo": features.tempo,
                    }))
            });
        }

        Ok(summary)
    }

    /// Both tagger entry points as one step; only the full tag list is kept from the second
    fn predict_tags(&self, path: &Path) -> Result<TagResult, TagError> {
        let top_tags = self.tagger.predict_top_tags(path)?;
        let extraction = self.tagger.predict_all_tags(path)?;

        Ok(TagResult {
            top_tags,
            tags_list: extraction.tags,
        })
    }

    fn trace_entry(&self, build: impl FnOnce() -> TraceEntry) {
        if let Some(ref writer) = self.trace {
            writer.record(&build());
        }
    }
}

/// Shortest round-trip rendering that always keeps a fractional part
fn format_float<F: std::fmt::Debug>(value: F) -> String {
    format!("{:?}", value)
}

/// Resolve a table reference against the audio directory
pub fn resolve_audio_path(audio_dir: &Path, reference: &str) -> PathBuf {
    audio_dir.join(reference)
}
