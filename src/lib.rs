// Audio Enricher - metadata table tagging and signal features
// Module declarations

pub mod analysis;
pub mod audio;
pub mod config;
pub mod pipeline;
pub mod rhythm;
pub mod table;
pub mod tagging;

pub use config::EnrichConfig;
pub use pipeline::{EnrichError, EnrichSummary, Enricher};

use analysis::DspAnalyzer;
use pipeline::TraceWriter;
use tagging::{PrototypeTagger, TagModel};

/// Run one enrichment pass with the shipped tagger and analyzer
pub fn run(config: &EnrichConfig) -> Result<EnrichSummary, EnrichError> {
    let model = match config.tag_model {
        Some(ref path) => TagModel::load(path)?,
        None => TagModel::builtin(),
    };
    log::info!(
        "Using tag model '{}' v{} ({} labels, top {})",
        model.name,
        model.version,
        model.labels.len(),
        config.top_n
    );

    let tagger = PrototypeTagger::new(model).with_top_n(config.top_n);
    let mut enricher = Enricher::new(tagger, DspAnalyzer::default())
        .with_audio_column(config.audio_column.as_str());

    if let Some(ref trace_path) = config.trace_path {
        let writer = TraceWriter::new(trace_path.clone());
        log::info!("Tracing to {}", writer.path().display());
        enricher = enricher.with_trace(writer);
    }

    enricher.enrich(&config.input_table, &config.audio_dir, &config.output_table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unloadable_model_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("meta.csv");
        let output = temp_dir.path().join("out.csv");
        std::fs::write(&input, "audio\na.wav\n").unwrap();

        let config = EnrichConfig::new(&input, temp_dir.path(), &output)
            .with_tag_model(temp_dir.path().join("missing-model.json"));

        assert!(matches!(run(&config), Err(EnrichError::TagModel(_))));
        assert!(!output.exists());
    }

    #[test]
    fn test_missing_files_only() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("meta.csv");
        let output = temp_dir.path().join("out.csv");
        std::fs::write(&input, "audio,caption\nmissing.wav,hello\n").unwrap();

        let summary = run(&EnrichConfig::new(&input, temp_dir.path(), &output)).unwrap();

        assert_eq!(summary.missing, 1);
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "audio,caption,Top_Tags,Tags_List,RMS,Tempo\nmissing.wav,hello,,,0.0,0.0\n"
        );
    }
}
