// Audio Enricher - command line entry point
// Parses arguments, sets up logging and runs one enrichment pass

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use audio_enricher_lib::EnrichConfig;

/// Command-line arguments for audio-enricher
#[derive(Parser, Debug)]
#[command(name = "audio-enricher")]
#[command(about = "Add tags, loudness and tempo columns to an audio metadata table")]
#[command(version)]
struct Args {
    /// Metadata table to read (.csv, or .tsv/.tab for tab-delimited)
    #[arg(short, long, env = "ENRICH_INPUT_TABLE")]
    input: PathBuf,

    /// Directory the audio references are relative to
    #[arg(short, long, env = "ENRICH_AUDIO_DIR")]
    audio_dir: PathBuf,

    /// Enriched table destination (overwritten)
    #[arg(short, long, env = "ENRICH_OUTPUT_TABLE")]
    output: PathBuf,

    /// Column holding the audio file reference
    #[arg(long, default_value = "audio")]
    audio_column: String,

    /// JSON tag model (built-in vocabulary when omitted)
    #[arg(long)]
    tag_model: Option<PathBuf>,

    /// Number of tags in the Top_Tags column
    #[arg(long, default_value_t = 3)]
    top_n: usize,

    /// Append a JSONL progress trace to this file
    #[arg(long)]
    trace: Option<PathBuf>,
}

impl From<Args> for EnrichConfig {
    fn from(args: Args) -> Self {
        EnrichConfig {
            input_table: args.input,
            audio_dir: args.audio_dir,
            output_table: args.output,
            audio_column: args.audio_column,
            tag_model: args.tag_model,
            top_n: args.top_n,
            trace_path: args.trace,
        }
    }
}

fn main() -> ExitCode {
    // RUST_LOG overrides the default level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = EnrichConfig::from(Args::parse());
    log::info!(
        "Enriching {} (audio in {}) -> {}",
        config.input_table.display(),
        config.audio_dir.display(),
        config.output_table.display()
    );

    match audio_enricher_lib::run(&config) {
        Ok(summary) => {
            log::info!(
                "Done: {}/{} rows enriched, {} missing",
                summary.enriched,
                summary.rows,
                summary.missing
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Enrichment failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults_match_config() {
        let args =
            Args::try_parse_from(["audio-enricher", "-i", "meta.csv", "-a", "wav", "-o", "out.csv"])
                .unwrap();

        assert_eq!(
            EnrichConfig::from(args),
            EnrichConfig::new("meta.csv", "wav", "out.csv")
        );
    }

    #[test]
    fn test_args_all_flags() {
        let args = Args::try_parse_from([
            "audio-enricher",
            "--input",
            "meta.tsv",
            "--audio-dir",
            "wav",
            "--output",
            "out.tsv",
            "--audio-column",
            "path",
            "--tag-model",
            "model.json",
            "--top-n",
            "5",
            "--trace",
            "trace.jsonl",
        ])
        .unwrap();

        let expected = EnrichConfig::new("meta.tsv", "wav", "out.tsv")
            .with_audio_column("path")
            .with_tag_model("model.json")
            .with_top_n(5)
            .with_trace("trace.jsonl");
        assert_eq!(EnrichConfig::from(args), expected);
    }

    #[test]
    fn test_args_reject_bad_top_n() {
        let result = Args::try_parse_from([
            "audio-enricher",
            "-i",
            "meta.csv",
            "-a",
            "wav",
            "-o",
            "out.csv",
            "--top-n",
            "three",
        ]);
        assert!(result.is_err());
    }
}
