// End-to-end enrichment runs
// Real WAV fixtures through the shipped tagger and analyzer

use std::path::Path;

use audio_enricher_lib::pipeline::read_trace_file;
use audio_enricher_lib::table::MetadataTable;
use audio_enricher_lib::{run, EnrichConfig, EnrichError};
use hound::{SampleFormat, WavSpec, WavWriter};
use tempfile::TempDir;

const SAMPLE_RATE: u32 = 22050;

fn write_wav(path: &Path, samples: &[f32]) {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for &s in samples {
        writer.write_sample(s).unwrap();
    }
    writer.finalize().unwrap();
}

/// Unit impulses at a steady tempo
fn click_train(bpm: f64, seconds: f64) -> Vec<f32> {
    let len = (SAMPLE_RATE as f64 * seconds) as usize;
    let interval = (SAMPLE_RATE as f64 * 60.0 / bpm) as usize;
    let mut samples = vec![0.0f32; len];
    let mut pos = 5000;
    while pos < len {
        samples[pos] = 1.0;
        pos += interval;
    }
    samples
}

#[test]
fn test_enrich_csv_with_real_audio() {
    let temp_dir = TempDir::new().unwrap();
    let audio_dir = temp_dir.path().join("audio");
    std::fs::create_dir(&audio_dir).unwrap();
    write_wav(&audio_dir.join("clicks.wav"), &click_train(120.0, 8.0));
    write_wav(&audio_dir.join("silence.wav"), &vec![0.0; SAMPLE_RATE as usize * 4]);

    let input = temp_dir.path().join("meta.csv");
    let output = temp_dir.path().join("enriched.csv");
    std::fs::write(
        &input,
        "audio,caption\nclicks.wav,\"steady, dry clicks\"\nmissing.wav,gone\nsilence.wav,nothing\n",
    )
    .unwrap();

    let summary = run(&EnrichConfig::new(&input, &audio_dir, &output)).unwrap();
    assert_eq!(summary.rows, 3);
    assert_eq!(summary.enriched, 2);
    assert_eq!(summary.missing, 1);
    assert_eq!(summary.tag_failures, 0);
    assert_eq!(summary.feature_failures, 0);

    let table = MetadataTable::read(&output).unwrap();
    assert_eq!(
        table.headers(),
        &["audio", "caption", "Top_Tags", "Tags_List", "RMS", "Tempo"]
    );
    assert_eq!(table.len(), 3);

    let clicks = &table.rows()[0];
    assert_eq!(clicks[1], "steady, dry clicks");
    assert_eq!(clicks[2].split(", ").count(), 3);
    assert!(clicks[3].split(", ").count() >= 3);
    assert!(clicks[3].starts_with(&clicks[2]));
    let rms: f32 = clicks[4].parse().unwrap();
    let tempo: f64 = clicks[5].parse().unwrap();
    assert!(rms > 0.0);
    assert!(tempo > 110.0 && tempo < 130.0, "tempo = {}", tempo);

    assert_eq!(table.rows()[1], vec!["missing.wav", "gone", "", "", "0.0", "0.0"]);

    let silence = &table.rows()[2];
    assert!(silence[2].starts_with("quiet"));
    assert_eq!(silence[4], "0.0");
    assert_eq!(silence[5], "0.0");
}

#[test]
fn test_enrich_tsv_with_trace_and_custom_column() {
    let temp_dir = TempDir::new().unwrap();
    write_wav(&temp_dir.path().join("a.wav"), &click_train(90.0, 6.0));

    let input = temp_dir.path().join("meta.tsv");
    let output = temp_dir.path().join("out.tsv");
    let trace = temp_dir.path().join("trace.jsonl");
    std::fs::write(&input, "id\tfile\n1\ta.wav\n").unwrap();

    let config = EnrichConfig::new(&input, temp_dir.path(), &output)
        .with_audio_column("file")
        .with_top_n(1)
        .with_trace(&trace);
    run(&config).unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("id\tfile\tTop_Tags\tTags_List\tRMS\tTempo"));
    let row: Vec<&str> = lines.next().unwrap().split('\t').collect();
    assert_eq!(row.len(), 6);
    assert!(!row[2].contains(", "));

    let entries = read_trace_file(&trace).unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[1].row, Some(0));
}

#[test]
fn test_missing_audio_column_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("meta.csv");
    let output = temp_dir.path().join("out.csv");
    std::fs::write(&input, "path,caption\na.wav,x\n").unwrap();

    let result = run(&EnrichConfig::new(&input, temp_dir.path(), &output));

    assert!(matches!(result, Err(EnrichError::MissingColumn(_))));
    assert!(!output.exists());
}
