// Prototype tagger
// Scores fixed-length segments against the model vocabulary and ranks labels by mean score

use std::path::Path;

use crate::audio::{self, Signal};
use crate::tagging::backend::{TagError, TagPredictor};
use crate::tagging::model::TagModel;
use crate::tagging::types::{SegmentFeatures, TagExtraction, Taggram};

/// Number of top tags returned when not configured otherwise
pub const DEFAULT_TOP_N: usize = 3;

/// Tagger backed by a prototype [`TagModel`]
pub struct PrototypeTagger {
    model: TagModel,
    top_n: usize,
}

impl PrototypeTagger {
    pub fn new(model: TagModel) -> Self {
        PrototypeTagger {
            model,
            top_n: DEFAULT_TOP_N,
        }
    }

    /// Tagger using the built-in vocabulary
    pub fn builtin() -> Self {
        Self::new(TagModel::builtin())
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn model(&self) -> &TagModel {
        &self.model
    }

    /// Describe and score every segment of a signal
    pub fn analyze_signal(
        &self,
        signal: &Signal,
    ) -> Result<(Vec<SegmentFeatures>, Taggram), TagError> {
        if signal.is_empty() {
            return Err(TagError::EmptySignal);
        }
        if signal.sample_rate == 0 {
            return Err(TagError::TaggingError("sample rate is zero".to_string()));
        }

        let segment_len =
            ((self.model.segment_seconds * signal.sample_rate as f32) as usize).max(1);
        let segments = split_segments(&signal.samples, segment_len);

        let mut features = Vec::with_capacity(segments.len());
        let mut taggram = Taggram::new(self.model.vocabulary());

        for segment in segments {
            let segment_features = audio::extract_features(segment, signal.sample_rate);
            taggram.push_frame(self.model.score(&segment_features));
            features.push(segment_features);
        }

        log::debug!(
            "Scored {} segment(s) of {:.2}s against {} labels",
            taggram.frames.len(),
            signal.duration_secs(),
            taggram.labels.len()
        );

        Ok((features, taggram))
    }

    /// Best `top_n` labels of a taggram
    pub fn top_tags_for(&self, taggram: &Taggram) -> Vec<String> {
        taggram
            .ranked()
            .into_iter()
            .take(self.top_n)
            .map(|(label, _)| label)
            .collect()
    }

    /// Every label whose mean score reaches the model threshold, best first
    pub fn full_tags_for(&self, taggram: &Taggram) -> Vec<String> {
        taggram
            .ranked()
            .into_iter()
            .filter(|(_, score)| *score >= self.model.threshold)
            .map(|(label, _)| label)
            .collect()
    }
}

/// Consecutive non-overlapping segments; a short tail is dropped unless it is
/// the only segment or covers at least half a segment
fn split_segments(samples: &[f32], segment_len: usize) -> Vec<&[f32]> {
    let chunks: Vec<&[f32]> = samples.chunks(segment_len).collect();
    if chunks.len() <= 1 {
        return chunks;
    }

    chunks
        .into_iter()
        .filter(|chunk| chunk.len() * 2 >= segment_len)
        .collect()
}

impl TagPredictor for PrototypeTagger {
    fn predict_top_tags(&self, path: &Path) -> Result<Vec<String>, TagError> {
        let signal = audio::load_signal(path)?;
        let (_, taggram) = self.analyze_signal(&signal)?;
        Ok(self.top_tags_for(&taggram))
    }

    fn predict_all_tags(&self, path: &Path) -> Result<TagExtraction, TagError> {
        let signal = audio::load_signal(path)?;
        let (features, taggram) = self.analyze_signal(&signal)?;
        let tags = self.full_tags_for(&taggram);

        Ok(TagExtraction {
            features,
            tags,
            taggram,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use tempfile::TempDir;

    fn write_wav(path: &Path, sample_rate: u32, samples: &[f32]) {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn tone(sample_rate: u32, seconds: f32) -> Vec<f32> {
        let len = (sample_rate as f32 * seconds) as usize;
        (0..len)
            .map(|i| 0.3 * (2.0 * std::f32::consts::PI * 440.0 * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn test_split_segments() {
        let samples = vec![0.0; 7];
        let segments = split_segments(&samples, 3);
        // 3 + 3 kept, tail of 1 dropped
        assert_eq!(segments.len(), 2);

        let segments = split_segments(&samples[..2], 3);
        assert_eq!(segments.len(), 1);

        // 3 + 3 + a tail of 2 that covers half a segment
        let longer = vec![0.0; 8];
        let segments = split_segments(&longer, 3);
        assert_eq!(segments.len(), 3);
    }

    #[test]
    fn test_top_tags_default_count() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tone.wav");
        write_wav(&path, 8000, &tone(8000, 4.0));

        let tagger = PrototypeTagger::builtin();
        let tags = tagger.predict_top_tags(&path).unwrap();
        assert_eq!(tags.len(), DEFAULT_TOP_N);

        let tags = PrototypeTagger::builtin()
            .with_top_n(100)
            .predict_top_tags(&path)
            .unwrap();
        assert_eq!(tags.len(), tagger.model().labels.len());
    }

    #[test]
    fn test_full_tags_rank_whole_vocabulary() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tone.wav");
        write_wav(&path, 8000, &tone(8000, 7.0));

        let tagger = PrototypeTagger::builtin();
        let top = tagger.predict_top_tags(&path).unwrap();
        let extraction = tagger.predict_all_tags(&path).unwrap();

        assert_eq!(extraction.tags.len(), tagger.model().labels.len());
        assert_eq!(&extraction.tags[..top.len()], &top[..]);
        assert_eq!(extraction.taggram.frames.len(), 2);
        assert_eq!(extraction.features.len(), 2);
    }

    #[test]
    fn test_threshold_filters_full_list() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tone.wav");
        write_wav(&path, 8000, &tone(8000, 1.0));

        let mut model = TagModel::builtin();
        model.threshold = 1.1;
        let tagger = PrototypeTagger::new(model);

        let extraction = tagger.predict_all_tags(&path).unwrap();
        assert!(extraction.tags.is_empty());
        assert_eq!(tagger.predict_top_tags(&path).unwrap().len(), DEFAULT_TOP_N);
    }

    #[test]
    fn test_silence_is_tagged_quiet() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("silence.wav");
        write_wav(&path, 8000, &vec![0.0; 8000 * 2]);

        let tags = PrototypeTagger::builtin().predict_top_tags(&path).unwrap();
        assert_eq!(tags[0], "quiet");
    }

    #[test]
    fn test_deterministic() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tone.wav");
        write_wav(&path, 8000, &tone(8000, 2.0));

        let tagger = PrototypeTagger::builtin();
        let first = tagger.predict_all_tags(&path).unwrap();
        let second = tagger.predict_all_tags(&path).unwrap();
        assert_eq!(first.tags, second.tags);
        assert_eq!(first.taggram.frames, second.taggram.frames);
    }

    #[test]
    fn test_empty_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.wav");
        write_wav(&path, 8000, &[]);

        let result = PrototypeTagger::builtin().predict_top_tags(&path);
        assert!(matches!(result, Err(TagError::EmptySignal)));
    }

    #[test]
    fn test_missing_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.wav");

        let result = PrototypeTagger::builtin().predict_all_tags(&path);
        assert!(matches!(result, Err(TagError::Audio(_))));
    }
}
