// Signal feature extraction
// Whole-file loudness and tempo behind a trait the enricher can swap out

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::audio::{self, AudioError, OnsetConfig, Signal};
use crate::rhythm::{self, TempoConfig};

/// Errors that can occur while computing signal features
#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("Audio loading failed: {0}")]
    Audio(#[from] AudioError),

    #[error("Audio file contains no samples")]
    EmptySignal,
}

/// Loudness and tempo of one file
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureResult {
    /// Mean frame RMS
    pub rms: f32,

    /// Beats per minute
    pub tempo: f64,
}

/// Computes loudness and tempo for audio files
pub trait SignalAnalyzer {
    /// Decode a file to a mono waveform at its native sample rate
    fn load_signal(&self, path: &Path) -> Result<Signal, FeatureError>;

    /// Loudness estimate of a waveform
    fn loudness(&self, samples: &[f32]) -> f32;

    /// Tempo estimate of a waveform in BPM
    fn tempo(&self, samples: &[f32], sample_rate: u32) -> f64;

    /// Load a file and compute both features
    fn analyze(&self, path: &Path) -> Result<FeatureResult, FeatureError> {
        let signal = self.load_signal(path)?;
        if signal.is_empty() {
            return Err(FeatureError::EmptySignal);
        }

        Ok(FeatureResult {
            rms: self.loudness(&signal.samples),
            tempo: self.tempo(&signal.samples, signal.sample_rate),
        })
    }
}

/// Frame RMS loudness and spectral-flux tempo
#[derive(Debug, Clone, Default)]
pub struct DspAnalyzer {
    pub onset_config: OnsetConfig,
    pub tempo_config: TempoConfig,
}

impl DspAnalyzer {
    pub fn new(onset_config: OnsetConfig, tempo_config: TempoConfig) -> Self {
        DspAnalyzer {
            onset_config,
            tempo_config,
        }
    }
}

impl SignalAnalyzer for DspAnalyzer {
    fn load_signal(&self, path: &Path) -> Result<Signal, FeatureError> {
        Ok(audio::load_signal(path)?)
    }

    fn loudness(&self, samples: &[f32]) -> f32 {
        audio::mean_rms(samples)
    }

    fn tempo(&self, samples: &[f32], sample_rate: u32) -> f64 {
        let onsets = audio::detect_onsets(samples, sample_rate, &self.onset_config);
        let estimate = rhythm::estimate_tempo_with_config(&onsets, &self.tempo_config);

        log::debug!(
            "Tempo {:.1} BPM from {} onsets (confidence {:.2}, {} beats)",
            estimate.bpm,
            onsets.len(),
            estimate.confidence,
            estimate.beat_positions_ms.len()
        );

        estimate.bpm
    }
}
