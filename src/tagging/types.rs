// Tagging types
// Segment descriptors, taggrams and the tag results handed to the enricher

use serde::{Deserialize, Serialize};

/// Spectral and temporal descriptors of one audio segment
/// Used both for live segments and for tag model prototypes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentFeatures {
    /// Spectral centroid (Hz) - "center of mass" of spectrum
    pub spectral_centroid: f32,

    /// Zero-crossing rate (crossings per sample)
    pub zcr: f32,

    /// Energy in low frequency band (0-200 Hz), relative to total energy
    pub low_band_energy: f32,

    /// Energy in mid frequency band (200-2000 Hz), relative to total energy
    pub mid_band_energy: f32,

    /// Energy in high frequency band (2000+ Hz), relative to total energy
    pub high_band_energy: f32,

    /// Mean frame RMS of the segment
    pub rms: f32,

    /// Detected onsets per second
    pub onset_rate: f32,
}

impl SegmentFeatures {
    /// Create features with all zeros
    pub fn zero() -> Self {
        SegmentFeatures {
            spectral_centroid: 0.0,
            zcr: 0.0,
            low_band_energy: 0.0,
            mid_band_energy: 0.0,
            high_band_energy: 0.0,
            rms: 0.0,
            onset_rate: 0.0,
        }
    }

    /// Euclidean distance with each dimension scaled to roughly [0, 1]
    pub fn distance_to(&self, other: &SegmentFeatures) -> f32 {
        let d_centroid = (self.spectral_centroid - other.spectral_centroid) / 5000.0;
        let d_zcr = self.zcr - other.zcr;
        let d_low = self.low_band_energy - other.low_band_energy;
        let d_mid = self.mid_band_energy - other.mid_band_energy;
        let d_high = self.high_band_energy - other.high_band_energy;
        let d_rms = (self.rms - other.rms) / 0.3;
        let d_onsets = (self.onset_rate - other.onset_rate) / 10.0;

        (d_centroid * d_centroid
            + d_zcr * d_zcr
            + d_low * d_low
            + d_mid * d_mid
            + d_high * d_high
            + d_rms * d_rms
            + d_onsets * d_onsets)
            .sqrt()
    }
}

/// Per-segment label scores over a model vocabulary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Taggram {
    /// Vocabulary, in model order
    pub labels: Vec<String>,

    /// One row per segment, one score per label
    pub frames: Vec<Vec<f32>>,
}

impl Taggram {
    pub fn new(labels: Vec<String>) -> Self {
        Taggram {
            labels,
            frames: Vec::new(),
        }
    }

    pub fn push_frame(&mut self, scores: Vec<f32>) {
        debug_assert_eq!(scores.len(), self.labels.len());
        self.frames.push(scores);
    }

    /// Average score of each label over all segments
    pub fn mean_scores(&self) -> Vec<f32> {
        let mut means = vec![0.0f32; self.labels.len()];
        if self.frames.is_empty() {
            return means;
        }

        for frame in &self.frames {
            for (mean, score) in means.iter_mut().zip(frame.iter()) {
                *mean += score;
            }
        }

        let count = self.frames.len() as f32;
        means.iter_mut().for_each(|m| *m /= count);
        means
    }

    /// Labels with their mean score, best first; ties keep vocabulary order
    pub fn ranked(&self) -> Vec<(String, f32)> {
        let mut ranked: Vec<(String, f32)> = self
            .labels
            .iter()
            .cloned()
            .zip(self.mean_scores())
            .collect();

        // Stable sort keeps vocabulary order for equal scores
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}

/// Everything the full tagging pass produces
#[derive(Debug, Clone)]
pub struct TagExtraction {
    /// Descriptors of every analysed segment
    pub features: Vec<SegmentFeatures>,

    /// Full tag list, best first
    pub tags: Vec<String>,

    /// Raw per-segment scores
    pub taggram: Taggram,
}

/// Tags recorded for one table row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagResult {
    pub top_tags: Vec<String>,
    pub tags_list: Vec<String>,
}

impl TagResult {
    /// Comma-joined top tags as written to the table
    pub fn top_tags_cell(&self) -> String {
        self.top_tags.join(", ")
    }

    /// Comma-joined full tag list as written to the table
    pub fn tags_list_cell(&self) -> String {
        self.tags_list.join(", ")
    }
}
