// Tempo Estimation - BPM detection using inter-onset intervals
// Uses an IOI histogram to find periodic structure, then aligns a beat grid

use serde::{Deserialize, Serialize};

use crate::audio::Onset;

/// Tempo estimation result with BPM and beat grid positions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TempoEstimate {
    /// Estimated beats per minute, 0.0 when no periodic structure was found
    pub bpm: f64,

    /// Confidence in the estimate [0.0, 1.0]
    pub confidence: f32,

    /// Estimated beat positions in milliseconds
    pub beat_positions_ms: Vec<f64>,
}

impl TempoEstimate {
    fn none() -> Self {
        TempoEstimate {
            bpm: 0.0,
            confidence: 0.0,
            beat_positions_ms: Vec::new(),
        }
    }
}

/// Configuration for tempo estimation
#[derive(Debug, Clone)]
pub struct TempoConfig {
    /// Minimum BPM to consider
    pub min_bpm: f64,

    /// Maximum BPM to consider
    pub max_bpm: f64,

    /// Number of bins for IOI histogram
    pub histogram_bins: usize,

    /// Minimum number of onsets required for estimation
    pub min_onsets: usize,
}

impl Default for TempoConfig {
    fn default() -> Self {
        TempoConfig {
            min_bpm: 60.0,
            max_bpm: 180.0,
            histogram_bins: 300,
            min_onsets: 8,
        }
    }
}

/// Estimate tempo from onset detections
///
/// Algorithm:
/// 1. Compute inter-onset intervals (IOIs)
/// 2. Build IOI histogram (with half/double interval votes)
/// 3. Pick strongest peak in valid BPM range
/// 4. Align a beat grid to the onsets
pub fn estimate_tempo(onsets: &[Onset]) -> TempoEstimate {
    estimate_tempo_with_config(onsets, &TempoConfig::default())
}

/// Estimate tempo with custom configuration
pub fn estimate_tempo_with_config(onsets: &[Onset], config: &TempoConfig) -> TempoEstimate {
    if onsets.len() < config.min_onsets.max(2) {
        return TempoEstimate::none();
    }
    if config.min_bpm <= 0.0 || config.max_bpm <= config.min_bpm || config.histogram_bins < 3 {
        return TempoEstimate::none();
    }

    let iois = compute_iois(onsets);
    if iois.is_empty() {
        return TempoEstimate::none();
    }

    let histogram = build_ioi_histogram(&iois, config);
    let peaks = find_histogram_peaks(&histogram);

    let Some((interval_ms, confidence)) = select_best_tempo(&peaks, &histogram, config) else {
        return TempoEstimate::none();
    };

    let bpm = (60000.0 / interval_ms).clamp(config.min_bpm, config.max_bpm);
    let beat_positions_ms = generate_beat_grid(onsets, interval_ms);

    TempoEstimate {
        bpm,
        confidence,
        beat_positions_ms,
    }
}

/// Compute inter-onset intervals (time between consecutive onsets)
fn compute_iois(onsets: &[Onset]) -> Vec<f64> {
    onsets
        .windows(2)
        .map(|pair| pair[1].timestamp_ms - pair[0].timestamp_ms)
        .filter(|&interval| interval > 0.0)
        .collect()
}

/// Interval range in ms covered by the histogram: (shortest, longest)
fn interval_range(config: &TempoConfig) -> (f64, f64) {
    (60000.0 / config.max_bpm, 60000.0 / config.min_bpm)
}

/// Build histogram of inter-onset intervals
/// Bins are distributed linearly across the interval range
fn build_ioi_histogram(iois: &[f64], config: &TempoConfig) -> Vec<f32> {
    let (min_interval_ms, max_interval_ms) = interval_range(config);
    let bins = config.histogram_bins;
    let bin_width = (max_interval_ms - min_interval_ms) / bins as f64;
    let mut histogram = vec![0.0f32; bins];

    let mut vote = |interval: f64, weight: f32| {
        if interval >= min_interval_ms && interval <= max_interval_ms {
            let bin = (((interval - min_interval_ms) / bin_width) as usize).min(bins - 1);
            histogram[bin] += weight;
        }
    };

    for &ioi in iois {
        vote(ioi, 1.0);
        // Half and double tempo share some evidence (2:1 and 1:2 relationships)
        vote(ioi / 2.0, 0.5);
        vote(ioi * 2.0, 0.5);
    }

    smooth_histogram(&histogram, 3)
}

/// Smooth histogram using moving average filter
fn smooth_histogram(histogram: &[f32], window_size: usize) -> Vec<f32> {
    let half_window = window_size / 2;

    (0..histogram.len())
        .map(|i| {
            let start = i.saturating_sub(half_window);
            let end = (i + half_window + 1).min(histogram.len());
            histogram[start..end].iter().sum::<f32>() / (end - start) as f32
        })
        .collect()
}

/// Local maxima of the histogram, strongest first
/// The left edge of a plateau counts as its peak
fn find_histogram_peaks(histogram: &[f32]) -> Vec<(usize, f32)> {
    if histogram.len() < 3 {
        return Vec::new();
    }

    let mut peaks: Vec<(usize, f32)> = (1..histogram.len() - 1)
        .filter(|&i| histogram[i] > histogram[i - 1] && histogram[i] >= histogram[i + 1])
        .map(|i| (i, histogram[i]))
        .collect();

    peaks.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    peaks.truncate(5);
    peaks
}

/// Convert the strongest peak to a beat interval and a confidence
fn select_best_tempo(
    peaks: &[(usize, f32)],
    histogram: &[f32],
    config: &TempoConfig,
) -> Option<(f64, f32)> {
    let &(best_bin, peak_strength) = peaks.first()?;

    let (min_interval_ms, max_interval_ms) = interval_range(config);
    let bin_width = (max_interval_ms - min_interval_ms) / config.histogram_bins as f64;

    // Center of the bin
    let interval_ms = min_interval_ms + (best_bin as f64 + 0.5) * bin_width;

    // Confidence: peak strength relative to the histogram mean
    let histogram_mean: f32 = histogram.iter().sum::<f32>() / histogram.len() as f32;
    let confidence = if histogram_mean > 0.0 && peak_strength.is_finite() {
        let raw = peak_strength / (histogram_mean * 3.0);
        if raw.is_finite() {
            raw.min(1.0)
        } else {
            0.0
        }
    } else {
        0.0
    };

    Some((interval_ms, confidence))
}

/// Generate beat grid positions based on estimated beat interval
/// Tests several phase offsets and keeps the one best aligned with onsets
fn generate_beat_grid(onsets: &[Onset], interval_ms: f64) -> Vec<f64> {
    let (Some(first), Some(last)) = (onsets.first(), onsets.last()) else {
        return Vec::new();
    };
    let first_onset = first.timestamp_ms;
    let last_onset = last.timestamp_ms;

    if last_onset <= first_onset || interval_ms <= 0.0 {
        return Vec::new();
    }

    let num_phase_tests = 8;
    let phase_step = interval_ms / num_phase_tests as f64;

    let mut best_phase = first_onset;
    let mut best_score = 0.0;

    for i in 0..num_phase_tests {
        let phase = first_onset + (i as f64 * phase_step);
        let score = score_beat_alignment(onsets, phase, interval_ms, last_onset);

        if score > best_score {
            best_score = score;
            best_phase = phase;
        }
    }

    let mut beat_positions = Vec::new();
    let mut beat_time = best_phase;

    while beat_time <= last_onset + interval_ms {
        beat_positions.push(beat_time);
        beat_time += interval_ms;
    }

    beat_positions
}

/// Score how well a beat grid aligns with detected onsets
fn score_beat_alignment(onsets: &[Onset], phase: f64, interval_ms: f64, end_time: f64) -> f64 {
    let tolerance_ms = interval_ms * 0.15; // 15% tolerance window
    let mut score = 0.0;

    let mut beat_time = phase;
    while beat_time <= end_time {
        let closest_distance = onsets
            .iter()
            .map(|onset| (onset.timestamp_ms - beat_time).abs())
            .fold(f64::MAX, f64::min);

        if closest_distance < tolerance_ms {
            score += (tolerance_ms - closest_distance) / tolerance_ms;
        }

        beat_time += interval_ms;
    }

    score
}
