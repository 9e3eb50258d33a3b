// Spectral feature extraction and onset detection
// Frame-wise RMS loudness, Spectral Flux onsets and per-segment descriptors used by the tagger

use realfft::{RealFftPlanner, RealToComplex};
use std::sync::Arc;

use crate::tagging::types::SegmentFeatures;

/// Frame length used for RMS loudness (samples)
pub const RMS_FRAME_LENGTH: usize = 2048;

/// Hop between RMS frames (samples)
pub const RMS_HOP_LENGTH: usize = 512;

/// Onset detection result
#[derive(Debug, Clone)]
pub struct Onset {
    /// Timestamp in milliseconds from start of audio
    pub timestamp_ms: f64,
}

/// Configuration for onset detection
#[derive(Debug, Clone)]
pub struct OnsetConfig {
    /// FFT window size in samples (power of 2)
    pub window_size: usize,

    /// Hop size in samples (advance between frames)
    pub hop_size: usize,

    /// Threshold multiplier for adaptive peak picking
    /// Threshold = mean(flux) + threshold_factor * std(flux)
    pub threshold_factor: f32,

    /// Minimum time between onsets in milliseconds
    pub min_onset_gap_ms: f64,
}

impl Default for OnsetConfig {
    fn default() -> Self {
        OnsetConfig {
            window_size: 2048,
            hop_size: 512,
            threshold_factor: 1.5,
            min_onset_gap_ms: 30.0,
        }
    }
}

/// Root-mean-square amplitude for each centered frame
///
/// Frames are centered on multiples of `hop_length` and the signal is
/// zero-padded by half a frame on both sides, so a signal of `n` samples
/// yields `1 + n / hop_length` frames.
pub fn frame_rms(samples: &[f32], frame_length: usize, hop_length: usize) -> Vec<f32> {
    if frame_length == 0 || hop_length == 0 {
        return Vec::new();
    }

    // Prefix sums of squares keep this linear in the signal length
    let mut prefix = Vec::with_capacity(samples.len() + 1);
    prefix.push(0.0f64);
    let mut acc = 0.0f64;
    for &s in samples {
        acc += (s as f64) * (s as f64);
        prefix.push(acc);
    }

    let pad = frame_length / 2;
    let num_frames = 1 + samples.len() / hop_length;

    (0..num_frames)
        .map(|frame_idx| {
            let center = frame_idx * hop_length;
            let start = center.saturating_sub(pad).min(samples.len());
            let end = (center + frame_length - pad).min(samples.len());
            let energy = prefix[end] - prefix[start];
            (energy / frame_length as f64).sqrt() as f32
        })
        .collect()
}

/// Mean of the frame-wise RMS curve, the loudness estimate written to the table
pub fn mean_rms(samples: &[f32]) -> f32 {
    let frames = frame_rms(samples, RMS_FRAME_LENGTH, RMS_HOP_LENGTH);
    if frames.is_empty() {
        return 0.0;
    }
    frames.iter().sum::<f32>() / frames.len() as f32
}

/// Describe a segment of mono audio for tag scoring
pub fn extract_features(samples: &[f32], sample_rate: u32) -> SegmentFeatures {
    if samples.is_empty() || sample_rate == 0 {
        return SegmentFeatures::zero();
    }

    let zcr = calculate_zcr(samples);
    let rms = mean_rms(samples);
    let (centroid, band_energies) = calculate_spectral_features(samples, sample_rate, 2048);

    let duration_secs = samples.len() as f32 / sample_rate as f32;
    let onsets = detect_onsets(samples, sample_rate, &OnsetConfig::default());
    let onset_rate = if duration_secs > 0.0 {
        onsets.len() as f32 / duration_secs
    } else {
        0.0
    };

    SegmentFeatures {
        spectral_centroid: centroid,
        zcr,
        low_band_energy: band_energies[0],
        mid_band_energy: band_energies[1],
        high_band_energy: band_energies[2],
        rms,
        onset_rate,
    }
}

/// Calculate Zero-Crossing Rate (ZCR)
/// Higher ZCR indicates noisy/unvoiced content
fn calculate_zcr(samples: &[f32]) -> f32 {
    if samples.len() < 2 {
        return 0.0;
    }

    let crossings = samples
        .windows(2)
        .filter(|pair| (pair[1] >= 0.0) != (pair[0] >= 0.0))
        .count();

    crossings as f32 / (samples.len() - 1) as f32
}

/// Spectral centroid and band energy ratios accumulated over consecutive frames
/// Returns (centroid in Hz, [low, mid, high] energy ratios)
fn calculate_spectral_features(
    samples: &[f32],
    sample_rate: u32,
    window_size: usize,
) -> (f32, [f32; 3]) {
    let analyzer = SpectrumAnalyzer::new(window_size);
    let bin_width = sample_rate as f32 / window_size as f32;

    // Band boundaries: low (0-200 Hz), mid (200-2000 Hz), high (2000+ Hz)
    let low_max_bin = (200.0 / bin_width) as usize;
    let mid_max_bin = (2000.0 / bin_width) as usize;

    let mut weighted_sum = 0.0f64;
    let mut total_magnitude = 0.0f64;
    let mut bands = [0.0f64; 3];

    for frame in samples.chunks(window_size) {
        let spectrum = analyzer.magnitudes(frame);

        for (i, &magnitude) in spectrum.iter().enumerate() {
            let frequency = i as f32 * bin_width;
            weighted_sum += (frequency * magnitude) as f64;
            total_magnitude += magnitude as f64;

            let energy = (magnitude * magnitude) as f64;
            if i < low_max_bin {
                bands[0] += energy;
            } else if i < mid_max_bin {
                bands[1] += energy;
            } else {
                bands[2] += energy;
            }
        }
    }

    let centroid = if total_magnitude > 0.0 {
        (weighted_sum / total_magnitude) as f32
    } else {
        0.0
    };

    let total_energy: f64 = bands.iter().sum();
    let ratios = if total_energy > 0.0 {
        [
            (bands[0] / total_energy) as f32,
            (bands[1] / total_energy) as f32,
            (bands[2] / total_energy) as f32,
        ]
    } else {
        [0.0, 0.0, 0.0]
    };

    (centroid, ratios)
}

/// Apply Hann window function to reduce spectral leakage
fn apply_hann_window(samples: &mut [f32]) {
    let n = samples.len();
    if n == 0 {
        return;
    }

    for (i, sample) in samples.iter_mut().enumerate() {
        let window_val = 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos());
        *sample *= window_val;
    }
}

/// Windowed magnitude spectrum with a single planned FFT reused across frames
struct SpectrumAnalyzer {
    fft: Arc<dyn RealToComplex<f32>>,
    size: usize,
}

impl SpectrumAnalyzer {
    fn new(size: usize) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(size);
        SpectrumAnalyzer { fft, size }
    }

    /// Magnitudes of a Hann-windowed frame; shorter frames are zero-padded
    fn magnitudes(&self, frame: &[f32]) -> Vec<f32> {
        let mut input = self.fft.make_input_vec();
        let copy_len = frame.len().min(self.size);
        input[..copy_len].copy_from_slice(&frame[..copy_len]);
        apply_hann_window(&mut input);

        let mut spectrum = self.fft.make_output_vec();
        if self.fft.process(&mut input, &mut spectrum).is_err() {
            return vec![0.0; spectrum.len()];
        }

        spectrum.iter().map(|c| c.norm()).collect()
    }
}

/// Detect onsets in mono audio using Spectral Flux
pub fn detect_onsets(samples: &[f32], sample_rate: u32, config: &OnsetConfig) -> Vec<Onset> {
    if samples.is_empty() || sample_rate == 0 {
        return Vec::new();
    }

    let flux = compute_spectral_flux(samples, config);
    if flux.is_empty() {
        return Vec::new();
    }

    pick_onset_peaks(&flux, sample_rate, config)
}

/// Spectral flux = sum of positive differences between consecutive magnitude spectra
fn compute_spectral_flux(samples: &[f32], config: &OnsetConfig) -> Vec<f32> {
    let window_size = config.window_size;
    let hop_size = config.hop_size;

    if hop_size == 0 || window_size == 0 || samples.len() < window_size {
        return Vec::new();
    }

    let num_frames = (samples.len() - window_size) / hop_size + 1;
    let analyzer = SpectrumAnalyzer::new(window_size);

    let mut flux = Vec::with_capacity(num_frames);
    let mut prev_spectrum: Option<Vec<f32>> = None;

    for frame_idx in 0..num_frames {
        let start = frame_idx * hop_size;
        let spectrum = analyzer.magnitudes(&samples[start..start + window_size]);

        let frame_flux = match prev_spectrum {
            Some(ref prev) => spectrum
                .iter()
                .zip(prev.iter())
                .map(|(curr, prev)| (curr - prev).max(0.0))
                .sum(),
            None => 0.0, // First frame has no flux
        };

        flux.push(frame_flux);
        prev_spectrum = Some(spectrum);
    }

    flux
}

/// Pick onset peaks from spectral flux using adaptive threshold
fn pick_onset_peaks(flux: &[f32], sample_rate: u32, config: &OnsetConfig) -> Vec<Onset> {
    if flux.len() < 3 || config.hop_size == 0 {
        return Vec::new();
    }

    let mean = flux.iter().sum::<f32>() / flux.len() as f32;
    let variance = flux.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / flux.len() as f32;
    let std_dev = variance.sqrt();
    let threshold = mean + config.threshold_factor * std_dev;

    let hop_size = config.hop_size;
    let min_gap_samples = (config.min_onset_gap_ms * sample_rate as f64 / 1000.0) as usize;
    let min_gap_frames = min_gap_samples / hop_size;

    let mut onsets = Vec::new();
    let mut last_onset_frame: Option<usize> = None;

    // Find local maxima above threshold
    for i in 1..flux.len() - 1 {
        let is_peak = flux[i] > flux[i - 1] && flux[i] > flux[i + 1];
        let above_threshold = flux[i] > threshold;
        let gap_ok = last_onset_frame
            .map(|last| i - last >= min_gap_frames)
            .unwrap_or(true);

        if is_peak && above_threshold && gap_ok {
            let timestamp_ms = (i * hop_size) as f64 * 1000.0 / sample_rate as f64;
            onsets.push(Onset { timestamp_ms });

            last_onset_frame = Some(i);
        }
    }

    onsets
}
