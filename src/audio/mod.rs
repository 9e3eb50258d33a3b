// Audio processing module
// Handles file decoding, loudness and spectral analysis

pub mod features;
pub mod ingest;

pub use features::{detect_onsets, extract_features, frame_rms, mean_rms, Onset, OnsetConfig};
pub use ingest::{decode_file, load_audio, load_signal, load_wav, AudioData, AudioError, Signal};
