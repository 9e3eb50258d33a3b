// Signal analysis module
// Loudness and tempo extraction consumed by the enricher

pub mod analyzer;

pub use analyzer::{DspAnalyzer, FeatureError, FeatureResult, SignalAnalyzer};
