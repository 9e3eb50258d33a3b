// Tag model
// A vocabulary of labels, each described by a prototype segment, stored as JSON

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::tagging::backend::TagError;
use crate::tagging::types::SegmentFeatures;

/// One label of the vocabulary and the segment it looks like
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelPrototype {
    pub tag: String,
    pub prototype: SegmentFeatures,
}

/// Prototype-based tag model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagModel {
    /// Model name (e.g., "builtin")
    pub name: String,

    /// Model format version
    pub version: u32,

    /// Length of the analysis segments in seconds
    #[serde(default = "default_segment_seconds")]
    pub segment_seconds: f32,

    /// Softness of the distance-to-score mapping; larger values flatten scores
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Minimum mean score for a label to appear in the full tag list
    #[serde(default)]
    pub threshold: f32,

    /// Vocabulary in model order
    pub labels: Vec<LabelPrototype>,

    /// Creation timestamp (ISO 8601)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

fn default_segment_seconds() -> f32 {
    3.0
}

fn default_temperature() -> f32 {
    0.25
}

impl TagModel {
    /// Create an empty model with default scoring parameters
    pub fn new(name: impl Into<String>) -> Self {
        TagModel {
            name: name.into(),
            version: 1,
            segment_seconds: default_segment_seconds(),
            temperature: default_temperature(),
            threshold: 0.0,
            labels: Vec::new(),
            created_at: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// Add a label to the vocabulary
    pub fn add_label(&mut self, tag: impl Into<String>, prototype: SegmentFeatures) {
        self.labels.push(LabelPrototype {
            tag: tag.into(),
            prototype,
        });
    }

    /// Label names in model order
    pub fn vocabulary(&self) -> Vec<String> {
        self.labels.iter().map(|l| l.tag.clone()).collect()
    }

    /// Score each label against a segment, in model order
    pub fn score(&self, features: &SegmentFeatures) -> Vec<f32> {
        self.labels
            .iter()
            .map(|label| (-features.distance_to(&label.prototype) / self.temperature).exp())
            .collect()
    }

    /// Reject models the tagger cannot use
    pub fn validate(&self) -> Result<(), TagError> {
        if self.labels.is_empty() {
            return Err(TagError::InvalidModel("model has no labels".to_string()));
        }
        if !(self.segment_seconds > 0.0) {
            return Err(TagError::InvalidModel(format!(
                "segment_seconds must be positive, got {}",
                self.segment_seconds
            )));
        }
        if !(self.temperature > 0.0) {
            return Err(TagError::InvalidModel(format!(
                "temperature must be positive, got {}",
                self.temperature
            )));
        }
        if let Some(label) = self.labels.iter().find(|l| l.tag.trim().is_empty()) {
            return Err(TagError::InvalidModel(format!(
                "blank label name in model (prototype {:?})",
                label.prototype
            )));
        }
        Ok(())
    }

    /// Load and validate a model file
    pub fn load(path: &Path) -> Result<Self, TagError> {
        let data = std::fs::read(path)
            .map_err(|e| TagError::ModelLoadError(format!("{}: {}", path.display(), e)))?;
        let model = Self::from_json_bytes(&data)?;
        model.validate()?;

        log::info!(
            "Loaded tag model '{}' v{} with {} labels from {}",
            model.name,
            model.version,
            model.labels.len(),
            path.display()
        );

        Ok(model)
    }

    /// Serialize model to JSON bytes
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    /// Deserialize model from JSON bytes
    pub fn from_json_bytes(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }

    /// Default vocabulary with hand-tuned prototypes
    pub fn builtin() -> Self {
        let mut model = TagModel {
            name: "builtin".to_string(),
            version: 1,
            segment_seconds: default_segment_seconds(),
            temperature: default_temperature(),
            threshold: 0.0,
            labels: Vec::new(),
            created_at: None,
        };

        // (tag, centroid Hz, zcr, low, mid, high, rms, onsets/s)
        let prototypes: [(&str, f32, f32, f32, f32, f32, f32, f32); 14] = [
            ("piano", 1200.0, 0.04, 0.25, 0.60, 0.15, 0.08, 3.0),
            ("classical", 1000.0, 0.03, 0.30, 0.55, 0.15, 0.05, 1.5),
            ("strings", 1400.0, 0.05, 0.20, 0.60, 0.20, 0.06, 1.0),
            ("guitar", 1800.0, 0.07, 0.20, 0.55, 0.25, 0.08, 3.0),
            ("ambient", 800.0, 0.03, 0.45, 0.45, 0.10, 0.03, 0.5),
            ("slow", 900.0, 0.04, 0.40, 0.48, 0.12, 0.04, 1.0),
            ("fast", 2500.0, 0.12, 0.25, 0.40, 0.35, 0.12, 7.0),
            ("drums", 3000.0, 0.15, 0.40, 0.20, 0.40, 0.15, 6.0),
            ("techno", 2200.0, 0.10, 0.50, 0.25, 0.25, 0.20, 8.0),
            ("electronic", 2600.0, 0.12, 0.35, 0.30, 0.35, 0.15, 6.0),
            ("rock", 2800.0, 0.13, 0.30, 0.35, 0.35, 0.20, 5.0),
            ("vocal", 1600.0, 0.08, 0.15, 0.65, 0.20, 0.09, 3.5),
            ("quiet", 700.0, 0.03, 0.40, 0.50, 0.10, 0.01, 0.5),
            ("loud", 3000.0, 0.14, 0.35, 0.30, 0.35, 0.30, 5.0),
        ];

        for (tag, centroid, zcr, low, mid, high, rms, onset_rate) in prototypes {
            model.add_label(
                tag,
                SegmentFeatures {
                    spectral_centroid: centroid,
                    zcr,
                    low_band_energy: low,
                    mid_band_energy: mid,
                    high_band_energy: high,
                    rms,
                    onset_rate,
                },
            );
        }

        model
    }
}
