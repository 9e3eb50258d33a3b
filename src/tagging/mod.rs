// Tagging module
// Tag prediction interface, prototype tag model and the shipped tagger

pub mod backend;
pub mod model;
pub mod prototype;
pub mod types;

pub use backend::{TagError, TagPredictor};
pub use model::{LabelPrototype, TagModel};
pub use prototype::{PrototypeTagger, DEFAULT_TOP_N};
pub use types::{SegmentFeatures, TagExtraction, TagResult, Taggram};
