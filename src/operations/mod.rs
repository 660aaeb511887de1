pub mod boolean;
pub mod consolidate;
pub mod extract;
pub mod offset;
pub mod talus;
pub mod trim;

pub use consolidate::{ConsolidateBuildings, Consolidation};
pub use extract::{ExtractFeature, ExtractFeatures, ExtractedFeatures, LayerClassifier};
pub use trim::{TrimContours, TrimMasks, TrimOutcome, TrimStage};
