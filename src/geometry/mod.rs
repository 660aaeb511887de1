pub mod entity;
pub mod feature;
pub mod mask;
pub mod shape;

pub use entity::{EntityKind, RawEntity};
pub use feature::{Feature, FeatureClass, LineFeature, PolygonFeature};
pub use mask::{BuildingMask, Mask};
pub use shape::Shape;
