use geo::Polygon;
use tracing::info;

use crate::error::Result;
use crate::geometry::shape::points_from_line_string;
use crate::geometry::{BuildingMask, Feature, Mask};
use crate::math::polygon_2d::is_valid_ring;
use crate::operations::boolean::Union;
use crate::operations::offset::FlatBuffer2D;
use crate::task::{TaskFailure, TaskQueue};

/// Result of building consolidation.
#[derive(Debug, Clone, Default)]
pub struct Consolidation {
    pub mask: BuildingMask,
    /// Features whose buffering failed; they are absent from the mask.
    pub failures: Vec<TaskFailure>,
}

/// Merges buffered building features into one mask.
///
/// Wall centerlines are buffered by half the distance on each side so the
/// outline spans the full wall width; closed footprints are grown by the
/// full distance. Every feature is buffered as its own task.
pub struct ConsolidateBuildings<'a> {
    features: &'a [Feature],
    buffer_distance: f64,
}

impl<'a> ConsolidateBuildings<'a> {
    /// Creates a new `ConsolidateBuildings` operation.
    #[must_use]
    pub fn new(features: &'a [Feature], buffer_distance: f64) -> Self {
        Self {
            features,
            buffer_distance,
        }
    }

    /// Executes the consolidation.
    ///
    /// Never fails: features that cannot be buffered are reported in
    /// [`Consolidation::failures`], and the mask is empty when nothing
    /// could be buffered.
    #[must_use]
    pub fn execute(&self) -> Consolidation {
        if self.features.is_empty() {
            return Consolidation::default();
        }

        let report = TaskQueue::new("buffer buildings")
            .run(self.features, |_, feature| buffer_feature(feature, self.buffer_distance));

        let buffered: Vec<Polygon<f64>> = report
            .done
            .into_iter()
            .flat_map(|(_, polygons)| polygons)
            .filter(|p| is_valid_ring(&points_from_line_string(p.exterior())))
            .collect();

        let mask = Mask::from_polygons(Union::new(&buffered).execute());
        info!(
            features = self.features.len(),
            failed = report.failures.len(),
            parts = mask.polygons().len(),
            "consolidated buildings"
        );
        Consolidation {
            mask,
            failures: report.failures,
        }
    }
}

fn buffer_feature(feature: &Feature, distance: f64) -> Result<Vec<Polygon<f64>>> {
    match feature {
        Feature::Line(line) => FlatBuffer2D::new(line.points().to_vec(), distance / 2.0, false).execute(),
        Feature::Polygon(polygon) => {
            FlatBuffer2D::new(polygon.ring().to_vec(), distance, true).execute()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{FeatureClass, LineFeature, PolygonFeature};
    use crate::math::Point2;

    fn footprint(x: f64, y: f64) -> Feature {
        let ring = vec![
            Point2::new(x, y),
            Point2::new(x + 4.0, y),
            Point2::new(x + 4.0, y + 4.0),
            Point2::new(x, y + 4.0),
        ];
        Feature::Polygon(PolygonFeature::new(ring, FeatureClass::Building).unwrap())
    }

    fn wall(x: f64, y: f64) -> Feature {
        let points = vec![Point2::new(x, y), Point2::new(x + 10.0, y)];
        Feature::Line(LineFeature::new(points, FeatureClass::Building).unwrap())
    }

    #[test]
    fn empty_input_gives_empty_mask() {
        let result = ConsolidateBuildings::new(&[], 3.2).execute();
        assert!(result.mask.is_empty());
        assert!(result.failures.is_empty());
    }

    #[test]
    fn wall_is_buffered_by_half_width() {
        let result = ConsolidateBuildings::new(&[wall(0.0, 0.0)], 2.0).execute();
        assert_eq!(result.mask.polygons().len(), 1);
        // 10 long, 1 on each side, flat caps.
        assert!((result.mask.area() - 20.0).abs() < 1e-5);
    }

    #[test]
    fn overlapping_footprints_merge() {
        let features = vec![footprint(0.0, 0.0), footprint(5.0, 0.0), footprint(100.0, 0.0)];
        let result = ConsolidateBuildings::new(&features, 1.0).execute();
        assert_eq!(result.mask.polygons().len(), 2);
    }

    #[test]
    fn one_failing_feature_does_not_abort_the_batch() {
        let mut features: Vec<Feature> = (0..9).map(|i| footprint(f64::from(i) * 20.0, 0.0)).collect();
        // A zero-length wall cannot be buffered.
        let stuck = Point2::new(500.0, 500.0);
        features.insert(
            4,
            Feature::Line(LineFeature::new(vec![stuck, stuck], FeatureClass::Building).unwrap()),
        );

        let result = ConsolidateBuildings::new(&features, 3.2).execute();
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].index, 4);
        assert_eq!(result.mask.polygons().len(), 9);
        for polygon in result.mask.polygons() {
            assert!(is_valid_ring(&points_from_line_string(polygon.exterior())));
        }
    }

    #[test]
    fn all_failures_give_empty_mask() {
        let stuck = Point2::new(1.0, 1.0);
        let features =
            vec![Feature::Line(LineFeature::new(vec![stuck, stuck], FeatureClass::Building).unwrap())];
        let result = ConsolidateBuildings::new(&features, 3.2).execute();
        assert!(result.mask.is_empty());
        assert_eq!(result.failures.len(), 1);
    }
}
