use geo::{BooleanOps, MultiPolygon, Polygon};

use crate::geometry::Shape;

/// Rebuilds a possibly self-intersecting polygon as valid, disjoint regions.
///
/// Equivalent to a zero-distance buffer: the ring is run through the
/// overlay engine on its own, which splits it at its self-crossings.
pub struct Repair<'a> {
    polygon: &'a Polygon<f64>,
}

impl<'a> Repair<'a> {
    /// Creates a new `Repair` operation.
    #[must_use]
    pub fn new(polygon: &'a Polygon<f64>) -> Self {
        Self { polygon }
    }

    /// Executes the repair. An empty result means the ring enclosed no area.
    #[must_use]
    pub fn execute(&self) -> Vec<Polygon<f64>> {
        let subject = MultiPolygon::new(vec![self.polygon.clone()]);
        let resolved = subject.union(&MultiPolygon::new(Vec::new()));
        Shape::polygons(Shape::flatten(resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Area};

    #[test]
    fn bowtie_splits_into_two_triangles() {
        let bowtie = polygon![
            (x: 0.0, y: 0.0),
            (x: 2.0, y: 2.0),
            (x: 2.0, y: 0.0),
            (x: 0.0, y: 2.0),
        ];
        let parts = Repair::new(&bowtie).execute();
        assert_eq!(parts.len(), 2);
        for part in &parts {
            assert!((part.unsigned_area() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn flat_ring_repairs_to_nothing() {
        let flat = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0)];
        assert!(Repair::new(&flat).execute().is_empty());
    }
}
