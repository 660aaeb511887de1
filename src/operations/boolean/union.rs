use geo::{BooleanOps, MultiPolygon, Polygon};
use rayon::prelude::*;

use crate::geometry::Shape;

/// Computes the union of a set of polygons.
///
/// Pairs are merged in a parallel reduction tree, so large inputs do not
/// degrade into one long chain of unions.
pub struct Union<'a> {
    polygons: &'a [Polygon<f64>],
}

impl<'a> Union<'a> {
    /// Creates a new `Union` operation.
    #[must_use]
    pub fn new(polygons: &'a [Polygon<f64>]) -> Self {
        Self { polygons }
    }

    /// Executes the union, returning the disjoint result polygons.
    ///
    /// An empty input yields an empty list.
    #[must_use]
    pub fn execute(&self) -> Vec<Polygon<f64>> {
        let merged = self
            .polygons
            .par_iter()
            .map(|p| MultiPolygon::new(vec![p.clone()]))
            .reduce(|| MultiPolygon::new(Vec::new()), |a, b| union_pair(&a, &b));
        Shape::polygons(Shape::flatten(merged))
    }
}

fn union_pair(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    if a.0.is_empty() {
        return b.clone();
    }
    if b.0.is_empty() {
        return a.clone();
    }
    a.union(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Area};

    fn square(x: f64, y: f64, size: f64) -> Polygon<f64> {
        polygon![
            (x: x, y: y),
            (x: x + size, y: y),
            (x: x + size, y: y + size),
            (x: x, y: y + size),
        ]
    }

    #[test]
    fn overlapping_squares_merge() {
        let input = vec![square(0.0, 0.0, 2.0), square(1.0, 1.0, 2.0)];
        let result = Union::new(&input).execute();
        assert_eq!(result.len(), 1);
        let area: f64 = result.iter().map(|p| p.unsigned_area()).sum();
        assert!((area - 7.0).abs() < 1e-5, "area={area}");
    }

    #[test]
    fn disjoint_squares_stay_apart() {
        let input: Vec<Polygon<f64>> = (0..6)
            .map(|i| square(f64::from(i) * 10.0, 0.0, 1.0))
            .collect();
        let result = Union::new(&input).execute();
        assert_eq!(result.len(), 6);
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(Union::new(&[]).execute().is_empty());
    }
}
