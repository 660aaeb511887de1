use crate::error::{GeometryError, Result};
use crate::math::polygon_2d::{close_ring, is_valid_ring, open_ring, signed_area_2d};
use crate::math::polyline_2d::{interpolate_normalized, polyline_length};
use crate::math::{is_finite, Point2};

use super::shape::{line_string_from_points, points_from_line_string};

/// Role of a feature, derived from its drawing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureClass {
    Building,
    BaseTalus,
    TopTalus,
    /// Contour on the configured elevation layer with this index.
    Contour(usize),
    /// Slope face synthesized between a base and a top talus line.
    TalusStrip,
    Unclassified,
}

/// An open polyline of at least two finite points.
#[derive(Debug, Clone, PartialEq)]
pub struct LineFeature {
    points: Vec<Point2>,
    length: f64,
    class: FeatureClass,
}

impl LineFeature {
    /// Creates a line feature.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::TooFewVertices` for fewer than 2 points and
    /// `GeometryError::NonFinite` for NaN or infinite coordinates.
    pub fn new(points: Vec<Point2>, class: FeatureClass) -> Result<Self> {
        if points.len() < 2 {
            return Err(GeometryError::TooFewVertices {
                required: 2,
                actual: points.len(),
            }
            .into());
        }
        check_finite(&points)?;
        let length = polyline_length(&points);
        Ok(Self {
            points,
            length,
            class,
        })
    }

    /// Creates a new feature of the same class over different points.
    ///
    /// # Errors
    ///
    /// Same as [`LineFeature::new`].
    pub fn with_points(&self, points: Vec<Point2>) -> Result<Self> {
        Self::new(points, self.class)
    }

    #[must_use]
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    #[must_use]
    pub fn class(&self) -> FeatureClass {
        self.class
    }

    /// Point halfway along the line by arc length.
    #[must_use]
    pub fn midpoint(&self) -> Point2 {
        interpolate_normalized(&self.points, 0.5).unwrap_or(self.points[0])
    }

    #[must_use]
    pub fn to_line_string(&self) -> geo::LineString<f64> {
        line_string_from_points(&self.points)
    }

    #[must_use]
    pub fn into_points(self) -> Vec<Point2> {
        self.points
    }
}

/// A polygon given by its outer ring (stored open, without the closing
/// vertex) and optional holes, plus a validity flag computed on creation.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonFeature {
    ring: Vec<Point2>,
    holes: Vec<Vec<Point2>>,
    class: FeatureClass,
    valid: bool,
}

impl PolygonFeature {
    /// Creates a polygon feature from a ring, closed or not.
    ///
    /// # Errors
    ///
    /// Returns `GeometryError::TooFewVertices` if the ring has fewer than 3
    /// distinct vertices and `GeometryError::NonFinite` for bad coordinates.
    pub fn new(ring: Vec<Point2>, class: FeatureClass) -> Result<Self> {
        check_finite(&ring)?;
        let ring = open_ring(&ring);
        if ring.len() < 3 {
            return Err(GeometryError::TooFewVertices {
                required: 3,
                actual: ring.len(),
            }
            .into());
        }
        let valid = is_valid_ring(&ring);
        Ok(Self {
            ring,
            holes: Vec::new(),
            class,
            valid,
        })
    }

    /// Converts a polygon coming out of a boolean operation.
    ///
    /// # Errors
    ///
    /// Same as [`PolygonFeature::new`].
    pub fn from_polygon(polygon: &geo::Polygon<f64>, class: FeatureClass) -> Result<Self> {
        let mut feature = Self::new(points_from_line_string(polygon.exterior()), class)?;
        feature.holes = polygon
            .interiors()
            .iter()
            .map(|hole| open_ring(&points_from_line_string(hole)))
            .filter(|hole| hole.len() >= 3)
            .collect();
        Ok(feature)
    }

    /// Outer ring vertices, without the closing duplicate.
    #[must_use]
    pub fn ring(&self) -> &[Point2] {
        &self.ring
    }

    #[must_use]
    pub fn holes(&self) -> &[Vec<Point2>] {
        &self.holes
    }

    #[must_use]
    pub fn class(&self) -> FeatureClass {
        self.class
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Enclosed area (outer ring minus holes).
    #[must_use]
    pub fn area(&self) -> f64 {
        let holes: f64 = self.holes.iter().map(|h| signed_area_2d(h).abs()).sum();
        signed_area_2d(&self.ring).abs() - holes
    }

    #[must_use]
    pub fn to_polygon(&self) -> geo::Polygon<f64> {
        geo::Polygon::new(
            line_string_from_points(&self.ring),
            self.holes
                .iter()
                .map(|h| line_string_from_points(h))
                .collect(),
        )
    }

    /// The outer ring as a closed line of the same class.
    #[must_use]
    pub fn boundary(&self) -> LineFeature {
        let points = close_ring(&self.ring);
        let length = polyline_length(&points);
        LineFeature {
            points,
            length,
            class: self.class,
        }
    }
}

/// Output of feature extraction: either a line or a polygon.
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    Line(LineFeature),
    Polygon(PolygonFeature),
}

impl Feature {
    #[must_use]
    pub fn class(&self) -> FeatureClass {
        match self {
            Self::Line(line) => line.class(),
            Self::Polygon(polygon) => polygon.class(),
        }
    }

    /// Returns the feature as a line; polygons yield their closed outer ring.
    #[must_use]
    pub fn into_line(self) -> LineFeature {
        match self {
            Self::Line(line) => line,
            Self::Polygon(polygon) => polygon.boundary(),
        }
    }
}

fn check_finite(points: &[Point2]) -> Result<()> {
    match points.iter().find(|p| !is_finite(p)) {
        Some(p) => Err(GeometryError::NonFinite { x: p.x, y: p.y }.into()),
        None => Ok(()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn line_requires_two_points() {
        let err = LineFeature::new(vec![Point2::new(0.0, 0.0)], FeatureClass::Unclassified);
        assert!(err.is_err());
    }

    #[test]
    fn line_rejects_nan() {
        let err = LineFeature::new(
            vec![Point2::new(0.0, 0.0), Point2::new(f64::NAN, 1.0)],
            FeatureClass::Unclassified,
        );
        assert!(err.is_err());
    }

    #[test]
    fn line_length_and_midpoint() {
        let line = LineFeature::new(
            vec![Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)],
            FeatureClass::BaseTalus,
        )
        .unwrap();
        assert!((line.length() - 10.0).abs() < 1e-12);
        assert_eq!(line.midpoint(), Point2::new(5.0, 0.0));
        assert_eq!(line.class(), FeatureClass::BaseTalus);
    }

    #[test]
    fn polygon_strips_closing_vertex() {
        let ring = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 0.0),
        ];
        let polygon = PolygonFeature::new(ring, FeatureClass::Building).unwrap();
        assert_eq!(polygon.ring().len(), 3);
        assert!(polygon.is_valid());
        assert!((polygon.area() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn bowtie_polygon_is_flagged_invalid() {
        let ring = vec![
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(2.0, 0.0),
            Point2::new(0.0, 2.0),
        ];
        let polygon = PolygonFeature::new(ring, FeatureClass::Building).unwrap();
        assert!(!polygon.is_valid());
    }

    #[test]
    fn polygon_boundary_is_closed_line() {
        let ring = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
        ];
        let polygon = PolygonFeature::new(ring, FeatureClass::TopTalus).unwrap();
        let line = Feature::Polygon(polygon).into_line();
        assert_eq!(line.points().len(), 4);
        assert_eq!(line.points().first(), line.points().last());
        assert_eq!(line.class(), FeatureClass::TopTalus);
    }
}
