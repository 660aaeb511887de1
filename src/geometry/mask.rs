use geo::{Area, BoundingRect, Intersects, LineString, MultiPolygon, Polygon, Rect};

/// A frozen clipping region.
///
/// Built once per stage and then only read; an empty mask clips nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    region: MultiPolygon<f64>,
    bounds: Option<Rect<f64>>,
}

/// The union of all buffered building footprints.
pub type BuildingMask = Mask;

impl Default for Mask {
    fn default() -> Self {
        Self::empty()
    }
}

impl Mask {
    /// A mask covering nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            region: MultiPolygon::new(Vec::new()),
            bounds: None,
        }
    }

    /// Wraps already-unioned polygons; polygons without area are dropped.
    #[must_use]
    pub fn from_polygons(polygons: Vec<Polygon<f64>>) -> Self {
        let region = MultiPolygon::new(
            polygons
                .into_iter()
                .filter(|p| p.unsigned_area() > 0.0)
                .collect(),
        );
        let bounds = region.bounding_rect();
        Self { region, bounds }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.region.0.is_empty()
    }

    #[must_use]
    pub fn region(&self) -> &MultiPolygon<f64> {
        &self.region
    }

    #[must_use]
    pub fn polygons(&self) -> &[Polygon<f64>] {
        &self.region.0
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.region.unsigned_area()
    }

    /// Returns `true` if the line touches any part of the mask.
    #[must_use]
    pub fn intersects(&self, line: &LineString<f64>) -> bool {
        let (Some(bounds), Some(line_bounds)) = (self.bounds, line.bounding_rect()) else {
            return false;
        };
        if !bounds.intersects(&line_bounds) {
            return false;
        }
        self.region.0.iter().any(|polygon| {
            polygon
                .bounding_rect()
                .is_some_and(|r| r.intersects(&line_bounds))
                && line.intersects(polygon)
        })
    }
}
