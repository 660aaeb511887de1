use spade::{DelaunayTriangulation, HasPosition, Point2 as SpadePoint2, Triangulation};
use tracing::{info, warn};

use crate::geometry::LineFeature;
use crate::math::Point2;

/// A base talus line matched to its nearest top talus line.
///
/// Indices refer to the slices given to [`PairTalus::new`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TalusPair {
    pub base: usize,
    pub top: usize,
    /// Distance between the two lines' midpoints.
    pub distance: f64,
}

/// Top-line midpoint stored in the spatial index.
#[derive(Debug, Clone, Copy)]
struct Midpoint {
    position: SpadePoint2<f64>,
    top: usize,
}

impl HasPosition for Midpoint {
    type Scalar = f64;

    fn position(&self) -> SpadePoint2<f64> {
        self.position
    }
}

/// Matches base talus lines to top talus lines by nearest midpoint.
///
/// Several base lines may claim the same top line; no one-to-one matching
/// is attempted.
pub struct PairTalus<'a> {
    base: &'a [LineFeature],
    top: &'a [LineFeature],
    max_distance: f64,
}

impl<'a> PairTalus<'a> {
    /// Creates a new `PairTalus` operation.
    #[must_use]
    pub fn new(base: &'a [LineFeature], top: &'a [LineFeature], max_distance: f64) -> Self {
        Self {
            base,
            top,
            max_distance,
        }
    }

    /// Executes the pairing.
    ///
    /// Base lines whose nearest top midpoint lies farther than the maximum
    /// distance produce no pair. Returns an empty list if either side is
    /// empty.
    #[must_use]
    pub fn execute(&self) -> Vec<TalusPair> {
        if self.base.is_empty() || self.top.is_empty() {
            warn!(
                base = self.base.len(),
                top = self.top.len(),
                "missing talus lines for pairing"
            );
            return Vec::new();
        }

        let index = self.build_index();
        let pairs: Vec<TalusPair> = self
            .base
            .iter()
            .enumerate()
            .filter_map(|(base, line)| {
                let mid = line.midpoint();
                let nearest = index.nearest_neighbor(SpadePoint2::new(mid.x, mid.y))?;
                let top = nearest.data().top;
                let distance = nalgebra::distance(&mid, &self.top[top].midpoint());
                (distance <= self.max_distance).then_some(TalusPair {
                    base,
                    top,
                    distance,
                })
            })
            .collect();

        info!(
            paired = pairs.len(),
            base = self.base.len(),
            "paired talus lines"
        );
        pairs
    }

    /// Indexes top-line midpoints. Coincident midpoints share one vertex,
    /// which keeps the last top line inserted there.
    fn build_index(&self) -> DelaunayTriangulation<Midpoint> {
        let mut index = DelaunayTriangulation::<Midpoint>::new();
        for (top, line) in self.top.iter().enumerate() {
            let mid: Point2 = line.midpoint();
            let vertex = Midpoint {
                position: SpadePoint2::new(mid.x, mid.y),
                top,
            };
            if let Err(err) = index.insert(vertex) {
                warn!(top, error = ?err, "cannot index talus midpoint");
            }
        }
        index
    }
}
