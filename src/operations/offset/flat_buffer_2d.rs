use std::f64::consts::TAU;

use geo::{Coord, LineString, Polygon};

use crate::error::{GeometryError, OperationError, Result};
use crate::geometry::shape::line_string_from_points;
use crate::math::polygon_2d::{is_valid_ring, left_normal, open_ring, segment_direction};
use crate::math::{coincident, is_finite, Point2, TOLERANCE};
use crate::operations::boolean::{Repair, Union};

/// Number of vertices used to approximate a round join.
const JOIN_SEGMENTS: u32 = 64;

/// Joints whose directions are this close to parallel get no round join.
const STRAIGHT_JOINT_COS: f64 = 1.0 - 1e-9;

/// Buffers a 2D polyline or ring with flat end caps and round joins.
///
/// The outline is assembled from simple pieces and unioned:
///
/// 1. A rectangle of half-width `distance` along every segment.
/// 2. A disc of radius `distance` at every turning joint.
/// 3. For closed rings, the ring's own interior.
///
/// Open polylines get no disc at their two ends, so the buffer stops flush
/// with the end vertices (flat cap).
#[derive(Debug)]
pub struct FlatBuffer2D {
    points: Vec<Point2>,
    distance: f64,
    closed: bool,
}

impl FlatBuffer2D {
    /// Creates a new buffer operation.
    #[must_use]
    pub fn new(points: Vec<Point2>, distance: f64, closed: bool) -> Self {
        Self {
            points,
            distance,
            closed,
        }
    }

    /// Executes the buffer, returning the disjoint outline polygons.
    ///
    /// # Errors
    ///
    /// - `GeometryError::NonFinite` for NaN or infinite coordinates
    /// - `GeometryError::TooFewVertices` for rings under 3 or lines under 2 vertices
    /// - `GeometryError::Degenerate` for zero-length lines or a zero-width line buffer
    /// - `OperationError::InvalidInput` for a negative or non-finite distance
    /// - `OperationError::Failed` if the union of the pieces is empty
    pub fn execute(&self) -> Result<Vec<Polygon<f64>>> {
        if let Some(p) = self.points.iter().find(|p| !is_finite(p)) {
            return Err(GeometryError::NonFinite { x: p.x, y: p.y }.into());
        }
        if !self.distance.is_finite() || self.distance < 0.0 {
            return Err(OperationError::InvalidInput(format!(
                "buffer distance {} must be finite and non-negative",
                self.distance
            ))
            .into());
        }

        let pieces = if self.closed {
            self.ring_pieces()?
        } else {
            self.line_pieces()?
        };

        let outline = Union::new(&pieces).execute();
        if outline.is_empty() {
            return Err(OperationError::Failed("buffer produced no area".to_owned()).into());
        }
        Ok(outline)
    }

    fn ring_pieces(&self) -> Result<Vec<Polygon<f64>>> {
        let ring = open_ring(&self.points);
        let n = ring.len();
        if n < 3 {
            return Err(GeometryError::TooFewVertices {
                required: 3,
                actual: n,
            }
            .into());
        }

        let body = Polygon::new(line_string_from_points(&ring), Vec::new());
        let mut pieces = if is_valid_ring(&ring) {
            vec![body]
        } else {
            Repair::new(&body).execute()
        };
        if self.distance < TOLERANCE {
            return Ok(pieces);
        }

        for i in 0..n {
            pieces.push(segment_rectangle(&ring[i], &ring[(i + 1) % n], self.distance)?);
            pieces.push(disc(&ring[i], self.distance));
        }
        Ok(pieces)
    }

    fn line_pieces(&self) -> Result<Vec<Polygon<f64>>> {
        let mut path: Vec<Point2> = Vec::with_capacity(self.points.len());
        for p in &self.points {
            if !path.last().is_some_and(|last| coincident(last, p)) {
                path.push(*p);
            }
        }
        if self.points.len() < 2 {
            return Err(GeometryError::TooFewVertices {
                required: 2,
                actual: self.points.len(),
            }
            .into());
        }
        if path.len() < 2 {
            return Err(GeometryError::Degenerate("zero-length line".to_owned()).into());
        }
        if self.distance < TOLERANCE {
            return Err(GeometryError::Degenerate("zero-width line buffer".to_owned()).into());
        }

        let mut pieces = Vec::with_capacity(path.len() * 2);
        let mut directions = Vec::with_capacity(path.len() - 1);
        for w in path.windows(2) {
            directions.push(segment_direction(&w[0], &w[1])?);
            pieces.push(segment_rectangle(&w[0], &w[1], self.distance)?);
        }

        // Interior joints.
        for i in 1..path.len() - 1 {
            if directions[i - 1].dot(&directions[i]) < STRAIGHT_JOINT_COS {
                pieces.push(disc(&path[i], self.distance));
            }
        }

        // A path drawn back onto its start has a joint there too.
        let last = path.len() - 1;
        if last >= 2 && coincident(&path[0], &path[last]) {
            pieces.push(disc(&path[0], self.distance));
        }
        Ok(pieces)
    }
}

/// Rectangle of half-width `distance` centered on segment `a`→`b`.
fn segment_rectangle(a: &Point2, b: &Point2, distance: f64) -> Result<Polygon<f64>> {
    let offset = left_normal(segment_direction(a, b)?) * distance;
    let corners = [a + offset, a - offset, b - offset, b + offset];
    Ok(Polygon::new(line_string_from_points(&corners), Vec::new()))
}

/// Regular polygon approximating a circle of radius `distance`.
fn disc(center: &Point2, distance: f64) -> Polygon<f64> {
    let coords = (0..JOIN_SEGMENTS)
        .map(|i| {
            let angle = TAU * f64::from(i) / f64::from(JOIN_SEGMENTS);
            Coord {
                x: center.x + distance * angle.cos(),
                y: center.y + distance * angle.sin(),
            }
        })
        .collect();
    Polygon::new(LineString::new(coords), Vec::new())
}
