use super::intersect_2d::{collinear_overlap_2d, segment_segment_intersect_2d};
use super::{coincident, Point2, Vector2, TOLERANCE};
use crate::error::{GeometryError, Result};

/// Computes the signed area of a ring (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise. A closing
/// duplicate vertex contributes nothing.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Removes consecutive duplicate vertices and a trailing closing vertex.
#[must_use]
pub fn open_ring(points: &[Point2]) -> Vec<Point2> {
    let mut ring: Vec<Point2> = Vec::with_capacity(points.len());
    for p in points {
        if !ring.last().is_some_and(|last| coincident(last, p)) {
            ring.push(*p);
        }
    }
    while ring.len() > 1 && ring.first().zip(ring.last()).is_some_and(|(a, b)| coincident(a, b)) {
        ring.pop();
    }
    ring
}

/// Appends the first vertex if the ring is not already closed.
#[must_use]
pub fn close_ring(points: &[Point2]) -> Vec<Point2> {
    let mut ring = points.to_vec();
    if let (Some(first), Some(last)) = (points.first(), points.last()) {
        if points.len() > 1 && first != last {
            ring.push(*first);
        }
    }
    ring
}

/// Finds the first pair of non-adjacent ring edges that touch or cross.
///
/// `ring` must be open (no closing duplicate). Edge `i` runs from vertex `i`
/// to vertex `(i + 1) % n`. Returns `(i, j)` with `i < j`.
#[must_use]
pub fn find_self_intersection(ring: &[Point2]) -> Option<(usize, usize)> {
    let n = ring.len();
    if n < 4 {
        return None;
    }
    for i in 0..n {
        let (a0, a1) = (&ring[i], &ring[(i + 1) % n]);
        for j in i + 1..n {
            let (b0, b1) = (&ring[j], &ring[(j + 1) % n]);
            if are_adjacent(i, j, n) {
                // Adjacent edges may only share their common vertex.
                if collinear_overlap_2d(a0, a1, b0, b1) {
                    return Some((i, j));
                }
                continue;
            }
            if segment_segment_intersect_2d(a0, a1, b0, b1).is_some()
                || collinear_overlap_2d(a0, a1, b0, b1)
            {
                return Some((i, j));
            }
        }
    }
    None
}

/// Checks whether segments i and j are adjacent in a closed ring.
fn are_adjacent(i: usize, j: usize, n: usize) -> bool {
    let diff = i.abs_diff(j);
    diff == 1 || diff == n - 1
}

/// Returns `true` if the ring bounds a simple polygon: at least three
/// distinct vertices, non-zero area, and no self-touching edges.
#[must_use]
pub fn is_valid_ring(points: &[Point2]) -> bool {
    let ring = open_ring(points);
    ring.len() >= 3
        && signed_area_2d(&ring).abs() > TOLERANCE
        && find_self_intersection(&ring).is_none()
}

/// Computes the normalized direction from point `a` to point `b`.
///
/// # Errors
///
/// Returns `GeometryError::Degenerate` if the segment has zero length.
pub fn segment_direction(a: &Point2, b: &Point2) -> Result<Vector2> {
    let d = b - a;
    let len = d.norm();
    if len < TOLERANCE {
        return Err(GeometryError::Degenerate(format!(
            "zero-length segment between ({}, {}) and ({}, {})",
            a.x, a.y, b.x, b.y
        ))
        .into());
    }
    Ok(d / len)
}

/// Returns the left-pointing normal of a direction vector.
#[must_use]
pub fn left_normal(dir: Vector2) -> Vector2 {
    Vector2::new(-dir.y, dir.x)
}
