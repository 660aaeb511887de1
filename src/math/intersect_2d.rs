use super::{Point2, Vector2, TOLERANCE};

/// Bounded segment-segment intersection in 2D.
///
/// Returns `(intersection_point, t, u)` where `t` and `u` are in `[0, 1]`.
/// Parallel segments never intersect here; see [`collinear_overlap_2d`].
#[must_use]
pub fn segment_segment_intersect_2d(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
) -> Option<(Point2, f64, f64)> {
    let da = a1 - a0;
    let db = b1 - b0;

    let cross = cross_2d(&da, &db);
    if cross.abs() < TOLERANCE {
        return None;
    }

    let d = b0 - a0;
    let t = cross_2d(&d, &db) / cross;
    let u = cross_2d(&d, &da) / cross;

    // Use a small epsilon to include endpoints.
    let eps = TOLERANCE;
    if t >= -eps && t <= 1.0 + eps && u >= -eps && u <= 1.0 + eps {
        let t_clamped = t.clamp(0.0, 1.0);
        Some((a0 + da * t_clamped, t_clamped, u.clamp(0.0, 1.0)))
    } else {
        None
    }
}

/// Returns `true` if two segments lie on the same line and share more than
/// a single point.
#[must_use]
pub fn collinear_overlap_2d(a0: &Point2, a1: &Point2, b0: &Point2, b1: &Point2) -> bool {
    let da = a1 - a0;
    let len_sq = da.norm_squared();
    if len_sq < TOLERANCE * TOLERANCE {
        return false;
    }
    let scale = len_sq.sqrt();
    if cross_2d(&da, &(b0 - a0)).abs() / scale > TOLERANCE
        || cross_2d(&da, &(b1 - a0)).abs() / scale > TOLERANCE
    {
        return false;
    }

    // Project b onto a's parameter range and measure the shared interval.
    let s0 = da.dot(&(b0 - a0)) / len_sq;
    let s1 = da.dot(&(b1 - a0)) / len_sq;
    let (lo, hi) = if s0 <= s1 { (s0, s1) } else { (s1, s0) };
    let shared = hi.min(1.0) - lo.max(0.0);
    shared * scale > TOLERANCE
}

/// 2D cross product (z-component of the 3D cross product).
#[must_use]
pub fn cross_2d(a: &Vector2, b: &Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn crossing_segments() {
        let hit = segment_segment_intersect_2d(&p(0.0, 0.0), &p(2.0, 2.0), &p(0.0, 2.0), &p(2.0, 0.0));
        let (pt, t, u) = hit.unwrap_or_else(|| panic!("segments should cross"));
        assert!((pt.x - 1.0).abs() < TOLERANCE && (pt.y - 1.0).abs() < TOLERANCE);
        assert!((t - 0.5).abs() < TOLERANCE);
        assert!((u - 0.5).abs() < TOLERANCE);
    }

    #[test]
    fn disjoint_segments() {
        let hit = segment_segment_intersect_2d(&p(0.0, 0.0), &p(1.0, 0.0), &p(2.0, -1.0), &p(2.0, 1.0));
        assert!(hit.is_none());
    }

    #[test]
    fn endpoint_touch_is_reported() {
        let hit = segment_segment_intersect_2d(&p(0.0, 0.0), &p(1.0, 0.0), &p(1.0, 0.0), &p(1.0, 1.0));
        assert!(hit.is_some());
    }

    #[test]
    fn parallel_segments_do_not_intersect() {
        let hit = segment_segment_intersect_2d(&p(0.0, 0.0), &p(1.0, 0.0), &p(0.0, 1.0), &p(1.0, 1.0));
        assert!(hit.is_none());
    }

    #[test]
    fn collinear_overlap_detection() {
        assert!(collinear_overlap_2d(&p(0.0, 0.0), &p(2.0, 0.0), &p(1.0, 0.0), &p(3.0, 0.0)));
        // Touching at a single point only.
        assert!(!collinear_overlap_2d(&p(0.0, 0.0), &p(1.0, 0.0), &p(1.0, 0.0), &p(2.0, 0.0)));
        // Parallel but offset.
        assert!(!collinear_overlap_2d(&p(0.0, 0.0), &p(2.0, 0.0), &p(0.0, 1.0), &p(2.0, 1.0)));
    }
}
