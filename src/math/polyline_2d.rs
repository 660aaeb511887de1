use super::{coincident, Point2, TOLERANCE};

/// Total Euclidean length of an open polyline.
#[must_use]
pub fn polyline_length(points: &[Point2]) -> f64 {
    points
        .windows(2)
        .map(|w| nalgebra::distance(&w[0], &w[1]))
        .sum()
}

/// Returns the point at normalized arc-length parameter `t` along the polyline.
///
/// `t` is clamped to `[0, 1]`. A zero-length polyline yields its first point.
/// Returns `None` only for an empty slice.
#[must_use]
pub fn interpolate_normalized(points: &[Point2], t: f64) -> Option<Point2> {
    let first = *points.first()?;
    let total = polyline_length(points);
    if total < TOLERANCE {
        return Some(first);
    }

    let target = t.clamp(0.0, 1.0) * total;
    let mut walked = 0.0;
    for w in points.windows(2) {
        let seg = nalgebra::distance(&w[0], &w[1]);
        if seg > TOLERANCE && walked + seg >= target {
            let local = ((target - walked) / seg).clamp(0.0, 1.0);
            return Some(w[0] + (w[1] - w[0]) * local);
        }
        walked += seg;
    }
    points.last().copied()
}

/// Resamples a polyline to `count` points at equal normalized arc-length steps.
///
/// The first and last samples are the polyline's endpoints. A zero-length
/// polyline resamples to `count` copies of its first point.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn resample(points: &[Point2], count: usize) -> Vec<Point2> {
    let Some(&first) = points.first() else {
        return Vec::new();
    };
    if count < 2 || polyline_length(points) < TOLERANCE {
        return vec![first; count];
    }

    let last = (count - 1) as f64;
    (0..count)
        .filter_map(|i| interpolate_normalized(points, i as f64 / last))
        .collect()
}

/// Snaps `points` onto `reference` within `tolerance`.
///
/// Every vertex moves onto the closest reference vertex in range. Reference
/// vertices lying within range of a segment's interior are then inserted
/// into that segment, ordered along it.
#[must_use]
pub fn snap_to_reference(points: &[Point2], reference: &[Point2], tolerance: f64) -> Vec<Point2> {
    let moved: Vec<Point2> = points
        .iter()
        .map(|p| snap_vertex(p, reference, tolerance))
        .collect();

    let mut out = Vec::with_capacity(moved.len());
    for (i, p) in moved.iter().enumerate() {
        out.push(*p);
        if let Some(next) = moved.get(i + 1) {
            out.extend(vertices_near_segment(p, next, reference, tolerance));
        }
    }
    out
}

fn snap_vertex(p: &Point2, reference: &[Point2], tolerance: f64) -> Point2 {
    reference
        .iter()
        .map(|r| (r, nalgebra::distance(p, r)))
        .filter(|(_, d)| *d <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map_or(*p, |(r, _)| *r)
}

/// Reference vertices within `tolerance` of the open segment `a`-`b`,
/// sorted by their position along it.
fn vertices_near_segment(a: &Point2, b: &Point2, reference: &[Point2], tolerance: f64) -> Vec<Point2> {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 < TOLERANCE * TOLERANCE {
        return Vec::new();
    }
    let mut hits: Vec<(f64, Point2)> = reference
        .iter()
        .filter(|r| !coincident(r, a) && !coincident(r, b))
        .filter_map(|r| {
            let t = (r - a).dot(&ab) / len2;
            let foot = a + ab * t;
            (t > 0.0 && t < 1.0 && nalgebra::distance(&foot, r) <= tolerance).then_some((t, *r))
        })
        .collect();
    hits.sort_by(|x, y| x.0.total_cmp(&y.0));
    hits.dedup_by(|x, y| coincident(&x.1, &y.1));
    hits.into_iter().map(|(_, r)| r).collect()
}
