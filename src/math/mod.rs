pub mod intersect_2d;
pub mod polygon_2d;
pub mod polyline_2d;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Returns `true` if both coordinates of `p` are finite.
#[must_use]
pub fn is_finite(p: &Point2) -> bool {
    p.x.is_finite() && p.y.is_finite()
}

/// Returns `true` if `a` and `b` coincide within [`TOLERANCE`].
#[must_use]
pub fn coincident(a: &Point2, b: &Point2) -> bool {
    (a - b).norm_squared() < TOLERANCE * TOLERANCE
}
