use geo::{BooleanOps, LineString, MultiLineString};

use crate::geometry::{Mask, Shape};

/// Removes the parts of a line that fall inside a mask.
pub struct Subtract<'a> {
    mask: &'a Mask,
}

impl<'a> Subtract<'a> {
    /// Creates a new `Subtract` operation (line - mask).
    #[must_use]
    pub fn new(mask: &'a Mask) -> Self {
        Self { mask }
    }

    /// Executes the difference for one line.
    ///
    /// Returns zero, one or several pieces. Pieces shorter than the global
    /// tolerance are dropped.
    #[must_use]
    pub fn execute(&self, line: &LineString<f64>) -> Vec<LineString<f64>> {
        if self.mask.is_empty() {
            return vec![line.clone()];
        }
        let outside = self
            .mask
            .region()
            .clip(&MultiLineString::new(vec![line.clone()]), true);
        Shape::lines(Shape::flatten(outside))
    }
}
