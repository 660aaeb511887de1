use crate::math::Point2;

/// Kind of a raw drawing entity as reported by the file reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    /// A two-point line segment.
    LineSegment,
    /// An open polyline.
    OpenPolyline,
    /// A polyline whose last vertex connects back to the first.
    ClosedPolyline,
    /// Any other entity type; carries the reader's type name.
    Unsupported(String),
}

/// A drawing entity handed over by the external reader.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntity {
    pub kind: EntityKind,
    pub layer: String,
    pub vertices: Vec<Point2>,
}

impl RawEntity {
    /// Creates an entity from its parts.
    #[must_use]
    pub fn new(kind: EntityKind, layer: impl Into<String>, vertices: Vec<Point2>) -> Self {
        Self {
            kind,
            layer: layer.into(),
            vertices,
        }
    }

    /// Creates a two-point line segment.
    #[must_use]
    pub fn line_segment(layer: impl Into<String>, start: Point2, end: Point2) -> Self {
        Self::new(EntityKind::LineSegment, layer, vec![start, end])
    }

    /// Creates an open or closed polyline.
    #[must_use]
    pub fn polyline(layer: impl Into<String>, vertices: Vec<Point2>, closed: bool) -> Self {
        let kind = if closed {
            EntityKind::ClosedPolyline
        } else {
            EntityKind::OpenPolyline
        };
        Self::new(kind, layer, vertices)
    }

    /// Returns `true` for closed polylines.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.kind == EntityKind::ClosedPolyline
    }
}
