use geo::{Area, Coord, Geometry, LineString, Polygon};

use crate::math::{Point2, TOLERANCE};

/// A simple geometry produced by a boolean operation.
///
/// Results of `geo` operations are flattened into a list of these right
/// away, so callers never match on multi-geometries or collections.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Line(LineString<f64>),
    Polygon(Polygon<f64>),
}

impl Shape {
    /// Flattens any geometry into simple lines and polygons.
    ///
    /// Points, lines shorter than [`TOLERANCE`] and zero-area polygons are dropped.
    #[must_use]
    pub fn flatten(geometry: impl Into<Geometry<f64>>) -> Vec<Shape> {
        let mut shapes = Vec::new();
        push_flat(geometry.into(), &mut shapes);
        shapes
    }

    /// Collects the lines of a flattened result.
    #[must_use]
    pub fn lines(shapes: Vec<Shape>) -> Vec<LineString<f64>> {
        shapes
            .into_iter()
            .filter_map(|shape| match shape {
                Shape::Line(line) => Some(line),
                Shape::Polygon(_) => None,
            })
            .collect()
    }

    /// Collects the polygons of a flattened result.
    #[must_use]
    pub fn polygons(shapes: Vec<Shape>) -> Vec<Polygon<f64>> {
        shapes
            .into_iter()
            .filter_map(|shape| match shape {
                Shape::Polygon(polygon) => Some(polygon),
                Shape::Line(_) => None,
            })
            .collect()
    }
}

fn push_flat(geometry: Geometry<f64>, out: &mut Vec<Shape>) {
    match geometry {
        Geometry::Line(line) => push_line(LineString::new(vec![line.start, line.end]), out),
        Geometry::LineString(line) => push_line(line, out),
        Geometry::MultiLineString(lines) => {
            for line in lines {
                push_line(line, out);
            }
        }
        Geometry::Polygon(polygon) => push_polygon(polygon, out),
        Geometry::MultiPolygon(polygons) => {
            for polygon in polygons {
                push_polygon(polygon, out);
            }
        }
        Geometry::Rect(rect) => push_polygon(rect.to_polygon(), out),
        Geometry::Triangle(triangle) => push_polygon(triangle.to_polygon(), out),
        Geometry::GeometryCollection(collection) => {
            for member in collection {
                push_flat(member, out);
            }
        }
        _ => {}
    }
}

fn push_line(line: LineString<f64>, out: &mut Vec<Shape>) {
    let length: f64 = line
        .lines()
        .map(|segment| segment.dx().hypot(segment.dy()))
        .sum();
    if line.0.len() >= 2 && length > TOLERANCE {
        out.push(Shape::Line(line));
    }
}

fn push_polygon(polygon: Polygon<f64>, out: &mut Vec<Shape>) {
    if polygon.exterior().0.len() >= 4 && polygon.unsigned_area() > TOLERANCE {
        out.push(Shape::Polygon(polygon));
    }
}

/// Converts points into a `geo` line string.
#[must_use]
pub fn line_string_from_points(points: &[Point2]) -> LineString<f64> {
    LineString::new(points.iter().map(|p| Coord { x: p.x, y: p.y }).collect())
}

/// Converts a `geo` line string back into points.
#[must_use]
pub fn points_from_line_string(line: &LineString<f64>) -> Vec<Point2> {
    line.coords().map(|c| Point2::new(c.x, c.y)).collect()
}
