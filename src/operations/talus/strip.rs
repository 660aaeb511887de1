use geo::{Area, Polygon};
use tracing::info;

use crate::error::{OperationError, Result};
use crate::geometry::shape::line_string_from_points;
use crate::geometry::{FeatureClass, LineFeature, PolygonFeature};
use crate::math::polygon_2d::{close_ring, is_valid_ring};
use crate::math::polyline_2d::{resample, snap_to_reference};
use crate::operations::boolean::Repair;
use crate::task::{TaskFailure, TaskQueue};

use super::pair::TalusPair;

/// Parameters of strip construction.
#[derive(Debug, Clone, Copy)]
pub struct StripParams {
    /// Points each talus line is resampled to.
    pub points: usize,
    /// Minimum area of a kept strip.
    pub area_threshold: f64,
    /// Snap tolerance from the top line onto the base line.
    pub snap_tolerance: f64,
}

impl Default for StripParams {
    fn default() -> Self {
        Self {
            points: 20,
            area_threshold: 1e-4,
            snap_tolerance: 0.01,
        }
    }
}

/// Slope face polygon built from one talus pair.
#[derive(Debug, Clone, PartialEq)]
pub struct TalusStrip {
    /// Index of the source pair.
    pub pair: usize,
    pub polygon: PolygonFeature,
    pub area: f64,
}

/// Strips built from a list of pairs.
#[derive(Debug, Clone, Default)]
pub struct StripSet {
    pub strips: Vec<TalusStrip>,
    /// Indices of pairs that produced no strip, in ascending order.
    pub skipped: Vec<usize>,
    /// Pairs whose construction raised an error; also listed in `skipped`.
    pub failures: Vec<TaskFailure>,
}

/// Builds one slope face polygon per talus pair.
///
/// Pairs are independent tasks. A pair yields zero, one or several strips;
/// pairs yielding none, including failed ones, are reported as skipped.
pub struct BuildStrips<'a> {
    pairs: &'a [TalusPair],
    base: &'a [LineFeature],
    top: &'a [LineFeature],
    params: StripParams,
}

impl<'a> BuildStrips<'a> {
    /// Creates a new `BuildStrips` operation over pairs indexing `base` and `top`.
    #[must_use]
    pub fn new(
        pairs: &'a [TalusPair],
        base: &'a [LineFeature],
        top: &'a [LineFeature],
        params: StripParams,
    ) -> Self {
        Self {
            pairs,
            base,
            top,
            params,
        }
    }

    /// Executes strip construction for every pair.
    #[must_use]
    pub fn execute(&self) -> StripSet {
        let report = TaskQueue::new("build strips").run(self.pairs, |index, pair| {
            let base = self.base.get(pair.base).ok_or_else(|| missing("base", pair.base))?;
            let top = self.top.get(pair.top).ok_or_else(|| missing("top", pair.top))?;
            build_strip(index, base, top, &self.params)
        });

        let mut set = StripSet::default();
        for (index, strips) in report.done {
            if strips.is_empty() {
                set.skipped.push(index);
            } else {
                set.strips.extend(strips);
            }
        }
        set.skipped.extend(report.failures.iter().map(|f| f.index));
        set.skipped.sort_unstable();
        set.failures = report.failures;

        info!(
            strips = set.strips.len(),
            skipped = set.skipped.len(),
            "built talus strips"
        );
        set
    }
}

fn missing(side: &str, index: usize) -> crate::error::TrimError {
    OperationError::InvalidInput(format!("no {side} talus line at index {index}")).into()
}

/// Builds the strip polygons between one base and one top line.
///
/// 1. Resample both lines to `params.points` points.
/// 2. Reverse the top line when its start lies closer to the base end than
///    to the base start.
/// 3. Snap the top line onto the base line.
/// 4. Close the loop base → reversed top and repair it if invalid.
/// 5. Keep every resulting region of at least `params.area_threshold`.
///
/// An empty result means the pair is skipped.
///
/// # Errors
///
/// Returns an error if a strip polygon cannot be represented as a feature.
pub fn build_strip(
    pair: usize,
    base: &LineFeature,
    top: &LineFeature,
    params: &StripParams,
) -> Result<Vec<TalusStrip>> {
    let base_points = resample(base.points(), params.points);
    let mut top_points = resample(top.points(), params.points);
    if base_points.is_empty() || top_points.is_empty() {
        return Ok(Vec::new());
    }

    if should_reverse(&base_points, &top_points) {
        top_points.reverse();
    }
    let top_points = snap_to_reference(&top_points, &base_points, params.snap_tolerance);

    let mut ring = base_points;
    ring.extend(top_points.iter().rev());
    let ring = close_ring(&ring);

    let polygon = Polygon::new(line_string_from_points(&ring), Vec::new());
    let regions = if is_valid_ring(&ring) {
        vec![polygon]
    } else {
        Repair::new(&polygon).execute()
    };

    regions
        .iter()
        .map(|region| (region, region.unsigned_area()))
        .filter(|(_, area)| *area >= params.area_threshold)
        .map(|(region, area)| {
            Ok(TalusStrip {
                pair,
                polygon: PolygonFeature::from_polygon(region, FeatureClass::TalusStrip)?,
                area,
            })
        })
        .collect()
}

/// Orientation heuristic: compares base-start and base-end against the top
/// start only. Not reliable for self-crossing or strongly curved lines.
fn should_reverse(base: &[crate::math::Point2], top: &[crate::math::Point2]) -> bool {
    match (base.first(), base.last(), top.first()) {
        (Some(base_start), Some(base_end), Some(top_start)) => {
            nalgebra::distance(base_end, top_start) < nalgebra::distance(base_start, top_start)
        }
        _ => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use approx::assert_relative_eq;

    fn line(points: &[(f64, f64)], class: FeatureClass) -> LineFeature {
        LineFeature::new(points.iter().map(|&(x, y)| Point2::new(x, y)).collect(), class).unwrap()
    }

    fn base(points: &[(f64, f64)]) -> LineFeature {
        line(points, FeatureClass::BaseTalus)
    }

    fn top(points: &[(f64, f64)]) -> LineFeature {
        line(points, FeatureClass::TopTalus)
    }

    #[test]
    fn parallel_lines_make_rectangle_strip() {
        let strips = build_strip(
            0,
            &base(&[(0.0, 0.0), (10.0, 0.0)]),
            &top(&[(0.0, 5.0), (10.0, 5.0)]),
            &StripParams::default(),
        )
        .unwrap();
        assert_eq!(strips.len(), 1);
        assert_relative_eq!(strips[0].area, 50.0, max_relative = 0.05);
        assert!(strips[0].polygon.is_valid());
        assert_eq!(strips[0].polygon.class(), FeatureClass::TalusStrip);
    }

    #[test]
    fn opposite_top_direction_is_reversed() {
        let strips = build_strip(
            0,
            &base(&[(0.0, 0.0), (10.0, 0.0)]),
            &top(&[(10.0, 5.0), (0.0, 5.0)]),
            &StripParams::default(),
        )
        .unwrap();
        // Without reversal the loop would be a bowtie of two 12.5 triangles.
        assert_eq!(strips.len(), 1);
        assert_relative_eq!(strips[0].area, 50.0, epsilon = 1e-6);
    }

    #[test]
    fn crossing_pair_splits_into_regions() {
        // Top line crosses the base line halfway: the loop is a bowtie.
        let strips = build_strip(
            3,
            &base(&[(0.0, 0.0), (10.0, 0.0)]),
            &top(&[(0.0, 2.0), (10.0, -2.0)]),
            &StripParams::default(),
        )
        .unwrap();
        assert_eq!(strips.len(), 2);
        for strip in &strips {
            assert_eq!(strip.pair, 3);
            assert!((strip.area - 5.0).abs() < 1e-6, "area={}", strip.area);
        }
    }

    #[test]
    fn coincident_lines_are_skipped() {
        let strips = build_strip(
            0,
            &base(&[(0.0, 0.0), (10.0, 0.0)]),
            &top(&[(0.0, 0.0), (10.0, 0.0)]),
            &StripParams::default(),
        )
        .unwrap();
        assert!(strips.is_empty());
    }

    #[test]
    fn tiny_strip_below_threshold_is_skipped() {
        let params = StripParams {
            area_threshold: 1.0,
            ..StripParams::default()
        };
        let strips = build_strip(
            0,
            &base(&[(0.0, 0.0), (1.0, 0.0)]),
            &top(&[(0.0, 0.5), (1.0, 0.5)]),
            &params,
        )
        .unwrap();
        assert!(strips.is_empty());
    }

    #[test]
    fn skipped_pairs_are_reported_by_index() {
        let bases = vec![
            base(&[(0.0, 0.0), (10.0, 0.0)]),
            base(&[(50.0, 0.0), (60.0, 0.0)]),
        ];
        let tops = vec![
            top(&[(0.0, 5.0), (10.0, 5.0)]),
            top(&[(50.0, 0.0), (60.0, 0.0)]),
        ];
        let pairs = vec![
            TalusPair { base: 0, top: 0, distance: 5.0 },
            TalusPair { base: 1, top: 1, distance: 0.0 },
            TalusPair { base: 7, top: 0, distance: 1.0 },
        ];
        let set = BuildStrips::new(&pairs, &bases, &tops, StripParams::default()).execute();
        assert_eq!(set.strips.len(), 1);
        assert_eq!(set.skipped, vec![1, 2]);
        assert_eq!(set.failures.len(), 1);
        assert_eq!(set.failures[0].index, 2);
        for strip in &set.strips {
            assert!(strip.area >= StripParams::default().area_threshold);
        }
    }
}
