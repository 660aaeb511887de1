use std::fmt;

use geo::Polygon;
use tracing::info;

use crate::error::Result;
use crate::geometry::shape::points_from_line_string;
use crate::geometry::{BuildingMask, LineFeature, Mask};
use crate::operations::boolean::{Subtract, Union};
use crate::operations::offset::FlatBuffer2D;
use crate::task::{TaskFailure, TaskQueue};

use super::talus::TalusStrip;

/// The three trimming stages, in the order they are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimStage {
    Buildings,
    Strips,
    SlopeBuffers,
}

impl fmt::Display for TrimStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Buildings => "buildings",
            Self::Strips => "strips",
            Self::SlopeBuffers => "slope buffers",
        };
        f.write_str(name)
    }
}

/// Frozen masks shared by every contour layer.
#[derive(Debug, Clone, Default)]
pub struct TrimMasks {
    pub buildings: BuildingMask,
    pub strips: Mask,
    pub slopes: Mask,
    /// Talus lines whose buffer could not be built.
    pub slope_failures: Vec<TaskFailure>,
}

impl TrimMasks {
    /// Builds the strip mask and the buffered slope-line mask.
    ///
    /// Slope lines no longer than `min_slope_length` are left out of the
    /// slope mask.
    #[must_use]
    pub fn build<'l>(
        buildings: BuildingMask,
        strips: &[TalusStrip],
        slope_lines: impl IntoIterator<Item = &'l LineFeature>,
        slope_buffer: f64,
        min_slope_length: f64,
    ) -> Self {
        let strip_polygons: Vec<Polygon<f64>> =
            strips.iter().map(|s| s.polygon.to_polygon()).collect();
        let strips = Mask::from_polygons(Union::new(&strip_polygons).execute());

        let lines: Vec<&LineFeature> = slope_lines
            .into_iter()
            .filter(|l| l.length() > min_slope_length)
            .collect();
        let report = TaskQueue::new("buffer slope lines").run(&lines, |_, line| {
            FlatBuffer2D::new(line.points().to_vec(), slope_buffer, false).execute()
        });
        let slope_failures = report.failures.clone();
        let buffers: Vec<Polygon<f64>> = report.into_values().into_iter().flatten().collect();
        let slopes = Mask::from_polygons(Union::new(&buffers).execute());

        info!(
            building_parts = buildings.polygons().len(),
            strip_parts = strips.polygons().len(),
            slope_parts = slopes.polygons().len(),
            "built trim masks"
        );
        Self {
            buildings,
            strips,
            slopes,
            slope_failures,
        }
    }

    /// The mask used by a stage.
    #[must_use]
    pub fn stage(&self, stage: TrimStage) -> &Mask {
        match stage {
            TrimStage::Buildings => &self.buildings,
            TrimStage::Strips => &self.strips,
            TrimStage::SlopeBuffers => &self.slopes,
        }
    }
}

/// Result of trimming one contour layer.
#[derive(Debug, Clone, Default)]
pub struct TrimOutcome {
    pub lines: Vec<LineFeature>,
    /// Line count after each stage, in stage order.
    pub stage_counts: Vec<(TrimStage, usize)>,
    /// Batches whose clipping failed; their lines are dropped.
    pub failures: Vec<(TrimStage, TaskFailure)>,
}

/// Clips contour lines against buildings, then strips, then slope buffers.
///
/// Each stage only sees the output of the previous one. Lines that do not
/// touch a stage's mask pass through untouched; lines that do are replaced
/// by the pieces left outside it.
pub struct TrimContours<'a> {
    masks: &'a TrimMasks,
    batch_size: usize,
}

impl<'a> TrimContours<'a> {
    const STAGES: [TrimStage; 3] = [
        TrimStage::Buildings,
        TrimStage::Strips,
        TrimStage::SlopeBuffers,
    ];

    /// Creates a new `TrimContours` operation.
    #[must_use]
    pub fn new(masks: &'a TrimMasks, batch_size: usize) -> Self {
        Self {
            masks,
            batch_size: batch_size.max(1),
        }
    }

    /// Executes all three stages on one layer's lines.
    #[must_use]
    pub fn execute(&self, lines: Vec<LineFeature>) -> TrimOutcome {
        let mut outcome = TrimOutcome {
            lines,
            ..TrimOutcome::default()
        };
        for stage in Self::STAGES {
            let before = outcome.lines.len();
            let (lines, failures) = self.clip_stage(stage, std::mem::take(&mut outcome.lines));
            outcome.lines = lines;
            outcome.stage_counts.push((stage, outcome.lines.len()));
            outcome
                .failures
                .extend(failures.into_iter().map(|f| (stage, f)));
            info!(%stage, before, after = outcome.lines.len(), "trimmed contours");
        }
        outcome
    }

    /// Clips lines against one stage's mask, batching large inputs onto the pool.
    fn clip_stage(
        &self,
        stage: TrimStage,
        lines: Vec<LineFeature>,
    ) -> (Vec<LineFeature>, Vec<TaskFailure>) {
        let mask = self.masks.stage(stage);
        if mask.is_empty() || lines.is_empty() {
            return (lines, Vec::new());
        }

        let batches: Vec<&[LineFeature]> = lines.chunks(self.batch_size).collect();
        let queue = TaskQueue::new("clip contours");
        let queue = if batches.len() > 1 {
            queue
        } else {
            queue.sequential()
        };
        let report = queue.run(&batches, |_, batch| clip_batch(batch, mask));
        let clipped = report.done.into_iter().flat_map(|(_, lines)| lines).collect();
        (clipped, report.failures)
    }
}

fn clip_batch(batch: &[LineFeature], mask: &Mask) -> Result<Vec<LineFeature>> {
    let subtract = Subtract::new(mask);
    let mut out = Vec::with_capacity(batch.len());
    for line in batch {
        let geometry = line.to_line_string();
        if !mask.intersects(&geometry) {
            out.push(line.clone());
            continue;
        }
        for piece in subtract.execute(&geometry) {
            out.push(line.with_points(points_from_line_string(&piece))?);
        }
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::FeatureClass;
    use crate::math::Point2;
    use geo::polygon;

    fn contour(points: &[(f64, f64)]) -> LineFeature {
        LineFeature::new(
            points.iter().map(|&(x, y)| Point2::new(x, y)).collect(),
            FeatureClass::Contour(0),
        )
        .unwrap()
    }

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Mask {
        Mask::from_polygons(vec![polygon![
            (x: x0, y: y0),
            (x: x1, y: y0),
            (x: x1, y: y1),
            (x: x0, y: y1),
        ]])
    }

    fn masks(buildings: Mask, strips: Mask, slopes: Mask) -> TrimMasks {
        TrimMasks {
            buildings,
            strips,
            slopes,
            slope_failures: Vec::new(),
        }
    }

    fn total_length(lines: &[LineFeature]) -> f64 {
        lines.iter().map(LineFeature::length).sum()
    }

    #[test]
    fn empty_masks_are_identity() {
        let lines = vec![
            contour(&[(0.0, 0.0), (10.0, 0.0)]),
            contour(&[(0.0, 5.0), (3.0, 7.0), (10.0, 5.0)]),
        ];
        let masks = TrimMasks::default();
        let outcome = TrimContours::new(&masks, 100).execute(lines.clone());
        assert_eq!(outcome.lines, lines);
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn line_inside_building_is_removed() {
        let masks = masks(rect(0.0, 0.0, 10.0, 10.0), Mask::empty(), Mask::empty());
        let outcome = TrimContours::new(&masks, 100).execute(vec![contour(&[(2.0, 5.0), (8.0, 5.0)])]);
        assert!(outcome.lines.is_empty());
        assert_eq!(outcome.stage_counts[0], (TrimStage::Buildings, 0));
    }

    #[test]
    fn untouched_line_passes_all_stages_unchanged() {
        let masks = masks(
            rect(0.0, 0.0, 1.0, 1.0),
            rect(2.0, 0.0, 3.0, 1.0),
            rect(4.0, 0.0, 5.0, 1.0),
        );
        let line = contour(&[(0.0, 20.0), (2.5, 21.0), (5.0, 20.0)]);
        let outcome = TrimContours::new(&masks, 100).execute(vec![line.clone()]);
        assert_eq!(outcome.lines, vec![line]);
    }

    #[test]
    fn crossing_line_is_split_and_keeps_class() {
        let masks = masks(Mask::empty(), rect(4.0, -1.0, 6.0, 1.0), Mask::empty());
        let outcome = TrimContours::new(&masks, 100).execute(vec![contour(&[(0.0, 0.0), (10.0, 0.0)])]);
        assert_eq!(outcome.lines.len(), 2);
        assert!((total_length(&outcome.lines) - 8.0).abs() < 1e-6);
        assert!(outcome
            .lines
            .iter()
            .all(|l| l.class() == FeatureClass::Contour(0)));
    }

    #[test]
    fn stages_apply_buildings_then_strips_then_slopes() {
        // A covers [2, 6], B covers [4, 8]; they overlap on [4, 6].
        let line = contour(&[(0.0, 0.0), (10.0, 0.0)]);
        let a = rect(2.0, -1.0, 6.0, 1.0);
        let b = rect(4.0, -1.0, 8.0, 1.0);

        let staged = masks(a.clone(), b.clone(), Mask::empty());
        let outcome = TrimContours::new(&staged, 100).execute(vec![line.clone()]);
        // The building stage has already cut [2, 6] when the strip stage runs.
        assert_eq!(outcome.stage_counts[0], (TrimStage::Buildings, 2));
        assert_eq!(outcome.stage_counts[1], (TrimStage::Strips, 2));
        assert_eq!(outcome.lines.len(), 2);
        assert!((total_length(&outcome.lines) - 4.0).abs() < 1e-6);

        // Same pieces as clipping by A, then clipping A's output by B.
        let only_a = masks(a, Mask::empty(), Mask::empty());
        let after_a = TrimContours::new(&only_a, 100).execute(vec![line]).lines;
        assert_eq!(after_a.len(), 2);
        assert!((total_length(&after_a) - 6.0).abs() < 1e-6);
        let only_b = masks(b, Mask::empty(), Mask::empty());
        let after_b = TrimContours::new(&only_b, 100).execute(after_a).lines;
        assert_eq!(after_b.len(), outcome.lines.len());
        for (expected, actual) in after_b.iter().zip(&outcome.lines) {
            assert_eq!(expected.points().len(), actual.points().len());
            for (e, a) in expected.points().iter().zip(actual.points()) {
                assert!(nalgebra::distance(e, a) < 1e-6);
            }
        }
    }

    #[test]
    fn batched_clipping_preserves_order() {
        let masks = masks(Mask::empty(), rect(4.0, -1000.0, 6.0, 1000.0), Mask::empty());
        let lines: Vec<LineFeature> = (0..250)
            .map(|i| {
                let y = f64::from(i);
                contour(&[(0.0, y), (10.0, y)])
            })
            .collect();
        let outcome = TrimContours::new(&masks, 100).execute(lines);
        assert_eq!(outcome.lines.len(), 500);
        for (i, pair) in outcome.lines.chunks(2).enumerate() {
            let y = f64::from(u32::try_from(i).unwrap());
            assert!(pair.iter().all(|l| (l.points()[0].y - y).abs() < 1e-6));
        }
    }

    #[test]
    fn slope_mask_skips_short_lines() {
        let long = LineFeature::new(
            vec![Point2::new(0.0, 0.0), Point2::new(10.0, 0.0)],
            FeatureClass::BaseTalus,
        )
        .unwrap();
        let short = LineFeature::new(
            vec![Point2::new(50.0, 0.0), Point2::new(50.05, 0.0)],
            FeatureClass::TopTalus,
        )
        .unwrap();
        let masks = TrimMasks::build(Mask::empty(), &[], [&long, &short], 3.0, 0.1);
        assert_eq!(masks.slopes.polygons().len(), 1);
        assert!((masks.slopes.area() - 60.0).abs() < 1e-5);
        assert!(masks.strips.is_empty());
        assert!(masks.slope_failures.is_empty());
    }
}
