use std::time::{Duration, Instant};

use tracing::{info, info_span};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::geometry::{LineFeature, RawEntity};
use crate::math::Point2;
use crate::operations::talus::{BuildStrips, PairTalus, StripParams};
use crate::operations::{ConsolidateBuildings, ExtractFeatures, TrimContours, TrimMasks, TrimStage};
use crate::task::TaskFailure;

/// Color index the drawing writer applies to every output polyline.
pub const WRITER_COLOR_INDEX: u8 = 2;

/// Line type the drawing writer applies to every output polyline.
pub const WRITER_LINETYPE: &str = "CONTINUOUS";

/// Trimmed lines of one contour layer, handed to the drawing writer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerOutput {
    pub name: String,
    pub lines: Vec<Vec<Point2>>,
}

/// Line counts of one contour layer before and after trimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerCounts {
    pub name: String,
    pub before: usize,
    pub after: usize,
}

/// A contour batch that could not be clipped.
#[derive(Debug, Clone)]
pub struct TrimFailure {
    pub layer: String,
    pub stage: TrimStage,
    pub failure: TaskFailure,
}

/// Diagnostics of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub entities: usize,
    pub skipped_entities: usize,
    pub unclassified_entities: usize,
    pub building_features: usize,
    pub building_failures: Vec<TaskFailure>,
    pub building_parts: usize,
    pub base_talus: usize,
    pub top_talus: usize,
    pub pairs: usize,
    pub strips: usize,
    /// Pair indices that produced no strip.
    pub skipped_strips: Vec<usize>,
    pub strip_failures: Vec<TaskFailure>,
    pub slope_failures: Vec<TaskFailure>,
    pub layers: Vec<LayerCounts>,
    pub trim_failures: Vec<TrimFailure>,
    /// Elapsed time per stage, in execution order.
    pub timings: Vec<(&'static str, Duration)>,
}

impl RunReport {
    /// Total number of failed tasks across all stages.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.building_failures.len()
            + self.strip_failures.len()
            + self.slope_failures.len()
            + self.trim_failures.len()
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    /// One entry per configured contour layer, in configured order.
    pub layers: Vec<LayerOutput>,
    pub report: RunReport,
}

/// Runs extraction, consolidation, pairing, strip building and trimming
/// over one drawing.
///
/// Stages run strictly one after another; tasks within a stage run on the
/// rayon pool.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Creates a pipeline with a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the configuration is rejected.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the whole pipeline. Never fails; see [`RunReport`] for what was
    /// skipped along the way.
    #[must_use]
    pub fn run<'e>(&self, entities: impl IntoIterator<Item = &'e RawEntity>) -> PipelineOutput {
        let config = &self.config;
        let mut report = RunReport::default();

        let extracted = timed(&mut report, "extract", || {
            ExtractFeatures::new(config).execute(entities)
        });
        report.entities = extracted.entities;
        report.skipped_entities = extracted.skipped;
        report.unclassified_entities = extracted.unclassified;
        report.building_features = extracted.buildings.len();
        report.base_talus = extracted.base_talus.len();
        report.top_talus = extracted.top_talus.len();

        let consolidation = timed(&mut report, "consolidate", || {
            ConsolidateBuildings::new(&extracted.buildings, config.building_buffer).execute()
        });
        report.building_failures = consolidation.failures;
        report.building_parts = consolidation.mask.polygons().len();

        let pairs = timed(&mut report, "pair", || {
            PairTalus::new(
                &extracted.base_talus,
                &extracted.top_talus,
                config.max_pair_distance,
            )
            .execute()
        });
        report.pairs = pairs.len();

        let params = StripParams {
            points: config.strip_points,
            area_threshold: config.strip_area_threshold,
            snap_tolerance: config.strip_snap_tolerance,
        };
        let strips = timed(&mut report, "strips", || {
            BuildStrips::new(&pairs, &extracted.base_talus, &extracted.top_talus, params).execute()
        });
        report.strips = strips.strips.len();
        report.skipped_strips = strips.skipped;
        report.strip_failures = strips.failures;

        let masks = timed(&mut report, "masks", || {
            TrimMasks::build(
                consolidation.mask,
                &strips.strips,
                extracted.base_talus.iter().chain(&extracted.top_talus),
                config.slope_buffer,
                config.min_slope_length,
            )
        });
        report.slope_failures = masks.slope_failures.clone();

        let trimmer = TrimContours::new(&masks, config.trim_batch_size);
        let layers = timed(&mut report, "trim", || {
            config
                .contour_layers
                .iter()
                .zip(extracted.contours)
                .map(|(name, lines)| {
                    let _span = info_span!("layer", layer = %name).entered();
                    let before = lines.len();
                    (name.clone(), before, trimmer.execute(lines))
                })
                .collect::<Vec<_>>()
        });

        let mut output = Vec::with_capacity(layers.len());
        for (name, before, outcome) in layers {
            report.layers.push(LayerCounts {
                name: name.clone(),
                before,
                after: outcome.lines.len(),
            });
            report
                .trim_failures
                .extend(outcome.failures.into_iter().map(|(stage, failure)| TrimFailure {
                    layer: name.clone(),
                    stage,
                    failure,
                }));
            output.push(LayerOutput {
                name,
                lines: outcome.lines.into_iter().map(LineFeature::into_points).collect(),
            });
        }

        info!(
            entities = report.entities,
            pairs = report.pairs,
            strips = report.strips,
            failures = report.failure_count(),
            "pipeline finished"
        );
        PipelineOutput {
            layers: output,
            report,
        }
    }
}

fn timed<T>(report: &mut RunReport, stage: &'static str, f: impl FnOnce() -> T) -> T {
    let _span = info_span!("stage", stage).entered();
    let start = Instant::now();
    let value = f();
    let elapsed = start.elapsed();
    info!(elapsed_ms = elapsed.as_secs_f64() * 1e3, "stage done");
    report.timings.push((stage, elapsed));
    value
}
