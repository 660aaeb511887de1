use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use contour_trim::geometry::{EntityKind, RawEntity};
use contour_trim::math::Point2;
use contour_trim::{
    Pipeline, PipelineConfig, PipelineOutput, WRITER_COLOR_INDEX, WRITER_LINETYPE,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "contour-trim")]
#[command(about = "Remove contour lines overlapping buildings and talus faces")]
struct Cli {
    /// Entity dump written by the drawing reader.
    #[arg(long)]
    input: PathBuf,
    /// Pipeline configuration; defaults apply to missing keys.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output file; stdout when omitted.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Deserialize)]
struct EntityDump {
    entities: Vec<EntityRecord>,
}

#[derive(Deserialize)]
struct EntityRecord {
    kind: String,
    layer: String,
    points: Vec<[f64; 2]>,
    #[serde(default)]
    closed: bool,
}

impl EntityRecord {
    fn into_entity(self) -> RawEntity {
        let kind = match (self.kind.to_ascii_lowercase().as_str(), self.closed) {
            ("line", _) => EntityKind::LineSegment,
            ("polyline", false) => EntityKind::OpenPolyline,
            ("polyline" | "closed_polyline", _) => EntityKind::ClosedPolyline,
            _ => EntityKind::Unsupported(self.kind),
        };
        let vertices = self.points.into_iter().map(|[x, y]| Point2::new(x, y)).collect();
        RawEntity::new(kind, self.layer, vertices)
    }
}

#[derive(Serialize)]
struct LayerDump {
    name: String,
    color: u8,
    linetype: &'static str,
    lines: Vec<Vec<[f64; 2]>>,
}

#[derive(Serialize)]
struct OutputDump {
    layers: Vec<LayerDump>,
}

impl From<PipelineOutput> for OutputDump {
    fn from(output: PipelineOutput) -> Self {
        let layers = output
            .layers
            .into_iter()
            .map(|layer| LayerDump {
                name: layer.name,
                color: WRITER_COLOR_INDEX,
                linetype: WRITER_LINETYPE,
                lines: layer
                    .lines
                    .into_iter()
                    .map(|line| line.into_iter().map(|p| [p.x, p.y]).collect())
                    .collect(),
            })
            .collect();
        Self { layers }
    }
}

fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::from_path(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let pipeline = Pipeline::new(config).context("invalid pipeline config")?;

    let raw = fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;
    let dump: EntityDump = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", cli.input.display()))?;
    let entities: Vec<RawEntity> = dump
        .entities
        .into_iter()
        .map(EntityRecord::into_entity)
        .collect();

    let output = pipeline.run(&entities);
    let report = &output.report;
    info!(
        entities = report.entities,
        skipped = report.skipped_entities,
        pairs = report.pairs,
        strips = report.strips,
        skipped_strips = ?report.skipped_strips,
        "run summary"
    );
    for layer in &report.layers {
        info!(layer = %layer.name, before = layer.before, after = layer.after, "layer summary");
    }
    for (stage, elapsed) in &report.timings {
        info!(stage, elapsed_ms = elapsed.as_secs_f64() * 1e3, "stage timing");
    }
    if report.failure_count() > 0 {
        warn!(failures = report.failure_count(), "some tasks failed");
    }

    let json = serde_json::to_string_pretty(&OutputDump::from(output))?;
    match &cli.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(json.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}
