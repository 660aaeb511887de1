pub mod config;
pub mod error;
pub mod geometry;
pub mod math;
pub mod operations;
pub mod pipeline;
pub mod task;

pub use config::PipelineConfig;
pub use error::{Result, TrimError};
pub use pipeline::{
    LayerOutput, Pipeline, PipelineOutput, RunReport, WRITER_COLOR_INDEX, WRITER_LINETYPE,
};
