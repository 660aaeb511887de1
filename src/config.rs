use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Parameters controlling every stage of the trimming pipeline.
///
/// Missing fields in a JSON document fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Full buffer width applied to building polygons (lines get half of it).
    pub building_buffer: f64,
    /// Half-width of the flat-capped buffer around talus lines.
    pub slope_buffer: f64,
    /// Maximum midpoint distance for a base/top talus pair.
    pub max_pair_distance: f64,
    /// Number of points each talus line is resampled to before building a strip.
    pub strip_points: usize,
    /// Strips smaller than this area are discarded.
    pub strip_area_threshold: f64,
    /// Snap tolerance between the resampled top and base lines.
    pub strip_snap_tolerance: f64,
    /// Contour lines per clipping task; smaller inputs are clipped inline.
    pub trim_batch_size: usize,
    /// Talus lines at or below this length are not buffered.
    pub min_slope_length: f64,
    /// Contour layers, matched exactly and emitted in this order.
    pub contour_layers: Vec<String>,
    /// Case-insensitive substrings marking a building layer.
    pub building_tags: Vec<String>,
    /// Case-insensitive substring marking a talus base layer.
    pub base_talus_tag: String,
    /// Case-insensitive substring marking a talus top layer.
    pub top_talus_tag: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            building_buffer: 3.2,
            slope_buffer: 3.0,
            max_pair_distance: 13.8,
            strip_points: 20,
            strip_area_threshold: 1e-4,
            strip_snap_tolerance: 0.01,
            trim_batch_size: 100,
            min_slope_length: 0.1,
            contour_layers: vec![
                "COURBES_DE_NIVEAU_PRINCIPALES".to_owned(),
                "COURBES_DE_NIVEAU_INTERMEDIAIRES".to_owned(),
                "COURBES_DE_NIVEAU_SECONDAIRES".to_owned(),
            ],
            building_tags: vec![
                "batiment".to_owned(),
                "bâtiment".to_owned(),
                "building".to_owned(),
            ],
            base_talus_tag: "bas_talus".to_owned(),
            top_talus_tag: "haut_talus".to_owned(),
        }
    }
}

impl PipelineConfig {
    /// Parses a JSON document and validates the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON and
    /// `ConfigError::InvalidValue` when a parameter is out of range.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise the
    /// same errors as [`PipelineConfig::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(ConfigError::from)?;
        Self::from_json_str(&json)
    }

    /// Checks that every parameter is usable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        non_negative("building_buffer", self.building_buffer)?;
        non_negative("slope_buffer", self.slope_buffer)?;
        non_negative("max_pair_distance", self.max_pair_distance)?;
        non_negative("strip_area_threshold", self.strip_area_threshold)?;
        non_negative("strip_snap_tolerance", self.strip_snap_tolerance)?;
        non_negative("min_slope_length", self.min_slope_length)?;

        if self.strip_points < 2 {
            return Err(invalid("strip_points", format!("{} < 2", self.strip_points)));
        }
        if self.trim_batch_size == 0 {
            return Err(invalid("trim_batch_size", "must be positive".to_owned()));
        }
        if self.contour_layers.is_empty() {
            return Err(invalid("contour_layers", "no layer given".to_owned()));
        }
        Ok(())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("{value} is not a finite non-negative number")))
    }
}

fn invalid(field: &'static str, reason: String) -> crate::error::TrimError {
    ConfigError::InvalidValue { field, reason }.into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::TrimError;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::default();
        config.validate().unwrap();
        assert!((config.max_pair_distance - 13.8).abs() < 1e-12);
        assert_eq!(config.strip_points, 20);
        assert_eq!(config.contour_layers.len(), 3);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = PipelineConfig::from_json_str(r#"{"max_pair_distance": 10.0}"#).unwrap();
        assert!((config.max_pair_distance - 10.0).abs() < 1e-12);
        assert!((config.building_buffer - 3.2).abs() < 1e-12);
        assert_eq!(config.trim_batch_size, 100);
    }

    #[test]
    fn rejects_single_strip_point() {
        let err = PipelineConfig::from_json_str(r#"{"strip_points": 1}"#).unwrap_err();
        assert!(matches!(
            err,
            TrimError::Config(ConfigError::InvalidValue {
                field: "strip_points",
                ..
            })
        ));
    }

    #[test]
    fn rejects_negative_distance() {
        let config = PipelineConfig {
            slope_buffer: -1.0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_batch_and_empty_layers() {
        let config = PipelineConfig {
            trim_batch_size: 0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            contour_layers: Vec::new(),
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = PipelineConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, TrimError::Config(ConfigError::Parse(_))));
    }
}
