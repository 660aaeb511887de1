use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::geometry::{EntityKind, Feature, FeatureClass, LineFeature, PolygonFeature, RawEntity};

/// Maps layer names to feature classes.
///
/// Building tags and talus tags are case-insensitive substrings of the
/// layer name; contour layers must match exactly.
#[derive(Debug, Clone)]
pub struct LayerClassifier {
    building_tags: Vec<String>,
    base_tag: String,
    top_tag: String,
    contour_layers: Vec<String>,
}

impl LayerClassifier {
    /// Builds the classifier from the configured layer vocabulary.
    #[must_use]
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            building_tags: config
                .building_tags
                .iter()
                .map(|t| t.to_lowercase())
                .collect(),
            base_tag: config.base_talus_tag.to_lowercase(),
            top_tag: config.top_talus_tag.to_lowercase(),
            contour_layers: config.contour_layers.clone(),
        }
    }

    /// Classifies a layer. Buildings win over talus, base over top.
    #[must_use]
    pub fn classify(&self, layer: &str) -> FeatureClass {
        let lower = layer.to_lowercase();
        if self.building_tags.iter().any(|t| lower.contains(t.as_str())) {
            FeatureClass::Building
        } else if !self.base_tag.is_empty() && lower.contains(&self.base_tag) {
            FeatureClass::BaseTalus
        } else if !self.top_tag.is_empty() && lower.contains(&self.top_tag) {
            FeatureClass::TopTalus
        } else if let Some(index) = self.contour_layers.iter().position(|name| name == layer) {
            FeatureClass::Contour(index)
        } else {
            FeatureClass::Unclassified
        }
    }
}

/// Converts one raw entity into a typed feature.
pub struct ExtractFeature<'a> {
    entity: &'a RawEntity,
    classifier: &'a LayerClassifier,
}

impl<'a> ExtractFeature<'a> {
    /// Creates a new `ExtractFeature` operation.
    #[must_use]
    pub fn new(entity: &'a RawEntity, classifier: &'a LayerClassifier) -> Self {
        Self { entity, classifier }
    }

    /// Executes the extraction.
    ///
    /// Segments and open polylines become lines; closed polylines with at
    /// least 3 distinct vertices become polygons. A closed building ring
    /// that is not a valid polygon is kept as its closed outline instead.
    /// Returns `None` for unsupported or degenerate entities.
    #[must_use]
    pub fn execute(&self) -> Option<Feature> {
        let entity = self.entity;
        let class = self.classifier.classify(&entity.layer);
        let result = match &entity.kind {
            EntityKind::LineSegment | EntityKind::OpenPolyline => {
                LineFeature::new(entity.vertices.clone(), class).map(Feature::Line)
            }
            EntityKind::ClosedPolyline => {
                PolygonFeature::new(entity.vertices.clone(), class).map(|polygon| {
                    if class == FeatureClass::Building && !polygon.is_valid() {
                        Feature::Line(polygon.boundary())
                    } else {
                        Feature::Polygon(polygon)
                    }
                })
            }
            EntityKind::Unsupported(kind) => {
                debug!(layer = %entity.layer, kind = %kind, "skipping unsupported entity");
                return None;
            }
        };

        match result {
            Ok(feature) => Some(feature),
            Err(err) => {
                debug!(layer = %entity.layer, error = %err, "skipping malformed entity");
                None
            }
        }
    }
}

/// Features sorted by role, ready for the downstream stages.
#[derive(Debug, Clone, Default)]
pub struct ExtractedFeatures {
    pub buildings: Vec<Feature>,
    pub base_talus: Vec<LineFeature>,
    pub top_talus: Vec<LineFeature>,
    /// Contour lines per configured layer, in configured layer order.
    pub contours: Vec<Vec<LineFeature>>,
    /// Entities read in total.
    pub entities: usize,
    /// Entities that could not be converted.
    pub skipped: usize,
    /// Valid entities on layers no stage is interested in.
    pub unclassified: usize,
}

/// Extracts and sorts every entity of a drawing.
pub struct ExtractFeatures<'a> {
    config: &'a PipelineConfig,
}

impl<'a> ExtractFeatures<'a> {
    /// Creates a new `ExtractFeatures` operation.
    #[must_use]
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Executes the extraction over all entities.
    #[must_use]
    pub fn execute<'e>(&self, entities: impl IntoIterator<Item = &'e RawEntity>) -> ExtractedFeatures {
        let classifier = LayerClassifier::new(self.config);
        let mut out = ExtractedFeatures {
            contours: vec![Vec::new(); self.config.contour_layers.len()],
            ..ExtractedFeatures::default()
        };

        for entity in entities {
            out.entities += 1;
            let Some(feature) = ExtractFeature::new(entity, &classifier).execute() else {
                out.skipped += 1;
                continue;
            };
            match feature.class() {
                FeatureClass::Building => out.buildings.push(feature),
                FeatureClass::BaseTalus => out.base_talus.push(feature.into_line()),
                FeatureClass::TopTalus => out.top_talus.push(feature.into_line()),
                FeatureClass::Contour(index) => out.contours[index].push(feature.into_line()),
                FeatureClass::TalusStrip | FeatureClass::Unclassified => out.unclassified += 1,
            }
        }

        info!(
            entities = out.entities,
            skipped = out.skipped,
            buildings = out.buildings.len(),
            base_talus = out.base_talus.len(),
            top_talus = out.top_talus.len(),
            "extracted features"
        );
        for (name, lines) in self.config.contour_layers.iter().zip(&out.contours) {
            info!(layer = %name, lines = lines.len(), "extracted contour layer");
        }
        out
    }
}
