use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::annotation::{AnnotationStyle, Annotator, ColorMap, LabelFont, ToothBucket, ToothLocator};
use crate::error::ConfigError;
use crate::models::Color;
use crate::report::ReportSettings;

/// Everything a screening session needs, loadable from a JSON file.
///
/// Every section is optional; missing values fall back to the built-in
/// defaults (demo color table, 200 px tooth buckets, A4 report).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScreeningConfig {
    /// Detections below this confidence are dropped before annotation
    pub confidence_threshold: f32,
    pub colors: ColorConfig,
    pub tooth: ToothConfig,
    pub annotation: AnnotationConfig,
    pub report: ReportSettings,
}

impl Default for ScreeningConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.25,
            colors: ColorConfig::default(),
            tooth: ToothConfig::default(),
            annotation: AnnotationConfig::default(),
            report: ReportSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub labels: BTreeMap<String, Color>,
    pub fallback: Color,
}

impl Default for ColorConfig {
    fn default() -> Self {
        let map = ColorMap::default();
        Self {
            labels: map.iter().map(|(label, color)| (label.to_string(), color)).collect(),
            fallback: map.fallback(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ToothConfig {
    Index { table: Vec<String> },
    Position { buckets: Vec<BucketConfig> },
}

#[derive(Debug, Clone, Deserialize)]
pub struct BucketConfig {
    /// Exclusive upper bound in pixels; omit for the last bucket
    #[serde(default)]
    pub upper: Option<f32>,
    pub label: String,
}

impl Default for ToothConfig {
    fn default() -> Self {
        match ToothLocator::default_position() {
            ToothLocator::Position(buckets) => ToothConfig::Position {
                buckets: buckets
                    .into_iter()
                    .map(|b| BucketConfig {
                        upper: b.upper,
                        label: b.label,
                    })
                    .collect(),
            },
            ToothLocator::Index(table) => ToothConfig::Index { table },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    pub stroke_width: u32,
    pub font_size: f32,
    pub text_color: Color,
    pub show_confidence: bool,
    /// TTF/OTF file for labels instead of the bundled font
    pub font_path: Option<PathBuf>,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        let style = AnnotationStyle::default();
        Self {
            stroke_width: style.stroke_width,
            font_size: style.font_size,
            text_color: style.text_color,
            show_confidence: style.show_confidence,
            font_path: None,
        }
    }
}

impl ScreeningConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ConfigError::Invalid(format!(
                "confidence_threshold {} outside [0, 1]",
                self.confidence_threshold
            )));
        }
        if self.annotation.stroke_width == 0 {
            return Err(ConfigError::Invalid("stroke_width must be at least 1".into()));
        }
        if !(self.annotation.font_size > 0.0) {
            return Err(ConfigError::Invalid("font_size must be positive".into()));
        }
        let report = &self.report;
        if !(report.line_spacing_mm > 0.0)
            || !(report.margin_mm >= 0.0)
            || report.page_width_mm <= 2.0 * report.margin_mm
            || report.page_height_mm <= 2.0 * report.margin_mm
        {
            return Err(ConfigError::Invalid(
                "report page must be larger than its margins with positive line spacing".into(),
            ));
        }
        self.tooth_locator()?;
        Ok(())
    }

    pub fn color_map(&self) -> ColorMap {
        let mut map = ColorMap::new(self.colors.fallback);
        for (label, color) in &self.colors.labels {
            map.insert(label, *color);
        }
        map
    }

    pub fn tooth_locator(&self) -> Result<ToothLocator, ConfigError> {
        match &self.tooth {
            ToothConfig::Index { table } => Ok(ToothLocator::index(table.iter().cloned())),
            ToothConfig::Position { buckets } => ToothLocator::position(
                buckets
                    .iter()
                    .map(|b| ToothBucket {
                        upper: b.upper,
                        label: b.label.clone(),
                    })
                    .collect(),
            ),
        }
    }

    pub fn annotation_style(&self) -> AnnotationStyle {
        AnnotationStyle {
            stroke_width: self.annotation.stroke_width,
            font_size: self.annotation.font_size,
            text_color: self.annotation.text_color,
            show_confidence: self.annotation.show_confidence,
        }
    }

    pub fn label_font(&self) -> Result<LabelFont, ConfigError> {
        match &self.annotation.font_path {
            Some(path) => LabelFont::from_file(path),
            None => LabelFont::bundled(),
        }
    }

    pub fn build_annotator(&self) -> Result<Annotator, ConfigError> {
        Ok(Annotator::new(self.color_map(), self.tooth_locator()?, self.label_font()?)
            .with_style(self.annotation_style()))
    }
}
