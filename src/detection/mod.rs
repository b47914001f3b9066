//! Detector boundary.
//!
//! The model itself runs outside this crate. Adapters turn whatever the model
//! produced into validated [`Detection`] values.

pub mod command;
pub mod json;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DetectorError;
use crate::models::{BoundingBox, Detection, SourceImage};

pub use command::CommandDetector;
pub use json::JsonDetector;

/// Largest coordinate magnitude accepted from a detector, in pixels
pub const MAX_COORDINATE: f32 = 1_000_000.0;

/// Common interface for object detectors.
///
/// Calls may block for the whole inference and return no partial results.
pub trait Detector: Send + Sync {
    fn detect(&self, image: &SourceImage) -> Result<Vec<Detection>, DetectorError>;

    /// Detector name (for logging)
    fn name(&self) -> &str;
}

/// One record as emitted by the external model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    pub label: String,
    pub confidence: f32,
    /// `[x1, y1, x2, y2]` in pixels
    pub bbox: [f32; 4],
}

impl RawDetection {
    /// Check ranges and round the box to whole pixels.
    pub fn validate(self, index: usize) -> Result<Detection, DetectorError> {
        let invalid = |reason: String| DetectorError::InvalidDetection { index, reason };

        let label = self.label.trim();
        if label.is_empty() {
            return Err(invalid("empty label".into()));
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(invalid(format!("confidence {} outside [0, 1]", self.confidence)));
        }
        if self.bbox.iter().any(|v| !v.is_finite()) {
            return Err(invalid(format!("non-finite box {:?}", self.bbox)));
        }
        if self.bbox.iter().any(|v| v.abs() > MAX_COORDINATE) {
            return Err(invalid(format!(
                "box {:?} exceeds +/-{MAX_COORDINATE} px",
                self.bbox
            )));
        }

        let [x1, y1, x2, y2] = self.bbox.map(|v| v.round() as i32);
        if x1 >= x2 || y1 >= y2 {
            return Err(invalid(format!("degenerate box {:?}", self.bbox)));
        }

        Ok(Detection {
            label: label.to_string(),
            confidence: self.confidence,
            bbox: BoundingBox { x1, y1, x2, y2 },
        })
    }
}

/// Parse a JSON array of [`RawDetection`] and validate every record.
pub fn parse_detections(bytes: &[u8], origin: &Path) -> Result<Vec<Detection>, DetectorError> {
    let raw: Vec<RawDetection> =
        serde_json::from_slice(bytes).map_err(|e| DetectorError::MalformedOutput {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })?;

    raw.into_iter()
        .enumerate()
        .map(|(index, record)| record.validate(index))
        .collect()
}

/// Drop detections under `threshold`, keeping detector order.
pub fn filter_by_confidence(detections: Vec<Detection>, threshold: f32) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| d.confidence >= threshold)
        .collect()
}
