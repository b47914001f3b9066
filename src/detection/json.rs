use std::path::{Path, PathBuf};

use crate::detection::{Detector, parse_detections};
use crate::error::DetectorError;
use crate::models::{Detection, SourceImage};

pub const SIDECAR_SUFFIX: &str = "detections.json";

/// Reads detections an external inference run already wrote to disk.
///
/// For `photo.jpg` the file `photo.detections.json` is looked up in the
/// configured directory, or next to the image when none is set.
#[derive(Debug, Clone, Default)]
pub struct JsonDetector {
    dir: Option<PathBuf>,
}

impl JsonDetector {
    pub fn new() -> Self {
        Self { dir: None }
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn sidecar_path(&self, image_path: &Path) -> PathBuf {
        let stem = image_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = match &self.dir {
            Some(dir) => dir.clone(),
            None => image_path.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        dir.join(format!("{stem}.{SIDECAR_SUFFIX}"))
    }
}

impl Detector for JsonDetector {
    fn detect(&self, image: &SourceImage) -> Result<Vec<Detection>, DetectorError> {
        let path = self.sidecar_path(&image.path);
        if !path.exists() {
            return Err(DetectorError::Unavailable(format!(
                "no detections file at {}",
                path.display()
            )));
        }

        let bytes = std::fs::read(&path)?;
        let detections = parse_detections(&bytes, &path)?;
        tracing::debug!(path = %path.display(), count = detections.len(), "loaded detections");
        Ok(detections)
    }

    fn name(&self) -> &str {
        "json-sidecar"
    }
}
