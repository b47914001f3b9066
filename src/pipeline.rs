use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{ImageReader, RgbImage};
use tempdir::TempDir;

use crate::annotation::Annotator;
use crate::config::ScreeningConfig;
use crate::detection::{Detector, filter_by_confidence};
use crate::error::ScreeningError;
use crate::models::{Detection, FindingEntry, PatientInfo, SourceImage};
use crate::report::{ReportDocument, ReportGenerator};

/// Upload formats accepted by the session
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Decode an upload as RGB, rejecting anything that is not a jpg/jpeg/png.
pub fn load_image(path: &Path) -> Result<SourceImage, ScreeningError> {
    let rejected = |reason: String| ScreeningError::InvalidImage {
        path: path.to_path_buf(),
        reason,
    };

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(rejected(format!(
            "unsupported extension '{extension}', expected one of {}",
            SUPPORTED_EXTENSIONS.join(", ")
        )));
    }

    let image = ImageReader::open(path)
        .map_err(|e| rejected(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| rejected(e.to_string()))?
        .decode()
        .map_err(|e| rejected(format!("Failed to decode image: {e}")))?;

    Ok(SourceImage {
        path: path.to_path_buf(),
        image: image.to_rgb8(),
    })
}

/// Debug configuration for session execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

impl DebugConfig {
    fn save(&self, stage: &str, index: usize, image: &RgbImage) -> Result<(), ScreeningError> {
        let stage_dir = self.output_dir.join(stage);
        std::fs::create_dir_all(&stage_dir).map_err(|source| ScreeningError::Io {
            path: stage_dir.clone(),
            source,
        })?;

        let path = stage_dir.join(format!("{:02}.png", index + 1));
        image.save(&path).map_err(|source| ScreeningError::SaveImage {
            path: path.clone(),
            source,
        })?;
        tracing::debug!("Debug: saved {}/{:02}.png", stage, index + 1);
        Ok(())
    }
}

/// Result of running one upload through detection and annotation
#[derive(Debug, Clone)]
pub struct ScreenedImage {
    pub source_path: PathBuf,
    /// Annotated copy inside the session scratch directory
    pub annotated_path: PathBuf,
    pub detections: Vec<Detection>,
    pub findings: Vec<FindingEntry>,
}

/// One interactive session: uploads are screened one after another and the
/// results feed a single report.
///
/// Annotated images and the report are written to a scratch directory that is
/// removed when the session is dropped; copy the report out with
/// [`export_report`] first.
pub struct ScreeningSession {
    detector: Arc<dyn Detector>,
    annotator: Arc<Annotator>,
    reports: ReportGenerator,
    confidence_threshold: f32,
    scratch: TempDir,
    debug: Option<DebugConfig>,
    screened_count: AtomicUsize,
}

impl ScreeningSession {
    pub fn new(
        detector: Arc<dyn Detector>,
        annotator: Annotator,
        reports: ReportGenerator,
    ) -> Result<Self, ScreeningError> {
        let scratch = TempDir::new("affodent_session").map_err(|source| ScreeningError::Io {
            path: std::env::temp_dir(),
            source,
        })?;
        tracing::debug!(scratch = %scratch.path().display(), detector = detector.name(), "session started");

        Ok(Self {
            detector,
            annotator: Arc::new(annotator),
            reports,
            confidence_threshold: 0.0,
            scratch,
            debug: None,
            screened_count: AtomicUsize::new(0),
        })
    }

    pub fn from_config(
        detector: Arc<dyn Detector>,
        config: &ScreeningConfig,
    ) -> Result<Self, ScreeningError> {
        let annotator = config.build_annotator()?;
        let reports = ReportGenerator::new(config.report.clone());
        Ok(Self::new(detector, annotator, reports)?
            .with_confidence_threshold(config.confidence_threshold))
    }

    pub fn with_confidence_threshold(mut self, threshold: f32) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_report_generator(mut self, reports: ReportGenerator) -> Self {
        self.reports = reports;
        self
    }

    /// Enable debug mode with output directory
    /// The directory must be empty or non-existent
    pub fn with_debug(mut self, output_dir: PathBuf) -> Result<Self, ScreeningError> {
        let io_error = |source| ScreeningError::Io {
            path: output_dir.clone(),
            source,
        };

        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir).map_err(io_error)?;
            if entries.count() > 0 {
                return Err(ScreeningError::Io {
                    path: output_dir.clone(),
                    source: std::io::Error::other("debug directory is not empty"),
                });
            }
        } else {
            std::fs::create_dir_all(&output_dir).map_err(io_error)?;
        }

        self.debug = Some(DebugConfig { output_dir });
        Ok(self)
    }

    pub fn scratch_dir(&self) -> &Path {
        self.scratch.path()
    }

    /// Decode, detect and annotate one upload.
    ///
    /// Detection blocks, so it runs on the blocking pool; the next upload is
    /// only started once this one is fully annotated.
    pub async fn screen(&self, path: &Path) -> Result<ScreenedImage, ScreeningError> {
        let source = load_image(path)?;
        // Rejected uploads do not take a number
        let index = self.screened_count.fetch_add(1, Ordering::SeqCst);

        if let Some(debug) = &self.debug {
            debug.save("00_input", index, &source.image)?;
        }

        let detector = Arc::clone(&self.detector);
        let annotator = Arc::clone(&self.annotator);
        let threshold = self.confidence_threshold;

        let (source, detections, annotation) = tokio::task::spawn_blocking(move || {
            let detections = detector.detect(&source)?;
            let total = detections.len();
            let detections = filter_by_confidence(detections, threshold);
            tracing::info!(
                image = %source.path.display(),
                detected = total,
                kept = detections.len(),
                threshold,
                "detection finished"
            );
            let annotation = annotator.annotate(&source.image, &detections);
            Ok::<_, ScreeningError>((source, detections, annotation))
        })
        .await??;

        if let Some(debug) = &self.debug {
            debug.save("01_annotated", index, &annotation.image)?;
        }

        let stem = source
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let annotated_path = self
            .scratch
            .path()
            .join(format!("{:02}_{stem}_annotated.png", index + 1));
        annotation
            .image
            .save(&annotated_path)
            .map_err(|source| ScreeningError::SaveImage {
                path: annotated_path.clone(),
                source,
            })?;

        Ok(ScreenedImage {
            source_path: source.path,
            annotated_path,
            detections,
            findings: annotation.findings,
        })
    }

    /// Screen every upload in order, stopping at the first failure.
    pub async fn screen_all(&self, paths: &[PathBuf]) -> Result<Vec<ScreenedImage>, ScreeningError> {
        let mut screened = Vec::with_capacity(paths.len());
        for path in paths {
            screened.push(self.screen(path).await?);
        }
        Ok(screened)
    }

    /// Write the report for `screened` into the scratch directory.
    ///
    /// Findings keep upload order, then detection order within each upload.
    pub async fn generate_report(
        &self,
        patient: &PatientInfo,
        screened: &[ScreenedImage],
    ) -> Result<ReportDocument, ScreeningError> {
        let findings: Vec<FindingEntry> = screened
            .iter()
            .flat_map(|s| s.findings.iter().cloned())
            .collect();
        let images: Vec<PathBuf> = screened.iter().map(|s| s.annotated_path.clone()).collect();

        let reports = self.reports.clone();
        let patient = patient.clone();
        let dir = self.scratch.path().to_path_buf();
        let document = tokio::task::spawn_blocking(move || {
            reports.generate(&patient, &findings, &images, &dir)
        })
        .await??;
        Ok(document)
    }
}

/// Copy a generated report into `out_dir`, creating it if needed.
pub fn export_report(document: &ReportDocument, out_dir: &Path) -> Result<PathBuf, ScreeningError> {
    std::fs::create_dir_all(out_dir).map_err(|source| ScreeningError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let file_name = document
        .path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    let target = out_dir.join(file_name);
    std::fs::copy(&document.path, &target).map_err(|source| ScreeningError::Io {
        path: target.clone(),
        source,
    })?;
    Ok(target)
}
