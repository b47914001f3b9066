pub mod annotation;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;

pub use annotation::{Annotation, AnnotationStyle, Annotator, ColorMap, LabelFont, ToothLocator};
pub use config::ScreeningConfig;
pub use detection::{CommandDetector, Detector, JsonDetector, RawDetection};
pub use error::{ConfigError, DetectorError, ReportError, ScreeningError};
pub use models::{BoundingBox, Color, Detection, FindingEntry, PatientInfo, Sex, SourceImage};
pub use pipeline::{ScreenedImage, ScreeningSession, export_report, load_image};
pub use report::{ReportDocument, ReportGenerator, ReportSettings};
