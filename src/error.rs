use std::path::PathBuf;

/// Failures at the detector boundary. Fatal for the current session.
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    #[error("Detector unavailable: {0}")]
    Unavailable(String),

    #[error("Detector command `{command}` failed: {reason}")]
    Command { command: String, reason: String },

    #[error("Malformed detector output for {path:?}: {reason}")]
    MalformedOutput { path: PathBuf, reason: String },

    #[error("Invalid detection #{index}: {reason}")]
    InvalidDetection { index: usize, reason: String },

    #[error("Detector I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Report I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load annotated image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("PDF error: {0}")]
    Pdf(#[from] printpdf::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid tooth table: {0}")]
    ToothTable(String),

    #[error("Failed to load label font: {0}")]
    Font(String),

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Errors surfaced to the session shell.
#[derive(Debug, thiserror::Error)]
pub enum ScreeningError {
    #[error(transparent)]
    Detector(#[from] DetectorError),

    #[error("Rejected image {path:?}: {reason}")]
    InvalidImage { path: PathBuf, reason: String },

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save image {path:?}: {source}")]
    SaveImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
