use std::process::Command;

use crate::detection::{Detector, parse_detections};
use crate::error::DetectorError;
use crate::models::{Detection, SourceImage};

/// Runs an external inference program once per image.
///
/// The program is called as `program [args..] <image path>` and must exit
/// with status 0 after printing a JSON array of detections on stdout.
#[derive(Debug, Clone)]
pub struct CommandDetector {
    program: String,
    args: Vec<String>,
}

impl CommandDetector {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<S: Into<String>>(mut self, args: impl IntoIterator<Item = S>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Split a whitespace separated command line such as `python predict.py --conf 0.1`
    pub fn from_command_line(line: &str) -> Result<Self, DetectorError> {
        let mut parts = line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| DetectorError::Unavailable("empty detector command".into()))?;
        Ok(Self::new(program).with_args(parts))
    }

    fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Detector for CommandDetector {
    fn detect(&self, image: &SourceImage) -> Result<Vec<Detection>, DetectorError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&image.path)
            .output()
            .map_err(|e| DetectorError::Command {
                command: self.command_line(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DetectorError::Command {
                command: self.command_line(),
                reason: format!("{}: {}", output.status, stderr.trim()),
            });
        }

        let detections = parse_detections(&output.stdout, &image.path)?;
        tracing::debug!(
            command = %self.command_line(),
            image = %image.path.display(),
            count = detections.len(),
            "detector finished"
        );
        Ok(detections)
    }

    fn name(&self) -> &str {
        &self.program
    }
}
