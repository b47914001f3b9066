pub mod layout;
pub mod pdf;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ReportError;
use crate::models::{FindingEntry, PatientInfo};

pub use layout::{
    FINDINGS_HEADING, LineRole, NO_FINDINGS_LINE, ReportLayout, ReportPage, TextLine, layout_report,
};

pub const REPORT_SUFFIX: &str = "_report.pdf";

/// Page geometry and typography, all lengths in millimetres
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub title: String,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_mm: f32,
    pub line_spacing_mm: f32,
    pub title_size: f32,
    pub heading_size: f32,
    pub body_size: f32,
    /// Characters per line before patient fields wrap
    pub wrap_chars: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            title: "AffoDent Oral Screening Report".to_string(),
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_mm: 20.0,
            line_spacing_mm: 8.0,
            title_size: 18.0,
            heading_size: 14.0,
            body_size: 12.0,
            wrap_chars: 85,
        }
    }
}

/// A report that has been written to disk
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub path: PathBuf,
    pub report_id: String,
    pub layout: ReportLayout,
}

impl ReportDocument {
    pub fn page_count(&self) -> usize {
        self.layout.page_count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReportGenerator {
    settings: ReportSettings,
    date: Option<time::Date>,
}

impl ReportGenerator {
    pub fn new(settings: ReportSettings) -> Self {
        Self { settings, date: None }
    }

    /// Fix the date printed on the report instead of using today's
    pub fn with_date(mut self, date: time::Date) -> Self {
        self.date = Some(date);
        self
    }

    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    /// Lay out and write the report into `dir`, returning where it went.
    ///
    /// The file name comes from the patient name, see [`report_file_name`].
    pub fn generate(
        &self,
        patient: &PatientInfo,
        findings: &[FindingEntry],
        annotated_images: &[PathBuf],
        dir: &Path,
    ) -> Result<ReportDocument, ReportError> {
        let images = annotated_images
            .iter()
            .map(|path| {
                image::image_dimensions(path)
                    .map(|size| (path.clone(), size))
                    .map_err(|source| ReportError::Image {
                        path: path.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let date = self.date.unwrap_or_else(today);
        let layout = layout_report(&self.settings, patient, findings, &images, &date.to_string());

        let path = dir.join(report_file_name(&patient.name));
        let report_id = Uuid::new_v4().to_string();
        pdf::render_pdf(&layout, &self.settings, &report_id, &path)?;

        tracing::info!(
            path = %path.display(),
            %report_id,
            pages = layout.page_count(),
            findings = findings.len(),
            "report written"
        );

        Ok(ReportDocument {
            path,
            report_id,
            layout,
        })
    }
}

fn today() -> time::Date {
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date()
}

/// Keep alphanumerics and spaces, replace everything else with `_`.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == ' ' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "patient".to_string()
    } else {
        cleaned
    }
}

pub fn report_file_name(patient_name: &str) -> String {
    format!("{}{}", sanitize_name(patient_name), REPORT_SUFFIX)
}
