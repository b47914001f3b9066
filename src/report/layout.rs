use std::path::PathBuf;

use crate::models::{FindingEntry, PatientInfo};
use crate::report::ReportSettings;

pub const NO_FINDINGS_LINE: &str = "No abnormalities detected.";
pub const FINDINGS_HEADING: &str = "Findings";

/// Rows kept free under the patient fields: half-row gap, heading, one finding
const FINDINGS_RESERVE_ROWS: f32 = 2.5;
const ELLIPSIS: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    Title,
    Field,
    Heading,
    Finding,
}

/// Text placed at `(x_mm, y_mm)`, measured from the bottom-left page corner
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub font_size: f32,
    pub x_mm: f32,
    pub y_mm: f32,
    pub role: LineRole,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlacement {
    pub path: PathBuf,
    pub pixel_size: (u32, u32),
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReportPage {
    Text(Vec<TextLine>),
    Image(ImagePlacement),
}

/// Position of everything on every page, before any PDF is written
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub pages: Vec<ReportPage>,
}

impl ReportLayout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All text on the first page, top to bottom
    pub fn summary_lines(&self) -> Vec<&str> {
        match self.pages.first() {
            Some(ReportPage::Text(lines)) => lines.iter().map(|l| l.text.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    /// Lines below the findings heading
    pub fn findings_lines(&self) -> Vec<&str> {
        match self.pages.first() {
            Some(ReportPage::Text(lines)) => lines
                .iter()
                .filter(|l| l.role == LineRole::Finding)
                .map(|l| l.text.as_str())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Lay out the summary page followed by one page per image.
///
/// `images` carries each annotated image path with its pixel size.
pub fn layout_report(
    settings: &ReportSettings,
    patient: &PatientInfo,
    findings: &[FindingEntry],
    images: &[(PathBuf, (u32, u32))],
    date: &str,
) -> ReportLayout {
    let mut pages = Vec::with_capacity(1 + images.len());
    pages.push(ReportPage::Text(summary_page(settings, patient, findings, date)));
    pages.extend(
        images
            .iter()
            .map(|(path, size)| ReportPage::Image(place_image(settings, path.clone(), *size))),
    );
    ReportLayout { pages }
}

struct Cursor<'a> {
    settings: &'a ReportSettings,
    y: f32,
    lines: Vec<TextLine>,
}

impl Cursor<'_> {
    fn push(&mut self, text: String, font_size: f32, role: LineRole) {
        self.lines.push(TextLine {
            text,
            font_size,
            x_mm: self.settings.margin_mm,
            y_mm: self.y,
            role,
        });
        self.y -= self.settings.line_spacing_mm;
    }

    fn gap(&mut self, lines: f32) {
        self.y -= self.settings.line_spacing_mm * lines;
    }

    /// Lines that still fit above the bottom margin
    fn remaining_rows(&self) -> usize {
        self.rows_down_to(self.settings.margin_mm)
    }

    /// Lines that can be placed at or above `floor`
    fn rows_down_to(&self, floor: f32) -> usize {
        // Tolerance for accumulated float error in `y`
        let span = (self.y - floor) / self.settings.line_spacing_mm + 1e-3;
        if span < 0.0 {
            return 0;
        }
        span.floor() as usize + 1
    }
}

fn summary_page(
    settings: &ReportSettings,
    patient: &PatientInfo,
    findings: &[FindingEntry],
    date: &str,
) -> Vec<TextLine> {
    let mut cursor = Cursor {
        settings,
        y: settings.page_height_mm - settings.margin_mm,
        lines: Vec::new(),
    };

    cursor.push(settings.title.clone(), settings.title_size, LineRole::Title);
    cursor.gap(0.5);
    cursor.push(format!("Date: {date}"), settings.body_size, LineRole::Field);
    cursor.gap(0.5);

    let fields = [
        ("Name", &patient.name),
        ("Age", &patient.age),
        ("Sex", &patient.sex),
        ("Chief Complaint", &patient.chief_complaint),
        ("Medical History", &patient.medical_history),
    ];
    let wrapped: Vec<Vec<String>> = fields
        .iter()
        .map(|(label, value)| wrap(&format!("{label}: {value}"), settings.wrap_chars))
        .collect();

    // Keep room below the fields for the gap, the heading and one findings row
    let floor = settings.margin_mm + FINDINGS_RESERVE_ROWS * settings.line_spacing_mm;
    let lengths: Vec<usize> = wrapped.iter().map(Vec::len).collect();
    let allotted = allot_rows(&lengths, cursor.rows_down_to(floor));

    for (lines, keep) in wrapped.into_iter().zip(allotted) {
        let truncated = keep < lines.len();
        let mut lines: Vec<String> = lines.into_iter().take(keep).collect();
        if truncated {
            if let Some(last) = lines.last_mut() {
                ellipsize(last, settings.wrap_chars);
            }
        }
        for line in lines {
            cursor.push(line, settings.body_size, LineRole::Field);
        }
    }

    cursor.gap(0.5);
    cursor.push(FINDINGS_HEADING.to_string(), settings.heading_size, LineRole::Heading);

    if findings.is_empty() {
        cursor.push(NO_FINDINGS_LINE.to_string(), settings.body_size, LineRole::Finding);
        return cursor.lines;
    }

    let rows = cursor.remaining_rows();
    let (shown, hidden) = if findings.len() <= rows {
        (findings.len(), 0)
    } else {
        let shown = rows.saturating_sub(1);
        (shown, findings.len() - shown)
    };

    for finding in &findings[..shown] {
        cursor.push(finding.report_line(), settings.body_size, LineRole::Finding);
    }
    if hidden > 0 {
        cursor.push(
            format!("... and {hidden} more findings"),
            settings.body_size,
            LineRole::Finding,
        );
    }

    cursor.lines
}

/// Share `budget` rows between fields of `lengths` wrapped lines.
///
/// Every field gets its first line before any field gets a second one; extra
/// rows then go to fields in order.
fn allot_rows(lengths: &[usize], budget: usize) -> Vec<usize> {
    let mut left = budget;
    let mut allotted: Vec<usize> = lengths
        .iter()
        .map(|&len| {
            let take = len.min(1).min(left);
            left -= take;
            take
        })
        .collect();
    for (slot, &len) in allotted.iter_mut().zip(lengths) {
        let extra = (len - *slot).min(left);
        *slot += extra;
        left -= extra;
    }
    allotted
}

/// Mark a cut-off line, staying within `width` characters.
fn ellipsize(line: &mut String, width: usize) {
    let keep = width.saturating_sub(ELLIPSIS.len());
    if line.chars().count() > keep {
        *line = line.chars().take(keep).collect();
    }
    line.push_str(ELLIPSIS);
}

/// Fit into the content area, keeping the aspect ratio, centered horizontally
/// and aligned to the top margin.
fn place_image(settings: &ReportSettings, path: PathBuf, pixel_size: (u32, u32)) -> ImagePlacement {
    let content_w = settings.page_width_mm - 2.0 * settings.margin_mm;
    let content_h = settings.page_height_mm - 2.0 * settings.margin_mm;
    let (px_w, px_h) = (pixel_size.0.max(1) as f32, pixel_size.1.max(1) as f32);

    let mm_per_px = (content_w / px_w).min(content_h / px_h);
    let width_mm = px_w * mm_per_px;
    let height_mm = px_h * mm_per_px;

    ImagePlacement {
        path,
        pixel_size,
        x_mm: settings.margin_mm + (content_w - width_mm) / 2.0,
        y_mm: settings.page_height_mm - settings.margin_mm - height_mm,
        width_mm,
        height_mm,
    }
}

/// Greedy word wrap; words longer than `width` are split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if current.is_empty() { word.len() } else { current.chars().count() + 1 + word.len() };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
