use std::path::{Path, PathBuf};

use affodent::ReportError;
use affodent::report::layout::wrap;
use affodent::report::{
    FINDINGS_HEADING, NO_FINDINGS_LINE, ReportLayout, ReportPage, TextLine, layout_report,
    report_file_name, sanitize_name,
};
use printpdf::lopdf;
use tempfile::TempDir;
use time::{Date, Month};

mod common;

use common::*;

fn fixed_date() -> anyhow::Result<Date> {
    Ok(Date::from_calendar_date(2024, Month::May, 1)?)
}

fn pdf_pages(path: &Path) -> anyhow::Result<usize> {
    Ok(lopdf::Document::load(path)?.get_pages().len())
}

fn pdf_text(path: &Path, page: u32) -> anyhow::Result<String> {
    Ok(lopdf::Document::load(path)?.extract_text(&[page])?)
}

fn summary_page_lines(layout: &ReportLayout) -> anyhow::Result<&[TextLine]> {
    match layout.pages.first() {
        Some(ReportPage::Text(lines)) => Ok(lines),
        _ => anyhow::bail!("summary page missing"),
    }
}

fn long_history_patient() -> PatientInfo {
    PatientInfo {
        medical_history: "hypertension ".repeat(250),
        ..jane_doe()
    }
}

#[test]
fn test_report_for_single_finding() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let image = write_png(dir.path(), "01_upper_annotated.png", 640, 480);
    let findings = vec![finding("caries", 0.87, "13-23")];

    let generator = ReportGenerator::default().with_date(fixed_date()?);
    let report = generator.generate(&jane_doe(), &findings, &[image], dir.path())?;

    assert_eq!(report.path, dir.path().join("Jane Doe_report.pdf"));
    assert!(report.path.exists());
    assert!(!report.report_id.is_empty());

    let summary = report.layout.summary_lines();
    assert_eq!(summary[0], "AffoDent Oral Screening Report");
    assert!(summary.contains(&"Date: 2024-05-01"));
    assert!(summary.contains(&"Name: Jane Doe"));
    assert!(summary.contains(&"Age: 30"));
    assert!(summary.contains(&"Sex: Female"));
    assert!(summary.contains(&"Chief Complaint: pain"));
    assert!(summary.contains(&"Medical History: none"));
    assert!(summary.contains(&FINDINGS_HEADING));
    assert_eq!(
        report.layout.findings_lines(),
        ["- caries at 13-23 (Confidence: 0.87)"]
    );

    assert_eq!(report.page_count(), 2);
    assert_eq!(pdf_pages(&report.path)?, 2);

    let text = pdf_text(&report.path, 1)?;
    assert!(text.contains("Name: Jane Doe"));
    assert!(text.contains("Date: 2024-05-01"));
    assert!(text.contains("- caries at 13-23 (Confidence: 0.87)"));
    Ok(())
}

#[test]
fn test_report_without_findings() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let images = vec![
        write_png(dir.path(), "01_a_annotated.png", 320, 240),
        write_png(dir.path(), "02_b_annotated.png", 320, 240),
        write_png(dir.path(), "03_c_annotated.png", 240, 320),
    ];

    let report = ReportGenerator::default().generate(&jane_doe(), &[], &images, dir.path())?;

    assert_eq!(report.layout.findings_lines(), [NO_FINDINGS_LINE]);
    assert_eq!(report.page_count(), 4);
    assert_eq!(pdf_pages(&report.path)?, 4);
    Ok(())
}

#[test]
fn test_report_without_images_is_single_page() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let report = ReportGenerator::default().generate(
        &jane_doe(),
        &[finding("stain", 0.4, "24-28")],
        &[],
        dir.path(),
    )?;

    assert_eq!(report.page_count(), 1);
    assert_eq!(pdf_pages(&report.path)?, 1);
    Ok(())
}

#[test]
fn test_image_pages_keep_aspect_ratio() {
    let settings = ReportSettings::default();
    let images: Vec<(PathBuf, (u32, u32))> = vec![
        ("wide.png".into(), (400, 200)),
        ("tall.png".into(), (300, 900)),
    ];
    let layout = layout_report(&settings, &jane_doe(), &[], &images, "2024-05-01");

    assert_eq!(layout.page_count(), 3);
    let placements: Vec<_> = layout
        .pages
        .iter()
        .filter_map(|page| match page {
            ReportPage::Image(p) => Some(p),
            ReportPage::Text(_) => None,
        })
        .collect();
    assert_eq!(placements.len(), 2);

    // Wide image fills the 170 mm content width
    let wide = placements[0];
    assert!((wide.width_mm - 170.0).abs() < 1e-3);
    assert!((wide.height_mm - 85.0).abs() < 1e-3);
    assert!((wide.x_mm - 20.0).abs() < 1e-3);

    // Tall image is limited by the 257 mm content height and centered
    let tall = placements[1];
    assert!((tall.height_mm - 257.0).abs() < 1e-3);
    assert!((tall.width_mm / tall.height_mm - 300.0 / 900.0).abs() < 1e-4);
    assert!((tall.x_mm + tall.width_mm / 2.0 - 105.0).abs() < 1e-3);

    for placement in placements {
        assert!(placement.x_mm >= 20.0 - 1e-3);
        assert!(placement.y_mm >= 20.0 - 1e-3);
        assert!(placement.y_mm + placement.height_mm <= 277.0 + 1e-3);
    }
}

#[test]
fn test_findings_follow_input_order() {
    let findings = vec![
        finding("caries", 0.87, "18-14"),
        finding("calculus", 0.5, "13-23"),
        finding("caries", 0.31, "38-34"),
    ];
    let layout = layout_report(&ReportSettings::default(), &jane_doe(), &findings, &[], "today");

    assert_eq!(
        layout.findings_lines(),
        [
            "- caries at 18-14 (Confidence: 0.87)",
            "- calculus at 13-23 (Confidence: 0.50)",
            "- caries at 38-34 (Confidence: 0.31)",
        ]
    );
}

#[test]
fn test_many_findings_stay_on_summary_page() -> anyhow::Result<()> {
    let findings: Vec<FindingEntry> = (0..60)
        .map(|i| finding("stain", 0.5, &format!("{}", 11 + i % 10)))
        .collect();
    let layout = layout_report(&ReportSettings::default(), &jane_doe(), &findings, &[], "today");

    assert_eq!(layout.page_count(), 1);
    let lines = layout.findings_lines();
    let last = lines.last().copied().unwrap_or_default();
    let shown = lines.len() - 1;
    assert_eq!(last, format!("... and {} more findings", 60 - shown));

    let Some(ReportPage::Text(text)) = layout.pages.first() else {
        anyhow::bail!("summary page missing");
    };
    assert!(text.iter().all(|line| line.y_mm >= 20.0 - 1e-3));

    let dir = TempDir::new()?;
    let report = ReportGenerator::default().generate(&jane_doe(), &findings, &[], dir.path())?;
    assert_eq!(pdf_pages(&report.path)?, 1);
    Ok(())
}

#[test]
fn test_long_history_wraps() {
    let patient = PatientInfo {
        medical_history: "hypertension ".repeat(20),
        ..jane_doe()
    };
    let settings = ReportSettings::default();
    let layout = layout_report(&settings, &patient, &[], &[], "today");

    let history: Vec<&str> = layout
        .summary_lines()
        .into_iter()
        .skip_while(|l| !l.starts_with("Medical History:"))
        .take_while(|l| *l != FINDINGS_HEADING)
        .collect();
    assert!(history.len() > 1);
    assert!(history.iter().all(|l| l.chars().count() <= settings.wrap_chars));
}

#[test]
fn test_wrap() {
    assert_eq!(wrap("one two three", 7), ["one two", "three"]);
    assert_eq!(wrap("", 10), [""]);
    assert_eq!(wrap("abcdefghij", 4), ["abcd", "efgh", "ij"]);
    assert_eq!(wrap("a   b", 10), ["a b"]);
}

#[test]
fn test_report_file_name_sanitization() {
    assert_eq!(report_file_name("Jane Doe"), "Jane Doe_report.pdf");
    assert_eq!(sanitize_name("O'Brien/Smith"), "O_Brien_Smith");
    assert_eq!(sanitize_name("../etc"), "___etc");
    assert_eq!(sanitize_name(""), "patient");
    assert_eq!(sanitize_name("   "), "patient");
}

#[test]
fn test_missing_output_directory() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let missing = dir.path().join("does-not-exist");

    let result = ReportGenerator::default().generate(&jane_doe(), &[], &[], &missing);
    assert!(matches!(result, Err(ReportError::Io { .. })));
    Ok(())
}

#[test]
fn test_unreadable_image_is_reported() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let missing = dir.path().join("gone.png");

    let result = ReportGenerator::default().generate(&jane_doe(), &[], &[missing], dir.path());
    assert!(matches!(result, Err(ReportError::Image { .. })));
    Ok(())
}

#[test]
fn test_long_history_keeps_findings_on_page() -> anyhow::Result<()> {
    let settings = ReportSettings::default();
    let findings = vec![finding("caries", 0.87, "13-23")];
    let layout = layout_report(&settings, &long_history_patient(), &findings, &[], "today");

    assert_eq!(
        layout.findings_lines(),
        ["- caries at 13-23 (Confidence: 0.87)"]
    );
    let lines = summary_page_lines(&layout)?;
    assert!(lines.iter().all(|l| l.y_mm >= settings.margin_mm - 1e-3));

    // Cut-off history is marked and stays within the wrap width
    let history: Vec<&TextLine> = lines
        .iter()
        .skip_while(|l| !l.text.starts_with("Medical History:"))
        .take_while(|l| l.text != FINDINGS_HEADING)
        .collect();
    let last = history.last().map(|l| l.text.as_str()).unwrap_or_default();
    assert!(last.ends_with("..."));
    assert!(history.iter().all(|l| l.text.chars().count() <= settings.wrap_chars));
    Ok(())
}

#[test]
fn test_long_history_without_findings() -> anyhow::Result<()> {
    let settings = ReportSettings::default();
    let layout = layout_report(&settings, &long_history_patient(), &[], &[], "today");

    assert_eq!(layout.findings_lines(), [NO_FINDINGS_LINE]);
    let lines = summary_page_lines(&layout)?;
    assert!(lines.iter().all(|l| l.y_mm >= settings.margin_mm - 1e-3));
    Ok(())
}

#[test]
fn test_every_long_field_keeps_its_label() -> anyhow::Result<()> {
    let filler = "lorem ipsum dolor ".repeat(120);
    let patient = PatientInfo {
        name: "Jane Doe".to_string(),
        age: "30".to_string(),
        sex: "Female".to_string(),
        chief_complaint: filler.clone(),
        medical_history: filler,
    };
    let findings: Vec<FindingEntry> = (0..5).map(|_| finding("stain", 0.5, "21")).collect();
    let settings = ReportSettings::default();
    let layout = layout_report(&settings, &patient, &findings, &[], "today");

    let summary = layout.summary_lines();
    assert!(summary.iter().any(|l| l.starts_with("Chief Complaint:")));
    assert!(summary.iter().any(|l| l.starts_with("Medical History:")));

    // Only one findings row is left: the overflow line covers all of them
    assert_eq!(layout.findings_lines(), ["... and 5 more findings"]);
    let lines = summary_page_lines(&layout)?;
    assert!(lines.iter().all(|l| l.y_mm >= settings.margin_mm - 1e-3));

    let dir = TempDir::new()?;
    let report = ReportGenerator::default().generate(&patient, &findings, &[], dir.path())?;
    assert!(pdf_text(&report.path, 1)?.contains("... and 5 more findings"));
    Ok(())
}
