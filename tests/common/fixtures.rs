use std::path::{Path, PathBuf};

use affodent::{
    Annotator, ColorMap, Detection, FindingEntry, LabelFont, PatientInfo, RawDetection,
    ToothLocator,
};
use image::{ImageBuffer, Rgb, RgbImage};

/// Mid-gray so neither black text nor white fallback boxes blend in.
pub const BACKGROUND: Rgb<u8> = Rgb([90, 90, 90]);

pub fn test_image(width: u32, height: u32) -> RgbImage {
    ImageBuffer::from_fn(width, height, |_, _| BACKGROUND)
}

/// Writes a solid test image as PNG and returns its path.
pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    test_image(width, height)
        .save_with_format(&path, image::ImageFormat::Png)
        .expect("Failed to save test image");
    path
}

pub fn raw(label: &str, confidence: f32, bbox: [f32; 4]) -> RawDetection {
    RawDetection {
        label: label.to_string(),
        confidence,
        bbox,
    }
}

pub fn detection(label: &str, confidence: f32, bbox: [f32; 4]) -> Detection {
    raw(label, confidence, bbox)
        .validate(0)
        .expect("fixture detection should be valid")
}

/// Writes `<stem>.detections.json` next to the test images.
pub fn write_detections(dir: &Path, stem: &str, records: &[RawDetection]) -> PathBuf {
    let path = dir.join(format!("{stem}.detections.json"));
    let json = serde_json::to_string(records).expect("Failed to encode detections");
    std::fs::write(&path, json).expect("Failed to write detections");
    path
}

pub fn annotator(locator: ToothLocator) -> Annotator {
    let font = LabelFont::bundled().expect("bundled font should load");
    Annotator::new(ColorMap::default(), locator, font)
}

pub fn jane_doe() -> PatientInfo {
    PatientInfo {
        name: "Jane Doe".to_string(),
        age: "30".to_string(),
        sex: "Female".to_string(),
        chief_complaint: "pain".to_string(),
        medical_history: "none".to_string(),
    }
}

pub fn finding(label: &str, confidence: f32, tooth: &str) -> FindingEntry {
    FindingEntry {
        label: label.to_string(),
        confidence,
        tooth: tooth.to_string(),
    }
}
