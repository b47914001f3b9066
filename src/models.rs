use std::fmt;
use std::path::PathBuf;

use image::{Rgb, RgbImage};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Axis-aligned box in pixel coordinates of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1).max(0) as u32
    }

    /// Horizontal center, kept fractional so bucket boundaries are exact
    pub fn center_x(&self) -> f32 {
        (self.x1 as f32 + self.x2 as f32) / 2.0
    }

    pub fn center(&self) -> (f32, f32) {
        (self.center_x(), (self.y1 as f32 + self.y2 as f32) / 2.0)
    }
}

/// One object reported by the detector.
///
/// Only built through [`crate::detection::RawDetection::validate`], so the
/// confidence is in `[0, 1]` and the box is non-degenerate.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub label: String,
    pub confidence: f32,
    pub bbox: BoundingBox,
}

/// A decoded upload, kept with the path it came from.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub path: PathBuf,
    pub image: RgbImage,
}

/// A detection translated into a report line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FindingEntry {
    pub label: String,
    pub confidence: f32,
    pub tooth: String,
}

impl FindingEntry {
    /// Line used in the findings section of the report
    pub fn report_line(&self) -> String {
        format!(
            "- {} at {} (Confidence: {:.2})",
            self.label, self.tooth, self.confidence
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientInfo {
    pub name: String,
    pub age: String,
    pub sex: String,
    pub chief_complaint: String,
    pub medical_history: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Sex {
    Male,
    Female,
    Other,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "Male"),
            Sex::Female => write!(f, "Female"),
            Sex::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a CSS-style color name or a `#rrggbb` hex string.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_lowercase();
        if let Some(hex) = value.strip_prefix('#') {
            if hex.len() != 6 || !hex.is_ascii() {
                return None;
            }
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            return Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?));
        }

        let color = match value.as_str() {
            "black" => Color::BLACK,
            "white" => Color::WHITE,
            "red" => Color::rgb(255, 0, 0),
            "green" => Color::rgb(0, 128, 0),
            "blue" => Color::rgb(0, 0, 255),
            "yellow" => Color::rgb(255, 255, 0),
            "orange" => Color::rgb(255, 165, 0),
            "purple" => Color::rgb(128, 0, 128),
            "brown" => Color::rgb(165, 42, 42),
            "gray" | "grey" => Color::rgb(128, 128, 128),
            "cyan" => Color::rgb(0, 255, 255),
            "magenta" => Color::rgb(255, 0, 255),
            "pink" => Color::rgb(255, 192, 203),
            _ => return None,
        };
        Some(color)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<Color> for Rgb<u8> {
    fn from(color: Color) -> Self {
        Rgb([color.r, color.g, color.b])
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Color::parse(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown color: {value}")))
    }
}
