#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from affodent for tests
pub use affodent::{
    BoundingBox, Color, Detection, FindingEntry, PatientInfo, ReportGenerator, ReportSettings,
    ScreeningConfig, ToothLocator,
};
