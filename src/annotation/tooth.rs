//! Coarse tooth identification.
//!
//! Neither strategy looks at dental anatomy: the index table assigns tooth
//! numbers in detector output order, and the position buckets only split the
//! image horizontally. Both are placeholders and report `"?"` or a tooth range
//! rather than guessing harder.

use crate::error::ConfigError;
use crate::models::BoundingBox;

pub const UNKNOWN_TOOTH: &str = "?";

/// One horizontal band. `upper` is exclusive; `None` means unbounded.
#[derive(Debug, Clone, PartialEq)]
pub struct ToothBucket {
    pub upper: Option<f32>,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToothLocator {
    /// Detection index -> tooth number
    Index(Vec<String>),
    /// Box center x -> tooth range
    Position(Vec<ToothBucket>),
}

impl ToothLocator {
    pub fn index<S: Into<String>>(table: impl IntoIterator<Item = S>) -> Self {
        ToothLocator::Index(table.into_iter().map(Into::into).collect())
    }

    /// Build a position locator, checking the buckets partition the x axis:
    /// strictly ascending finite bounds and exactly the last bucket unbounded.
    pub fn position(buckets: Vec<ToothBucket>) -> Result<Self, ConfigError> {
        let Some((last, bounded)) = buckets.split_last() else {
            return Err(ConfigError::ToothTable("no buckets configured".into()));
        };
        if last.upper.is_some() {
            return Err(ConfigError::ToothTable(format!(
                "last bucket '{}' must be unbounded",
                last.label
            )));
        }

        let mut previous = f32::NEG_INFINITY;
        for bucket in bounded {
            let upper = bucket.upper.ok_or_else(|| {
                ConfigError::ToothTable(format!(
                    "only the last bucket may be unbounded, '{}' is not last",
                    bucket.label
                ))
            })?;
            if !upper.is_finite() || upper <= previous {
                return Err(ConfigError::ToothTable(format!(
                    "bucket bounds must be finite and strictly ascending (at '{}')",
                    bucket.label
                )));
            }
            previous = upper;
        }

        Ok(ToothLocator::Position(buckets))
    }

    pub fn tooth_for(&self, index: usize, bbox: &BoundingBox) -> String {
        match self {
            ToothLocator::Index(table) => table
                .get(index)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_TOOTH.to_string()),
            ToothLocator::Position(buckets) => {
                let xc = bbox.center_x();
                buckets
                    .iter()
                    .find(|b| b.upper.is_none_or(|upper| xc < upper))
                    .map(|b| b.label.clone())
                    .unwrap_or_else(|| UNKNOWN_TOOTH.to_string())
            }
        }
    }

    /// Table used by the first demo: upper teeth 11-15 and 21-25 in order.
    pub fn default_index() -> Self {
        ToothLocator::index(["11", "12", "13", "14", "15", "21", "22", "23", "24", "25"])
    }

    /// Four coarse ranges, 200 px wide, the last catching the rest.
    pub fn default_position() -> Self {
        let bucket = |upper: Option<f32>, label: &str| ToothBucket {
            upper,
            label: label.to_string(),
        };
        ToothLocator::Position(vec![
            bucket(Some(200.0), "18-14"),
            bucket(Some(400.0), "13-23"),
            bucket(Some(600.0), "24-28"),
            bucket(None, "38-34"),
        ])
    }
}

impl Default for ToothLocator {
    fn default() -> Self {
        Self::default_position()
    }
}
