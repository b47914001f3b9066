use std::path::Path;

use ab_glyph::{FontArc, PxScale};

use crate::error::ConfigError;

/// Font used for box labels. Cheap to clone.
#[derive(Clone)]
pub struct LabelFont {
    font: FontArc,
}

impl LabelFont {
    /// Hack Regular, shipped inside `epaint_default_fonts`
    pub fn bundled() -> Result<Self, ConfigError> {
        let font = FontArc::try_from_slice(epaint_default_fonts::HACK_REGULAR)
            .map_err(|e| ConfigError::Font(format!("bundled font: {e}")))?;
        Ok(Self { font })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let font = FontArc::try_from_vec(data)
            .map_err(|e| ConfigError::Font(format!("{}: {e}", path.display())))?;
        Ok(Self { font })
    }

    pub fn font(&self) -> &FontArc {
        &self.font
    }

    /// Rendered (width, height) of `text` at `size` pixels
    pub fn measure(&self, text: &str, size: f32) -> (u32, u32) {
        imageproc::drawing::text_size(PxScale::from(size), &self.font, text)
    }
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelFont").finish_non_exhaustive()
    }
}
