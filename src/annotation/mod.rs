pub mod colors;
pub mod font;
pub mod tooth;

use ab_glyph::PxScale;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::models::{BoundingBox, Color, Detection, FindingEntry};

pub use colors::{ColorMap, normalize_label};
pub use font::LabelFont;
pub use tooth::{ToothBucket, ToothLocator, UNKNOWN_TOOTH};

/// Drawing parameters for boxes and labels
#[derive(Debug, Clone)]
pub struct AnnotationStyle {
    pub stroke_width: u32,
    pub font_size: f32,
    pub text_color: Color,
    /// Append the confidence to the drawn label
    pub show_confidence: bool,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            stroke_width: 3,
            font_size: 16.0,
            text_color: Color::BLACK,
            show_confidence: false,
        }
    }
}

/// Output of one annotation pass
#[derive(Debug, Clone)]
pub struct Annotation {
    pub image: RgbImage,
    pub findings: Vec<FindingEntry>,
}

/// Draws detections onto an image and collects the matching findings
#[derive(Debug, Clone)]
pub struct Annotator {
    colors: ColorMap,
    locator: ToothLocator,
    font: LabelFont,
    style: AnnotationStyle,
}

impl Annotator {
    pub fn new(colors: ColorMap, locator: ToothLocator, font: LabelFont) -> Self {
        Self {
            colors,
            locator,
            font,
            style: AnnotationStyle::default(),
        }
    }

    pub fn with_style(mut self, style: AnnotationStyle) -> Self {
        self.style = style;
        self
    }

    pub fn colors(&self) -> &ColorMap {
        &self.colors
    }

    pub fn locator(&self) -> &ToothLocator {
        &self.locator
    }

    /// Draw every detection, in order, and return one finding per detection.
    pub fn annotate(&self, image: &RgbImage, detections: &[Detection]) -> Annotation {
        let mut canvas = image.clone();
        let mut findings = Vec::with_capacity(detections.len());

        for (index, detection) in detections.iter().enumerate() {
            let color = self.colors.color_for(&detection.label);
            let tooth = self.locator.tooth_for(index, &detection.bbox);

            self.draw_box(&mut canvas, &detection.bbox, color);

            let text = self.label_text(detection, &tooth);
            self.draw_label(&mut canvas, &detection.bbox, &text, color);

            tracing::trace!(label = %detection.label, %tooth, "annotated detection");

            findings.push(FindingEntry {
                label: detection.label.clone(),
                confidence: detection.confidence,
                tooth,
            });
        }

        Annotation {
            image: canvas,
            findings,
        }
    }

    fn label_text(&self, detection: &Detection, tooth: &str) -> String {
        if self.style.show_confidence {
            format!("{} ({}) {:.2}", detection.label, tooth, detection.confidence)
        } else {
            format!("{} ({})", detection.label, tooth)
        }
    }

    /// Stroke grows inward from the box edge
    fn draw_box(&self, canvas: &mut RgbImage, bbox: &BoundingBox, color: Color) {
        let pixel: Rgb<u8> = color.into();
        let stroke = self.style.stroke_width.max(1);
        let Some(bbox) = clip_to_canvas(bbox, canvas.dimensions(), stroke) else {
            return;
        };
        for inset in 0..stroke {
            let width = bbox.width().saturating_sub(2 * inset);
            let height = bbox.height().saturating_sub(2 * inset);
            if width == 0 || height == 0 {
                break;
            }
            let rect = Rect::at(bbox.x1 + inset as i32, bbox.y1 + inset as i32).of_size(width, height);
            draw_hollow_rect_mut(canvas, rect, pixel);
        }
    }

    fn draw_label(&self, canvas: &mut RgbImage, bbox: &BoundingBox, text: &str, color: Color) {
        let (text_w, text_h) = self.font.measure(text, self.style.font_size);
        if text_w == 0 || text_h == 0 {
            return;
        }

        let (x, y) = label_origin(bbox, (text_w, text_h), canvas.dimensions());
        let background = Rect::at(x, y).of_size(text_w, text_h);
        draw_filled_rect_mut(canvas, background, color.into());
        draw_text_mut(
            canvas,
            self.style.text_color.into(),
            x,
            y,
            PxScale::from(self.style.font_size),
            self.font.font(),
            text,
        );
    }
}

/// Cut the box down to the canvas plus a `stroke` wide border, so edges that
/// were off canvas stay off canvas. `None` when nothing would be visible.
fn clip_to_canvas(bbox: &BoundingBox, canvas: (u32, u32), stroke: u32) -> Option<BoundingBox> {
    let pad = i32::try_from(stroke).unwrap_or(i32::MAX);
    let width = i32::try_from(canvas.0).unwrap_or(i32::MAX);
    let height = i32::try_from(canvas.1).unwrap_or(i32::MAX);

    let clipped = BoundingBox {
        x1: bbox.x1.max(pad.saturating_neg()),
        y1: bbox.y1.max(pad.saturating_neg()),
        x2: bbox.x2.min(width.saturating_add(pad)),
        y2: bbox.y2.min(height.saturating_add(pad)),
    };
    (clipped.x1 < clipped.x2 && clipped.y1 < clipped.y2).then_some(clipped)
}

/// Top-left corner of a label background.
///
/// The label sits directly above the box. When that would cross the top edge
/// it flips inside the box under the top edge, and it is shifted left when it
/// would run past the right edge.
pub fn label_origin(bbox: &BoundingBox, text: (u32, u32), canvas: (u32, u32)) -> (i32, i32) {
    let text_w = i32::try_from(text.0).unwrap_or(i32::MAX);
    let text_h = i32::try_from(text.1).unwrap_or(i32::MAX);
    let canvas_w = i32::try_from(canvas.0).unwrap_or(i32::MAX);

    let above = bbox.y1.saturating_sub(text_h);
    let y = if above >= 0 { above } else { bbox.y1.max(0) };

    let mut x = bbox.x1.max(0);
    if x.saturating_add(text_w) > canvas_w {
        x = canvas_w.saturating_sub(text_w).max(0);
    }

    (x, y)
}
