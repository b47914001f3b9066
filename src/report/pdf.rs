use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::{
    BuiltinFont, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, IndirectFontRef, Mm,
    PdfDocument, PdfLayerReference, Px,
};

use crate::error::ReportError;
use crate::report::ReportSettings;
use crate::report::layout::{ImagePlacement, LineRole, ReportLayout, ReportPage, TextLine};

/// Write `layout` as a PDF at `path`.
pub fn render_pdf(
    layout: &ReportLayout,
    settings: &ReportSettings,
    report_id: &str,
    path: &Path,
) -> Result<(), ReportError> {
    let page_w = Mm(settings.page_width_mm);
    let page_h = Mm(settings.page_height_mm);

    let (doc, first_page, first_layer) = PdfDocument::new(&settings.title, page_w, page_h, "Layer 1");
    let doc = doc.with_identifier(report_id);
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    for (index, page) in layout.pages.iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) =
                doc.add_page(page_w, page_h, format!("Page {}, Layer 1", index + 1));
            doc.get_page(page_index).get_layer(layer_index)
        };

        match page {
            ReportPage::Text(lines) => {
                for line in lines {
                    let font = match line.role {
                        LineRole::Title | LineRole::Heading => &bold,
                        LineRole::Field | LineRole::Finding => &regular,
                    };
                    draw_line(&layer, line, font);
                }
            }
            ReportPage::Image(placement) => draw_image(&layer, placement)?,
        }
    }

    let file = File::create(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    doc.save(&mut BufWriter::new(file))?;
    Ok(())
}

fn draw_line(layer: &PdfLayerReference, line: &TextLine, font: &IndirectFontRef) {
    layer.use_text(
        line.text.clone(),
        line.font_size,
        Mm(line.x_mm),
        Mm(line.y_mm),
        font,
    );
}

/// Embed raw RGB pixels; the dpi is chosen so the image spans `width_mm`.
fn draw_image(layer: &PdfLayerReference, placement: &ImagePlacement) -> Result<(), ReportError> {
    let rgb = image::open(&placement.path)
        .map_err(|source| ReportError::Image {
            path: placement.path.clone(),
            source,
        })?
        .to_rgb8();
    let (width, height) = rgb.dimensions();

    let xobject = ImageXObject {
        width: Px(width as usize),
        height: Px(height as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: rgb.into_raw(),
        image_filter: None,
        smask: None,
        clipping_bbox: None,
    };

    let dpi = width as f32 * 25.4 / placement.width_mm;
    Image::from(xobject).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(placement.x_mm)),
            translate_y: Some(Mm(placement.y_mm)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
    Ok(())
}
