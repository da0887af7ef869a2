//! PDF painting: replay a [`DocumentLayout`] into a new pdfium document.
//!
//! The layout measures from the top-left in millimetres; PDF user space
//! measures from the bottom-left in points. All flipping happens here.
//! Text uses the built-in Helvetica family, so no font files are embedded.

use super::layout::{DocumentLayout, FontStyle, PageLayout};
use crate::error::PlanError;
use pdfium_render::prelude::*;
use tracing::{debug, info};

const BORDER_WIDTH_PT: f32 = 0.57;

struct Fonts {
    regular: PdfFontToken,
    bold: PdfFontToken,
    oblique: PdfFontToken,
}

impl Fonts {
    fn get(&self, style: FontStyle) -> PdfFontToken {
        match style {
            FontStyle::Regular => self.regular,
            FontStyle::Bold => self.bold,
            FontStyle::Oblique => self.oblique,
        }
    }
}

/// Paint every page of `layout` and return the serialised PDF.
pub fn paint_document(pdfium: &Pdfium, layout: &DocumentLayout) -> Result<Vec<u8>, PlanError> {
    let mut document = pdfium
        .create_new_pdf()
        .map_err(|e| PlanError::RenderFailed {
            page: 0,
            detail: format!("cannot create document: {e:?}"),
        })?;

    let fonts = Fonts {
        regular: document.fonts_mut().helvetica(),
        bold: document.fonts_mut().helvetica_bold(),
        oblique: document.fonts_mut().helvetica_oblique(),
    };

    for (idx, page_layout) in layout.pages.iter().enumerate() {
        let page_no = idx + 1;
        let failed = |e: PdfiumError| PlanError::RenderFailed {
            page: page_no,
            detail: format!("{e:?}"),
        };

        let mut page = document
            .pages_mut()
            .create_page_at_end(PdfPagePaperSize::new_custom(
                PdfPoints::from_mm(page_layout.width),
                PdfPoints::from_mm(page_layout.height),
            ))
            .map_err(failed)?;

        paint_page(&mut page, page_layout, &fonts).map_err(failed)?;
        debug!(
            "Painted page {} → {} texts, {} cells",
            page_no,
            page_layout.texts.len(),
            page_layout.borders.len()
        );
    }

    let bytes = document
        .save_to_bytes()
        .map_err(|e| PlanError::RenderFailed {
            page: 0,
            detail: format!("cannot serialise document: {e:?}"),
        })?;
    info!("Rendered {} pages, {} bytes", layout.pages.len(), bytes.len());
    Ok(bytes)
}

fn paint_page(page: &mut PdfPage, layout: &PageLayout, fonts: &Fonts) -> Result<(), PdfiumError> {
    let height = layout.height;
    let objects = page.objects_mut();

    for cell in &layout.borders {
        objects.create_path_object_rect(
            PdfRect::new(
                PdfPoints::from_mm(height - cell.y - cell.height),
                PdfPoints::from_mm(cell.x),
                PdfPoints::from_mm(height - cell.y),
                PdfPoints::from_mm(cell.x + cell.width),
            ),
            Some(PdfColor::new(0, 0, 0, 255)),
            Some(PdfPoints::new(BORDER_WIDTH_PT)),
            None,
        )?;
    }

    for run in &layout.texts {
        objects.create_text_object(
            PdfPoints::from_mm(run.x),
            PdfPoints::from_mm(height - run.baseline),
            &run.text,
            fonts.get(run.style),
            PdfPoints::new(run.size_pt),
        )?;
    }

    Ok(())
}
