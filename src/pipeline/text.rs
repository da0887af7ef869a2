//! Invoice text extraction via pdfium.
//!
//! Page texts are joined with a newline; pages without a text layer
//! (scans) contribute nothing, which the amount extractor then reports as
//! "no keyword line".

use crate::error::PlanError;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Read all text of the PDF at `pdf_path`.
pub fn read_text(pdfium: &Pdfium, pdf_path: &Path) -> Result<String, PlanError> {
    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| PlanError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    info!("{}: {} pages", pdf_path.display(), pages.len());

    let mut texts = Vec::with_capacity(pages.len() as usize);
    for (idx, page) in pages.iter().enumerate() {
        let text = page
            .text()
            .map_err(|e| PlanError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: format!("text layer of page {}: {:?}", idx + 1, e),
            })?
            .all();
        debug!("Page {} → {} chars", idx + 1, text.chars().count());
        if !text.trim().is_empty() {
            texts.push(text);
        }
    }

    Ok(texts.join("\n"))
}
