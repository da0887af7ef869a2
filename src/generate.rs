//! Generation entry points.
//!
//! [`generate`] is the primary API: one [`PlanRequest`] in, one rendered
//! PDF out. The PDF lives in a scoped temp file owned by [`RenderedPlan`]
//! and disappears when the plan is dropped, unless it is persisted.
//! [`generate_to_file`] writes straight to a destination, atomically.

use crate::config::PlanConfig;
use crate::engine;
use crate::error::PlanError;
use crate::pipeline::{input, layout, paint, text};
use crate::request::{InvoiceReport, PlanRequest, INVOICE_COUNT_RANGE};
use crate::schedule::{build_schedule, Schedule};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// File name offered for download.
pub const FILE_NAME: &str = "Zahlungsplan.pdf";
/// Media type of the rendered document.
pub const MIME_TYPE: &str = "application/pdf";

/// A rendered Zahlungsplan.
#[derive(Debug)]
pub struct RenderedPlan {
    file: NamedTempFile,
    bytes: Vec<u8>,
    schedule: Schedule,
    page_count: usize,
}

impl RenderedPlan {
    /// Location of the temp file; valid while `self` lives.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn file_name(&self) -> &'static str {
        FILE_NAME
    }

    pub fn mime_type(&self) -> &'static str {
        MIME_TYPE
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Keep the document at `dest`. Falls back to copying the bytes when
    /// the temp file cannot be renamed there (different file system).
    pub fn persist(self, dest: impl AsRef<Path>) -> Result<PathBuf, PlanError> {
        let dest = dest.as_ref();
        match self.file.persist(dest) {
            Ok(_) => Ok(dest.to_path_buf()),
            Err(e) => {
                debug!("rename into place failed ({}); copying", e.error);
                write_atomic(dest, &self.bytes)?;
                Ok(dest.to_path_buf())
            }
        }
    }
}

/// The schedule a request would print. Does not need pdfium.
pub fn preview(request: &PlanRequest, config: &PlanConfig) -> Schedule {
    build_schedule(&request.amounts, config)
}

/// Render `request` to a PDF held in a temp file.
///
/// # Errors
/// - [`PlanError::EngineUnavailable`] when pdfium cannot be bound
/// - [`PlanError::RenderFailed`] when pdfium rejects the document
/// - [`PlanError::Internal`] when the temp file cannot be written
pub fn generate(request: &PlanRequest, config: &PlanConfig) -> Result<RenderedPlan, PlanError> {
    let start = Instant::now();
    let schedule = preview(request, config);
    let (bytes, page_count) = render(request, &schedule, config)?;

    let mut file = tempfile::Builder::new()
        .prefix("zahlungsplan-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| PlanError::Internal(format!("tempfile: {e}")))?;
    file.write_all(&bytes)
        .and_then(|_| file.flush())
        .map_err(|e| PlanError::Internal(format!("tempfile write: {e}")))?;

    info!(
        "Generated {} ({} pages, {} bytes) in {}ms",
        FILE_NAME,
        page_count,
        bytes.len(),
        start.elapsed().as_millis()
    );

    Ok(RenderedPlan {
        file,
        bytes,
        schedule,
        page_count,
    })
}

/// Render `request` and write it to `dest`.
///
/// Uses atomic write (temp file in the destination directory + rename), so
/// an existing file is either replaced completely or left untouched.
pub fn generate_to_file(
    request: &PlanRequest,
    dest: impl AsRef<Path>,
    config: &PlanConfig,
) -> Result<Schedule, PlanError> {
    let dest = dest.as_ref();
    let schedule = preview(request, config);
    let (bytes, _) = render(request, &schedule, config)?;
    write_atomic(dest, &bytes)?;
    info!("Wrote {}", dest.display());
    Ok(schedule)
}

/// Read every invoice and run both extractors.
///
/// Only the invoice count and the engine are fatal here; a document that
/// cannot be resolved or read shows up as an unreadable report.
pub fn extract_invoices<S: AsRef<str>>(
    inputs: &[S],
    config: &PlanConfig,
) -> Result<Vec<InvoiceReport>, PlanError> {
    if !INVOICE_COUNT_RANGE.contains(&inputs.len()) {
        return Err(PlanError::WrongDocumentCount { got: inputs.len() });
    }
    let pdfium = engine::bind_engine(config.allow_engine_download, None)?;

    let reports = inputs
        .iter()
        .map(|raw| {
            let raw = raw.as_ref();
            let name = input::display_name(raw);
            let read = input::resolve_input(raw, config.download_timeout_secs)
                .and_then(|resolved| text::read_text(&pdfium, resolved.path()));
            match read {
                Ok(content) => InvoiceReport::from_text(name, &content),
                Err(e) => {
                    warn!("{}: {}", name, e);
                    InvoiceReport::unreadable(name, e.to_string())
                }
            }
        })
        .collect();
    Ok(reports)
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Paint the plan; returns the PDF bytes and the page count.
fn render(
    request: &PlanRequest,
    schedule: &Schedule,
    config: &PlanConfig,
) -> Result<(Vec<u8>, usize), PlanError> {
    let document = layout::compose(schedule, &request.identity, config);
    debug!(
        "Layout: {:?}, {} pages",
        document.orientation,
        document.pages.len()
    );
    let pdfium = engine::bind_engine(config.allow_engine_download, None)?;
    let bytes = paint::paint_document(&pdfium, &document)?;
    Ok((bytes, document.pages.len()))
}

fn write_atomic(dest: &Path, bytes: &[u8]) -> Result<(), PlanError> {
    let failed = |source: std::io::Error| PlanError::OutputWriteFailed {
        path: dest.to_path_buf(),
        source,
    };

    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir).map_err(failed)?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(failed)?;
    tmp.write_all(bytes).map_err(failed)?;
    tmp.persist(dest).map_err(|e| failed(e.error))?;
    Ok(())
}
