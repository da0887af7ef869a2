//! Error types for the zahlungsplan library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`PlanError`] — **Fatal**: no document can be produced for this request
//!   (missing rent, wrong number of invoices, pdfium unavailable, output not
//!   writable). Returned as `Err(PlanError)` from the top-level functions.
//!
//! * [`DocumentError`] — **Non-fatal**: one invoice could not be read or did
//!   not yield an amount. Stored inside [`crate::request::InvoiceReport`] so
//!   the caller can show every problem at once and let a human correct the
//!   values before generating.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the zahlungsplan library.
#[derive(Debug, Error)]
pub enum PlanError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Invoice file was not found at the given path.
    #[error("Invoice not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    // ── Amount errors ─────────────────────────────────────────────────────
    /// A typed amount could not be parsed.
    #[error("Invalid amount '{input}': expected a number like 1234,56 or 1234.56")]
    InvalidAmount { input: String },

    /// Amounts on the schedule are never negative.
    #[error("Amount must not be negative, got {value}")]
    NegativeAmount { value: String },

    /// Amounts beyond 999.999.999.999,99 EUR are refused.
    #[error("Amount {value} is too large (at most 999.999.999.999,99 EUR)")]
    AmountTooLarge { value: String },

    /// Neither typed input nor any invoice provided the monthly rent.
    #[error("No rent amount: type it with --rent or supply the rent invoice")]
    MissingRent,

    // ── Invoice gating ────────────────────────────────────────────────────
    /// Invoice-driven generation needs exactly two or three documents.
    #[error("Please supply exactly 2 or 3 invoice PDFs (got {got})")]
    WrongDocumentCount { got: usize },

    /// At least one invoice could not be read; nothing is generated.
    #[error("At least one invoice could not be read: {}", .failures.join("; "))]
    UnreadableDocuments { failures: Vec<String> },

    // ── Engine / output errors ────────────────────────────────────────────
    /// No pdfium library could be bound.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium is normally downloaded automatically on first run.\n\
If the auto-download failed, you can:\n\
  • Check your internet connection and try again.\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n"
    )]
    EngineUnavailable(String),

    /// pdfium rejected a drawing or save operation.
    #[error("Rendering failed on page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// Could not create or write the output PDF.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed, or a payee file could not be loaded.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single invoice.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// The invoice could not be opened or its text could not be extracted.
    #[error("{source_name}: unreadable: {detail}")]
    Unreadable { source_name: String, detail: String },

    /// The text was read but no amount line was recognised.
    #[error("{source_name}: no amount found{}", line_hint(.line))]
    AmountNotFound {
        source_name: String,
        line: Option<String>,
    },
}

fn line_hint(line: &Option<String>) -> String {
    match line {
        Some(l) => format!(" (matched line: {l:?})"),
        None => String::new(),
    }
}
