//! Pipeline stages for turning invoices into a Zahlungsplan.
//!
//! Each submodule implements exactly one step. Only [`text`] and [`paint`]
//! talk to pdfium; everything between them is plain data and is tested
//! without the native library.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ text ──▶ extract ──▶ (request) ──▶ layout ──▶ paint
//! (URL/path) (pdfium) (amount)    classify      (pages)    (pdfium)
//! ```
//!
//! 1. [`input`]    — canonicalise the user-supplied path or URL to a local PDF
//! 2. [`text`]     — pull the text layer of every page
//! 3. [`extract`]  — find the billed amount on the last keyword line
//! 4. [`classify`] — guess the invoice kind and the tenant identity
//! 5. [`layout`]   — position header, table and payment boilerplate on pages
//! 6. [`paint`]    — replay the page model into a PDF document

pub mod classify;
pub mod extract;
pub mod input;
pub mod layout;
pub mod paint;
pub mod text;
