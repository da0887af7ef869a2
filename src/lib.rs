//! # zahlungsplan
//!
//! Generate a tenant's twelve-month payment schedule (*Zahlungsplan*) as a
//! PDF, from typed amounts or from the tenant's invoices.
//!
//! A schedule lists, per calendar month, the rent including service
//! charges, the half-yearly advertising contribution (Januar and Juli
//! only), an optional food-service fee and the monthly total. Below the
//! table the document prints where each amount has to be transferred.
//!
//! ## Pipeline Overview
//!
//! ```text
//! invoices (2–3 PDFs, optional)
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Text      read the text layer via pdfium
//!  ├─ 3. Extract   amount from the last Betrag/Gesamt/Total line
//!  ├─ 4. Request   typed values win; extraction fills the gaps
//!  ├─ 5. Schedule  twelve rows, totals derived
//!  ├─ 6. Layout    header, table, payment instructions, paginated
//!  └─ 7. Paint     pdfium writes Zahlungsplan.pdf
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use zahlungsplan::{generate, PlanConfig, PlanInput, PlanRequest, TenantIdentity};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let request = PlanRequest::typed(PlanInput {
//!         identity: TenantIdentity {
//!             tenant_name: "Café Sonnenschein UG".into(),
//!             address: "Hauptstraße 12, 20095 Hamburg".into(),
//!             contract_reference: "MV-2023-118".into(),
//!         },
//!         rent: Some("1.234,50".parse()?),
//!         advertising: Some("600".parse()?),
//!         food_fee: None,
//!     })?;
//!     let plan = generate(&request, &PlanConfig::default())?;
//!     plan.persist("Zahlungsplan.pdf")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `zahlungsplan` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! ```toml
//! zahlungsplan = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod engine;
pub mod error;
pub mod generate;
pub mod money;
pub mod pipeline;
pub mod request;
pub mod schedule;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    AssignmentStrategy, Payee, PayeeKind, PlanConfig, PlanConfigBuilder, TableLayout, ZeroFeePolicy,
};
pub use error::{DocumentError, PlanError};
pub use generate::{extract_invoices, generate, generate_to_file, preview, RenderedPlan};
pub use money::{format_eur, MonetaryAmount};
pub use pipeline::classify::InvoiceKind;
pub use pipeline::extract::AmountLookup;
pub use request::{InvoiceReport, PlanInput, PlanRequest, TenantIdentity};
pub use schedule::{build_schedule, Month, PlanAmounts, Schedule, ScheduleRow};
