//! Configuration types for payment-schedule generation.
//!
//! All generation behaviour is controlled through [`PlanConfig`], built via
//! its [`PlanConfigBuilder`]. The defaults reproduce the landlord's standard
//! Zahlungsplan: the eight-column table with hand-fill "Überwiesen" columns,
//! the three HBB payee accounts and the gross-amount disclaimer.

use crate::error::PlanError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default disclaimer printed below the tenant address on every page.
pub const DEFAULT_DISCLAIMER: &str = "Die Beträge sind brutto.";

/// Configuration for one Zahlungsplan.
///
/// # Example
/// ```rust
/// use zahlungsplan::{PlanConfig, TableLayout, ZeroFeePolicy};
///
/// let config = PlanConfig::builder()
///     .table_layout(TableLayout::Compact)
///     .zero_food_fee(ZeroFeePolicy::Show)
///     .build()
///     .unwrap();
/// assert_eq!(config.payees.len(), 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Which columns the table carries. Default: [`TableLayout::TransferColumns`].
    pub table_layout: TableLayout,

    /// What a food fee of exactly zero means. Default: [`ZeroFeePolicy::Omit`].
    pub zero_food_fee: ZeroFeePolicy,

    /// How amounts extracted from invoices map onto rent / advertising /
    /// food fee. Default: [`AssignmentStrategy::ByMagnitude`].
    pub assignment: AssignmentStrategy,

    /// Sentence printed under the address. Default: [`DEFAULT_DISCLAIMER`].
    pub disclaimer: String,

    /// Payment recipients, in print order. The food-fee payee is printed
    /// only when the schedule carries a food fee.
    pub payees: Vec<Payee>,

    /// Whether the pdfium library may be downloaded when it is not found
    /// locally. Default: true.
    pub allow_engine_download: bool,

    /// Download timeout for invoice URLs in seconds. Default: 60.
    pub download_timeout_secs: u64,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            table_layout: TableLayout::default(),
            zero_food_fee: ZeroFeePolicy::default(),
            assignment: AssignmentStrategy::default(),
            disclaimer: DEFAULT_DISCLAIMER.to_string(),
            payees: Payee::defaults(),
            allow_engine_download: true,
            download_timeout_secs: 60,
        }
    }
}

impl PlanConfig {
    /// Create a new builder for `PlanConfig`.
    pub fn builder() -> PlanConfigBuilder {
        PlanConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PlanConfig`].
#[derive(Debug)]
pub struct PlanConfigBuilder {
    config: PlanConfig,
}

impl PlanConfigBuilder {
    pub fn table_layout(mut self, layout: TableLayout) -> Self {
        self.config.table_layout = layout;
        self
    }

    pub fn zero_food_fee(mut self, policy: ZeroFeePolicy) -> Self {
        self.config.zero_food_fee = policy;
        self
    }

    pub fn assignment(mut self, strategy: AssignmentStrategy) -> Self {
        self.config.assignment = strategy;
        self
    }

    pub fn disclaimer(mut self, text: impl Into<String>) -> Self {
        self.config.disclaimer = text.into();
        self
    }

    pub fn payees(mut self, payees: Vec<Payee>) -> Self {
        self.config.payees = payees;
        self
    }

    /// Replace the payees with the list stored in a JSON file.
    pub fn payees_from_file(self, path: impl AsRef<Path>) -> Result<Self, PlanError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PlanError::InvalidConfig(format!("cannot read payees '{}': {e}", path.display()))
        })?;
        let payees: Vec<Payee> = serde_json::from_str(&raw).map_err(|e| {
            PlanError::InvalidConfig(format!("malformed payees '{}': {e}", path.display()))
        })?;
        Ok(self.payees(payees))
    }

    pub fn allow_engine_download(mut self, v: bool) -> Self {
        self.config.allow_engine_download = v;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PlanConfig, PlanError> {
        let c = &self.config;
        for kind in [PayeeKind::Rent, PayeeKind::Advertising] {
            if !c.payees.iter().any(|p| p.kind == kind) {
                return Err(PlanError::InvalidConfig(format!(
                    "no payee configured for {kind:?}"
                )));
            }
        }
        if let Some(p) = c.payees.iter().find(|p| p.holder.trim().is_empty() || p.iban.trim().is_empty()) {
            return Err(PlanError::InvalidConfig(format!(
                "payee '{}' needs an account holder and an IBAN",
                p.label
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Column set of the schedule table.
///
/// | Layout | Without food fee | With food fee |
/// |--------|------------------|---------------|
/// | `TransferColumns` | 6 columns | 8 columns |
/// | `Compact` | 4 columns | 5 columns |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TableLayout {
    /// Every amount column is followed by an empty "Überwiesen" column the
    /// tenant ticks off by hand. (default)
    #[default]
    TransferColumns,
    /// Amount columns only.
    Compact,
}

/// Meaning of a food fee of exactly `0,00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZeroFeePolicy {
    /// Zero means "no food fee": the column and the third payee block are
    /// left out. (default)
    #[default]
    Omit,
    /// Zero is a real amount and is printed as `0,00 EUR`.
    Show,
}

/// How extracted invoice amounts are assigned to the three figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AssignmentStrategy {
    /// Largest amount is the rent, the next the advertising contribution,
    /// a third the food fee. (default)
    #[default]
    ByMagnitude,
    /// Each invoice is classified by its keywords.
    ByKind,
}

/// Which figure a payee collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayeeKind {
    Rent,
    Advertising,
    FoodFee,
}

/// One bank-transfer recipient in the boilerplate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payee {
    pub kind: PayeeKind,
    /// Heading label, e.g. "Miete + Nebenkosten".
    pub label: String,
    /// Kontoinhaber.
    pub holder: String,
    pub iban: String,
    pub bic: String,
    pub bank: String,
    /// Print a `Verwendungszweck: <contract>` line.
    #[serde(default)]
    pub with_reference: bool,
}

impl Payee {
    /// The three standard recipients.
    pub fn defaults() -> Vec<Payee> {
        vec![
            Payee {
                kind: PayeeKind::Rent,
                label: "Miete + Nebenkosten".into(),
                holder: "HBB Gewerbebau Projektgesellschaft".into(),
                iban: "DE94 1003 0200 1052 5300 42".into(),
                bic: "BHYPDEB2XXX".into(),
                bank: "Berlin Hyp".into(),
                with_reference: true,
            },
            Payee {
                kind: PayeeKind::Advertising,
                label: "Werbebeiträge".into(),
                holder: "HBB Centermanagement GmbH & Co. KG".into(),
                iban: "DE39 2005 0550 1002 2985 84".into(),
                bic: "HASPDEHHXXX".into(),
                bank: "Hamburger Sparkasse".into(),
                with_reference: true,
            },
            Payee {
                kind: PayeeKind::FoodFee,
                label: "Gastro".into(),
                holder: "HBB Betreuungsgesellschaft mbH".into(),
                iban: "DE56 2005 0550 1002 2562 77".into(),
                bic: "HASPDEHHXXX".into(),
                bank: "Hamburger Sparkasse".into(),
                with_reference: false,
            },
        ]
    }

    /// Lines of this payee's block, numbered `index` (1-based).
    pub fn block_lines(&self, index: usize, contract_reference: &str) -> Vec<String> {
        let mut lines = vec![
            format!("{index}. {} - Kontoinhaber: {}", self.label, self.holder),
            format!("IBAN: {}", self.iban),
            format!("BIC: {}", self.bic),
            format!("Bank: {}", self.bank),
        ];
        if self.with_reference {
            lines.push(format!("Verwendungszweck: {contract_reference}"));
        }
        lines
    }
}
