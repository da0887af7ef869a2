//! Euro amounts and their German presentation.
//!
//! Every figure on a Zahlungsplan is a non-negative Euro sum with two
//! fractional digits. [`MonetaryAmount`] wraps a [`Decimal`] so that row
//! totals are exact (`0.1 + 0.2 == 0.3`) and rounding happens once, at
//! construction.

use crate::error::PlanError;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

/// Largest accepted amount. Schedule sums add at most 36 of these, which
/// stays far below the range of [`Decimal`].
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// A non-negative Euro amount, rounded to cents, at most [`MAX_AMOUNT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct MonetaryAmount(Decimal);

impl MonetaryAmount {
    /// Round `value` to two digits; negative values and values above
    /// [`MAX_AMOUNT`] are rejected.
    pub fn new(value: Decimal) -> Result<Self, PlanError> {
        let mut rounded = value.round_dp(2);
        if rounded.is_sign_negative() && !rounded.is_zero() {
            return Err(PlanError::NegativeAmount {
                value: rounded.to_string(),
            });
        }
        if rounded.abs() > MAX_AMOUNT {
            return Err(PlanError::AmountTooLarge {
                value: rounded.to_string(),
            });
        }
        rounded.rescale(2);
        // -0.00 would otherwise print with a sign
        Ok(Self(rounded.abs()))
    }

    pub fn zero() -> Self {
        Self(Decimal::new(0, 2))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// German presentation, e.g. `12.345,67 EUR`.
    pub fn to_eur_string(&self) -> String {
        format_eur(self.0)
    }
}

impl Default for MonetaryAmount {
    fn default() -> Self {
        Self::zero()
    }
}

impl TryFrom<Decimal> for MonetaryAmount {
    type Error = PlanError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MonetaryAmount> for Decimal {
    fn from(amount: MonetaryAmount) -> Self {
        amount.0
    }
}

impl Add for MonetaryAmount {
    type Output = MonetaryAmount;

    /// Saturates at [`Decimal::MAX`]; unreachable for schedule sums of
    /// capped amounts.
    fn add(self, rhs: Self) -> Self::Output {
        MonetaryAmount(self.0.saturating_add(rhs.0))
    }
}

impl Sum for MonetaryAmount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(MonetaryAmount::zero(), Add::add)
    }
}

impl fmt::Display for MonetaryAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_eur_string())
    }
}

static RE_PLAIN_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?\d+(?:\.\d+)?$").expect("static regex"));

/// Strict parser for typed input.
///
/// Accepts `1234.56`, `1234,56`, `1.234,56` and a trailing `€` or `EUR`.
/// When a comma is present it is the decimal separator and dots are
/// thousands separators; otherwise a dot is the decimal point.
impl FromStr for MonetaryAmount {
    type Err = PlanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PlanError::InvalidAmount {
            input: s.to_string(),
        };

        let body = s
            .trim()
            .trim_end_matches("EUR")
            .trim_end()
            .trim_end_matches('€')
            .trim();
        if body.is_empty() {
            return Err(invalid());
        }

        let normalised = if body.contains(',') {
            body.replace('.', "").replace(',', ".")
        } else {
            body.to_string()
        };
        if !RE_PLAIN_NUMBER.is_match(&normalised) {
            return Err(invalid());
        }

        let value = Decimal::from_str(&normalised).map_err(|_| invalid())?;
        MonetaryAmount::new(value)
    }
}

/// Format a value the German way: `.` groups thousands, `,` separates the
/// cents, followed by ` EUR`.
pub fn format_eur(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let plain = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped},{frac_part} EUR")
}

/// Table-cell presentation: an absent amount is an empty cell, not `0,00 EUR`.
pub fn format_cell(value: Option<&MonetaryAmount>) -> String {
    value.map(MonetaryAmount::to_eur_string).unwrap_or_default()
}
