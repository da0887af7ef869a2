//! Amount extraction: find the invoice total in extracted page text.
//!
//! Invoices put the grand total near the bottom, on a line labelled
//! "Gesamtbetrag", "Rechnungsbetrag", "Total" and the like. The scan therefore
//! walks the lines bottom-up and stops at the first labelled line. Only that
//! line is examined: a label without a readable figure is reported as such
//! rather than guessed from elsewhere in the text.

use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;

/// Lowercase keywords that mark the total line.
pub const AMOUNT_KEYWORDS: [&str; 3] = ["betrag", "gesamt", "total"];

/// Symbols stripped from every token before parsing.
const STRIPPED_SYMBOLS: [char; 6] = ['€', ':', ';', '*', '(', ')'];

/// Outcome of one extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AmountLookup {
    /// The first parseable token on the total line, rounded to cents.
    Found(Decimal),
    /// No line contains a keyword.
    NoKeywordLine,
    /// The total line was found but none of its tokens is a number.
    NoAmountOnLine { line: String },
}

impl AmountLookup {
    /// The amount, or `None` for both "not found" cases.
    pub fn amount(&self) -> Option<Decimal> {
        match self {
            AmountLookup::Found(v) => Some(*v),
            _ => None,
        }
    }

    /// The matched line, when there was one.
    pub fn matched_line(&self) -> Option<&str> {
        match self {
            AmountLookup::NoAmountOnLine { line } => Some(line),
            _ => None,
        }
    }
}

/// Extract the invoice total from `text`.
pub fn extract_amount(text: &str) -> AmountLookup {
    let Some(line) = text.lines().rev().find(|l| is_amount_line(l)) else {
        return AmountLookup::NoKeywordLine;
    };

    match line.split_whitespace().find_map(parse_token) {
        Some(value) => AmountLookup::Found(value),
        None => AmountLookup::NoAmountOnLine {
            line: line.trim().to_string(),
        },
    }
}

fn is_amount_line(line: &str) -> bool {
    let lower = line.to_lowercase();
    AMOUNT_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Parse one whitespace-delimited token in German notation.
///
/// `1.250,00€` → `1250.00`. A minus sign is kept, so `-12,00` parses as a
/// negative value.
fn parse_token(token: &str) -> Option<Decimal> {
    let cleaned: String = token
        .chars()
        .filter(|c| !STRIPPED_SYMBOLS.contains(c) && *c != '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if cleaned.is_empty() || !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    Decimal::from_str(&cleaned).ok().map(|v| v.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_german_total() {
        let text = "Rechnung Nr. 2024-17\nPosition 1  1.000,00 €\nGesamtbetrag: 1.250,00 €\n";
        assert_eq!(extract_amount(text), AmountLookup::Found(Decimal::new(125000, 2)));
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        assert_eq!(
            extract_amount("TOTAL 99,90"),
            AmountLookup::Found(Decimal::new(9990, 2))
        );
        assert_eq!(
            extract_amount("Rechnungsbetrag 42"),
            AmountLookup::Found(Decimal::new(42, 0))
        );
    }

    #[test]
    fn last_keyword_line_wins() {
        let text = "Zwischensumme gesamt 100,00\nMwSt 19,00\nGesamtbetrag 119,00";
        assert_eq!(extract_amount(text).amount(), Some(Decimal::new(11900, 2)));
    }

    #[test]
    fn first_parseable_token_from_the_left_wins() {
        let text = "Gesamt 2 Positionen 350,00 EUR";
        assert_eq!(extract_amount(text).amount(), Some(Decimal::new(2, 0)));
    }

    #[test]
    fn no_keyword_line_is_not_found() {
        let text = "Miete Januar 1.500,00\nNebenkosten 250,00";
        assert_eq!(extract_amount(text), AmountLookup::NoKeywordLine);
        assert_eq!(extract_amount(text).amount(), None);
    }

    #[test]
    fn keyword_line_without_number_does_not_fall_back() {
        let text = "Summe 500,00\nGesamtbetrag siehe Anlage";
        let lookup = extract_amount(text);
        assert_eq!(
            lookup,
            AmountLookup::NoAmountOnLine {
                line: "Gesamtbetrag siehe Anlage".into()
            }
        );
        assert_eq!(lookup.matched_line(), Some("Gesamtbetrag siehe Anlage"));
        assert_eq!(lookup.amount(), None);
    }

    #[test]
    fn negative_tokens_are_accepted() {
        assert_eq!(
            extract_amount("Gutschrift Betrag -12,50").amount(),
            Some(Decimal::new(-1250, 2))
        );
    }

    #[test]
    fn rounds_to_two_digits() {
        assert_eq!(
            extract_amount("Betrag 10,129").amount(),
            Some(Decimal::new(1013, 2))
        );
    }

    #[test]
    fn empty_text_is_not_found() {
        assert_eq!(extract_amount(""), AmountLookup::NoKeywordLine);
    }

    #[test]
    fn currency_symbol_glued_to_number() {
        assert_eq!(
            extract_amount("Total: 3.400,00€").amount(),
            Some(Decimal::new(340000, 2))
        );
    }
}
