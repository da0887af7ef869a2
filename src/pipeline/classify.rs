//! Tenant identity and invoice kind, guessed from invoice text.
//!
//! Every field is taken from the first line carrying its cue. Nothing is
//! validated; an empty string means "no cue found" and the user is expected
//! to fill the field in.

use crate::request::TenantIdentity;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// What an invoice bills for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvoiceKind {
    Rent,
    Advertising,
    FoodFee,
}

const FOOD_FEE_KEYWORDS: [&str; 3] = ["gastro", "fettabluft", "abluft"];

// Word start only: "Gewerbebau" is the landlord, not an advertising cue.
static RE_ADVERTISING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:werbe|werbung|marketing)").expect("static regex")
});

static RE_LEGAL_FORM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:gmbh|ag|kg|ohg|ug|gbr)\b|\be\.\s?k\.").expect("static regex")
});

static RE_STREET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:straße|strasse|str\.|weg|platz|allee|ring|damm)\s*\d+").expect("static regex")
});

static RE_CONTRACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)vertragsnummer|vertrags-?nr|vertrag-nr|mietvertrag").expect("static regex")
});

/// Classify the invoice. Food-fee cues are checked before advertising cues,
/// so a text mentioning both counts as a food-fee invoice.
pub fn classify(text: &str) -> InvoiceKind {
    let lower = text.to_lowercase();
    if FOOD_FEE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        InvoiceKind::FoodFee
    } else if RE_ADVERTISING.is_match(text) {
        InvoiceKind::Advertising
    } else {
        InvoiceKind::Rent
    }
}

/// Guess tenant name, address and contract reference.
pub fn guess_identity(text: &str) -> TenantIdentity {
    TenantIdentity {
        tenant_name: first_line(text, &RE_LEGAL_FORM).unwrap_or_default().to_string(),
        address: first_line(text, &RE_STREET).unwrap_or_default().to_string(),
        contract_reference: first_line(text, &RE_CONTRACT)
            .and_then(|l| l.split_whitespace().last())
            .unwrap_or_default()
            .to_string(),
    }
}

fn first_line<'t>(text: &'t str, cue: &Regex) -> Option<&'t str> {
    text.lines().map(str::trim).find(|l| cue.is_match(l))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVOICE: &str = "\
HBB Centermanagement GmbH & Co. KG
Rechnung
Café Sonnenschein UG
Hauptstraße 12, 20095 Hamburg
Mietvertrag Nr. MV-2023-118
Werbebeitrag 1. Halbjahr
Gesamtbetrag: 1.250,00 €";

    #[test]
    fn first_legal_form_line_is_the_name() {
        // The landlord's own letterhead comes first; no plausibility check.
        let id = guess_identity(INVOICE);
        assert_eq!(id.tenant_name, "HBB Centermanagement GmbH & Co. KG");
    }

    #[test]
    fn street_line_with_house_number_is_the_address() {
        assert_eq!(guess_identity(INVOICE).address, "Hauptstraße 12, 20095 Hamburg");
    }

    #[test]
    fn contract_reference_is_last_token_of_its_line() {
        assert_eq!(guess_identity(INVOICE).contract_reference, "MV-2023-118");
        assert_eq!(
            guess_identity("Vertragsnummer: 4711").contract_reference,
            "4711"
        );
    }

    #[test]
    fn missing_cues_leave_fields_empty() {
        let id = guess_identity("Rechnung\nBetrag 10,00");
        assert_eq!(id, TenantIdentity::default());
    }

    #[test]
    fn legal_form_must_be_a_whole_word() {
        // "Tag" and "Betrag" contain "ag" but are no legal form.
        let id = guess_identity("Tag der Leistung\nBetrag 10,00\nMüller AG");
        assert_eq!(id.tenant_name, "Müller AG");
    }

    #[test]
    fn einzelkaufmann_is_recognised() {
        assert_eq!(guess_identity("Blumen Schmidt e.K.").tenant_name, "Blumen Schmidt e.K.");
    }

    #[test]
    fn classification_order() {
        assert_eq!(classify("Miete Juli"), InvoiceKind::Rent);
        assert_eq!(classify(INVOICE), InvoiceKind::Advertising);
        assert_eq!(classify("Fettabluft Reinigung"), InvoiceKind::FoodFee);
        // food-fee cues win over advertising cues
        assert_eq!(classify("Werbung und Gastro-Umlage"), InvoiceKind::FoodFee);
    }

    #[test]
    fn landlord_name_is_no_advertising_cue() {
        let rent = "HBB Gewerbebau Projektgesellschaft\nMiete Januar 1.900,00\nGesamtbetrag: 2.400,00 €";
        assert_eq!(classify(rent), InvoiceKind::Rent);
        assert_eq!(classify("Marketingumlage 2024"), InvoiceKind::Advertising);
    }
}
