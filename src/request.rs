//! Request assembly: one submission's identity and amounts.
//!
//! A [`PlanRequest`] is built once per submission from what the user typed
//! ([`PlanInput`]) and, optionally, from the [`InvoiceReport`]s of two or
//! three uploaded invoices. Typed values always win over extracted ones;
//! extraction only fills the gaps. Nothing survives the request.

use crate::config::AssignmentStrategy;
use crate::error::{DocumentError, PlanError};
use crate::money::MonetaryAmount;
use crate::pipeline::classify::{self, InvoiceKind};
use crate::pipeline::extract::{self, AmountLookup};
use crate::schedule::PlanAmounts;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Accepted invoice counts when amounts come from documents.
pub const INVOICE_COUNT_RANGE: std::ops::RangeInclusive<usize> = 2..=3;

/// Who the schedule is for. Free text, printed as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantIdentity {
    pub tenant_name: String,
    pub address: String,
    /// Contract number; used as Verwendungszweck.
    pub contract_reference: String,
}

impl TenantIdentity {
    /// Fill every empty field from `other`.
    fn fill_from(&mut self, other: &TenantIdentity) {
        for (mine, theirs) in [
            (&mut self.tenant_name, &other.tenant_name),
            (&mut self.address, &other.address),
            (&mut self.contract_reference, &other.contract_reference),
        ] {
            if mine.trim().is_empty() && !theirs.is_empty() {
                *mine = theirs.clone();
            }
        }
    }
}

/// The form fields of one submission. Every amount is optional here; the
/// rent becomes mandatory only when the request is assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanInput {
    pub identity: TenantIdentity,
    pub rent: Option<MonetaryAmount>,
    pub advertising: Option<MonetaryAmount>,
    pub food_fee: Option<MonetaryAmount>,
}

/// Extraction result for one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceReport {
    /// File name or URL the invoice came from.
    pub source: String,
    /// `None` when the text could not be read at all.
    pub lookup: Option<AmountLookup>,
    pub kind: Option<InvoiceKind>,
    pub identity: TenantIdentity,
    pub error: Option<DocumentError>,
}

impl InvoiceReport {
    /// Run both extractors over the invoice text.
    pub fn from_text(source: impl Into<String>, text: &str) -> Self {
        let source = source.into();
        let lookup = extract::extract_amount(text);
        let error = match &lookup {
            AmountLookup::Found(_) => None,
            other => Some(DocumentError::AmountNotFound {
                source_name: source.clone(),
                line: other.matched_line().map(str::to_string),
            }),
        };
        debug!("{source}: {lookup:?}");

        Self {
            kind: Some(classify::classify(text)),
            identity: classify::guess_identity(text),
            lookup: Some(lookup),
            error,
            source,
        }
    }

    /// An invoice whose text could not be extracted.
    pub fn unreadable(source: impl Into<String>, detail: impl Into<String>) -> Self {
        let source = source.into();
        Self {
            error: Some(DocumentError::Unreadable {
                source_name: source.clone(),
                detail: detail.into(),
            }),
            lookup: None,
            kind: None,
            identity: TenantIdentity::default(),
            source,
        }
    }

    /// The extracted amount, if any.
    pub fn amount(&self) -> Option<rust_decimal::Decimal> {
        self.lookup.as_ref().and_then(AmountLookup::amount)
    }
}

/// Everything needed to render one Zahlungsplan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub identity: TenantIdentity,
    pub amounts: PlanAmounts,
}

impl PlanRequest {
    /// A request from typed values only.
    pub fn typed(input: PlanInput) -> Result<Self, PlanError> {
        Self::assemble(input, &[], AssignmentStrategy::default())
    }

    /// Merge typed input with invoice extraction results.
    ///
    /// When `reports` is non-empty it must hold two or three invoices, every
    /// one of which yielded a non-negative amount; otherwise nothing is
    /// generated. Typed amounts override extracted ones and empty identity
    /// fields are filled from the invoices in order.
    pub fn assemble(
        input: PlanInput,
        reports: &[InvoiceReport],
        strategy: AssignmentStrategy,
    ) -> Result<Self, PlanError> {
        let mut identity = input.identity;
        let mut extracted = ExtractedAmounts::default();

        if !reports.is_empty() {
            if !INVOICE_COUNT_RANGE.contains(&reports.len()) {
                return Err(PlanError::WrongDocumentCount { got: reports.len() });
            }

            let mut failures = Vec::new();
            let mut amounts = Vec::with_capacity(reports.len());
            for report in reports {
                if let Some(err) = &report.error {
                    failures.push(err.to_string());
                    continue;
                }
                match report.amount().map(MonetaryAmount::new) {
                    Some(Ok(amount)) => amounts.push((report, amount)),
                    Some(Err(e)) => failures.push(format!("{}: {e}", report.source)),
                    None => failures.push(format!("{}: no amount found", report.source)),
                }
            }
            if !failures.is_empty() {
                return Err(PlanError::UnreadableDocuments { failures });
            }

            extracted = match strategy {
                AssignmentStrategy::ByMagnitude => {
                    ExtractedAmounts::by_magnitude(amounts.iter().map(|(_, a)| *a).collect())
                }
                AssignmentStrategy::ByKind => ExtractedAmounts::by_kind(&amounts),
            };

            for report in reports {
                identity.fill_from(&report.identity);
            }
        }

        let rent = input.rent.or(extracted.rent).ok_or(PlanError::MissingRent)?;

        Ok(Self {
            identity,
            amounts: PlanAmounts {
                rent,
                advertising: input.advertising.or(extracted.advertising),
                food_fee: input.food_fee.or(extracted.food_fee),
            },
        })
    }
}

#[derive(Debug, Default)]
struct ExtractedAmounts {
    rent: Option<MonetaryAmount>,
    advertising: Option<MonetaryAmount>,
    food_fee: Option<MonetaryAmount>,
}

impl ExtractedAmounts {
    /// Largest is the rent, then advertising, then the food fee.
    fn by_magnitude(mut amounts: Vec<MonetaryAmount>) -> Self {
        amounts.sort_unstable_by(|a, b| b.cmp(a));
        let mut it = amounts.into_iter();
        Self {
            rent: it.next(),
            advertising: it.next(),
            food_fee: it.next(),
        }
    }

    /// First invoice of each kind wins.
    fn by_kind(amounts: &[(&InvoiceReport, MonetaryAmount)]) -> Self {
        let mut out = Self::default();
        for (report, amount) in amounts {
            let slot = match report.kind.unwrap_or(InvoiceKind::Rent) {
                InvoiceKind::Rent => &mut out.rent,
                InvoiceKind::Advertising => &mut out.advertising,
                InvoiceKind::FoodFee => &mut out.food_fee,
            };
            if slot.is_some() {
                warn!(
                    "{}: second {:?} invoice ignored",
                    report.source,
                    report.kind.unwrap_or(InvoiceKind::Rent)
                );
                continue;
            }
            *slot = Some(*amount);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eur(s: &str) -> MonetaryAmount {
        s.parse().unwrap()
    }

    fn report(name: &str, text: &str) -> InvoiceReport {
        InvoiceReport::from_text(name, text)
    }

    #[test]
    fn typed_request_needs_rent() {
        assert!(matches!(
            PlanRequest::typed(PlanInput::default()),
            Err(PlanError::MissingRent)
        ));

        let req = PlanRequest::typed(PlanInput {
            rent: Some(eur("1000")),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(req.amounts.rent, eur("1000"));
        assert_eq!(req.amounts.advertising, None);
    }

    #[test]
    fn by_magnitude_sorts_descending() {
        let reports = [
            report("werbung.pdf", "Werbebeitrag\nGesamtbetrag 600,00"),
            report("gastro.pdf", "Fettabluft\nGesamtbetrag 45,00"),
            report("miete.pdf", "Miete\nGesamtbetrag 2.400,00"),
        ];
        let req = PlanRequest::assemble(PlanInput::default(), &reports, AssignmentStrategy::ByMagnitude)
            .unwrap();
        assert_eq!(req.amounts.rent, eur("2400"));
        assert_eq!(req.amounts.advertising, Some(eur("600")));
        assert_eq!(req.amounts.food_fee, Some(eur("45")));
    }

    #[test]
    fn two_invoices_mean_no_food_fee() {
        let reports = [
            report("a.pdf", "Gesamt 300,00"),
            report("b.pdf", "Gesamt 1.300,00"),
        ];
        let req = PlanRequest::assemble(PlanInput::default(), &reports, AssignmentStrategy::ByMagnitude)
            .unwrap();
        assert_eq!(req.amounts.rent, eur("1300"));
        assert_eq!(req.amounts.advertising, Some(eur("300")));
        assert_eq!(req.amounts.food_fee, None);
    }

    #[test]
    fn by_kind_uses_classification() {
        let reports = [
            report("gastro.pdf", "Gastro Umlage\nBetrag 5.000,00"),
            report("miete.pdf", "Miete\nBetrag 900,00"),
            report("werbung.pdf", "Werbung\nBetrag 1.200,00"),
        ];
        let req = PlanRequest::assemble(PlanInput::default(), &reports, AssignmentStrategy::ByKind)
            .unwrap();
        assert_eq!(req.amounts.rent, eur("900"));
        assert_eq!(req.amounts.advertising, Some(eur("1200")));
        assert_eq!(req.amounts.food_fee, Some(eur("5000")));
    }

    #[test]
    fn wrong_document_count_is_rejected() {
        let one = [report("a.pdf", "Gesamt 1,00")];
        assert!(matches!(
            PlanRequest::assemble(PlanInput::default(), &one, AssignmentStrategy::ByMagnitude),
            Err(PlanError::WrongDocumentCount { got: 1 })
        ));

        let four: Vec<_> = (0..4).map(|i| report(&format!("{i}.pdf"), "Gesamt 1,00")).collect();
        assert!(matches!(
            PlanRequest::assemble(PlanInput::default(), &four, AssignmentStrategy::ByMagnitude),
            Err(PlanError::WrongDocumentCount { got: 4 })
        ));
    }

    #[test]
    fn any_unreadable_invoice_aborts() {
        let reports = [
            report("a.pdf", "Gesamt 300,00"),
            InvoiceReport::unreadable("b.pdf", "corrupt xref"),
            report("c.pdf", "kein Betrag hier? doch: Betrag"),
        ];
        let err = PlanRequest::assemble(PlanInput::default(), &reports, AssignmentStrategy::ByMagnitude)
            .unwrap_err();
        match err {
            PlanError::UnreadableDocuments { failures } => {
                assert_eq!(failures.len(), 2);
                assert!(failures[0].contains("b.pdf"));
                assert!(failures[1].contains("c.pdf"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn negative_extracted_amount_is_a_failure() {
        let reports = [
            report("a.pdf", "Gesamt -300,00"),
            report("b.pdf", "Gesamt 1.300,00"),
        ];
        assert!(matches!(
            PlanRequest::assemble(PlanInput::default(), &reports, AssignmentStrategy::ByMagnitude),
            Err(PlanError::UnreadableDocuments { .. })
        ));
    }

    #[test]
    fn typed_values_override_extracted_ones() {
        let reports = [
            report("a.pdf", "Gesamt 300,00"),
            report("b.pdf", "Gesamt 1.300,00"),
        ];
        let input = PlanInput {
            rent: Some(eur("1250")),
            food_fee: Some(eur("30")),
            ..Default::default()
        };
        let req = PlanRequest::assemble(input, &reports, AssignmentStrategy::ByMagnitude).unwrap();
        assert_eq!(req.amounts.rent, eur("1250"));
        assert_eq!(req.amounts.advertising, Some(eur("300")));
        assert_eq!(req.amounts.food_fee, Some(eur("30")));
    }

    #[test]
    fn empty_identity_fields_are_filled_from_invoices() {
        let reports = [
            report("a.pdf", "Bäckerei Korn GmbH\nGesamt 300,00"),
            report("b.pdf", "Am Markt 3\nVertragsnummer 77-1\nGesamt 1.300,00"),
        ];
        let input = PlanInput {
            identity: TenantIdentity {
                tenant_name: String::new(),
                address: "Typed Weg 1".into(),
                contract_reference: String::new(),
            },
            ..Default::default()
        };
        let req = PlanRequest::assemble(input, &reports, AssignmentStrategy::ByMagnitude).unwrap();
        assert_eq!(req.identity.tenant_name, "Bäckerei Korn GmbH");
        assert_eq!(req.identity.address, "Typed Weg 1");
        assert_eq!(req.identity.contract_reference, "77-1");
    }

    #[test]
    fn report_records_missing_amount_as_document_error() {
        let r = report("x.pdf", "Rechnung ohne Summe");
        assert_eq!(r.amount(), None);
        assert!(matches!(r.error, Some(DocumentError::AmountNotFound { line: None, .. })));
    }
}
