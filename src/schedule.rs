//! Expansion of the three base amounts into the twelve-row calendar table.
//!
//! Rules:
//! - rent is due every month;
//! - the advertising contribution is due half-yearly, in Januar and Juli, and
//!   is *absent* (not zero) in every other row;
//! - the food fee, when there is one, is due every month;
//! - each row's total is derived from the amounts present in that row.

use crate::config::{PlanConfig, ZeroFeePolicy};
use crate::money::MonetaryAmount;
use serde::{Serialize, Serializer};

/// The twelve months of the schedule, in calendar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Month {
    Januar,
    Februar,
    Maerz,
    April,
    Mai,
    Juni,
    Juli,
    August,
    September,
    Oktober,
    November,
    Dezember,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::Januar,
        Month::Februar,
        Month::Maerz,
        Month::April,
        Month::Mai,
        Month::Juni,
        Month::Juli,
        Month::August,
        Month::September,
        Month::Oktober,
        Month::November,
        Month::Dezember,
    ];

    /// German month name as printed in the table.
    pub fn name(self) -> &'static str {
        match self {
            Month::Januar => "Januar",
            Month::Februar => "Februar",
            Month::Maerz => "März",
            Month::April => "April",
            Month::Mai => "Mai",
            Month::Juni => "Juni",
            Month::Juli => "Juli",
            Month::August => "August",
            Month::September => "September",
            Month::Oktober => "Oktober",
            Month::November => "November",
            Month::Dezember => "Dezember",
        }
    }

    /// Months in which the advertising contribution falls due.
    pub fn is_advertising_month(self) -> bool {
        matches!(self, Month::Januar | Month::Juli)
    }
}

/// The three base amounts of one request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, serde::Deserialize)]
pub struct PlanAmounts {
    /// Monthly rent including service charges. Required, may be zero.
    pub rent: MonetaryAmount,
    /// Half-yearly advertising contribution.
    pub advertising: Option<MonetaryAmount>,
    /// Monthly food-service / grease-exhaust fee.
    pub food_fee: Option<MonetaryAmount>,
}

/// One month of the schedule. The total is computed, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRow {
    pub month: Month,
    pub rent: MonetaryAmount,
    pub advertising: Option<MonetaryAmount>,
    pub food_fee: Option<MonetaryAmount>,
}

impl ScheduleRow {
    /// `rent + advertising + food fee`; absent amounts contribute nothing.
    pub fn total(&self) -> MonetaryAmount {
        [Some(self.rent), self.advertising, self.food_fee]
            .into_iter()
            .flatten()
            .sum()
    }
}

impl Serialize for ScheduleRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("ScheduleRow", 5)?;
        s.serialize_field("month", self.month.name())?;
        s.serialize_field("rent", &self.rent)?;
        s.serialize_field("advertising", &self.advertising)?;
        s.serialize_field("food_fee", &self.food_fee)?;
        s.serialize_field("total", &self.total())?;
        s.end()
    }
}

/// Exactly twelve rows, Januar to Dezember.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    rows: Vec<ScheduleRow>,
}

impl Schedule {
    pub fn rows(&self) -> &[ScheduleRow] {
        &self.rows
    }

    /// True when any row carries a food fee; drives the food-fee column and
    /// the third payee block.
    pub fn has_food_fee(&self) -> bool {
        self.rows.iter().any(|r| r.food_fee.is_some())
    }

    /// Sum of all twelve row totals.
    pub fn annual_total(&self) -> MonetaryAmount {
        self.rows.iter().map(ScheduleRow::total).sum()
    }
}

/// Build the twelve-row schedule for `amounts`.
///
/// A food fee of exactly zero is treated according to
/// [`PlanConfig::zero_food_fee`]. An advertising contribution of zero is still
/// printed in its two months; only a missing one is left out.
pub fn build_schedule(amounts: &PlanAmounts, config: &PlanConfig) -> Schedule {
    let food_fee = match (amounts.food_fee, config.zero_food_fee) {
        (Some(fee), ZeroFeePolicy::Omit) if fee.is_zero() => None,
        (fee, _) => fee,
    };

    let rows = Month::ALL
        .iter()
        .map(|&month| ScheduleRow {
            month,
            rent: amounts.rent,
            advertising: amounts.advertising.filter(|_| month.is_advertising_month()),
            food_fee,
        })
        .collect();

    Schedule { rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eur(s: &str) -> MonetaryAmount {
        s.parse().unwrap()
    }

    fn amounts(rent: &str, adv: Option<&str>, food: Option<&str>) -> PlanAmounts {
        PlanAmounts {
            rent: eur(rent),
            advertising: adv.map(eur),
            food_fee: food.map(eur),
        }
    }

    #[test]
    fn twelve_rows_in_calendar_order() {
        let s = build_schedule(&amounts("1000", Some("300"), None), &PlanConfig::default());
        let names: Vec<&str> = s.rows().iter().map(|r| r.month.name()).collect();
        assert_eq!(
            names,
            vec![
                "Januar", "Februar", "März", "April", "Mai", "Juni", "Juli", "August",
                "September", "Oktober", "November", "Dezember"
            ]
        );
    }

    #[test]
    fn advertising_only_in_januar_and_juli() {
        let s = build_schedule(&amounts("1000", Some("300"), None), &PlanConfig::default());
        let with_adv: Vec<Month> = s
            .rows()
            .iter()
            .filter(|r| r.advertising.is_some())
            .map(|r| r.month)
            .collect();
        assert_eq!(with_adv, vec![Month::Januar, Month::Juli]);
    }

    #[test]
    fn zero_advertising_still_occupies_its_two_months() {
        let s = build_schedule(&amounts("1000", Some("0"), None), &PlanConfig::default());
        assert_eq!(s.rows().iter().filter(|r| r.advertising.is_some()).count(), 2);
        assert_eq!(s.rows()[0].total(), eur("1000"));
    }

    #[test]
    fn totals_add_present_amounts_exactly() {
        let s = build_schedule(
            &amounts("1234.56", Some("500.10"), Some("45.34")),
            &PlanConfig::default(),
        );
        assert_eq!(s.rows()[0].total(), eur("1780.00"));
        assert_eq!(s.rows()[1].total(), eur("1279.90"));
        assert_eq!(s.rows()[6].total(), eur("1780.00"));
        assert_eq!(s.annual_total(), eur("16359.00"));
    }

    #[test]
    fn food_fee_is_constant_across_rows() {
        let s = build_schedule(&amounts("800", Some("100"), Some("25")), &PlanConfig::default());
        assert!(s.rows().iter().all(|r| r.food_fee == Some(eur("25"))));
        assert!(s.has_food_fee());
    }

    #[test]
    fn missing_food_fee_leaves_schedule_without_one() {
        let s = build_schedule(&amounts("800", Some("100"), None), &PlanConfig::default());
        assert!(!s.has_food_fee());
        assert_eq!(s.rows()[3].total(), eur("800"));
    }

    #[test]
    fn zero_food_fee_follows_policy() {
        let a = amounts("800", Some("100"), Some("0"));

        let omitted = build_schedule(&a, &PlanConfig::default());
        assert!(!omitted.has_food_fee());

        let shown = build_schedule(
            &a,
            &PlanConfig::builder()
                .zero_food_fee(ZeroFeePolicy::Show)
                .build()
                .unwrap(),
        );
        assert!(shown.has_food_fee());
        assert_eq!(shown.rows()[5].food_fee, Some(MonetaryAmount::zero()));
    }

    #[test]
    fn zero_rent_is_allowed() {
        let s = build_schedule(&amounts("0", None, None), &PlanConfig::default());
        assert!(s.rows().iter().all(|r| r.total().is_zero()));
    }

    #[test]
    fn serialises_rows_with_total() {
        let s = build_schedule(&amounts("100", Some("50"), None), &PlanConfig::default());
        let json = serde_json::to_value(&s).unwrap();
        let first = &json["rows"][0];
        assert_eq!(first["month"], "Januar");
        assert_eq!(first["total"], "150.00");
        assert!(json["rows"][1]["advertising"].is_null());
    }
}
