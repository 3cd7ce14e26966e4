//! Bradesco statements: `DD/MM/YYYY  HISTÓRICO  DOCTO  VALOR  SALDO`.
//!
//! The amount is the first money token after the date; the running balance
//! that follows it is dropped.

use std::sync::OnceLock;

use regex::Regex;

use super::{AmountPick, DescriptionSpan, LineRules};
use crate::model::BankType;

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{2}/\d{2}/\d{4}\b").expect("valid bradesco date regex"))
}

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"-?\b\d{1,3}(?:\.\d{3})*,\d{2}\b-?").expect("valid bradesco amount regex")
    })
}

pub(super) fn rules() -> LineRules {
    LineRules::new(BankType::Bradesco, date_re(), amount_re())
        .pick(AmountPick::First)
        .span(DescriptionSpan::Between)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance_is_dropped() {
        let rows = rules().scan("02/01/2024 TRANSFERENCIA PIX 0012345 -250,00 1.749,10");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "TRANSFERENCIA PIX 0012345");
        assert_eq!(rows[0].value, "-250,00");
    }

    #[test]
    fn test_short_dates_are_not_transactions() {
        assert!(rules().scan("02/01 SALDO ANTERIOR 1.999,10").is_empty());
    }
}
