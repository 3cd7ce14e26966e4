//! Fallback rules for statements from unrecognised issuers.
//!
//! Looser date and amount shapes, the last amount on the line wins, and
//! short lines are skipped to keep headers and footers out.

use std::sync::OnceLock;

use regex::Regex;

use super::LineRules;
use crate::model::BankType;

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d{1,2}/\d{1,2}(?:/(?:\d{4}|\d{2}))?\b").expect("valid generic date regex")
    })
}

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\(?-?(?:(?:R|US)\$\s*)?-?\b\d{1,3}(?:[.,]?\d{3})*[.,]\d{2}\b\)?-?")
            .expect("valid generic amount regex")
    })
}

pub(super) fn rules() -> LineRules {
    LineRules::new(BankType::Generic, date_re(), amount_re()).with_min_line_len(10)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawTransactionRow;

    #[test]
    fn test_last_amount_wins() {
        let rows = rules().scan("10/01/24 COMPRA PARC 02/03 1.200,00 400,00");
        assert_eq!(rows, vec![RawTransactionRow::new("10/01/24", "COMPRA PARC 02/03 1.200,00", "400,00")]);
    }

    #[test]
    fn test_dot_decimal_and_parentheses() {
        let rows = rules().scan("3/1 REFUND AMAZON (12.99)");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, "(12.99)");
    }
}
