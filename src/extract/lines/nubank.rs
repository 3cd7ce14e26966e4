//! Nubank card invoices: `15 JAN  Uber *Trip  23,45`.

use std::sync::OnceLock;

use regex::Regex;

use super::LineRules;
use crate::extract::fold_text;
use crate::extract::normalize::month_number;
use crate::model::BankType;

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d{2}(?:/\d{2}(?:/\d{4})?|\s+[A-Za-z]{3})\b").expect("valid nubank date regex")
    })
}

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"-?(?:R\$\s*)?-?\b\d{1,3}(?:\.\d{3})*,\d{2}\b").expect("valid nubank amount regex")
    })
}

/// `15 XYZ` only counts when `XYZ` is a month.
fn is_date(token: &str) -> bool {
    match token.split_whitespace().nth(1) {
        Some(month) => month_number(&fold_text(month)).is_some(),
        None => true,
    }
}

pub(super) fn rules() -> LineRules {
    LineRules::new(BankType::Nubank, date_re(), amount_re()).check_date(is_date)
}
