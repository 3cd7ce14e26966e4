//! Itaú statements: debits carry a trailing minus, `05/01 PADARIA 12,50-`.

use std::sync::OnceLock;

use regex::Regex;

use super::LineRules;
use crate::model::BankType;

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{2}/\d{2}(?:/\d{4})?\b").expect("valid itau date regex"))
}

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"-?\b\d{1,3}(?:\.\d{3})*,\d{2}\b-?").expect("valid itau amount regex")
    })
}

pub(super) fn rules() -> LineRules {
    LineRules::new(BankType::Itau, date_re(), amount_re())
}
