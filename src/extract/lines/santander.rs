//! Santander statements: signed amounts after the description, then the
//! balance.

use std::sync::OnceLock;

use regex::Regex;

use super::{AmountPick, DescriptionSpan, LineRules};
use crate::model::BankType;

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{2}/\d{2}(?:/\d{4})?\b").expect("valid santander date regex"))
}

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"-?\b\d{1,3}(?:\.\d{3})*,\d{2}\b-?").expect("valid santander amount regex")
    })
}

pub(super) fn rules() -> LineRules {
    LineRules::new(BankType::Santander, date_re(), amount_re())
        .pick(AmountPick::First)
        .span(DescriptionSpan::Between)
}
