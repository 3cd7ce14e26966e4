//! Caixa statements: a document number follows the date and amounts carry a
//! `C`/`D` marker, `05/02/2024 000123 PAG BOLETO 89,90 D`.

use std::sync::OnceLock;

use regex::Regex;

use super::{AmountPick, DescriptionSpan, LineRules, SignStyle};
use crate::model::BankType;

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{2}/\d{2}/\d{4}\b").expect("valid caixa date regex"))
}

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b\d{1,3}(?:\.\d{3})*,\d{2}\s?[CD]\b").expect("valid caixa amount regex")
    })
}

fn document_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{3,}\s+").expect("valid caixa document number regex"))
}

pub(super) fn rules() -> LineRules {
    LineRules::new(BankType::Caixa, date_re(), amount_re())
        .pick(AmountPick::First)
        .sign(SignStyle::CreditDebit)
        .span(DescriptionSpan::Between)
        .strip_prefix(document_number_re())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawTransactionRow;

    #[test]
    fn test_document_number_is_dropped() {
        let text = "05/02/2024 000123 PAG BOLETO 89,90 D 1.010,10 C\n06/02/2024 000124 CRED PIX 300,00 C 1.310,10 C";
        assert_eq!(
            rules().scan(text),
            vec![
                RawTransactionRow::new("05/02/2024", "PAG BOLETO", "-89,90"),
                RawTransactionRow::new("06/02/2024", "CRED PIX", "300,00"),
            ]
        );
    }

    #[test]
    fn test_amount_on_continuation_line() {
        let rows = rules().scan("05/02/2024 000125 PAG CONTA LUZ\nCOPEL 120,00 D");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "PAG CONTA LUZ COPEL");
        assert_eq!(rows[0].value, "-120,00");
    }
}
