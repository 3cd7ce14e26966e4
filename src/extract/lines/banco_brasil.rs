//! Banco do Brasil statements: amounts end in `C` or `D`, followed by the
//! balance, `10/01/2024 Pix - Enviado 150,00 D 849,90 C`.

use std::sync::OnceLock;

use regex::Regex;

use super::{AmountPick, DescriptionSpan, LineRules, SignStyle};
use crate::model::BankType;

fn date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{2}/\d{2}/\d{4}\b").expect("valid banco do brasil date regex"))
}

fn amount_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b\d{1,3}(?:\.\d{3})*,\d{2}\s?[CD]\b").expect("valid banco do brasil amount regex")
    })
}

pub(super) fn rules() -> LineRules {
    LineRules::new(BankType::BancoBrasil, date_re(), amount_re())
        .pick(AmountPick::First)
        .sign(SignStyle::CreditDebit)
        .span(DescriptionSpan::Between)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawTransactionRow;

    #[test]
    fn test_debit_marker_becomes_minus() {
        let text = "10/01/2024 Pix - Enviado 150,00 D 849,90 C\n11/01/2024 Pix - Recebido 1.000,00 C 1.849,90 C";
        assert_eq!(
            rules().scan(text),
            vec![
                RawTransactionRow::new("10/01/2024", "Pix - Enviado", "-150,00"),
                RawTransactionRow::new("11/01/2024", "Pix - Recebido", "1.000,00"),
            ]
        );
    }

    #[test]
    fn test_amount_without_marker_is_ignored() {
        assert!(rules().scan("10/01/2024 Saldo Anterior 1.000,00").is_empty());
    }
}
