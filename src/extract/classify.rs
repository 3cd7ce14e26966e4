//! Issuing-bank detection from document text.

use crate::model::BankType;

use super::fold_text;

/// Keyword sets in match order; the first bank with a hit wins.
///
/// Keywords are stored already folded (lowercase, unaccented).
const DEFAULT_KEYWORDS: &[(BankType, &[&str])] = &[
    (BankType::Nubank, &["nubank", "nu pagamentos"]),
    (BankType::Itau, &["itau"]),
    (BankType::Bradesco, &["bradesco"]),
    (BankType::BancoBrasil, &["banco do brasil", "bb.com.br"]),
    (BankType::Santander, &["santander"]),
    (BankType::Caixa, &["caixa economica", "caixa.gov.br"]),
];

/// Ordered keyword classifier.
#[derive(Debug, Clone)]
pub struct BankClassifier {
    rules: Vec<(BankType, Vec<String>)>,
}

impl BankClassifier {
    /// Classifier with the built-in keyword table.
    pub fn new() -> Self {
        Self {
            rules: DEFAULT_KEYWORDS
                .iter()
                .map(|(bank, words)| (*bank, words.iter().map(|w| w.to_string()).collect()))
                .collect(),
        }
    }

    /// Append a keyword set, checked after every existing one.
    pub fn with_rule<S: AsRef<str>>(mut self, bank: BankType, keywords: impl IntoIterator<Item = S>) -> Self {
        let words = keywords.into_iter().map(|k| fold_text(k.as_ref())).collect();
        self.rules.push((bank, words));
        self
    }

    /// First bank whose keywords occur in `text`, or [`BankType::Unknown`].
    pub fn classify(&self, text: &str) -> BankType {
        let folded = fold_text(text);
        let bank = self
            .rules
            .iter()
            .find(|(_, words)| words.iter().any(|w| folded.contains(w.as_str())))
            .map(|(bank, _)| *bank)
            .unwrap_or(BankType::Unknown);
        log::debug!("Classified document as {}", bank);
        bank
    }
}

impl Default for BankClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Classify with the built-in keyword table.
pub fn classify(text: &str) -> BankType {
    BankClassifier::new().classify(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_keywords() {
        assert_eq!(classify("FATURA NUBANK"), BankType::Nubank);
        assert_eq!(classify("fatura nubank"), BankType::Nubank);
        assert_eq!(classify("Nu Pagamentos S.A."), BankType::Nubank);
    }

    #[test]
    fn test_accents_are_ignored() {
        assert_eq!(classify("Itaú Unibanco S.A."), BankType::Itau);
        assert_eq!(classify("CAIXA ECONÔMICA FEDERAL"), BankType::Caixa);
    }

    #[test]
    fn test_each_bank() {
        assert_eq!(classify("Banco Bradesco S.A."), BankType::Bradesco);
        assert_eq!(classify("Banco do Brasil - extrato"), BankType::BancoBrasil);
        assert_eq!(classify("acesse bb.com.br"), BankType::BancoBrasil);
        assert_eq!(classify("Santander Brasil"), BankType::Santander);
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(
            classify("Pagamento Bradesco via Nubank"),
            BankType::Nubank
        );
    }

    #[test]
    fn test_no_keyword_is_unknown() {
        assert_eq!(classify("23/12/2024 SUPERMERCADO BRASIL R$ 45,90"), BankType::Unknown);
        assert_eq!(classify(""), BankType::Unknown);
    }

    #[test]
    fn test_custom_rule() {
        let classifier = BankClassifier::new().with_rule(BankType::Generic, ["Banco Inter"]);
        assert_eq!(classifier.classify("BANCO INTER S.A."), BankType::Generic);
    }
}
