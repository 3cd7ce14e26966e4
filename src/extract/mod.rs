//! Transaction extraction: tables, bank classification, line parsing and
//! normalization.

mod classify;
pub mod lines;
mod normalize;
mod tables;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub use classify::{classify, BankClassifier};
pub use lines::{extract_lines, rules_for, LineExtraction, LineRules};
pub use normalize::{clean_description, normalize_date, normalize_value, Normalizer};
pub use tables::{TableExtraction, TableExtractor};

/// Lowercase, strip accents and collapse whitespace.
///
/// Every marker and keyword comparison goes through this, so "LANÇAMENTOS"
/// and "lancamentos" compare equal.
pub fn fold_text(text: &str) -> String {
    let unaccented: String = text
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect();
    unaccented.split_whitespace().collect::<Vec<_>>().join(" ")
}
