//! Canonical descriptions, values and dates.
//!
//! Normalization never fails: an unparsable value becomes `0.00` and an empty
//! description drops the row. Both outcomes are reported as [`RowOutcome`]
//! variants so callers can count them.

use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::model::{BankType, DropReason, RawTransactionRow, RowOutcome, Transaction};
use crate::options::ExtractOptions;

use super::fold_text;

/// Connector words removed from long descriptions.
const STOPWORDS: &[&str] = &[
    "de", "da", "do", "das", "dos", "e", "a", "o", "as", "os", "em", "na", "no", "nas", "nos",
    "para", "por", "com",
];

/// Stopwords are only removed when at least this many tokens survive.
const MIN_TOKENS_AFTER_STOPWORDS: usize = 4;

const PT_MONTHS: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

fn noise_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w\s\-.]").expect("valid noise regex"))
}

fn numeric_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})[/.\-](\d{1,2})(?:[/.\-](\d{4}|\d{2}))?$")
            .expect("valid numeric date regex")
    })
}

fn iso_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("valid iso date regex"))
}

fn month_name_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})\s*(?:de\s+)?([a-z]{3})[a-z]*\.?(?:\s*(?:de\s+|/)?(\d{4}))?$")
            .expect("valid month-name date regex")
    })
}

/// Parse a locale-formatted amount into a two-digit decimal string.
///
/// Parentheses, a leading or trailing minus, or any minus sign inside the
/// token make the value negative. With both `.` and `,` present the last one
/// is the decimal separator. A lone `.` is decimal. A lone `,` is decimal
/// only before exactly two digits and grouping otherwise, so `1,234` reads
/// as `1234.00`. A repeated separator groups thousands unless its last
/// occurrence is followed by exactly two digits.
///
/// Returns `None` when no number can be read.
pub fn normalize_value(raw: &str) -> Option<String> {
    parse_decimal(raw).map(|d| d.to_string())
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let s = raw.trim();
    let negative = (s.starts_with('(') && s.ends_with(')')) || s.contains(['-', '\u{2212}']);

    let body: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    // Sentence punctuation around the number
    let body = body.trim_matches(|c| c == '.' || c == ',');
    if !body.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let decimal_pos = match (body.rfind('.'), body.rfind(',')) {
        (Some(dot), Some(comma)) => Some(dot.max(comma)),
        (Some(pos), None) | (None, Some(pos)) => {
            let sep = body.as_bytes()[pos] as char;
            let repeated = body.matches(sep).count() > 1;
            let tail = &body[pos + 1..];
            let cents = tail.len() == 2 && tail.chars().all(|c| c.is_ascii_digit());
            // A comma only marks decimals before exactly two digits; a lone dot always does
            if cents || (sep == '.' && !repeated) {
                Some(pos)
            } else {
                None
            }
        }
        (None, None) => None,
    };

    let mut canonical = String::with_capacity(body.len() + 1);
    for (i, c) in body.char_indices() {
        if c.is_ascii_digit() {
            canonical.push(c);
        } else if Some(i) == decimal_pos {
            canonical.push('.');
        }
    }
    if canonical.starts_with('.') {
        canonical.insert(0, '0');
    }
    if canonical.ends_with('.') {
        canonical.pop();
    }

    let mut value = Decimal::from_str(&canonical).ok()?;
    value = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    value.rescale(2);
    value.set_sign_negative(negative && !value.is_zero());
    Some(value)
}

/// Strip noise characters, collapse whitespace and drop connector words
/// from descriptions long enough to afford it.
pub fn clean_description(raw: &str) -> String {
    let stripped = noise_re().replace_all(raw, " ");
    let tokens: Vec<&str> = stripped
        .split_whitespace()
        .filter(|t| t.chars().any(|c| c.is_alphanumeric()))
        .collect();

    let kept: Vec<&str> = tokens
        .iter()
        .copied()
        .filter(|t| !STOPWORDS.contains(&fold_text(t).as_str()))
        .collect();

    if kept.len() >= MIN_TOKENS_AFTER_STOPWORDS {
        kept.join(" ")
    } else {
        tokens.join(" ")
    }
}

/// Canonicalize a statement date.
///
/// Recognized shapes are `DD/MM[/YY[YY]]` (also with `-` or `.`),
/// `YYYY-MM-DD` and `DD MMM [YYYY]` with Portuguese month names. Missing
/// years take `reference_year`. The result is `YYYY-MM-DD` when `iso` is
/// set and the date exists, `DD/MM/YYYY` otherwise. Anything unrecognized
/// comes back trimmed but untouched.
pub fn normalize_date(raw: &str, reference_year: i32, iso: bool) -> String {
    let trimmed = raw.trim();
    match parse_date_parts(trimmed, reference_year) {
        Some((day, month, year)) => {
            if iso {
                if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                    return date.format("%Y-%m-%d").to_string();
                }
            }
            format!("{day:02}/{month:02}/{year:04}")
        }
        None => trimmed.to_string(),
    }
}

fn parse_date_parts(s: &str, reference_year: i32) -> Option<(u32, u32, i32)> {
    if let Some(caps) = iso_date_re().captures(s) {
        return Some((caps[3].parse().ok()?, caps[2].parse().ok()?, caps[1].parse().ok()?));
    }

    if let Some(caps) = numeric_date_re().captures(s) {
        let year = match caps.get(3) {
            Some(y) if y.as_str().len() == 2 => 2000 + y.as_str().parse::<i32>().ok()?,
            Some(y) => y.as_str().parse().ok()?,
            None => reference_year,
        };
        return Some((caps[1].parse().ok()?, caps[2].parse().ok()?, year));
    }

    let folded = fold_text(s);
    let caps = month_name_date_re().captures(&folded)?;
    let month = month_number(&caps[2])?;
    let year = match caps.get(3) {
        Some(y) => y.as_str().parse().ok()?,
        None => reference_year,
    };
    Some((caps[1].parse().ok()?, month, year))
}

/// 1-based month for a Portuguese abbreviation (`jan`..`dez`).
pub(crate) fn month_number(abbrev: &str) -> Option<u32> {
    let abbrev = abbrev.get(..3)?;
    PT_MONTHS
        .iter()
        .position(|m| *m == abbrev)
        .map(|i| i as u32 + 1)
}

/// Whether a cell reads as a money amount (`1.234,56`, `R$ 12,00`, `(5,00)`).
pub(crate) fn looks_like_amount(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"^\(?-?\s*(?:R\$|US\$)?\s*-?\d{1,3}(?:[.,\s]?\d{3})*[.,]\d{2}\)?\s*[-CD]?$")
            .expect("valid amount regex")
    });
    re.is_match(text.trim())
}

/// Whether a cell reads as a date in any shape [`normalize_date`] accepts.
pub(crate) fn looks_like_date(text: &str) -> bool {
    parse_date_parts(text.trim(), 2000).is_some_and(|(d, m, _)| (1..=31).contains(&d) && (1..=12).contains(&m))
}

/// Turns raw rows into transactions.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    reference_year: i32,
    iso_dates: bool,
}

impl Normalizer {
    pub fn new(reference_year: i32, iso_dates: bool) -> Self {
        Self {
            reference_year,
            iso_dates,
        }
    }

    pub fn from_options(options: &ExtractOptions) -> Self {
        Self::new(options.effective_year(), options.iso_dates)
    }

    /// Normalize one raw row for `bank`, attaching the statement total if known.
    pub fn normalize(
        &self,
        row: &RawTransactionRow,
        bank: BankType,
        total_amount: Option<&str>,
    ) -> RowOutcome {
        let description = clean_description(&row.description);
        if description.is_empty() {
            log::warn!("Dropping row dated {:?}: empty description", row.date);
            return RowOutcome::Dropped(DropReason::EmptyDescription);
        }

        let date = normalize_date(&row.date, self.reference_year, self.iso_dates);
        let total_amount = total_amount.map(str::to_string);

        match normalize_value(&row.value) {
            Some(value) => RowOutcome::Parsed(Transaction {
                date,
                description,
                value,
                bank,
                total_amount,
            }),
            None => {
                log::warn!(
                    "Unparsable value {:?} for {:?}, defaulting to 0.00",
                    row.value,
                    description
                );
                RowOutcome::Defaulted {
                    transaction: Transaction {
                        date,
                        description,
                        value: "0.00".to_string(),
                        bank,
                        total_amount,
                    },
                    raw_value: row.value.clone(),
                }
            }
        }
    }
}
