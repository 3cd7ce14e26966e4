//! Line-oriented transaction parsing for documents without usable tables.
//!
//! Each bank gets a [`LineRules`] value describing its statement layout:
//! how a transaction line starts, what an amount looks like, which amount
//! to keep when a line carries several, and where the description sits.
//! One scan engine applies any rule set to raw page text.
//!
//! A line becomes a candidate when it starts with a date. When the same line
//! has no amount, the next line is consulted once (statements often wrap long
//! descriptions); it only counts if it does not start a transaction itself.

mod banco_brasil;
mod bradesco;
mod caixa;
mod generic;
mod itau;
mod nubank;
mod santander;

use regex::{Match, Regex};

use crate::model::{BankType, RawTransactionRow};
use crate::options::ExtractOptions;

/// Which amount to keep when a line carries more than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountPick {
    /// The first amount after the date; later ones are running balances.
    First,
    /// The last amount on the line.
    Last,
}

/// How the sign of an amount is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignStyle {
    /// Minus signs or parentheses, left for the normalizer to read.
    Inline,
    /// A trailing `C` (credit) or `D` (debit) marker; debits become negative.
    CreditDebit,
}

/// Which part of the line is the description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionSpan {
    /// Everything left after removing the date and the amount.
    Remainder,
    /// Only the text between the date and the amount.
    Between,
}

/// Layout rules for one statement format.
#[derive(Debug, Clone)]
pub struct LineRules {
    bank: BankType,
    date: &'static Regex,
    amount: &'static Regex,
    pick: AmountPick,
    sign: SignStyle,
    span: DescriptionSpan,
    /// Stripped from the start of the description (document numbers).
    prefix: Option<&'static Regex>,
    date_check: Option<fn(&str) -> bool>,
    min_line_len: usize,
}

impl LineRules {
    pub(crate) fn new(bank: BankType, date: &'static Regex, amount: &'static Regex) -> Self {
        Self {
            bank,
            date,
            amount,
            pick: AmountPick::Last,
            sign: SignStyle::Inline,
            span: DescriptionSpan::Remainder,
            prefix: None,
            date_check: None,
            min_line_len: 0,
        }
    }

    pub(crate) fn pick(mut self, pick: AmountPick) -> Self {
        self.pick = pick;
        self
    }

    pub(crate) fn sign(mut self, sign: SignStyle) -> Self {
        self.sign = sign;
        self
    }

    pub(crate) fn span(mut self, span: DescriptionSpan) -> Self {
        self.span = span;
        self
    }

    pub(crate) fn strip_prefix(mut self, prefix: &'static Regex) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Extra validation for a matched date token.
    pub(crate) fn check_date(mut self, check: fn(&str) -> bool) -> Self {
        self.date_check = Some(check);
        self
    }

    /// Skip candidate lines shorter than `len` characters.
    pub fn with_min_line_len(mut self, len: usize) -> Self {
        self.min_line_len = len;
        self
    }

    /// Bank credited on the rows these rules produce.
    pub fn bank(&self) -> BankType {
        self.bank
    }

    pub fn min_line_len(&self) -> usize {
        self.min_line_len
    }

    /// Scan `text` line by line and collect raw rows.
    pub fn scan(&self, text: &str) -> Vec<RawTransactionRow> {
        let lines: Vec<&str> = text.lines().map(str::trim).collect();
        let mut rows = Vec::new();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            let date = match self.leading_date(line) {
                Some(m) if line.chars().count() >= self.min_line_len => m,
                _ => {
                    i += 1;
                    continue;
                }
            };

            let rest = &line[date.end()..];
            if let Some(amount) = self.find_amount(rest) {
                let description = self.describe(rest, Some(amount), "", None);
                rows.push(self.row(date.as_str(), &description, amount.as_str()));
                i += 1;
                continue;
            }

            // description wrapped; the amount may sit on the next line
            let lookahead = lines
                .get(i + 1)
                .filter(|next| self.leading_date(next).is_none())
                .and_then(|next| self.find_amount(next).map(|m| (*next, m)));

            match lookahead {
                Some((next, amount)) => {
                    let description = self.describe(rest, None, next, Some(amount));
                    rows.push(self.row(date.as_str(), &description, amount.as_str()));
                    i += 2;
                }
                None => {
                    log::trace!("No amount near dated line: {}", line);
                    i += 1;
                }
            }
        }

        log::debug!("{} line rules matched {} rows", self.bank, rows.len());
        rows
    }

    fn leading_date<'t>(&self, line: &'t str) -> Option<Match<'t>> {
        let m = self.date.find(line)?;
        if m.start() != 0 {
            return None;
        }
        match self.date_check {
            Some(check) if !check(m.as_str()) => None,
            _ => Some(m),
        }
    }

    fn find_amount<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        let mut found = self.amount.find_iter(text);
        match self.pick {
            AmountPick::First => found.next(),
            AmountPick::Last => found.last(),
        }
    }

    /// Description text from the date line and, when the amount wrapped,
    /// the continuation line.
    fn describe(
        &self,
        first: &str,
        first_amount: Option<Match<'_>>,
        next: &str,
        next_amount: Option<Match<'_>>,
    ) -> String {
        let mut parts = Vec::new();
        match first_amount {
            Some(m) => self.push_around(&mut parts, first, m),
            None => parts.push(first),
        }
        if let Some(m) = next_amount {
            self.push_around(&mut parts, next, m);
        }

        let joined = parts
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        match self.prefix {
            Some(re) => re.replace(&joined, "").trim().to_string(),
            None => joined,
        }
    }

    fn push_around<'t>(&self, parts: &mut Vec<&'t str>, text: &'t str, amount: Match<'_>) {
        parts.push(&text[..amount.start()]);
        if self.span == DescriptionSpan::Remainder {
            parts.push(&text[amount.end()..]);
        }
    }

    fn row(&self, date: &str, description: &str, amount: &str) -> RawTransactionRow {
        RawTransactionRow::new(date.trim(), description, self.signed(amount))
    }

    fn signed(&self, amount: &str) -> String {
        let amount = amount.trim();
        match self.sign {
            SignStyle::Inline => amount.to_string(),
            SignStyle::CreditDebit => {
                let digits = amount.trim_end_matches(|c: char| c == 'C' || c == 'D' || c.is_whitespace());
                if amount.ends_with('D') {
                    format!("-{digits}")
                } else {
                    digits.to_string()
                }
            }
        }
    }
}

/// Rules for `bank`; unknown and generic documents share the loose rules.
pub fn rules_for(bank: BankType) -> LineRules {
    match bank {
        BankType::Nubank => nubank::rules(),
        BankType::Itau => itau::rules(),
        BankType::Bradesco => bradesco::rules(),
        BankType::BancoBrasil => banco_brasil::rules(),
        BankType::Santander => santander::rules(),
        BankType::Caixa => caixa::rules(),
        BankType::Generic | BankType::Unknown => generic::rules(),
    }
}

/// Rows found by the line parser, with the bank whose rules produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct LineExtraction {
    pub bank: BankType,
    pub rows: Vec<RawTransactionRow>,
}

/// Parse `text` with the rules for `bank`.
pub fn extract_lines(text: &str, bank: BankType, options: &ExtractOptions) -> LineExtraction {
    let mut rules = rules_for(bank);
    if rules.bank() == BankType::Generic {
        rules = rules.with_min_line_len(options.min_generic_line_len);
    }
    LineExtraction {
        bank: rules.bank(),
        rows: rules.scan(text),
    }
}
