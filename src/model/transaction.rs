//! Statement-level types: bank tags, transactions and extraction results.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Issuing institution of a statement.
///
/// Derived per extraction from the document text; `Generic` tags rows
/// produced by the fallback line parser, `Unknown` is what the classifier
/// reports when no institution keyword is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankType {
    Nubank,
    Itau,
    Bradesco,
    BancoBrasil,
    Santander,
    Caixa,
    Generic,
    Unknown,
}

impl BankType {
    /// Every institution with dedicated parsing rules.
    pub const KNOWN: [BankType; 6] = [
        BankType::Nubank,
        BankType::Itau,
        BankType::Bradesco,
        BankType::BancoBrasil,
        BankType::Santander,
        BankType::Caixa,
    ];

    /// Stable tag, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            BankType::Nubank => "nubank",
            BankType::Itau => "itau",
            BankType::Bradesco => "bradesco",
            BankType::BancoBrasil => "banco_brasil",
            BankType::Santander => "santander",
            BankType::Caixa => "caixa",
            BankType::Generic => "generic",
            BankType::Unknown => "unknown",
        }
    }

    /// Whether this tag names a concrete institution.
    pub fn is_known(&self) -> bool {
        !matches!(self, BankType::Generic | BankType::Unknown)
    }
}

impl fmt::Display for BankType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `(date, description, value)` triple as found in the document, before
/// normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTransactionRow {
    pub date: String,
    pub description: String,
    pub value: String,
}

impl RawTransactionRow {
    pub fn new(
        date: impl Into<String>,
        description: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            description: description.into(),
            value: value.into(),
        }
    }
}

/// A normalized transaction, the pipeline's output unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// ISO-8601 or the statement's own `DD/MM/YYYY` shape
    pub date: String,

    /// Cleaned description, never empty
    pub description: String,

    /// Signed decimal with exactly two fraction digits
    pub value: String,

    pub bank: BankType,

    /// Statement total the row belongs to, when the document states one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<String>,
}

/// Why a raw row was not emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Nothing was left of the description after cleaning.
    EmptyDescription,
}

/// What normalization made of one raw row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// Every field normalized cleanly.
    Parsed(Transaction),
    /// Emitted, but the value was unparsable and defaulted to `0.00`.
    Defaulted {
        transaction: Transaction,
        raw_value: String,
    },
    /// Not emitted.
    Dropped(DropReason),
}

impl RowOutcome {
    /// The emitted transaction, if any.
    pub fn transaction(&self) -> Option<&Transaction> {
        match self {
            RowOutcome::Parsed(t) | RowOutcome::Defaulted { transaction: t, .. } => Some(t),
            RowOutcome::Dropped(_) => None,
        }
    }

    pub fn into_transaction(self) -> Option<Transaction> {
        match self {
            RowOutcome::Parsed(t) | RowOutcome::Defaulted { transaction: t, .. } => Some(t),
            RowOutcome::Dropped(_) => None,
        }
    }
}

/// Row-level counters for one extraction run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Rows emitted with every field parsed
    pub parsed: u32,

    /// Rows emitted with a defaulted value
    pub defaulted: u32,

    /// Rows dropped for an empty description
    pub dropped: u32,

    /// Tables accepted by the table strategy (0 for the line strategy)
    pub tables_accepted: u32,
}

impl ExtractionStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one row outcome.
    pub fn record(&mut self, outcome: &RowOutcome) {
        match outcome {
            RowOutcome::Parsed(_) => self.parsed += 1,
            RowOutcome::Defaulted { .. } => self.defaulted += 1,
            RowOutcome::Dropped(_) => self.dropped += 1,
        }
    }

    /// Total rows seen by the normalizer.
    pub fn rows_seen(&self) -> u32 {
        self.parsed + self.defaulted + self.dropped
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &ExtractionStats) {
        self.parsed += other.parsed;
        self.defaulted += other.defaulted;
        self.dropped += other.dropped;
        self.tables_accepted += other.tables_accepted;
    }
}

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Everything one pipeline run hands to its caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub bank_type: BankType,
    pub transactions: Vec<Transaction>,
    pub transaction_count: usize,

    /// Leading characters of the raw text, for diagnostics
    pub text_sample: String,

    /// Normalized statement total, when the document states one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<String>,

    #[serde(default)]
    pub stats: ExtractionStats,
}

impl ExtractionResult {
    /// Assemble a result from row outcomes, keeping emitted rows in order.
    pub fn from_outcomes(
        bank_type: BankType,
        outcomes: impl IntoIterator<Item = RowOutcome>,
        raw_text: &str,
        sample_len: usize,
    ) -> Self {
        let mut stats = ExtractionStats::new();
        let mut transactions = Vec::new();
        for outcome in outcomes {
            stats.record(&outcome);
            if let Some(t) = outcome.into_transaction() {
                transactions.push(t);
            }
        }

        Self {
            bank_type,
            transaction_count: transactions.len(),
            transactions,
            text_sample: text_sample(raw_text, sample_len),
            total_amount: None,
            stats,
        }
    }

    /// Check if no transaction was emitted.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Serialize to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        let result = match format {
            JsonFormat::Pretty => serde_json::to_string_pretty(self),
            JsonFormat::Compact => serde_json::to_string(self),
        };

        result.map_err(|e| Error::Serialization(e.to_string()))
    }
}

/// First `max_chars` characters of `text`, or all of it when shorter.
pub(crate) fn text_sample(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
