//! Data model for statement extraction.
//!
//! Two halves: the structural representation a PDF is rendered into
//! (pages holding paragraph and table blocks), and the statement types the
//! pipeline emits (transactions, bank tags, results).

mod document;
mod page;
mod paragraph;
mod table;
mod transaction;

pub use document::{Document, Metadata};
pub use page::{Block, Page};
pub use paragraph::Paragraph;
pub use table::{Table, TableCell, TableRow};
pub use transaction::{
    BankType, DropReason, ExtractionResult, ExtractionStats, JsonFormat, RawTransactionRow,
    RowOutcome, Transaction,
};
