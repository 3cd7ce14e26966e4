//! Structural conversion of PDF pages.

mod converter;
mod layout;
mod table_detector;

pub use converter::StructuralConverter;
pub use layout::{group_into_lines, SpanExtractor, TextLine, TextSpan};
pub use table_detector::{DetectedTable, TableDetector, TableDetectorConfig, TableRowData};
