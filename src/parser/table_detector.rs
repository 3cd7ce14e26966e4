//! Table detection from text positions (stream mode).
//!
//! Statement PDFs rarely draw ruling lines around their transaction lists,
//! so tables are found from alignment alone: spans are grouped into rows by
//! baseline, column edges are the left edges shared by enough rows, and a
//! table is a contiguous run of rows that line up with those edges.

use std::collections::{HashMap, HashSet};

use crate::model::{Table, TableCell, TableRow};

use super::layout::TextSpan;

/// Width of the buckets left edges are snapped to, in points.
const EDGE_BUCKET: f32 = 5.0;
/// Distance within which a span counts as aligned with a column edge.
const ALIGN_TOLERANCE: f32 = 5.0;

/// A detected table region with its content.
#[derive(Debug, Clone)]
pub struct DetectedTable {
    /// Baseline of the first row (PDF coords, larger is higher)
    pub top_y: f32,
    /// Baseline of the last row
    pub bottom_y: f32,
    /// Right X boundary
    pub right_x: f32,
    /// Column left edges, ascending
    pub columns: Vec<f32>,
    /// Rows of spans, top to bottom
    pub rows: Vec<TableRowData>,
}

/// A row of text spans in a table.
#[derive(Debug, Clone)]
pub struct TableRowData {
    /// Y position of this row
    pub y: f32,
    /// Spans in this row, sorted by X
    pub spans: Vec<TextSpan>,
}

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Y tolerance for grouping spans into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum column alignment ratio (0.0-1.0)
    pub min_alignment_ratio: f32,
    /// Minimum gap between columns (points)
    pub min_column_gap: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 8,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
        }
    }
}

/// Detects tables in a list of text spans.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect tables in the given spans.
    ///
    /// Returns detected tables and the spans that were NOT part of tables.
    pub fn detect(&self, spans: Vec<TextSpan>) -> (Vec<DetectedTable>, Vec<TextSpan>) {
        let cfg = &self.config;
        if spans.len() < cfg.min_rows * cfg.min_columns {
            log::debug!("TableDetector: too few spans ({})", spans.len());
            return (vec![], spans);
        }

        let rows = self.group_into_rows(&spans);
        if rows.len() < cfg.min_rows {
            return (vec![], spans);
        }

        let columns = self.detect_columns(&rows);
        log::debug!(
            "TableDetector: {} rows, column edges {:?}",
            rows.len(),
            columns
        );
        if columns.len() < cfg.min_columns {
            return (vec![], spans);
        }

        let mut tables = Vec::new();
        let mut used: HashSet<usize> = HashSet::new();

        for (start, end) in self.find_table_regions(&rows, &columns) {
            let table_rows = rows[start..=end].to_vec();

            // Columns of this region alone
            let table_columns = self.detect_columns(&table_rows);
            if table_columns.len() < cfg.min_columns {
                continue;
            }
            if table_columns.len() > cfg.max_columns {
                log::debug!(
                    "TableDetector: skipping region, too many columns ({})",
                    table_columns.len()
                );
                continue;
            }
            if self.is_list_pattern(&table_rows, &table_columns) {
                log::debug!("TableDetector: skipping region, looks like a list");
                continue;
            }

            for row in &table_rows {
                for span in &row.spans {
                    if let Some(i) = spans.iter().enumerate().position(|(i, orig)| {
                        !used.contains(&i) && same_span(orig, span)
                    }) {
                        used.insert(i);
                    }
                }
            }

            let right_x = table_rows
                .iter()
                .flat_map(|r| r.spans.iter())
                .map(|s| s.x + s.width)
                .fold(f32::MIN, f32::max);

            tables.push(DetectedTable {
                top_y: table_rows[0].y,
                bottom_y: table_rows[table_rows.len() - 1].y,
                right_x,
                columns: table_columns,
                rows: table_rows,
            });
        }

        let remaining = spans
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !used.contains(i))
            .map(|(_, span)| span)
            .collect();

        (tables, remaining)
    }

    /// Group spans into rows by Y position, top to bottom.
    fn group_into_rows(&self, spans: &[TextSpan]) -> Vec<TableRowData> {
        let mut sorted = spans.to_vec();
        sorted.sort_by(|a, b| {
            b.y.partial_cmp(&a.y)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
        });

        let mut rows: Vec<TableRowData> = Vec::new();
        let mut current: Vec<TextSpan> = Vec::new();
        let mut current_y: Option<f32> = None;

        for span in sorted {
            let tolerance = span.font_size * self.config.y_tolerance_factor;
            match current_y {
                Some(y) if (span.y - y).abs() <= tolerance => current.push(span),
                _ => {
                    if !current.is_empty() {
                        rows.push(make_row(std::mem::take(&mut current)));
                    }
                    current_y = Some(span.y);
                    current.push(span);
                }
            }
        }
        if !current.is_empty() {
            rows.push(make_row(current));
        }

        rows
    }

    /// Column edges: left-edge buckets shared by enough rows.
    ///
    /// Only rows with two or more spans vote when there are enough of them;
    /// otherwise every span votes.
    fn detect_columns(&self, rows: &[TableRowData]) -> Vec<f32> {
        let multi: Vec<&TableRowData> = rows.iter().filter(|r| r.spans.len() >= 2).collect();
        let voters: Vec<&TableRowData> = if multi.len() >= self.config.min_rows {
            multi
        } else {
            rows.iter().collect()
        };
        if voters.is_empty() {
            return vec![];
        }

        let mut edge_counts: HashMap<i32, usize> = HashMap::new();
        for row in &voters {
            let buckets: HashSet<i32> = row
                .spans
                .iter()
                .map(|s| (s.x / EDGE_BUCKET).round() as i32)
                .collect();
            for bucket in buckets {
                *edge_counts.entry(bucket).or_insert(0) += 1;
            }
        }

        let min_occurrences =
            ((voters.len() as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut edges: Vec<f32> = edge_counts
            .into_iter()
            .filter(|(_, count)| *count >= min_occurrences)
            .map(|(bucket, _)| bucket as f32 * EDGE_BUCKET)
            .collect();
        edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mut merged: Vec<f32> = Vec::new();
        for edge in edges {
            match merged.last() {
                Some(last) if edge - last < self.config.min_column_gap => {}
                _ => merged.push(edge),
            }
        }
        merged
    }

    /// Contiguous runs of aligned rows, as inclusive index ranges.
    fn find_table_regions(&self, rows: &[TableRowData], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            if alignment_score(row, columns) >= self.config.min_alignment_ratio {
                start.get_or_insert(i);
                continue;
            }
            if let Some(s) = start.take() {
                if i - s >= self.config.min_rows {
                    regions.push((s, i - 1));
                }
            }
        }
        if let Some(s) = start {
            if rows.len() - s >= self.config.min_rows {
                regions.push((s, rows.len() - 1));
            }
        }

        regions
    }

    /// Convert a detected table to the model type; the first row becomes the header.
    pub fn to_table(&self, detected: &DetectedTable) -> Table {
        let columns = &detected.columns;
        let mut table = Table::with_header(if detected.rows.len() > 1 { 1 } else { 0 });

        for (row_idx, row_data) in detected.rows.iter().enumerate() {
            let mut contents: Vec<Vec<&str>> = vec![Vec::new(); columns.len()];
            for span in &row_data.spans {
                let col = find_column_for_span(span.x, columns, detected.right_x);
                if let Some(cell) = contents.get_mut(col) {
                    cell.push(span.text.trim());
                }
            }

            let cells = contents
                .into_iter()
                .map(|parts| TableCell::text(parts.join(" ")))
                .collect();
            table.add_row(if row_idx == 0 && table.header_rows > 0 {
                TableRow::header(cells)
            } else {
                TableRow::new(cells)
            });
        }

        let widths = columns
            .iter()
            .enumerate()
            .map(|(i, &left)| columns.get(i + 1).copied().unwrap_or(detected.right_x) - left)
            .collect();
        table.column_widths = Some(widths);

        table
    }

    /// Whether the region is really a bulleted or numbered list.
    fn is_list_pattern(&self, rows: &[TableRowData], columns: &[f32]) -> bool {
        if columns.len() < 2 || rows.is_empty() {
            return false;
        }

        let (mut bullets, mut numbers) = (0usize, 0usize);
        for row in rows {
            // Rows are sorted by X, so the first span is the leftmost
            if let Some(first) = row.spans.first() {
                let text = first.text.trim();
                if is_bullet_marker(text) {
                    bullets += 1;
                } else if is_number_marker(text) {
                    numbers += 1;
                }
            }
        }

        let total = rows.len() as f32;
        if bullets as f32 / total >= 0.5 {
            return true;
        }
        // Numbered first columns only disqualify two-column regions
        columns.len() == 2 && (bullets + numbers) as f32 / total >= 0.5
    }
}

fn make_row(spans: Vec<TextSpan>) -> TableRowData {
    let y = spans.iter().map(|s| s.y).sum::<f32>() / spans.len() as f32;
    TableRowData { y, spans }
}

fn same_span(a: &TextSpan, b: &TextSpan) -> bool {
    (a.x - b.x).abs() < 0.1 && (a.y - b.y).abs() < 0.1 && a.text == b.text
}

/// Fraction of a row's spans that start on a column edge.
fn alignment_score(row: &TableRowData, columns: &[f32]) -> f32 {
    if row.spans.is_empty() || columns.is_empty() {
        return 0.0;
    }
    let aligned = row
        .spans
        .iter()
        .filter(|s| columns.iter().any(|c| (s.x - c).abs() <= ALIGN_TOLERANCE))
        .count();
    aligned as f32 / row.spans.len() as f32
}

/// Column index for a span's left edge; spans up to 10pt early still count.
fn find_column_for_span(x: f32, columns: &[f32], right_x: f32) -> usize {
    for (i, &start) in columns.iter().enumerate() {
        let end = columns.get(i + 1).copied().unwrap_or(right_x + 100.0);
        if x >= start - 10.0 && x < end - 10.0 {
            return i;
        }
    }

    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (x - **a)
                .abs()
                .partial_cmp(&(x - **b).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn is_bullet_marker(text: &str) -> bool {
    matches!(text, "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "►" | "■" | "●")
}

/// `1.`, `12)`, bare numbers and single-letter markers like `a.`.
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }

    if let Some(pos) = cleaned.find(|c: char| !c.is_ascii_digit()) {
        let suffix = &cleaned[pos..];
        if pos > 0 && (suffix == "." || suffix == ")") {
            return true;
        }
    } else {
        return true;
    }

    let chars: Vec<char> = cleaned.chars().collect();
    chars.len() == 2 && chars[0].is_alphabetic() && (chars[1] == '.' || chars[1] == ')')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_span(text: &str, x: f32, y: f32) -> TextSpan {
        TextSpan {
            text: text.to_string(),
            x,
            y,
            width: text.len() as f32 * 6.0,
            font_size: 10.0,
            font_name: "Helvetica".to_string(),
        }
    }

    fn statement_spans() -> Vec<TextSpan> {
        vec![
            make_span("DATA", 50.0, 700.0),
            make_span("ESTABELECIMENTO", 150.0, 700.0),
            make_span("VALOR", 400.0, 700.0),
            make_span("10/01/2024", 50.0, 685.0),
            make_span("PADARIA REAL", 150.0, 685.0),
            make_span("12,00", 400.0, 685.0),
            make_span("11/01/2024", 50.0, 670.0),
            make_span("FARMACIA", 150.0, 670.0),
            make_span("30,50", 400.0, 670.0),
        ]
    }

    #[test]
    fn test_group_into_rows() {
        let detector = TableDetector::new();
        let rows = detector.group_into_rows(&statement_spans());
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.spans.len() == 3));
        assert_eq!(rows[0].spans[0].text, "DATA");
    }

    #[test]
    fn test_detect_statement_table() {
        let detector = TableDetector::new();
        let (tables, remaining) = detector.detect(statement_spans());
        assert_eq!(tables.len(), 1);
        assert!(remaining.is_empty());
        assert_eq!(tables[0].columns, vec![50.0, 150.0, 400.0]);

        let table = detector.to_table(&tables[0]);
        assert_eq!(table.header_rows, 1);
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.rows[0].texts(), vec!["DATA", "ESTABELECIMENTO", "VALOR"]);
        assert_eq!(table.rows[1].texts(), vec!["10/01/2024", "PADARIA REAL", "12,00"]);
    }

    #[test]
    fn test_unaligned_paragraph_is_left_out() {
        let detector = TableDetector::new();
        let mut spans = statement_spans();
        spans.push(make_span("Total da sua fatura é", 300.0, 760.0));

        let (tables, remaining) = detector.detect(spans);
        assert_eq!(tables.len(), 1);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].text, "Total da sua fatura é");
    }

    #[test]
    fn test_no_table_single_column() {
        let detector = TableDetector::new();
        let spans = vec![
            make_span("Linha 1", 10.0, 100.0),
            make_span("Linha 2", 10.0, 85.0),
            make_span("Linha 3", 10.0, 70.0),
        ];

        let (tables, remaining) = detector.detect(spans);
        assert!(tables.is_empty());
        assert_eq!(remaining.len(), 3);
    }

    #[test]
    fn test_bullet_list_not_detected_as_table() {
        let detector = TableDetector::new();
        let spans = vec![
            make_span("•", 50.0, 400.0),
            make_span("Anuidade isenta", 80.0, 400.0),
            make_span("•", 50.0, 370.0),
            make_span("Pagamento mínimo", 80.0, 370.0),
            make_span("•", 50.0, 340.0),
            make_span("Juros do rotativo", 80.0, 340.0),
        ];

        let (tables, remaining) = detector.detect(spans);
        assert!(tables.is_empty());
        assert_eq!(remaining.len(), 6);
    }

    #[test]
    fn test_number_markers() {
        assert!(is_number_marker("1."));
        assert!(is_number_marker("12)"));
        assert!(is_number_marker("3"));
        assert!(is_number_marker("a."));
        assert!(!is_number_marker("10/01/2024"));
        assert!(!is_number_marker("12,00"));
        assert!(!is_number_marker(""));
    }

    #[test]
    fn test_find_column_for_span() {
        let columns = [50.0, 150.0, 400.0];
        assert_eq!(find_column_for_span(50.0, &columns, 450.0), 0);
        assert_eq!(find_column_for_span(145.0, &columns, 450.0), 1);
        assert_eq!(find_column_for_span(420.0, &columns, 450.0), 2);
    }
}
