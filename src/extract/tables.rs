//! Transaction rows from converted tables.
//!
//! A table is accepted when its header names both a date column and an
//! establishment column. Tables whose real header sits a few rows down
//! (a title row, a column-index row) are re-anchored on the first row that
//! names a date column. Accepted tables are concatenated in discovery order
//! and cut at the first footer marker.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::{Document, RawTransactionRow, Table};
use crate::options::ExtractOptions;

use super::fold_text;
use super::normalize::{looks_like_amount, looks_like_date, normalize_value};

/// A folded marker, plus a pattern tolerating lost spaces between its words.
#[derive(Debug, Clone)]
struct Marker {
    folded: String,
    joined: Option<Regex>,
}

impl Marker {
    fn new(raw: &str) -> Self {
        let folded = fold_text(raw);
        let tokens: Vec<String> = folded.split(' ').map(regex::escape).collect();
        let joined = if tokens.len() > 1 {
            Regex::new(&tokens.join(r"\W*")).ok()
        } else {
            None
        };
        Self { folded, joined }
    }

    /// Match against already folded text.
    fn matches(&self, folded_text: &str) -> bool {
        !self.folded.is_empty()
            && (folded_text.contains(&self.folded)
                || self.joined.as_ref().is_some_and(|re| re.is_match(folded_text)))
    }
}

fn any_match(markers: &[Marker], folded_text: &str) -> bool {
    markers.iter().any(|m| m.matches(folded_text))
}

fn currency_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:R|US)\$\s*\(?-?\s*\d[\d.,]*\)?").expect("valid currency regex")
    })
}

/// Output of the table scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableExtraction {
    /// Rows of all accepted tables, in order, cut at the footer marker
    pub rows: Vec<RawTransactionRow>,

    /// Normalized statement total, when the document states one
    pub total_amount: Option<String>,

    /// How many tables passed the header check
    pub accepted_tables: usize,
}

/// Which cell holds what, for one accepted table.
#[derive(Debug, Clone, Copy, Default)]
struct ColumnRoles {
    date: Option<usize>,
    description: Option<usize>,
    value: Option<usize>,
}

/// An accepted table: its roles and body rows.
struct AcceptedTable {
    roles: ColumnRoles,
    body: Vec<Vec<String>>,
}

/// Scans a structural representation for transaction tables.
#[derive(Debug, Clone)]
pub struct TableExtractor {
    date_markers: Vec<Marker>,
    establishment_markers: Vec<Marker>,
    value_markers: Vec<Marker>,
    end_markers: Vec<Marker>,
    total_phrase: Marker,
}

impl TableExtractor {
    pub fn new(options: &ExtractOptions) -> Self {
        let markers = |list: &[String]| -> Vec<Marker> {
            list.iter().map(|m| Marker::new(m)).collect()
        };
        Self {
            date_markers: markers(&options.date_markers),
            establishment_markers: markers(&options.establishment_markers),
            value_markers: markers(&options.value_markers),
            end_markers: markers(&options.end_markers),
            total_phrase: Marker::new(&options.total_phrase),
        }
    }

    /// Scan every table and paragraph of `document`.
    pub fn extract(&self, document: &Document) -> TableExtraction {
        let accepted: Vec<AcceptedTable> = document
            .tables()
            .enumerate()
            .filter_map(|(i, table)| {
                let accepted = self.accept(table);
                log::debug!(
                    "Table {}: {}",
                    i,
                    if accepted.is_some() { "accepted" } else { "rejected" }
                );
                accepted
            })
            .collect();

        if accepted.is_empty() {
            log::warn!("No transaction table found");
        }

        let mut rows: Vec<(ColumnRoles, &Vec<String>)> = accepted
            .iter()
            .flat_map(|t| t.body.iter().map(move |row| (t.roles, row)))
            .collect();

        if let Some(end) = rows
            .iter()
            .position(|(_, row)| any_match(&self.end_markers, &fold_text(&row.join(" "))))
        {
            log::info!("Transaction list ends at row {} of {}", end, rows.len());
            rows.truncate(end);
        }

        TableExtraction {
            rows: rows
                .into_iter()
                .filter_map(|(roles, row)| map_row(roles, row))
                .collect(),
            total_amount: self.find_total(document),
            accepted_tables: accepted.len(),
        }
    }

    /// Header check, re-anchoring on the first row that names a date column.
    fn accept(&self, table: &Table) -> Option<AcceptedTable> {
        let mut grid = table.grid();
        // Column-index rows ("0 1 2") carry no labels
        if grid.len() > 1 && is_index_row(&grid[0]) {
            grid.remove(0);
        }
        if grid.is_empty() {
            return None;
        }

        let header = grid.remove(0);
        if self.is_transaction_header(&header) {
            let roles = self.roles(&header);
            return Some(AcceptedTable { roles, body: grid });
        }

        let anchor = grid
            .iter()
            .position(|row| any_match(&self.date_markers, &fold_text(&row.join(" "))))?;
        let body = grid.split_off(anchor + 1);
        let header = grid.pop()?;

        if self.is_transaction_header(&header) {
            log::debug!("Header re-anchored {} rows down", anchor + 1);
            let roles = self.roles(&header);
            Some(AcceptedTable { roles, body })
        } else {
            None
        }
    }

    fn is_transaction_header(&self, header: &[String]) -> bool {
        let text = fold_text(&header.join(" "));
        any_match(&self.date_markers, &text) && any_match(&self.establishment_markers, &text)
    }

    fn roles(&self, header: &[String]) -> ColumnRoles {
        let folded: Vec<String> = header.iter().map(|c| fold_text(c)).collect();
        let find = |markers: &[Marker], skip: &[Option<usize>]| {
            folded
                .iter()
                .enumerate()
                .position(|(i, cell)| !skip.contains(&Some(i)) && any_match(markers, cell))
        };

        let date = find(&self.date_markers, &[]);
        let description = find(&self.establishment_markers, &[date]);
        let value = find(&self.value_markers, &[date, description]);
        ColumnRoles {
            date,
            description,
            value,
        }
    }

    /// The amount following the total phrase, in the same or a later paragraph.
    fn find_total(&self, document: &Document) -> Option<String> {
        let paragraphs: Vec<&str> = document.paragraphs().map(|p| p.plain_text()).collect();
        let start = paragraphs
            .iter()
            .position(|p| self.total_phrase.matches(&fold_text(p)))?;

        let amount = paragraphs[start..]
            .iter()
            .find_map(|p| currency_re().find(p))
            .map(|m| m.as_str());

        match amount.and_then(normalize_value) {
            Some(total) => {
                log::debug!("Statement total: {}", total);
                Some(total)
            }
            None => {
                log::warn!("Total phrase found without a following amount");
                None
            }
        }
    }
}

fn is_index_row(row: &[String]) -> bool {
    !row.is_empty()
        && row
            .iter()
            .all(|c| !c.trim().is_empty() && c.trim().chars().all(|ch| ch.is_ascii_digit()))
}

/// Pick date, description and value cells; filler rows give `None`.
fn map_row(roles: ColumnRoles, row: &[String]) -> Option<RawTransactionRow> {
    let cell = |i: usize| row.get(i).map(|s| s.trim()).unwrap_or("");

    let date_idx = roles
        .date
        .or_else(|| row.iter().position(|c| looks_like_date(c)));
    let value_idx = roles
        .value
        .or_else(|| row.iter().rposition(|c| looks_like_amount(c)));

    let date = date_idx.map(cell).unwrap_or("");
    let value = value_idx.map(cell).unwrap_or("");
    if date.is_empty() && value.is_empty() {
        return None;
    }

    let description = match roles.description {
        Some(i) => cell(i).to_string(),
        None => row
            .iter()
            .enumerate()
            .filter(|(i, c)| Some(*i) != date_idx && Some(*i) != value_idx && !c.trim().is_empty())
            .map(|(_, c)| c.trim())
            .collect::<Vec<_>>()
            .join(" "),
    };

    Some(RawTransactionRow::new(date, description, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Page, Paragraph};

    fn extractor() -> TableExtractor {
        TableExtractor::new(&ExtractOptions::default())
    }

    fn document(tables: Vec<Table>, paragraphs: &[&str]) -> Document {
        let mut page = Page::a4(1);
        for p in paragraphs {
            page.add_paragraph(Paragraph::with_text(*p));
        }
        for t in tables {
            page.add_table(t);
        }
        let mut doc = Document::new();
        doc.add_page(page);
        doc
    }

    fn card_table(rows: &[[&str; 3]]) -> Table {
        let mut grid = vec![["DATA", "ESTABELECIMENTO", "VALOR EM R$"]];
        grid.extend_from_slice(rows);
        Table::from_grid(grid)
    }

    #[test]
    fn test_accepts_labeled_table_in_row_order() {
        let doc = document(
            vec![card_table(&[
                ["10/01", "PADARIA REAL", "12,00"],
                ["11/01", "FARMACIA", "30,50"],
                ["12/01", "POSTO SHELL", "150,00"],
            ])],
            &[],
        );

        let result = extractor().extract(&doc);
        assert_eq!(result.accepted_tables, 1);
        let descriptions: Vec<_> = result.rows.iter().map(|r| r.description.as_str()).collect();
        assert_eq!(descriptions, vec!["PADARIA REAL", "FARMACIA", "POSTO SHELL"]);
        assert_eq!(result.rows[1].value, "30,50");
        assert_eq!(result.rows[2].date, "12/01");
    }

    #[test]
    fn test_header_reanchored_below_title_rows() {
        let table = Table::from_grid([
            ["Cartão final 1234", "", ""],
            ["Data", "Descrição", "Valor"],
            ["05/02", "MERCADO LIVRE", "89,90"],
        ]);
        let result = extractor().extract(&document(vec![table], &[]));
        assert_eq!(result.accepted_tables, 1);
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].description, "MERCADO LIVRE");
    }

    #[test]
    fn test_index_row_is_skipped() {
        let table = Table::from_grid([
            ["0", "1", "2"],
            ["DATA", "ESTABELECIMENTO", "VALOR"],
            ["05/02", "IFOOD", "42,00"],
        ]);
        let result = extractor().extract(&document(vec![table], &[]));
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].value, "42,00");
    }

    #[test]
    fn test_unrelated_table_rejected() {
        let table = Table::from_grid([["Limite total", "Disponível"], ["5.000,00", "1.200,00"]]);
        let result = extractor().extract(&document(vec![table], &[]));
        assert_eq!(result.accepted_tables, 0);
        assert!(result.rows.is_empty());
    }

    #[test]
    fn test_truncates_at_end_marker() {
        let mut rows: Vec<[&str; 3]> = (1..=6)
            .map(|_| ["10/01", "COMPRA", "1,00"])
            .collect();
        rows.push(["Lançamentos no cartão", "", ""]);
        rows.extend([["13/01", "OUTRA", "2,00"], ["14/01", "MAIS", "3,00"], ["15/01", "FIM", "4,00"]]);
        assert_eq!(rows.len(), 10);

        let result = extractor().extract(&document(vec![card_table(&rows)], &[]));
        assert_eq!(result.rows.len(), 6);
    }

    #[test]
    fn test_end_marker_without_spaces() {
        let rows = [
            ["10/01", "COMPRA", "1,00"],
            ["LANÇAMENTOSNOCARTÃO", "", ""],
            ["11/01", "DEPOIS", "2,00"],
        ];
        let result = extractor().extract(&document(vec![card_table(&rows)], &[]));
        assert_eq!(result.rows.len(), 1);
    }

    #[test]
    fn test_tables_concatenate_in_discovery_order() {
        let doc = document(
            vec![
                card_table(&[["10/01", "PRIMEIRA", "1,00"]]),
                card_table(&[["11/01", "SEGUNDA", "2,00"]]),
            ],
            &[],
        );
        let result = extractor().extract(&doc);
        assert_eq!(result.accepted_tables, 2);
        assert_eq!(result.rows[0].description, "PRIMEIRA");
        assert_eq!(result.rows[1].description, "SEGUNDA");
    }

    #[test]
    fn test_filler_rows_skipped() {
        let rows = [["", "continuação", ""], ["10/01", "COMPRA", "1,00"]];
        let result = extractor().extract(&document(vec![card_table(&rows)], &[]));
        assert_eq!(result.rows.len(), 1);
    }

    #[test]
    fn test_value_column_fallback() {
        let table = Table::from_grid([
            ["Data", "Estabelecimento", "Parcela", ""],
            ["10/01", "LOJA", "01/03", "R$ 99,90"],
        ]);
        let result = extractor().extract(&document(vec![table], &[]));
        assert_eq!(result.rows[0].value, "R$ 99,90");
    }

    #[test]
    fn test_total_in_following_paragraph() {
        let doc = document(
            vec![card_table(&[["10/01", "COMPRA", "1,00"]])],
            &["Olá, Maria", "O total da sua fatura é", "R$ 1.234,56", "R$ 9,99"],
        );
        let result = extractor().extract(&doc);
        assert_eq!(result.total_amount.as_deref(), Some("1234.56"));
    }

    #[test]
    fn test_total_in_same_paragraph() {
        let doc = document(vec![], &["Total da sua fatura é R$ 87,10"]);
        let result = extractor().extract(&doc);
        assert_eq!(result.total_amount.as_deref(), Some("87.10"));
        assert_eq!(result.accepted_tables, 0);
    }

    #[test]
    fn test_no_total_phrase() {
        let doc = document(vec![], &["R$ 10,00"]);
        assert_eq!(extractor().extract(&doc).total_amount, None);
    }
}
