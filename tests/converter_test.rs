//! Structural conversion of generated statements.

mod common;

use extrato::loader::DocumentLoader;
use extrato::{Block, LopdfOpener, StructuralConverter, TableDetectorConfig, TextEngine, TextExtractor};

use common::{build_pdf, invoice_pdf};

#[test]
fn test_invoice_structure() {
    let loaded = DocumentLoader::new(LopdfOpener).load(&invoice_pdf(), None).unwrap();
    let document = StructuralConverter::new().convert(&loaded).unwrap();

    assert_eq!(document.metadata.page_count, 1);
    assert_eq!(document.metadata.pdf_version, "1.4");
    assert!(!document.metadata.decrypted);

    let tables: Vec<_> = document.tables().collect();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].row_count(), 4);
    assert_eq!(tables[0].rows[0].texts(), vec!["DATA", "ESTABELECIMENTO", "VALOR"]);
    assert_eq!(tables[0].rows[3].texts(), vec!["12/01/2024", "ESTORNO LOJA", "(30,00)"]);

    let paragraphs: Vec<_> = document.paragraphs().map(|p| p.plain_text()).collect();
    assert_eq!(paragraphs, vec!["Nu Pagamentos S.A.", "Total da sua fatura e R$ 1.234,56"]);
}

#[test]
fn test_blocks_keep_page_order() {
    let loaded = DocumentLoader::new(LopdfOpener).load(&invoice_pdf(), None).unwrap();
    let document = StructuralConverter::new().convert(&loaded).unwrap();

    let kinds: Vec<bool> = document.blocks().map(Block::is_table).collect();
    assert_eq!(kinds, vec![false, false, true]);
}

#[test]
fn test_strict_detector_finds_nothing() {
    let config = TableDetectorConfig {
        min_rows: 10,
        ..Default::default()
    };
    let loaded = DocumentLoader::new(LopdfOpener).load(&invoice_pdf(), None).unwrap();
    let document = StructuralConverter::new()
        .with_detector_config(config)
        .convert(&loaded)
        .unwrap();
    assert_eq!(document.tables().count(), 0);
}

#[test]
fn test_layout_text() {
    let pdf = build_pdf(&[("primeira linha", 50.0, 700.0), ("segunda linha", 50.0, 680.0)]);
    let loaded = DocumentLoader::new(LopdfOpener).load(&pdf, None).unwrap();
    let text = TextExtractor::new(TextEngine::Layout).extract(&loaded).unwrap();
    assert_eq!(text, "primeira linha\nsegunda linha");
}
