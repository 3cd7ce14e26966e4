//! Shared helpers: small single-page PDFs built with lopdf.

#![allow(dead_code)]

use lopdf::dictionary;
use lopdf::{Document, Object, Stream};

/// One text item placed at absolute coordinates.
pub type Item<'a> = (&'a str, f32, f32);

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('(', "\\(").replace(')', "\\)")
}

/// A one-page PDF showing each item with Helvetica 10 at its position.
pub fn build_pdf(items: &[Item<'_>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.4");

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let content: String = items
        .iter()
        .map(|(text, x, y)| format!("BT /F1 10 Tf 1 0 0 1 {x} {y} Tm ({}) Tj ET\n", escape(text)))
        .collect();
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));

    let resources = dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    };

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Contents" => content_id,
        "Resources" => resources,
    });

    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
    });

    if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
        dict.set("Parent", pages_id);
    }

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("save test pdf");
    bytes
}

/// A card invoice: issuer and total above a three-column transaction table.
pub fn invoice_pdf() -> Vec<u8> {
    build_pdf(&[
        ("Nu Pagamentos S.A.", 300.0, 780.0),
        ("Total da sua fatura e R$ 1.234,56", 300.0, 760.0),
        ("DATA", 50.0, 700.0),
        ("ESTABELECIMENTO", 150.0, 700.0),
        ("VALOR", 400.0, 700.0),
        ("10/01/2024", 50.0, 685.0),
        ("PADARIA REAL", 150.0, 685.0),
        ("12,00", 400.0, 685.0),
        ("11/01/2024", 50.0, 670.0),
        ("POSTO IPIRANGA", 150.0, 670.0),
        ("R$ 200,50", 400.0, 670.0),
        ("12/01/2024", 50.0, 655.0),
        ("ESTORNO LOJA", 150.0, 655.0),
        ("(30,00)", 400.0, 655.0),
    ])
}
