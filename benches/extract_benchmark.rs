//! Benchmarks for value normalization and line parsing.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use extrato::extract::{extract_lines, normalize_value};
use extrato::{BankType, ExtractOptions};

/// A synthetic statement body with `lines` transactions.
fn synthetic_statement(lines: usize) -> String {
    (0..lines)
        .map(|i| {
            format!(
                "{:02}/{:02}/2024 COMPRA CARTAO LOJA {} R$ {}.{:03},{:02}",
                i % 28 + 1,
                i % 12 + 1,
                i,
                i % 9 + 1,
                i % 1000,
                i % 100
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Benchmark amount parsing across notations.
fn bench_normalize_value(c: &mut Criterion) {
    let samples = ["R$ 1.234,56", "(30,00)", "12,50-", "1,234.56", "-0,01", "garbage"];

    c.bench_function("normalize_value", |b| {
        b.iter(|| {
            for s in &samples {
                let _ = normalize_value(black_box(s));
            }
        });
    });
}

/// Benchmark the line scanner at various statement sizes.
fn bench_line_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_parsing");
    let options = ExtractOptions::new();

    for line_count in [10, 100, 1000].iter() {
        let text = synthetic_statement(*line_count);

        group.bench_function(format!("{}_lines", line_count), |b| {
            b.iter(|| extract_lines(black_box(&text), BankType::Generic, &options));
        });
    }

    group.finish();
}

/// Benchmark the full text-only line strategy.
fn bench_text_pipeline(c: &mut Criterion) {
    let text = synthetic_statement(100);

    c.bench_function("text_pipeline_100_lines", |b| {
        b.iter(|| extrato::extract_bank_statement_text(black_box(&text)));
    });
}

criterion_group!(benches, bench_normalize_value, bench_line_parsing, bench_text_pipeline);
criterion_main!(benches);
