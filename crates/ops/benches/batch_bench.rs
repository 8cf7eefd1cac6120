use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use html::Document;
use ops::{BatchOptions, Engine, OperationBatch};
use serde_json::{Value, json};

const ROWS: usize = 500;

fn make_rows(count: usize, label: &str) -> String {
    let mut out = String::with_capacity(count * 48);
    out.push_str(r#"<table id="t">"#);
    for i in 0..count {
        out.push_str(&format!(r#"<tr id="r{i}"><td>{label} {i}</td></tr>"#));
    }
    out.push_str("</table>");
    out
}

fn attribute_batch(count: usize) -> OperationBatch {
    let entries: Vec<Value> = (0..count)
        .map(|i| json!({"selector": format!("#r{i}"), "name": "data-row", "value": i}))
        .collect();
    OperationBatch::from_value(json!({ "setAttribute": entries })).unwrap()
}

fn bench_decode_batch(c: &mut Criterion) {
    let text = attribute_batch(ROWS).to_value().to_string();
    c.bench_function("bench_decode_batch", |b| {
        b.iter(|| black_box(OperationBatch::from_json(black_box(&text)).unwrap().len()));
    });
}

fn bench_set_attribute_per_row(c: &mut Criterion) {
    let page = make_rows(ROWS, "row");
    let batch = attribute_batch(ROWS);
    c.bench_function("bench_set_attribute_per_row", |b| {
        b.iter_batched(
            || Engine::in_memory(Document::parse(&page)),
            |mut engine| black_box(engine.perform(&batch, BatchOptions::default()).applied),
            BatchSize::SmallInput,
        );
    });
}

fn bench_select_all_class(c: &mut Criterion) {
    let page = make_rows(ROWS, "row");
    let batch = OperationBatch::from_value(json!({
        "addCssClass": [{"selector": "tr", "selectAll": true, "name": "seen"}]
    }))
    .unwrap();
    c.bench_function("bench_select_all_class", |b| {
        b.iter_batched(
            || Engine::in_memory(Document::parse(&page)),
            |mut engine| black_box(engine.perform(&batch, BatchOptions::default()).applied),
            BatchSize::SmallInput,
        );
    });
}

fn bench_morph_table(c: &mut Criterion) {
    let page = make_rows(ROWS, "row");
    let batch = OperationBatch::from_value(json!({
        "morph": [{"selector": "#t", "html": make_rows(ROWS, "cell")}]
    }))
    .unwrap();
    c.bench_function("bench_morph_table", |b| {
        b.iter_batched(
            || Engine::in_memory(Document::parse(&page)),
            |mut engine| black_box(engine.perform(&batch, BatchOptions::default()).applied),
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_decode_batch,
    bench_set_attribute_per_row,
    bench_select_all_class,
    bench_morph_table
);
criterion_main!(benches);
