#![no_main]

use html::Document;
use libfuzzer_sys::fuzz_target;
use ops::{BatchOptions, Engine, OperationBatch};

const PAGE: &str = r#"<div id="a" class="c"><p id="b">x</p><input id="i" value="v"></div>"#;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(batch) = OperationBatch::from_json(text) else {
        return;
    };
    let mut engine = Engine::in_memory(Document::parse(PAGE));
    let report = engine.perform(&batch, BatchOptions::default());
    assert_eq!(report.skipped, 0);
});
