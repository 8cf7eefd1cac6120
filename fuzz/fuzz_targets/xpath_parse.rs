#![no_main]

use html::Document;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(expr) = std::str::from_utf8(data) else {
        return;
    };
    let doc = Document::parse(r#"<div id="x"><span>a</span><span>b</span></div>"#);
    if let Ok(Some(node)) = xpath::first_node(&doc, doc.root(), expr) {
        assert!(doc.contains(node));
    }
});
