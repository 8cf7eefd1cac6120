#![no_main]

use html::Document;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(selector) = std::str::from_utf8(data) else {
        return;
    };
    let doc = Document::parse(r#"<ul id="l"><li class="a b" data-x="1">one</li><li>two</li></ul>"#);
    if let Ok(found) = css::query_selector_all(&doc, doc.root(), selector) {
        for node in found {
            assert!(doc.is_element(node));
        }
    }
});
