#![no_main]

use html::Document;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(markup) = std::str::from_utf8(data) else {
        return;
    };
    let mut doc = Document::parse("<div id=\"host\"></div>");
    let fragment = doc.parse_fragment(markup);
    let _ = doc.inner_html(fragment);
    if let Some(host) = doc.element_by_id("host") {
        let _ = doc.set_inner_html(host, markup);
        let _ = doc.outer_html(host);
    }
});
