use html::{AdjacentPosition, Document};

const PAGE: &str = concat!(
    "<!DOCTYPE html>",
    r#"<main id="app" class="shell">"#,
    r#"<h1 title="a &amp; b">Tom &amp; Jerry</h1>"#,
    r#"<form id="f"><input id="q" type="search" value="x" disabled><textarea id="t">1 &lt; 2</textarea></form>"#,
    "<script>if (a < b) { go(); }</script>",
    "<!-- note -->",
    "<ul><li>one</li><li>two</li></ul>",
    "</main>"
);

#[test]
fn normalized_markup_survives_parse_and_serialize() {
    let doc = Document::parse(PAGE);
    assert_eq!(doc.doctype(), Some("DOCTYPE html"));
    let app = doc.element_by_id("app").unwrap();
    let again = Document::parse(&doc.outer_html(app));
    assert_eq!(again.inner_html(again.root()), doc.outer_html(app));
    assert!(doc.outer_html(app).contains("<script>if (a < b) { go(); }</script>"));
    assert!(doc.outer_html(app).contains(r#"<input id="q" type="search" value="x" disabled>"#));
}

#[test]
fn entities_decode_into_text_and_reencode_on_output() {
    let doc = Document::parse(PAGE);
    let h1 = doc.find_element(doc.root(), |d, n| d.tag_name(n) == Some("h1")).unwrap();
    assert_eq!(doc.text_content(h1), "Tom & Jerry");
    assert_eq!(doc.attribute(h1, "title"), Some("a & b"));
    assert_eq!(doc.inner_html(h1), "Tom &amp; Jerry");
    let t = doc.element_by_id("t").unwrap();
    assert_eq!(doc.value(t).as_deref(), Some("1 < 2"));
}

#[test]
fn fragments_splice_without_leaving_the_fragment_behind() {
    let mut doc = Document::parse(PAGE);
    let list = doc.find_element(doc.root(), |d, n| d.tag_name(n) == Some("ul")).unwrap();
    doc.insert_adjacent_html(list, AdjacentPosition::AfterBegin, "<li>zero</li>")
        .unwrap();
    doc.insert_adjacent_html(list, AdjacentPosition::AfterEnd, "<p id=\"after\"></p>")
        .unwrap();
    assert_eq!(
        doc.outer_html(list),
        "<ul><li>zero</li><li>one</li><li>two</li></ul>"
    );
    let after = doc.element_by_id("after").unwrap();
    assert_eq!(doc.previous_sibling(after), Some(list));
    assert_eq!(doc.element_index(after), Some(4));
}

#[test]
fn replacing_a_subtree_detaches_it_and_its_focus() {
    let mut doc = Document::parse(PAGE);
    let q = doc.element_by_id("q").unwrap();
    assert!(doc.focus(q));
    let form = doc.element_by_id("f").unwrap();
    doc.set_outer_html(form, "<p>sent</p>").unwrap();
    assert!(!doc.is_connected(q));
    assert_eq!(doc.active_element(), None);
    assert_eq!(doc.element_by_id("f"), None);
}
