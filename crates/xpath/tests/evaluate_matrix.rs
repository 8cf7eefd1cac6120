use html::{Document, NodeId};
use xpath::{Value, XPathEval, XPathParser, first_node};

const PAGE: &str = r#"<html><body>
<div id="nav"><a id="home" href="/">Home</a><a id="docs" href="/docs" class="active">Docs</a></div>
<ul id="list"><li id="l1">one</li><li id="l2">two</li><li id="l3" data-kind="last">three</li></ul>
<form id="f"><input id="name" name="user"><!-- note --><textarea id="bio">hi</textarea></form>
</body></html>"#;

fn page() -> Document {
    Document::parse(PAGE)
}

fn first_id(doc: &Document, expr: &str) -> Option<String> {
    first_node(doc, doc.root(), expr)
        .unwrap_or_else(|e| panic!("evaluation failed for '{expr}': {e}"))
        .and_then(|n| doc.attribute(n, "id").map(str::to_string))
}

fn all_ids(doc: &Document, context: NodeId, expr: &str) -> Vec<String> {
    let parsed = XPathParser::parse(expr).unwrap_or_else(|e| panic!("parse failed for '{expr}': {e}"));
    match XPathEval::new(doc).evaluate(&parsed, context).unwrap() {
        Value::Nodes(nodes) => nodes
            .into_iter()
            .filter_map(|n| match n {
                xpath::XNode::Node(id) => doc.attribute(id, "id").map(str::to_string),
                xpath::XNode::Attribute(..) => None,
            })
            .collect(),
        other => panic!("expected node-set for '{expr}', got {other:?}"),
    }
}

#[test]
fn location_path_matrix() {
    let doc = page();
    let cases = [
        ("//li", Some("l1")),
        ("//li[2]", Some("l2")),
        ("//li[last()]", Some("l3")),
        ("/html/body/ul/li[position() > 1]", Some("l2")),
        ("//a[@class='active']", Some("docs")),
        ("//a[contains(@href, 'doc')]", Some("docs")),
        ("//a[starts-with(., 'Ho')]", Some("home")),
        ("//li[text()='three']", Some("l3")),
        ("//li[@data-kind]/preceding-sibling::li[1]", Some("l2")),
        ("//li[@data-kind]/ancestor::*[@id][1]", Some("list")),
        ("//input/following-sibling::*", Some("bio")),
        ("//*[@id='l2']/..", Some("list")),
        ("(//li | //a)[1]", Some("home")),
        ("//li[not(@data-kind) and . != 'one']", Some("l2")),
        ("//LI[3]", Some("l3")),
        ("//span", None),
    ];
    for (expr, want) in cases {
        assert_eq!(first_id(&doc, expr).as_deref(), want, "expression {expr}");
    }
}

#[test]
fn results_are_in_document_order() {
    let doc = page();
    let l3 = doc.element_by_id("l3").unwrap();
    assert_eq!(all_ids(&doc, l3, "preceding-sibling::li"), ["l1", "l2"]);
    assert_eq!(all_ids(&doc, doc.root(), "//li[3] | //li[1]"), ["l1", "l3"]);
    assert_eq!(all_ids(&doc, doc.root(), "//*[@id='home']/following::li"), ["l1", "l2", "l3"]);
}

#[test]
fn relative_paths_use_the_context_node() {
    let doc = page();
    let list = doc.element_by_id("list").unwrap();
    assert_eq!(all_ids(&doc, list, "li[position() < 3]"), ["l1", "l2"]);
    assert_eq!(all_ids(&doc, list, ".//a"), Vec::<String>::new());
    assert_eq!(first_node(&doc, list, "..").unwrap(), doc.parent(list));
}

#[test]
fn text_and_comment_nodes_can_be_selected() {
    let doc = page();
    let text = first_node(&doc, doc.root(), "//li[1]/text()").unwrap().unwrap();
    assert_eq!(doc.node_text(text), Some("one"));
    let comment = first_node(&doc, doc.root(), "//form/comment()").unwrap().unwrap();
    assert_eq!(doc.node_text(comment), Some(" note "));
}

#[test]
fn scalar_results_and_attribute_only_results() {
    let doc = page();
    assert!(first_node(&doc, doc.root(), "count(//li)").is_err());
    assert_eq!(first_node(&doc, doc.root(), "//input/@name").unwrap(), None);
    let parsed = XPathParser::parse("count(//li) + 1").unwrap();
    assert_eq!(
        XPathEval::new(&doc).evaluate(&parsed, doc.root()).unwrap(),
        Value::Number(4.0)
    );
    let parsed = XPathParser::parse("normalize-space(concat(' a ', ' b '))").unwrap();
    assert_eq!(
        XPathEval::new(&doc).evaluate(&parsed, doc.root()).unwrap(),
        Value::String("a b".into())
    );
}
