use html::Document;
use ops::{BatchOptions, Engine, OperationBatch, PerformError, Severity, Storage};
use ops_test_support::EventRecorder;

fn engine(page: &str) -> (Engine, EventRecorder) {
    let mut engine = Engine::in_memory(Document::parse(page));
    let recorder = EventRecorder::new();
    let root = engine.document().root();
    recorder.attach(engine.events(), root);
    (engine, recorder)
}

fn batch(json: &str) -> OperationBatch {
    OperationBatch::from_json(json).unwrap_or_else(|e| panic!("bad batch {json}: {e}"))
}

fn markup(engine: &Engine) -> String {
    let doc = engine.document();
    doc.inner_html(doc.root())
}

const QUIET: BatchOptions = BatchOptions {
    emit_missing_element_warnings: false,
};

const EVERY_KIND_PAGE: &str = concat!(
    r#"<div id="root">"#,
    r#"<p id="inner">a</p><p id="outer">b</p><p id="app">c</p><p id="pre">d</p>"#,
    r#"<p id="adj">e</p><p id="adjt">f</p><p id="txt">g</p><p id="rep">h</p>"#,
    r#"<div id="mor"><i>i</i></div><p id="rem">j</p><p id="attr" title="t">k</p>"#,
    r#"<p id="cls" class="a b">l</p><p id="sty">m</p><p id="data">n</p>"#,
    r#"<input id="prop"><input id="val" value="v"><button id="btn">o</button>"#,
    r#"</div>"#
);

const EVERY_KIND_BATCH: &str = r##"{
    "innerHtml": [{"selector": "#inner", "html": "<b>A</b>"}],
    "outerHtml": [{"selector": "#outer", "html": "<p id=\"outer2\">B</p>"}],
    "append": [{"selector": "#app", "html": "<i>+</i>"}],
    "prepend": [{"selector": "#pre", "html": "<i>-</i>"}],
    "insertAdjacentHtml": [{"selector": "#adj", "html": "<hr>", "position": "afterend"}],
    "insertAdjacentText": [{"selector": "#adjt", "text": "!", "position": "beforeend"}],
    "textContent": [{"selector": "#txt", "text": "G"}],
    "replace": [{"selector": "#rep", "html": "<p id=\"rep2\">H</p>"}],
    "morph": [{"selector": "#mor", "html": "<div id=\"mor\"><i>I</i></div>"}],
    "remove": [{"selector": "#rem"}],
    "setAttribute": [{"selector": "#attr", "name": "data-x", "value": "1"}],
    "removeAttribute": [{"selector": "#attr", "name": "title"}],
    "addCssClass": [{"selector": "#cls", "name": "c"}],
    "removeCssClass": [{"selector": "#cls", "name": "a"}],
    "setStyle": [{"selector": "#sty", "name": "color", "value": "red"}],
    "setStyles": [{"selector": "#sty", "styles": {"marginTop": "1px"}}],
    "setDatasetProperty": [{"selector": "#data", "name": "userId", "value": "7"}],
    "setProperty": [{"selector": "#prop", "name": "disabled", "value": true}],
    "setValue": [{"selector": "#val", "value": "typed"}],
    "dispatchEvent": [{"selector": "#btn", "name": "app:ping", "detail": {"n": 1}}],
    "clearStorage": [{"type": "session"}],
    "setStorageItem": [{"key": "k", "value": "v"}],
    "removeStorageItem": [{"key": "gone"}],
    "pushState": [{"state": {"page": 2}, "title": "Two", "url": "/two"}],
    "setCookie": [{"cookie": "theme=dark; path=/"}],
    "consoleLog": [{"message": "hello", "level": "warn"}],
    "notification": [{"title": "Ping", "options": {"body": "hi"}}],
    "setFocus": [{"selector": "#val"}]
}"##;

#[test]
fn every_kind_runs_between_a_before_and_after_event() {
    let (mut engine, recorder) = engine(EVERY_KIND_PAGE);
    let report = engine.perform(&batch(EVERY_KIND_BATCH), BatchOptions::default());
    assert!(report.is_clean(), "{:?}", report.diagnostics);
    assert_eq!(report.applied, 28);
    assert!(recorder.is_paired(), "{:#?}", recorder.lines());
    assert_eq!(recorder.names().iter().filter(|n| n.starts_with("before-")).count(), 28);
    assert_eq!(recorder.count("app:ping"), 1);

    let html = markup(&engine);
    for fragment in [
        r#"<p id="inner"><b>A</b></p>"#,
        r#"<p id="outer2">B</p>"#,
        r#"<p id="app">c<i>+</i></p>"#,
        r#"<p id="pre"><i>-</i>d</p>"#,
        r#"<p id="adj">e</p><hr>"#,
        r#"<p id="adjt">f!</p>"#,
        r#"<p id="txt">G</p>"#,
        r#"<p id="rep2">H</p>"#,
        r#"<div id="mor"><i>I</i></div>"#,
        r#"<p id="attr" data-x="1">k</p>"#,
        r#"<p id="cls" class="b c">l</p>"#,
        r#"<p id="sty" style="color: red; margin-top: 1px;">m</p>"#,
        r#"<p id="data" data-user-id="7">n</p>"#,
        r#"<input id="prop" disabled="">"#,
    ] {
        assert!(html.contains(fragment), "missing {fragment} in {html}");
    }
    assert!(!html.contains(r#"id="rem""#));

    let doc = engine.document();
    let val = doc.element_by_id("val").unwrap();
    assert_eq!(doc.value(val).as_deref(), Some("typed"));
    assert_eq!(doc.active_element(), Some(val));

    let env = engine.environment();
    assert_eq!(env.local.len(), 1);
    assert_eq!(env.history.len(), 1);
    assert_eq!(env.cookies.header(), "theme=dark");
    assert_eq!(env.console.lines.len(), 1);
    assert_eq!(env.notifications.pending.len(), 1);
}

#[test]
fn canceling_every_before_event_leaves_everything_untouched() {
    let (mut engine, recorder) = engine(EVERY_KIND_PAGE);
    let root = engine.document().root();
    engine.events().add_wildcard_listener(root, |e| {
        if e.name().starts_with("before-") {
            e.cancel();
        }
    });
    let before = markup(&engine);
    let report = engine.perform(&batch(EVERY_KIND_BATCH), BatchOptions::default());

    assert!(report.is_clean(), "{:?}", report.diagnostics);
    assert_eq!((report.applied, report.canceled), (0, 28));
    assert_eq!(markup(&engine), before);
    assert!(recorder.is_paired());
    assert_eq!(recorder.events().len(), 56);
    assert!(
        recorder
            .events()
            .iter()
            .filter(|e| e.name.starts_with("after-"))
            .all(|e| e.canceled)
    );
    assert_eq!(engine.document().active_element(), None);

    let env = engine.environment();
    assert!(env.local.is_empty());
    assert!(env.history.is_empty());
    assert!(env.cookies.header().is_empty());
    assert!(env.console.lines.is_empty());
    assert!(env.notifications.pending.is_empty());
}

#[test]
fn set_attribute_yields_one_event_pair_on_the_target() {
    let (mut engine, recorder) = engine(r#"<div id="x"></div>"#);
    let report = engine.perform(
        &batch(r##"{"setAttribute":[{"selector":"#x","name":"data-state","value":"open"}]}"##),
        BatchOptions::default(),
    );
    assert!(report.is_clean());
    assert_eq!(markup(&engine), r#"<div id="x" data-state="open"></div>"#);
    assert_eq!(
        recorder.lines(),
        ["before-setAttribute #x", "after-setAttribute #x"]
    );
}

#[test]
fn missing_element_is_silent_when_warnings_are_off() {
    let (mut engine, recorder) = engine(r#"<div id="x"></div>"#);
    let report = engine.perform(&batch(r##"{"remove":[{"selector":"#missing"}]}"##), QUIET);
    assert!(report.is_clean());
    assert_eq!(report.skipped, 1);
    assert!(recorder.events().is_empty());
    assert_eq!(markup(&engine), r#"<div id="x"></div>"#);
}

#[test]
fn missing_element_with_warnings_is_a_resolution_failure() {
    let (mut engine, recorder) = engine(r#"<div id="x"></div>"#);
    let report = engine.perform(
        &batch(r##"{"remove":[{"selector":"#missing"}],"setAttribute":[{"selector":"#x","name":"a","value":"b"}]}"##),
        BatchOptions::default(),
    );
    assert_eq!(report.count(Severity::Resolution), 1);
    assert_eq!(report.count(Severity::Execution), 0);
    let diagnostic = &report.diagnostics[0];
    assert_eq!(diagnostic.kind, "remove");
    assert_eq!(diagnostic.selector.as_deref(), Some("#missing"));
    assert_eq!(report.applied, 1);
    assert_eq!(
        recorder.lines(),
        ["before-setAttribute #x", "after-setAttribute #x"]
    );
}

#[test]
fn global_kinds_still_run_when_their_selector_misses() {
    let (mut engine, recorder) = engine("<p></p>");
    let report = engine.perform(
        &batch(r##"{"setStorageItem":[{"selector":"#nowhere","key":"k","value":"v"}]}"##),
        BatchOptions::default(),
    );
    assert_eq!(report.applied, 1);
    assert_eq!(report.count(Severity::Resolution), 1);
    assert_eq!(report.count(Severity::Execution), 0);
    let diagnostic = &report.diagnostics[0];
    assert_eq!(diagnostic.kind, "setStorageItem");
    assert_eq!(diagnostic.selector.as_deref(), Some("#nowhere"));
    assert_eq!(engine.environment().local.len(), 1);
    assert_eq!(
        recorder.lines(),
        ["before-setStorageItem document", "after-setStorageItem document"]
    );
}

#[test]
fn malformed_selectors_count_as_missing_elements() {
    let (mut engine, recorder) = engine(r#"<p id="p"></p>"#);
    let report = engine.perform(
        &batch(r##"{"remove":[{"selector":"p["},{"selector":"//p[","xpath":true}]}"##),
        BatchOptions::default(),
    );
    assert_eq!(report.count(Severity::Resolution), 2);
    assert!(recorder.events().is_empty());
    let report = engine.perform(
        &batch(r##"{"remove":[{"selector":"p["}]}"##),
        QUIET,
    );
    assert!(report.is_clean());
}

#[test]
fn select_all_instances_cancel_independently() {
    let (mut engine, recorder) = engine(
        r#"<ul><li class="i" id="a"></li><li class="i" id="b"></li><li class="i" id="c"></li></ul>"#,
    );
    let root = engine.document().root();
    engine.events().add_listener(root, "before-addCssClass", |e| {
        if e.document().attribute(e.target(), "id") == Some("b") {
            e.cancel();
        }
    });
    let report = engine.perform(
        &batch(r#"{"addCssClass":[{"selector":".i","selectAll":true,"name":"done"}]}"#),
        BatchOptions::default(),
    );
    assert_eq!((report.applied, report.canceled), (2, 1));
    assert_eq!(
        markup(&engine),
        r#"<ul><li class="i done" id="a"></li><li class="i" id="b"></li><li class="i done" id="c"></li></ul>"#
    );
    assert_eq!(
        recorder.lines(),
        [
            "before-addCssClass #a",
            "after-addCssClass #a",
            "before-addCssClass #b",
            "after-addCssClass #b",
            "before-addCssClass #c",
            "after-addCssClass #c",
        ]
    );
}

#[test]
fn a_failing_entry_does_not_stop_the_rest() {
    let (mut engine, recorder) = engine(r#"<div id="x"></div>"#);
    let report = engine.perform(
        &batch(
            r##"{
                "setAttribute": [{"selector": "#x"}, {"selector": "#x", "name": "a", "value": "1"}],
                "explode": [{"selector": "#x"}],
                "outerHtml": [{"html": "<p></p>"}],
                "addCssClass": [{"selector": "#x", "name": "ok"}, {"selector": "#x", "name": 5}]
            }"##,
        ),
        BatchOptions::default(),
    );
    assert_eq!(report.count(Severity::Execution), 4, "{:#?}", report.diagnostics);
    assert_eq!(report.applied, 2);
    let kinds: Vec<&str> = report.diagnostics.iter().map(|d| d.kind.as_str()).collect();
    assert_eq!(kinds, ["setAttribute", "explode", "outerHtml", "addCssClass"]);
    assert_eq!(report.diagnostics[1].message, "unknown operation `explode`");
    assert_eq!(markup(&engine), r#"<div id="x" a="1" class="ok"></div>"#);
    assert!(recorder.is_paired());
    assert_eq!(recorder.count("before-outerHtml"), 1);
}

#[test]
fn malformed_descriptors_fail_alone() {
    let (mut engine, _) = engine(r#"<div id="x"></div>"#);
    let report = engine.perform(
        &batch(r##"{"remove":[42,{"selector":"#x","selectAll":"yes"},{"selector":"#x"}]}"##),
        BatchOptions::default(),
    );
    assert_eq!(report.count(Severity::Execution), 2);
    assert!(
        report.diagnostics[0].message.starts_with("malformed descriptor"),
        "{}",
        report.diagnostics[0].message
    );
    assert_eq!(report.applied, 1);
    assert_eq!(markup(&engine), "");
}

#[test]
fn lifecycle_events_carry_the_descriptor_and_bubble() {
    let (mut engine, recorder) = engine(r#"<section id="s"><p id="p"></p></section>"#);
    let section = engine.document().element_by_id("s").unwrap();
    let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = std::rc::Rc::clone(&seen);
    engine.events().add_listener(section, "before-setAttribute", move |e| {
        let d = e.descriptor().unwrap();
        sink.borrow_mut()
            .push((d.text("name").unwrap(), d.element == Some(e.target())));
    });
    engine.perform(
        &batch(r##"{"setAttribute":[{"selector":"#p","name":"role","value":"note"}]}"##),
        BatchOptions::default(),
    );
    assert_eq!(*seen.borrow(), [("role".to_string(), true)]);
    let before = &recorder.events()[0];
    assert_eq!(before.descriptor.as_ref().unwrap().selector(), Some("#p"));
}

#[test]
fn deferred_entry_point_resolves_with_the_report() {
    let (mut engine, recorder) = engine(r#"<div id="x"></div>"#);
    let batch = batch(r##"{"setAttribute":[{"selector":"#x","name":"a","value":"b"}]}"##);
    let report = pollster::block_on(engine.perform_async(&batch, BatchOptions::default())).unwrap();
    assert_eq!(report.applied, 1);
    assert!(recorder.is_paired());
}

#[test]
fn panicking_listener_fails_only_its_own_entry() {
    let (mut engine, _) = engine(r#"<div id="x"></div><p id="y"></p>"#);
    let root = engine.document().root();
    engine
        .events()
        .add_listener(root, "before-remove", |_| panic!("listener exploded"));
    let batch = batch(
        r##"{"remove":[{"selector":"#x"}],"setAttribute":[{"selector":"#y","name":"data-ok","value":"1"}]}"##,
    );
    let report = pollster::block_on(engine.perform_async(&batch, BatchOptions::default())).unwrap();
    assert_eq!(report.applied, 1);
    assert_eq!(report.count(Severity::Execution), 1);
    assert_eq!(report.diagnostics[0].kind, "remove");
    assert_eq!(report.diagnostics[0].message, "panicked: listener exploded");
    let y = engine.document().element_by_id("y").unwrap();
    assert_eq!(engine.document().attribute(y, "data-ok"), Some("1"));
    assert!(engine.document().element_by_id("x").is_some());
}

#[test]
fn panicking_merge_hook_does_not_abort_later_entries() {
    let (mut engine, _) = engine(r#"<div id="m"><p>1</p></div><div id="x"></div>"#);
    engine
        .hooks()
        .add_on_updated(|_, _| panic!("integrator hook failed"));
    let batch = batch(
        r##"{
            "morph": [{"selector": "#m", "html": "<div id=\"m\"><p>2</p></div>"}],
            "setAttribute": [{"selector": "#x", "name": "data-ok", "value": "1"}]
        }"##,
    );
    let report = pollster::block_on(engine.perform_async(&batch, BatchOptions::default())).unwrap();
    assert_eq!(report.applied, 1);
    assert_eq!(report.count(Severity::Execution), 1);
    assert_eq!(report.diagnostics[0].message, "panicked: integrator hook failed");
    let x = engine.document().element_by_id("x").unwrap();
    assert_eq!(engine.document().attribute(x, "data-ok"), Some("1"));
}

/// Panic payload that panics again when the handler drops it.
struct Volatile;

impl Drop for Volatile {
    fn drop(&mut self) {
        panic!("payload dropped");
    }
}

#[test]
fn deferred_entry_point_rejects_when_a_panic_escapes_entry_isolation() {
    let (mut engine, _) = engine(r#"<div id="x"></div>"#);
    let root = engine.document().root();
    engine
        .events()
        .add_listener(root, "before-remove", |_| std::panic::panic_any(Volatile));
    let batch = batch(r##"{"remove":[{"selector":"#x"}]}"##);
    let result = pollster::block_on(engine.perform_async(&batch, BatchOptions::default()));
    assert_eq!(result, Err(PerformError::Panicked("payload dropped".into())));
}

#[test]
fn repeated_batches_keep_the_document_arena_flat() {
    let (mut engine, _) = engine(r#"<ul id="l"></ul>"#);
    let batch = batch(r##"{"innerHtml":[{"selector":"#l","html":"<li>1</li><li>2</li><li>3</li>"}]}"##);
    for _ in 0..2 {
        engine.perform(&batch, BatchOptions::default());
    }
    let live = engine.document().node_count();
    let allocated = engine.document().allocated();
    for _ in 0..1000 {
        engine.perform(&batch, BatchOptions::default());
    }
    assert_eq!(engine.document().node_count(), live);
    assert_eq!(engine.document().allocated(), allocated);
    assert_eq!(markup(&engine), r#"<ul id="l"><li>1</li><li>2</li><li>3</li></ul>"#);
}

#[test]
fn listeners_on_freed_nodes_are_dropped() {
    let (mut engine, _) = engine(r#"<div id="w"><p id="p"></p></div>"#);
    let p = engine.document().element_by_id("p").unwrap();
    engine.events().add_listener(p, "click", |_| {});
    assert_eq!(engine.events().len(), 2);
    let report = engine.perform(
        &batch(r##"{"innerHtml":[{"selector":"#w","html":"<p id=\"p\"></p>"}]}"##),
        BatchOptions::default(),
    );
    assert_eq!(report.applied, 1);
    assert!(!engine.document().contains(p));
    assert_eq!(engine.events().len(), 1);
}

#[test]
fn engine_config_supplies_default_options() {
    let config = ops::EngineConfig::from_toml_str("emit_missing_element_warnings = false").unwrap();
    let engine = Engine::in_memory(Document::new()).with_config(config);
    assert_eq!(engine.default_options(), QUIET);
}
