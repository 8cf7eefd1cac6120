//! TOML scenario fixtures: a page, a batch, and what the page, the event
//! trace and the report should look like afterwards.
//!
//! ```toml
//! [[scenario]]
//! name = "set attribute"
//! page = '<div id="x"></div>'
//! batch = '{"setAttribute":[{"selector":"#x","name":"data-state","value":"open"}]}'
//!
//! [scenario.expect]
//! html = '<div id="x" data-state="open"></div>'
//! events = ["before-setAttribute #x", "after-setAttribute #x"]
//! ```

use crate::recorder::EventRecorder;
use crate::{diff_lines, markup_lines};
use html::Document;
use ops::{BatchOptions, Engine, OperationBatch, Severity};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFile {
    pub scenario: Vec<Scenario>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    pub name: String,
    pub page: String,
    /// JSON operation batch.
    pub batch: String,
    #[serde(default = "default_true")]
    pub emit_missing_element_warnings: bool,
    /// Selector of an element to focus before the batch runs.
    #[serde(default)]
    pub focus: Option<String>,
    #[serde(default)]
    pub expect: Expectations,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expectations {
    /// Serialized document after the batch.
    pub html: Option<String>,
    /// Event trace lines, `<event> <target label>`.
    pub events: Option<Vec<String>>,
    /// Selector the focused element must match; `""` means nothing focused.
    pub focused: Option<String>,
    #[serde(default)]
    pub resolution_failures: usize,
    #[serde(default)]
    pub execution_failures: usize,
}

fn default_true() -> bool {
    true
}

/// Every `*.toml` file directly under `dir`, sorted by path.
pub fn load_scenarios(dir: &Path) -> Vec<(PathBuf, Scenario)> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap_or_else(|err| panic!("failed to read scenario dir {dir:?}: {err}"))
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();
    let mut out = Vec::new();
    for path in paths {
        let content = fs::read_to_string(&path)
            .unwrap_or_else(|err| panic!("failed to read scenario file {path:?}: {err}"));
        let file: ScenarioFile = toml::from_str(&content)
            .unwrap_or_else(|err| panic!("failed to parse scenario file {path:?}: {err}"));
        out.extend(file.scenario.into_iter().map(|s| (path.clone(), s)));
    }
    out
}

/// Runs one scenario on a fresh in-memory engine. `Err` carries a readable
/// description of every expectation that did not hold.
pub fn run_scenario(scenario: &Scenario) -> Result<(), String> {
    let mut engine = Engine::in_memory(Document::parse(&scenario.page));
    if let Some(selector) = &scenario.focus {
        let doc = engine.document_mut();
        let node = css::query_selector(doc, doc.root(), selector)
            .ok()
            .flatten()
            .ok_or_else(|| format!("focus selector {selector:?} matched nothing"))?;
        doc.focus(node);
    }
    let recorder = EventRecorder::new();
    let root = engine.document().root();
    recorder.attach(engine.events(), root);

    let batch = OperationBatch::from_json(&scenario.batch).map_err(|e| format!("bad batch: {e}"))?;
    let report = engine.perform(
        &batch,
        BatchOptions {
            emit_missing_element_warnings: scenario.emit_missing_element_warnings,
        },
    );

    let mut problems = Vec::new();
    let doc = engine.document();
    if let Some(html) = &scenario.expect.html {
        let actual = doc.inner_html(doc.root());
        if &actual != html {
            problems.push(format!(
                "markup differs:\n{}",
                diff_lines(&markup_lines(html), &markup_lines(&actual))
            ));
        }
    }
    if let Some(events) = &scenario.expect.events {
        let actual = recorder.lines();
        if &actual != events {
            problems.push(format!("event trace differs:\n{}", diff_lines(events, &actual)));
        }
    }
    if let Some(focused) = &scenario.expect.focused {
        let active = doc.active_element();
        let ok = match (focused.as_str(), active) {
            ("", None) => true,
            ("", Some(_)) | (_, None) => false,
            (selector, Some(node)) => css::element_matches(doc, node, selector).unwrap_or(false),
        };
        if !ok {
            problems.push(format!("focus: expected {focused:?}, active element is {active:?}"));
        }
    }
    for (severity, want) in [
        (Severity::Resolution, scenario.expect.resolution_failures),
        (Severity::Execution, scenario.expect.execution_failures),
    ] {
        let got = report.count(severity);
        if got != want {
            problems.push(format!(
                "expected {want} {severity} failures, got {got}: {:?}",
                report.diagnostics
            ));
        }
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems.join("\n"))
    }
}
