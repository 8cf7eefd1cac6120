//! Shared helpers for the `ops` integration tests: an event recorder, TOML
//! scenario fixtures, and a line diff for readable failures.

mod recorder;
mod scenario;

pub use recorder::{EventRecorder, RecordedEvent};
pub use scenario::{Expectations, Scenario, ScenarioFile, load_scenarios, run_scenario};

use std::fmt::Write;

/// Renders the first differing line with two lines of context on each side.
pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    let max = expected.len().max(actual.len());
    let mut out = String::new();
    let mismatch = (0..max).find(|&i| line(expected, i) != line(actual, i));
    if let Some(i) = mismatch {
        let start = i.saturating_sub(2);
        let end = (i + 3).min(max);
        let _ = writeln!(
            out,
            "first mismatch at line {} (showing {}..={}):",
            i + 1,
            start + 1,
            end
        );
        for at in start..end {
            let marker = if at == i { ">" } else { " " };
            let _ = writeln!(out, "{marker} {:>4}  expected: {}", at + 1, line(expected, at));
            let _ = writeln!(out, "{marker} {:>4}    actual: {}", at + 1, line(actual, at));
        }
    }
    let _ = writeln!(
        out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}

fn line(lines: &[String], i: usize) -> &str {
    lines.get(i).map(String::as_str).unwrap_or("<missing>")
}

/// Splits serialized markup so each element starts a line, which keeps
/// [`diff_lines`] output focused on the node that differs.
pub fn markup_lines(markup: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for ch in markup.chars() {
        if ch == '<' && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn diff_points_at_first_mismatch() {
        let out = diff_lines(&owned(&["a", "b", "c"]), &owned(&["a", "x", "c"]));
        assert!(out.starts_with("first mismatch at line 2"), "{out}");
        assert!(out.contains(">    2  expected: b"), "{out}");
        assert!(out.contains(">    2    actual: x"), "{out}");
    }

    #[test]
    fn diff_reports_missing_lines() {
        let out = diff_lines(&owned(&["a"]), &owned(&["a", "b"]));
        assert!(out.contains("expected: <missing>"), "{out}");
        assert!(out.ends_with("expected 1 lines, actual 2 lines\n"), "{out}");
    }

    #[test]
    fn markup_is_split_per_tag() {
        assert_eq!(
            markup_lines(r#"<p id="a">hi <b>x</b></p>"#),
            owned(&[r#"<p id="a">hi "#, "<b>x", "</b>", "</p>"])
        );
    }
}
