use ops_test_support::{load_scenarios, run_scenario};
use std::path::Path;

#[test]
fn fixture_scenarios() {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let scenarios = load_scenarios(&dir);
    assert!(!scenarios.is_empty(), "no scenarios under {dir:?}");

    let mut failures = Vec::new();
    for (path, scenario) in &scenarios {
        if let Err(problem) = run_scenario(scenario) {
            failures.push(format!("{} ({}):\n{problem}", scenario.name, path.display()));
        }
    }
    assert!(
        failures.is_empty(),
        "{} of {} scenarios failed:\n\n{}",
        failures.len(),
        scenarios.len(),
        failures.join("\n\n")
    );
}
