//! Replays the patch scenarios in `fixtures/scenarios.json` through both
//! wire forms and both ownership modes.

use json_patch_plus::codec::compact::{self, EncodeOptions};
use json_patch_plus::{apply_patch, from_json_patch, ApplyPatchOptions, Op, PatchError, Value};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Scenario {
    name: String,
    doc: Value,
    patch: Value,
    #[serde(default)]
    expected: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

fn load_scenarios() -> Vec<Scenario> {
    let text = include_str!("fixtures/scenarios.json");
    serde_json::from_str(text).unwrap_or_else(|e| panic!("failed to parse scenarios: {e}"))
}

fn run(scenario: &Scenario, ops: &[Op], mutate: bool) -> (Value, Result<Value, PatchError>) {
    let mut doc = scenario.doc.clone();
    let result = apply_patch(&mut doc, ops, &ApplyPatchOptions::new(mutate)).map(|res| res.doc);
    (doc, result)
}

fn check(scenario: &Scenario, ops: &[Op], mutate: bool) {
    let (doc, result) = run(scenario, ops, mutate);
    match (&scenario.expected, &scenario.error, result) {
        (Some(expected), None, Ok(actual)) => {
            assert_eq!(&actual, expected, "{} (mutate = {mutate})", scenario.name);
            if mutate {
                assert_eq!(&doc, expected, "{}: input not updated", scenario.name);
            } else {
                assert_eq!(doc, scenario.doc, "{}: input changed", scenario.name);
            }
        }
        (None, Some(code), Err(err)) => {
            let message = err.to_string();
            assert!(
                message.starts_with(code.as_str()),
                "{}: expected error starting with {code:?}, got {message:?}",
                scenario.name
            );
            if !mutate {
                assert_eq!(doc, scenario.doc, "{}: input changed on failure", scenario.name);
            }
        }
        (_, _, result) => panic!("{}: unexpected outcome {result:?}", scenario.name),
    }
}

#[test]
fn scenarios_apply_from_json_form() {
    let scenarios = load_scenarios();
    assert!(scenarios.len() >= 20);
    for scenario in &scenarios {
        let ops = from_json_patch(&scenario.patch)
            .unwrap_or_else(|e| panic!("{}: decode failed: {e}", scenario.name));
        check(scenario, &ops, false);
        check(scenario, &ops, true);
    }
}

#[test]
fn scenarios_apply_from_compact_form() {
    for scenario in &load_scenarios() {
        let ops = from_json_patch(&scenario.patch).unwrap();
        let wire = compact::encode(&ops, &EncodeOptions::default());
        let decoded = compact::decode(&wire)
            .unwrap_or_else(|e| panic!("{}: compact decode failed: {e}", scenario.name));
        assert_eq!(decoded, ops, "{}", scenario.name);
        check(scenario, &decoded, false);
    }
}
