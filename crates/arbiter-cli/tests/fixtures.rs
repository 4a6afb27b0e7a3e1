//! End-to-end CLI integration tests using test fixtures.
//!
//! Each fixture in `tests/fixtures/` contains:
//! - `policy.json` and `request.json`
//! - optionally an `arbiter.toml` (and the policy directories it points at)
//! - an `expected.response.json` (timestamps and tool version use placeholders)
//!
//! These tests run the CLI against each fixture and verify:
//! 1. Exit code matches the aggregate decision
//! 2. JSON output matches expected (ignoring timestamps and version)

use arbiter_test_util::normalize_nondeterministic;
use assert_cmd::Command;
use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to get a Command for the arbiter binary.
/// Wraps the deprecated cargo_bin to centralize the deprecation warning.
#[allow(deprecated)]
fn arbiter_cmd() -> Command {
    Command::cargo_bin("arbiter").expect("arbiter binary not found - run `cargo build` first")
}

/// Get the path to the test fixtures directory
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("arbiter-cli crate should have a parent directory")
        .parent()
        .expect("crates directory should have a parent (repo root)")
        .join("tests")
        .join("fixtures")
}

/// Run `arbiter evaluate` against a fixture and return the exit code and the
/// JSON response written to `--out`.
fn run_evaluate_on_fixture(fixture_name: &str) -> (i32, Value) {
    let fixture_path = fixtures_dir().join(fixture_name);
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let response_path = temp_dir.path().join("response.json");

    let output = arbiter_cmd()
        .arg("--config")
        .arg(fixture_path.join("arbiter.toml"))
        .arg("evaluate")
        .arg("--policy")
        .arg(fixture_path.join("policy.json"))
        .arg("--request")
        .arg(fixture_path.join("request.json"))
        .arg("--out")
        .arg(&response_path)
        .output()
        .expect("Failed to run command");

    let exit_code = output.status.code().unwrap_or(-1);

    let content = std::fs::read_to_string(&response_path).expect("Failed to read response");
    let response: Value = serde_json::from_str(&content).expect("Failed to parse response JSON");

    (exit_code, response)
}

fn load_expected_response(fixture_name: &str) -> Value {
    let expected_path = fixtures_dir()
        .join(fixture_name)
        .join("expected.response.json");
    let content =
        std::fs::read_to_string(&expected_path).expect("Failed to read expected response");
    serde_json::from_str(&content).expect("Failed to parse expected response")
}

fn assert_fixture(fixture_name: &str, expected_exit: i32) {
    let (exit_code, actual) = run_evaluate_on_fixture(fixture_name);
    let actual = normalize_nondeterministic(actual);
    let expected = normalize_nondeterministic(load_expected_response(fixture_name));

    assert_eq!(
        actual,
        expected,
        "Response mismatch for fixture '{}'.\n\nActual:\n{}\n\nExpected:\n{}",
        fixture_name,
        serde_json::to_string_pretty(&actual).unwrap(),
        serde_json::to_string_pretty(&expected).unwrap()
    );
    assert_eq!(
        exit_code, expected_exit,
        "unexpected exit code for fixture '{}'",
        fixture_name
    );
}

// ============================================================================
// Fixture tests
// ============================================================================

#[test]
fn fixture_permit_with_obligation() {
    assert_fixture("permit-with-obligation", 0);
}

#[test]
fn fixture_deny_overrides() {
    assert_fixture("deny-overrides", 2);
}

#[test]
fn fixture_not_applicable() {
    assert_fixture("not-applicable", 3);
}

#[test]
fn fixture_missing_attribute() {
    assert_fixture("missing-attribute", 4);
}

#[test]
fn fixture_static_attributes() {
    assert_fixture("static-attributes", 0);
}

#[test]
fn fixture_hierarchical_descendants() {
    assert_fixture("hierarchical-descendants", 2);
}

#[test]
fn fixture_policy_references() {
    assert_fixture("policy-references", 0);
}

#[test]
fn fixture_invalid_policy() {
    assert_fixture("invalid-policy", 4);
}

#[test]
fn fixture_unresolved_reference() {
    assert_fixture("unresolved-reference", 4);
}
