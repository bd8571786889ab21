//! Runs every transcript in tests/scripts/ and compares its output with the
//! sibling .expected file.

use std::path::Path;

use quill::testing;
use quill::InterpreterConfig;
use termcolor::{ColorChoice, StandardStream};

#[test]
fn integration_scripts() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/scripts");
    let cases = testing::discover(&root).expect("scripts directory should be readable");
    assert!(!cases.is_empty(), "No .scm test scripts found in tests/scripts/");

    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let summary = testing::run_directory_with_output(&root, &InterpreterConfig::default(), &mut stdout)
        .expect("scripts should run");

    assert_eq!(summary.passed, cases.len());
    assert_eq!(summary.failed, 0, "Some integration scripts failed");
}

#[test]
fn cases_are_sorted_and_paired() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/scripts");
    let cases = testing::discover(&root).unwrap();
    let mut sorted = cases.clone();
    sorted.sort_by(|a, b| a.script.cmp(&b.script));
    assert_eq!(cases, sorted);
    for case in &cases {
        assert_eq!(case.expected.extension().unwrap(), "expected");
        assert_eq!(case.expected.file_stem(), case.script.file_stem());
    }
}
