//! # Transcript Tests
//!
//! Discovers `.scm` programs that have a sibling `.expected` file and checks
//! that evaluating the program prints exactly the expected transcript, one
//! result per line. Used by `quill test` and by the integration suite.

use std::fs;
use std::path::{Path, PathBuf};

use termcolor::{ColorChoice, StandardStream, WriteColor};
use walkdir::WalkDir;

use crate::cli::evaluate_program;
use crate::cli::output::write_test_result;
use crate::config::InterpreterConfig;
use crate::errors::{ErrorKind, SchemeError};
use crate::runtime::Interpreter;

/// A program and the transcript it should produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptCase {
    pub script: PathBuf,
    pub expected: PathBuf,
}

impl TranscriptCase {
    pub fn name(&self) -> String {
        self.script
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.script.display().to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TestSummary {
    pub passed: usize,
    pub failed: usize,
}

// ============================================================================
// DISCOVERY
// ============================================================================

/// Recursively finds transcript cases under `root`, sorted by path.
pub fn discover(root: impl AsRef<Path>) -> Result<Vec<TranscriptCase>, SchemeError> {
    let mut cases = Vec::new();
    for entry in WalkDir::new(root.as_ref()) {
        let entry = entry.map_err(|e| io_error(format!("failed to walk directory: {}", e)))?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "scm") {
            continue;
        }
        let expected = path.with_extension("expected");
        if expected.is_file() {
            cases.push(TranscriptCase {
                script: path.to_path_buf(),
                expected,
            });
        } else {
            log::warn!("skipping {}: no .expected file", path.display());
        }
    }
    cases.sort_by(|a, b| a.script.cmp(&b.script));
    Ok(cases)
}

// ============================================================================
// EXECUTION
// ============================================================================

/// Evaluates `source` in a fresh interpreter and returns its transcript.
/// A reader error becomes the whole transcript.
pub fn transcript(name: &str, source: &str, config: &InterpreterConfig) -> String {
    let mut interp = Interpreter::with_config(config.clone());
    match evaluate_program(&mut interp, name, source) {
        Ok(lines) => lines
            .into_iter()
            .map(|line| line.text)
            .collect::<Vec<_>>()
            .join("\n"),
        Err(e) => e.message(),
    }
}

/// Runs one case, returning `(expected, actual)` with line endings normalized.
pub fn run_case(case: &TranscriptCase, config: &InterpreterConfig) -> Result<(String, String), SchemeError> {
    let source = read_normalized(&case.script)?;
    let expected = read_normalized(&case.expected)?;
    let actual = transcript(&case.script.display().to_string(), &source, config);
    Ok((expected, actual.trim().to_string()))
}

/// Runs every case under `root`, reporting each to stdout.
pub fn run_directory(root: &Path, config: &InterpreterConfig) -> Result<TestSummary, SchemeError> {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    run_directory_with_output(root, config, &mut stdout)
}

pub fn run_directory_with_output(
    root: &Path,
    config: &InterpreterConfig,
    out: &mut impl WriteColor,
) -> Result<TestSummary, SchemeError> {
    let cases = discover(root)?;
    let mut summary = TestSummary::default();
    for case in &cases {
        let (expected, actual) = run_case(case, config)?;
        let pass = write_test_result(out, &case.name(), &expected, &actual)
            .map_err(|e| io_error(e.to_string()))?;
        if pass {
            summary.passed += 1;
        } else {
            summary.failed += 1;
        }
    }
    writeln!(out, "{} passed, {} failed", summary.passed, summary.failed).map_err(|e| io_error(e.to_string()))?;
    Ok(summary)
}

fn read_normalized(path: &Path) -> Result<String, SchemeError> {
    let text = fs::read_to_string(path).map_err(|e| io_error(format!("cannot read '{}': {}", path.display(), e)))?;
    Ok(text.replace("\r\n", "\n").trim().to_string())
}

fn io_error(message: String) -> SchemeError {
    SchemeError::new(ErrorKind::Config { message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transcript_prints_one_result_per_line() {
        let config = InterpreterConfig::default();
        assert_eq!(transcript("<t>", "(define x 1) x (+ x 1)", &config), "1\n2");
    }

    #[test]
    fn reader_error_replaces_the_transcript() {
        let config = InterpreterConfig::default();
        let text = transcript("<t>", "(+ 1", &config);
        assert!(text.starts_with("Malformed input: unexpected end of input"), "{}", text);
    }
}
