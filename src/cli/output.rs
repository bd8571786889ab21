//! User-facing output for the CLI: results, expansion traces and test
//! summaries, colorized through termcolor.

use std::io::Write;

use difference::{Changeset, Difference};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::atoms::PrimitiveKind;
use crate::macros::MacroExpansionStep;
use crate::runtime::Interpreter;

// ============================================================================
// RESULTS
// ============================================================================

/// Prints one rendered result per line; error messages go in red.
pub fn print_results(lines: &[ResultLine]) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    for line in lines {
        if line.is_error {
            let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
            let _ = writeln!(stdout, "{}", line.text);
            let _ = stdout.reset();
        } else {
            let _ = writeln!(stdout, "{}", line.text);
        }
    }
}

/// A printed top-level result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultLine {
    pub text: String,
    pub is_error: bool,
}

// ============================================================================
// MACRO TRACE
// ============================================================================

/// Prints a macro expansion trace with colored line diffs between the input
/// and output of each step.
pub fn print_trace(interp: &Interpreter, trace: &[MacroExpansionStep]) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let global = interp.global();

    if trace.is_empty() {
        let _ = writeln!(stdout, "No macro expansions.");
        return;
    }

    for (i, step) in trace.iter().enumerate() {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
        let _ = writeln!(stdout, "--- Step {}: {} ---", i + 1, step.macro_name);
        let _ = stdout.reset();

        let before = pretty(&interp.print(&step.input, &global));
        let after = pretty(&interp.print(&step.output, &global));
        let changeset = Changeset::new(&before, &after, "\n");
        print_diff(&mut stdout, &changeset.diffs);
        let _ = writeln!(stdout);
    }
}

/// Breaks a printed form before each nested list so diffs are per sub-form.
fn pretty(printed: &str) -> String {
    let mut out = String::with_capacity(printed.len());
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for ch in printed.chars() {
        if in_string {
            out.push(ch);
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => {
                in_string = true;
                out.push(ch);
            }
            '(' => {
                if depth > 0 {
                    if out.ends_with(' ') {
                        out.pop();
                    }
                    out.push('\n');
                    out.push_str(&"  ".repeat(depth));
                }
                depth += 1;
                out.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

fn print_diff(stdout: &mut StandardStream, diffs: &[Difference]) {
    for diff in diffs {
        match diff {
            Difference::Same(ref x) => {
                let _ = stdout.reset();
                for line in x.lines() {
                    let _ = writeln!(stdout, " {}", line);
                }
            }
            Difference::Add(ref x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
                for line in x.lines() {
                    let _ = writeln!(stdout, "+{}", line);
                }
            }
            Difference::Rem(ref x) => {
                let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
                for line in x.lines() {
                    let _ = writeln!(stdout, "-{}", line);
                }
            }
        }
    }
    let _ = stdout.reset();
}

// ============================================================================
// PRIMITIVES
// ============================================================================

pub fn print_primitive_list(interp: &Interpreter) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let registry = interp.registry();
    for name in registry.list() {
        let kind = match registry.get(&name).map(|p| p.kind) {
            Some(PrimitiveKind::SpecialForm) => "special form",
            _ => "procedure",
        };
        let _ = stdout.set_color(ColorSpec::new().set_bold(true));
        let _ = write!(stdout, "{:<16}", name);
        let _ = stdout.reset();
        let _ = writeln!(stdout, " {}", kind);
    }
}

// ============================================================================
// TEST SUMMARY
// ============================================================================

/// Writes a PASS/FAIL line, with the expected and actual transcripts on failure.
pub fn write_test_result(
    out: &mut impl WriteColor,
    name: &str,
    expected: &str,
    actual: &str,
) -> std::io::Result<bool> {
    let pass = expected == actual;
    if pass {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
        writeln!(out, "PASS: {}", name)?;
    } else {
        out.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true))?;
        writeln!(out, "FAIL: {}", name)?;
        out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
        writeln!(out, "  Expected: {:?}", expected)?;
        writeln!(out, "  Actual:   {:?}", actual)?;
    }
    out.reset()?;
    Ok(pass)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pretty_breaks_before_nested_lists() {
        assert_eq!(pretty("(if (a) b)"), "(if\n  (a) b)");
        assert_eq!(pretty("(f \"(x)\")"), "(f \"(x)\")");
    }

    #[test]
    fn test_result_reports_pass_and_fail() {
        let mut buffer = termcolor::Buffer::no_color();
        assert!(write_test_result(&mut buffer, "ok.scm", "1", "1").unwrap());
        assert!(!write_test_result(&mut buffer, "bad.scm", "1", "2").unwrap());
        let text = String::from_utf8(buffer.into_inner()).unwrap();
        assert!(text.contains("PASS: ok.scm"));
        assert!(text.contains("FAIL: bad.scm"));
    }
}
