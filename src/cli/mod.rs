//! The Quill command-line interface.
//!
//! Entry point for every subcommand. Loads configuration, builds an
//! [`Interpreter`] and hands results to [`output`] for display.

use std::path::Path;
use std::{fs, process};

use clap::Parser;

use crate::cli::args::{Command, QuillArgs};
use crate::cli::output::ResultLine;
use crate::config::InterpreterConfig;
use crate::errors::{print_error, ErrorKind, SchemeError};
use crate::runtime::Interpreter;
use crate::value::Value;
use crate::{repl, testing};

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = QuillArgs::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            print_error(e);
            process::exit(1);
        }
    };

    let result = match args.command.unwrap_or(Command::Repl) {
        Command::Repl => {
            repl::run_repl(config);
            Ok(())
        }
        Command::Run { file } => handle_run(&file, config),
        Command::Eval { expr } => handle_eval(&expr, config),
        Command::Macrotrace { file } => handle_macrotrace(&file, config),
        Command::Test { path } => handle_test(&path, config),
        Command::ListPrimitives => {
            output::print_primitive_list(&Interpreter::with_config(config));
            Ok(())
        }
    };

    if let Err(e) = result {
        print_error(e);
        process::exit(1);
    }
}

fn load_config(args: &QuillArgs) -> Result<InterpreterConfig, SchemeError> {
    let config = match &args.config {
        Some(path) => InterpreterConfig::load(path)?,
        None => InterpreterConfig::default(),
    };
    Ok(match args.max_depth {
        Some(depth) => config.with_max_depth(depth),
        None => config,
    })
}

// ============================================================================
// PROGRAM EVALUATION
// ============================================================================

/// Reads and evaluates a whole program, rendering each top-level result.
///
/// Results of `define` and `define-syntax` forms are not shown. A reader
/// error aborts before anything is evaluated.
pub fn evaluate_program(interp: &mut Interpreter, name: &str, source: &str) -> Result<Vec<ResultLine>, SchemeError> {
    let forms = interp.read_named(name, source)?;
    let global = interp.global();
    let mut lines = Vec::new();
    for form in &forms {
        let value = interp.eval(form, &global);
        if is_definition(interp, form) && !value.is_error() {
            continue;
        }
        lines.push(ResultLine {
            text: interp.print(&value, &global),
            is_error: value.is_error(),
        });
    }
    Ok(lines)
}

fn is_definition(interp: &Interpreter, form: &Value) -> bool {
    form.first()
        .ok()
        .and_then(|head| head.as_symbol())
        .is_some_and(|symbol| matches!(interp.symbol_name(symbol), "define" | "define-syntax"))
}

fn read_source(path: &Path) -> Result<String, SchemeError> {
    fs::read_to_string(path).map_err(|e| {
        SchemeError::new(ErrorKind::Config {
            message: format!("cannot read '{}': {}", path.display(), e),
        })
    })
}

// ============================================================================
// SUBCOMMANDS
// ============================================================================

fn handle_run(path: &Path, config: InterpreterConfig) -> Result<(), SchemeError> {
    let source = read_source(path)?;
    let mut interp = Interpreter::with_config(config);
    let lines = evaluate_program(&mut interp, &path.display().to_string(), &source)?;
    output::print_results(&lines);
    Ok(())
}

fn handle_eval(expr: &str, config: InterpreterConfig) -> Result<(), SchemeError> {
    let mut interp = Interpreter::with_config(config);
    let lines = evaluate_program(&mut interp, "<eval>", expr)?;
    output::print_results(&lines);
    Ok(())
}

fn handle_macrotrace(path: &Path, config: InterpreterConfig) -> Result<(), SchemeError> {
    let source = read_source(path)?;
    let mut interp = Interpreter::with_config(config.with_trace_macros(true));
    evaluate_program(&mut interp, &path.display().to_string(), &source)?;
    let trace = interp.take_macro_trace();
    output::print_trace(&interp, &trace);
    Ok(())
}

fn handle_test(path: &Path, config: InterpreterConfig) -> Result<(), SchemeError> {
    let summary = testing::run_directory(path, &config)?;
    if summary.failed > 0 {
        process::exit(1);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(source: &str) -> Vec<String> {
        let mut interp = Interpreter::new();
        evaluate_program(&mut interp, "<test>", source)
            .unwrap()
            .into_iter()
            .map(|line| line.text)
            .collect()
    }

    #[test]
    fn definitions_are_not_echoed() {
        assert_eq!(texts("(define x 2) (* x 21)"), vec!["42"]);
    }

    #[test]
    fn errors_are_printed_in_place_of_values() {
        let mut interp = Interpreter::new();
        let lines = evaluate_program(&mut interp, "<test>", "undefined-thing 1").unwrap();
        assert!(lines[0].is_error);
        assert_eq!(lines[0].text, "Variable 'undefined-thing' is not bound");
        assert_eq!(lines[1].text, "1");
    }

    #[test]
    fn failing_definition_is_reported() {
        assert_eq!(texts("(define y (car '()))").len(), 1);
    }
}
