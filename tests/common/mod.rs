//! Shared helpers for integration tests.
#![allow(dead_code)]

use quill::{Interpreter, InterpreterConfig};

/// Evaluates every form in `source` and returns the printed results.
pub fn eval_all(source: &str) -> Vec<String> {
    eval_all_in(&mut Interpreter::new(), source)
}

pub fn eval_all_in(interp: &mut Interpreter, source: &str) -> Vec<String> {
    let values = interp.eval_source(source).expect("source should parse");
    let global = interp.global();
    values.iter().map(|v| interp.print(v, &global)).collect()
}

/// Printed result of the last form in `source`.
pub fn eval_last(source: &str) -> String {
    eval_all(source).pop().expect("at least one form")
}

pub fn eval_last_with(config: InterpreterConfig, source: &str) -> String {
    let mut interp = Interpreter::with_config(config);
    eval_all_in(&mut interp, source).pop().expect("at least one form")
}
