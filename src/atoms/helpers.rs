//! # Primitive Helper Infrastructure
//!
//! Argument evaluation, arity validation and type extraction shared by all
//! primitives, so every primitive reports errors the same way.

use crate::errors::{arity_mismatch, type_mismatch, SchemeError};
use crate::numeric::Number;
use crate::runtime::environment::Environment;
use crate::runtime::eval::{evaluate, evaluate_all};
use crate::runtime::symbol::Symbol;
use crate::runtime::Interpreter;
use crate::value::{EvalResult, Value};

// ============================================================================
// ARITY VALIDATION
// ============================================================================

/// Requires exactly `expected` operands.
pub fn check_arity(name: &str, args: &[Value], expected: usize) -> Result<(), SchemeError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(arity_mismatch(name, expected, args.len()))
    }
}

/// Requires at least `min` operands.
pub fn check_min_arity(name: &str, args: &[Value], min: usize) -> Result<(), SchemeError> {
    if args.len() >= min {
        Ok(())
    } else {
        Err(arity_mismatch(name, format!("at least {}", min), args.len()))
    }
}

/// Requires between `min` and `max` operands inclusive.
pub fn check_arity_range(name: &str, args: &[Value], min: usize, max: usize) -> Result<(), SchemeError> {
    if (min..=max).contains(&args.len()) {
        Ok(())
    } else {
        Err(arity_mismatch(name, format!("{} or {}", min, max), args.len()))
    }
}

// ============================================================================
// ARGUMENT EVALUATION
// ============================================================================

/// Evaluates all operands left to right.
pub fn eval_args(args: &[Value], interp: &mut Interpreter, env: &Environment) -> Result<Vec<Value>, SchemeError> {
    evaluate_all(interp, args, env)
}

/// Checks arity, then evaluates exactly `N` operands.
pub fn eval_n_args<const N: usize>(
    name: &str,
    args: &[Value],
    interp: &mut Interpreter,
    env: &Environment,
) -> Result<[Value; N], SchemeError> {
    check_arity(name, args, N)?;
    let values = eval_args(args, interp, env)?;
    values
        .try_into()
        .map_err(|_| arity_mismatch(name, N, args.len()))
}

/// Evaluates a single operand.
pub fn eval_single_arg(name: &str, args: &[Value], interp: &mut Interpreter, env: &Environment) -> EvalResult {
    check_arity(name, args, 1)?;
    evaluate(interp, &args[0], env)
}

// ============================================================================
// TYPE EXTRACTION
// ============================================================================

pub fn extract_number(value: &Value, name: &str, index: usize) -> Result<Number, SchemeError> {
    value
        .as_number()
        .ok_or_else(|| type_mismatch(name, index, value.type_name(), "number"))
}

pub fn extract_numbers(values: &[Value], name: &str) -> Result<Vec<Number>, SchemeError> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| extract_number(value, name, index))
        .collect()
}

pub fn extract_symbol(value: &Value, name: &str, index: usize) -> Result<Symbol, SchemeError> {
    value
        .as_symbol()
        .ok_or_else(|| type_mismatch(name, index, value.type_name(), "symbol"))
}

/// Evaluates one operand and wraps a predicate result as a boolean.
pub fn eval_unary_predicate(
    name: &str,
    args: &[Value],
    interp: &mut Interpreter,
    env: &Environment,
    predicate: impl Fn(&Value) -> bool,
) -> EvalResult {
    let value = eval_single_arg(name, args, interp, env)?;
    Ok(Value::Boolean(predicate(&value)))
}
