//! # Mathematical Operations
//!
//! Arithmetic folds left to right over the evaluated operands, starting from
//! the first operand's value. Exactness, width and NaN/Inf handling live in
//! [`crate::numeric`].
//!
//! ## Atoms Provided
//!
//! - **Arithmetic**: `+`, `-`, `*`, `/`
//! - **Comparison**: `=`, `<`, `>`, `<=`, `>=`
//! - **Predicates**: `number?`, `exact?`, `inexact?`
//! - **Conversion**: `exact->inexact`, `inexact->exact`

use std::cmp::Ordering;

use crate::atoms::helpers::{
    check_min_arity, eval_args, eval_single_arg, eval_unary_predicate, extract_number, extract_numbers,
};
use crate::atoms::{AtomRegistry, NativeFn, PrimitiveKind};
use crate::errors::{arity_mismatch, type_mismatch, SchemeError};
use crate::numeric::{Number, Op};
use crate::runtime::environment::Environment;
use crate::runtime::Interpreter;
use crate::value::{EvalResult, Value};

// ============================================================================
// ARITHMETIC OPERATIONS
// ============================================================================

fn fold_numbers(op: Op, identity: Option<Number>, args: &[Value], interp: &mut Interpreter, env: &Environment) -> EvalResult {
    let name = op.symbol();
    let values = eval_args(args, interp, env)?;
    let numbers = extract_numbers(&values, name)?;
    let Some((first, rest)) = numbers.split_first() else {
        return match identity {
            Some(identity) => Ok(Value::number(identity)),
            None => Err(arity_mismatch(name, "at least 1", 0)),
        };
    };
    if rest.is_empty() {
        // Unary minus negates; unary divide takes the reciprocal.
        return match op {
            Op::Sub => Ok(Value::number(first.negate())),
            Op::Div => Ok(Value::number(Number::integer(1).combine(Op::Div, *first)?)),
            Op::Add | Op::Mul => Ok(Value::number(*first)),
        };
    }
    let result = rest
        .iter()
        .try_fold(*first, |acc, next| acc.combine(op, *next))?;
    Ok(Value::number(result))
}

/// Adds numbers.
///
/// Usage: (+ <a> <b> ...)
///   - <a>, <b>, ...: Numbers
///
///   Returns: Number (sum), 0 with no operands
///
/// Example:
///   (+ 1 2 3) ; => 6
///   (+ 1.0 2) ; => 3.0
pub const ATOM_ADD: NativeFn = |args, interp, env| fold_numbers(Op::Add, Some(Number::integer(0)), args, interp, env);

/// Subtracts numbers, or negates a single number.
///
/// Usage: (- <a> [<b> ...])
///
/// Example:
///   (- 10 3 2) ; => 5
///   (- 4) ; => -4
pub const ATOM_SUB: NativeFn = |args, interp, env| fold_numbers(Op::Sub, None, args, interp, env);

/// Multiplies numbers.
///
/// Usage: (* <a> <b> ...)
///
///   Returns: Number (product), 1 with no operands
pub const ATOM_MUL: NativeFn = |args, interp, env| fold_numbers(Op::Mul, Some(Number::integer(1)), args, interp, env);

/// Divides numbers, or takes the reciprocal of a single number.
///
/// Usage: (/ <a> [<b> ...])
///
/// Example:
///   (/ 1 3) ; => 1/3
///   (/ 1 0) ; => error: Division by zero in '/'
pub const ATOM_DIV: NativeFn = |args, interp, env| fold_numbers(Op::Div, None, args, interp, env);

// ============================================================================
// COMPARISON
// ============================================================================

fn compare_chain(
    name: &str,
    args: &[Value],
    interp: &mut Interpreter,
    env: &Environment,
    accept: fn(Ordering) -> bool,
) -> EvalResult {
    check_min_arity(name, args, 1)?;
    let values = eval_args(args, interp, env)?;
    let numbers = extract_numbers(&values, name)?;
    for (index, number) in numbers.iter().enumerate() {
        if number.is_complex() {
            return Err(type_mismatch(name, index, "complex", "real number"));
        }
    }
    let holds = numbers
        .windows(2)
        .all(|pair| pair[0].compare(&pair[1]).is_some_and(accept));
    Ok(Value::Boolean(holds))
}

/// Numeric equality; complex numbers compare part by part.
///
/// Usage: (= <a> <b> ...)
///
/// Example:
///   (= 1 1.0) ; => #t
pub const ATOM_EQ: NativeFn = |args, interp, env| {
    check_min_arity("=", args, 1)?;
    let values = eval_args(args, interp, env)?;
    let numbers = extract_numbers(&values, "=")?;
    let holds = numbers.windows(2).all(|pair| pair[0].num_eq(&pair[1]));
    Ok(Value::Boolean(holds))
};

/// Usage: (< <a> <b> ...) ; strictly increasing
pub const ATOM_LT: NativeFn = |args, interp, env| compare_chain("<", args, interp, env, Ordering::is_lt);

/// Usage: (> <a> <b> ...) ; strictly decreasing
pub const ATOM_GT: NativeFn = |args, interp, env| compare_chain(">", args, interp, env, Ordering::is_gt);

/// Usage: (<= <a> <b> ...)
pub const ATOM_LTE: NativeFn = |args, interp, env| compare_chain("<=", args, interp, env, Ordering::is_le);

/// Usage: (>= <a> <b> ...)
pub const ATOM_GTE: NativeFn = |args, interp, env| compare_chain(">=", args, interp, env, Ordering::is_ge);

// ============================================================================
// PREDICATES AND CONVERSION
// ============================================================================

/// Usage: (number? <x>)
pub const ATOM_IS_NUMBER: NativeFn =
    |args, interp, env| eval_unary_predicate("number?", args, interp, env, |v| matches!(v, Value::Number(_)));

/// Usage: (exact? <number>)
pub const ATOM_IS_EXACT: NativeFn = |args, interp, env| {
    let number = single_number("exact?", args, interp, env)?;
    Ok(Value::Boolean(number.is_exact()))
};

/// Usage: (inexact? <number>)
pub const ATOM_IS_INEXACT: NativeFn = |args, interp, env| {
    let number = single_number("inexact?", args, interp, env)?;
    Ok(Value::Boolean(!number.is_exact()))
};

/// Converts to a float of width 0.
///
/// Usage: (exact->inexact <number>)
///
/// Example:
///   (exact->inexact 1/4) ; => 0.25
pub const ATOM_EXACT_TO_INEXACT: NativeFn = |args, interp, env| {
    let number = single_number("exact->inexact", args, interp, env)?;
    Ok(Value::number(number.to_inexact()))
};

/// Converts a float `v` of width `w` to `round(v * 10^w) / 10^w`, reduced.
///
/// Usage: (inexact->exact <number>)
///
/// Example:
///   (inexact->exact 0.25) ; => 1/4
pub const ATOM_INEXACT_TO_EXACT: NativeFn = |args, interp, env| {
    let number = single_number("inexact->exact", args, interp, env)?;
    Ok(Value::number(number.to_exact()?))
};

fn single_number(name: &str, args: &[Value], interp: &mut Interpreter, env: &Environment) -> Result<Number, SchemeError> {
    let value = eval_single_arg(name, args, interp, env)?;
    extract_number(&value, name, 0)
}

// ============================================================================
// REGISTRATION
// ============================================================================

pub fn register_math_atoms(registry: &mut AtomRegistry) {
    let atoms: [(&'static str, NativeFn); 14] = [
        ("+", ATOM_ADD),
        ("-", ATOM_SUB),
        ("*", ATOM_MUL),
        ("/", ATOM_DIV),
        ("=", ATOM_EQ),
        ("<", ATOM_LT),
        (">", ATOM_GT),
        ("<=", ATOM_LTE),
        (">=", ATOM_GTE),
        ("number?", ATOM_IS_NUMBER),
        ("exact?", ATOM_IS_EXACT),
        ("inexact?", ATOM_IS_INEXACT),
        ("exact->inexact", ATOM_EXACT_TO_INEXACT),
        ("inexact->exact", ATOM_INEXACT_TO_EXACT),
    ];
    for (name, func) in atoms {
        registry.register(name, func, PrimitiveKind::Procedure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn run(source: &str) -> String {
        let mut interp = Interpreter::new();
        let global = interp.global();
        let values = interp.eval_source(source).unwrap();
        interp.print(values.last().unwrap(), &global)
    }

    #[test]
    fn exact_and_inexact_sums() {
        assert_eq!(run("(+ 1 2 3)"), "6");
        assert_eq!(run("(+ 1.0 2)"), "3.0");
        assert_eq!(run("(+)"), "0");
        assert_eq!(run("(*)"), "1");
        assert_eq!(run("(- 5)"), "-5");
        assert_eq!(run("(/ 4)"), "1/4");
        assert_eq!(run("(/ 6 4)"), "3/2");
    }

    #[test]
    fn division_by_zero_is_an_error_value() {
        let mut interp = Interpreter::new();
        let value = interp.eval_source("(/ 1 0)").unwrap().remove(0);
        assert!(matches!(
            value.as_error().map(|e| &e.kind),
            Some(ErrorKind::DivisionByZero { function }) if function == "/"
        ));
    }

    #[test]
    fn non_number_operand_is_type_mismatch() {
        let mut interp = Interpreter::new();
        let value = interp.eval_source("(+ 1 \"two\")").unwrap().remove(0);
        assert!(matches!(
            value.as_error().map(|e| &e.kind),
            Some(ErrorKind::TypeMismatch { index: 1, .. })
        ));
    }

    #[test]
    fn comparisons_chain() {
        assert_eq!(run("(< 1 2 3)"), "#t");
        assert_eq!(run("(< 1 3 2)"), "#f");
        assert_eq!(run("(>= 3 3 1)"), "#t");
        assert_eq!(run("(= 1 1.0 2/2)"), "#t");
        assert_eq!(run("(< +nan.0 1)"), "#f");
    }

    #[test]
    fn conversions() {
        assert_eq!(run("(exact->inexact 1/4)"), "0.25");
        assert_eq!(run("(inexact->exact 0.5)"), "1/2");
        assert_eq!(run("(exact? 1/2)"), "#t");
        assert_eq!(run("(inexact? 1.5)"), "#t");
    }
}
