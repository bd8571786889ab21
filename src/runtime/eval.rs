//! # Evaluation Engine
//!
//! `Value × Environment → Value`.
//!
//! - Symbols are looked up along the environment chain.
//! - Pairs are applications: the operator is evaluated first, then
//!   dispatched on its kind.
//! - Everything else evaluates to itself.
//!
//! ## Calling Conventions
//!
//! - **Primitive**: receives the *unevaluated* operands and the caller's
//!   environment. Ordinary primitives evaluate them left to right; special
//!   forms decide for themselves.
//! - **Compound**: operands are evaluated left to right in the caller's
//!   environment and bound in a fresh frame whose parent is the procedure's
//!   captured environment.
//! - **Macro**: the whole call form is expanded without evaluating the
//!   operands, and the expansion is evaluated in the caller's environment.

use std::rc::Rc;

use crate::errors::{arity_mismatch, not_applicable, unbound_variable, SchemeError};
use crate::macros::{MacroExpansionStep, MacroProcedure};
use crate::runtime::environment::Environment;
use crate::runtime::stack::ensure_sufficient_stack;
use crate::runtime::Interpreter;
use crate::value::{CompoundProcedure, EvalResult, Value};

/// Evaluates one expression under the depth guard, growing the native stack
/// as needed.
pub fn evaluate(interp: &mut Interpreter, expr: &Value, env: &Environment) -> EvalResult {
    interp.enter()?;
    let result = ensure_sufficient_stack(|| dispatch(interp, expr, env));
    interp.leave();
    result
}

fn dispatch(interp: &mut Interpreter, expr: &Value, env: &Environment) -> EvalResult {
    match expr {
        Value::Symbol(symbol) => env
            .get(*symbol)
            .ok_or_else(|| unbound_variable(interp.symbol_name(*symbol))),
        Value::Pair(pair) => {
            let operator = evaluate(interp, &pair.car(), env)?;
            apply_form(interp, &operator, expr, env)
        }
        other => Ok(other.clone()),
    }
}

/// Applies an already evaluated operator to the operands of `form`.
fn apply_form(interp: &mut Interpreter, operator: &Value, form: &Value, env: &Environment) -> EvalResult {
    match operator {
        Value::Primitive(primitive) => {
            log::trace!("apply primitive {}", primitive.name);
            let operands = form.rest()?.to_vec(primitive.name)?;
            (primitive.func)(&operands, interp, env)
        }
        Value::Compound(procedure) => {
            log::trace!("apply compound procedure");
            let operands = form.rest()?.to_vec(&procedure_name(interp, procedure))?;
            let args = evaluate_all(interp, &operands, env)?;
            apply_compound(interp, procedure, args)
        }
        Value::Macro(macro_procedure) => {
            let expanded = expand_macro(interp, macro_procedure, form)?;
            evaluate(interp, &expanded, env)
        }
        other => Err(not_applicable(interp.print(other, env))),
    }
}

/// Expands a macro call form once, recording the step when tracing.
pub fn expand_macro(interp: &mut Interpreter, macro_procedure: &MacroProcedure, form: &Value) -> EvalResult {
    let name = form
        .first()?
        .as_symbol()
        .map(|symbol| interp.symbol_name(symbol).to_string())
        .unwrap_or_else(|| "macro".to_string());
    let expanded = macro_procedure.expand(&name, form)?;
    log::debug!("expanded macro '{}'", name);
    interp.record_expansion(MacroExpansionStep {
        macro_name: name,
        input: form.clone(),
        output: expanded.clone(),
    });
    Ok(expanded)
}

/// Evaluates operands left to right.
pub fn evaluate_all(interp: &mut Interpreter, operands: &[Value], env: &Environment) -> Result<Vec<Value>, SchemeError> {
    operands
        .iter()
        .map(|operand| evaluate(interp, operand, env))
        .collect()
}

/// Evaluates a body in order and returns the last value (`Nil` if empty).
pub fn evaluate_sequence(interp: &mut Interpreter, body: &[Value], env: &Environment) -> EvalResult {
    let mut result = Value::Nil;
    for form in body {
        result = evaluate(interp, form, env)?;
    }
    Ok(result)
}

/// Binds `args` to the procedure's formals in a new frame and runs its body.
pub fn apply_compound(interp: &mut Interpreter, procedure: &Rc<CompoundProcedure>, mut args: Vec<Value>) -> EvalResult {
    let required = procedure.params.len();
    let too_many = procedure.rest.is_none() && args.len() > required;
    if args.len() < required || too_many {
        return Err(arity_mismatch(
            &procedure_name(interp, procedure),
            procedure.arity(),
            args.len(),
        ));
    }

    let frame = Environment::extend(&procedure.env);
    let extra = args.split_off(required);
    for (param, arg) in procedure.params.iter().zip(args) {
        frame.put(*param, arg);
    }
    if let Some(rest) = procedure.rest {
        frame.put(rest, Value::list(extra));
    }
    evaluate_sequence(interp, &procedure.body, &frame)
}

fn procedure_name(interp: &Interpreter, procedure: &CompoundProcedure) -> String {
    match procedure.name {
        Some(symbol) => interp.symbol_name(symbol).to_string(),
        None => "lambda".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn eval_str(interp: &mut Interpreter, source: &str) -> Value {
        interp.eval_source(source).unwrap().pop().unwrap()
    }

    #[test]
    fn self_evaluating_values() {
        let mut interp = Interpreter::new();
        assert_eq!(eval_str(&mut interp, "42").as_integer(), Some(42));
        assert!(matches!(eval_str(&mut interp, "\"s\""), Value::String(_)));
        assert!(matches!(eval_str(&mut interp, "#f"), Value::Boolean(false)));
    }

    #[test]
    fn applying_a_number_is_not_applicable() {
        let mut interp = Interpreter::new();
        let value = eval_str(&mut interp, "(1 2)");
        assert!(matches!(
            value.as_error().map(|e| &e.kind),
            Some(ErrorKind::NotApplicable { .. })
        ));
    }

    #[test]
    fn compound_arity_is_checked() {
        let mut interp = Interpreter::new();
        let value = eval_str(&mut interp, "(define (f a b) a) (f 1)");
        match value.as_error().map(|e| &e.kind) {
            Some(ErrorKind::ArityMismatch {
                function,
                expected,
                actual,
            }) => {
                assert_eq!(function, "f");
                assert_eq!(expected, "2");
                assert_eq!(*actual, 1);
            }
            other => panic!("expected arity error, got {:?}", other),
        }
    }

    #[test]
    fn operands_evaluate_in_caller_environment() {
        let mut interp = Interpreter::new();
        let value = eval_str(
            &mut interp,
            "(define x 10) (define (get) x) (let ((x 20)) (get))",
        );
        assert_eq!(value.as_integer(), Some(10));
    }
}
