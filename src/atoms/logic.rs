//! # Logic and Equivalence
//!
//! `not`, the three equivalence predicates and the type predicates.

use crate::atoms::helpers::{eval_n_args, eval_unary_predicate};
use crate::atoms::{AtomRegistry, NativeFn, PrimitiveKind};
use crate::value::Value;

/// Usage: (not <x>) ; #t only for #f
pub const ATOM_NOT: NativeFn = |args, interp, env| eval_unary_predicate("not", args, interp, env, |v| !v.is_true());

/// Identity.
///
/// Usage: (eq? <a> <b>)
///
/// Example:
///   (eq? 'a 'a) ; => #t
pub const ATOM_EQ: NativeFn = |args, interp, env| {
    let [a, b] = eval_n_args::<2>("eq?", args, interp, env)?;
    Ok(Value::Boolean(a.is_identical(&b)))
};

/// Usage: (eqv? <a> <b>)
pub const ATOM_EQV: NativeFn = |args, interp, env| {
    let [a, b] = eval_n_args::<2>("eqv?", args, interp, env)?;
    Ok(Value::Boolean(a.eqv(&b)))
};

/// Structural equality.
///
/// Usage: (equal? <a> <b>)
///
/// Example:
///   (equal? '(1 "x") (list 1 "x")) ; => #t
pub const ATOM_EQUAL: NativeFn = |args, interp, env| {
    let [a, b] = eval_n_args::<2>("equal?", args, interp, env)?;
    Ok(Value::Boolean(a.equal(&b)))
};

pub const ATOM_IS_BOOLEAN: NativeFn =
    |args, interp, env| eval_unary_predicate("boolean?", args, interp, env, |v| matches!(v, Value::Boolean(_)));

pub const ATOM_IS_SYMBOL: NativeFn =
    |args, interp, env| eval_unary_predicate("symbol?", args, interp, env, |v| matches!(v, Value::Symbol(_)));

pub const ATOM_IS_STRING: NativeFn =
    |args, interp, env| eval_unary_predicate("string?", args, interp, env, |v| matches!(v, Value::String(_)));

pub const ATOM_IS_PROCEDURE: NativeFn =
    |args, interp, env| eval_unary_predicate("procedure?", args, interp, env, Value::is_procedure);

pub fn register_logic_atoms(registry: &mut AtomRegistry) {
    let atoms: [(&'static str, NativeFn); 8] = [
        ("not", ATOM_NOT),
        ("eq?", ATOM_EQ),
        ("eqv?", ATOM_EQV),
        ("equal?", ATOM_EQUAL),
        ("boolean?", ATOM_IS_BOOLEAN),
        ("symbol?", ATOM_IS_SYMBOL),
        ("string?", ATOM_IS_STRING),
        ("procedure?", ATOM_IS_PROCEDURE),
    ];
    for (name, func) in atoms {
        registry.register(name, func, PrimitiveKind::Procedure);
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::Interpreter;

    fn run(source: &str) -> String {
        let mut interp = Interpreter::new();
        let global = interp.global();
        let values = interp.eval_source(source).unwrap();
        interp.print(values.last().unwrap(), &global)
    }

    #[test]
    fn equivalence_predicates() {
        assert_eq!(run("(eq? 'a 'a)"), "#t");
        assert_eq!(run("(eq? '(1) '(1))"), "#f");
        assert_eq!(run("(eqv? 2 2)"), "#t");
        assert_eq!(run("(eqv? 2 2.0)"), "#f");
        assert_eq!(run("(equal? '(1 (2 \"x\")) (list 1 (list 2 \"x\")))"), "#t");
    }

    #[test]
    fn type_predicates() {
        assert_eq!(run("(not 0)"), "#f");
        assert_eq!(run("(not #f)"), "#t");
        assert_eq!(run("(symbol? 'a)"), "#t");
        assert_eq!(run("(string? \"a\")"), "#t");
        assert_eq!(run("(boolean? '())"), "#f");
        assert_eq!(run("(procedure? car)"), "#t");
        assert_eq!(run("(procedure? (lambda (x) x))"), "#t");
        assert_eq!(run("(procedure? 'car)"), "#f");
    }
}
