//! # List Operations
//!
//! Pair construction, access and mutation, plus list utilities. Accessor
//! errors name the primitive and report the offending argument's type.

use crate::atoms::helpers::{eval_args, eval_n_args, eval_single_arg, eval_unary_predicate};
use crate::atoms::{AtomRegistry, NativeFn, PrimitiveKind};
use crate::value::Value;

/// Usage: (cons <car> <cdr>)
///
/// Example:
///   (cons 1 '(2)) ; => (1 2)
pub const ATOM_CONS: NativeFn = |args, interp, env| {
    let [car, cdr] = eval_n_args::<2>("cons", args, interp, env)?;
    Ok(Value::cons(car, cdr))
};

/// Usage: (car <pair>)
///
/// Example:
///   (car '()) ; => error: Function 'car' passed incorrect type for argument 0. Got (), expected pair.
pub const ATOM_CAR: NativeFn = |args, interp, env| eval_single_arg("car", args, interp, env)?.first();

/// Usage: (cdr <pair>)
pub const ATOM_CDR: NativeFn = |args, interp, env| eval_single_arg("cdr", args, interp, env)?.rest();

/// Usage: (set-car! <pair> <value>)
pub const ATOM_SET_CAR: NativeFn = |args, interp, env| {
    let [pair, value] = eval_n_args::<2>("set-car!", args, interp, env)?;
    pair.set_first(value)?;
    Ok(Value::Nil)
};

/// Usage: (set-cdr! <pair> <value>)
pub const ATOM_SET_CDR: NativeFn = |args, interp, env| {
    let [pair, value] = eval_n_args::<2>("set-cdr!", args, interp, env)?;
    pair.set_rest(value)?;
    Ok(Value::Nil)
};

/// Usage: (list <item> ...)
pub const ATOM_LIST: NativeFn = |args, interp, env| Ok(Value::list(eval_args(args, interp, env)?));

/// Usage: (length <list>)
///
/// Example:
///   (length '(a b c)) ; => 3
pub const ATOM_LENGTH: NativeFn = |args, interp, env| {
    let list = eval_single_arg("length", args, interp, env)?;
    let items = list.to_vec("length")?;
    Ok(Value::integer(items.len() as i64))
};

/// Usage: (null? <x>)
pub const ATOM_IS_NULL: NativeFn = |args, interp, env| eval_unary_predicate("null?", args, interp, env, Value::is_nil);

/// Usage: (pair? <x>)
pub const ATOM_IS_PAIR: NativeFn = |args, interp, env| eval_unary_predicate("pair?", args, interp, env, Value::is_pair);

pub fn register_list_atoms(registry: &mut AtomRegistry) {
    let atoms: [(&'static str, NativeFn); 9] = [
        ("cons", ATOM_CONS),
        ("car", ATOM_CAR),
        ("cdr", ATOM_CDR),
        ("set-car!", ATOM_SET_CAR),
        ("set-cdr!", ATOM_SET_CDR),
        ("list", ATOM_LIST),
        ("length", ATOM_LENGTH),
        ("null?", ATOM_IS_NULL),
        ("pair?", ATOM_IS_PAIR),
    ];
    for (name, func) in atoms {
        registry.register(name, func, PrimitiveKind::Procedure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::runtime::Interpreter;

    fn run(source: &str) -> String {
        let mut interp = Interpreter::new();
        let global = interp.global();
        let values = interp.eval_source(source).unwrap();
        interp.print(values.last().unwrap(), &global)
    }

    #[test]
    fn car_of_empty_list_names_car() {
        let mut interp = Interpreter::new();
        let value = interp.eval_source("(car '())").unwrap().remove(0);
        assert_eq!(
            value.as_error().map(|e| e.kind.clone()),
            Some(ErrorKind::TypeMismatch {
                function: "car".into(),
                index: 0,
                actual: "()".into(),
                expected: "pair".into(),
            })
        );
    }

    #[test]
    fn construction_and_access() {
        assert_eq!(run("(cons 1 2)"), "(1 . 2)");
        assert_eq!(run("(list 1 (list 2 3) \"s\")"), "(1 (2 3) \"s\")");
        assert_eq!(run("(cdr '(1 2 3))"), "(2 3)");
        assert_eq!(run("(length '())"), "0");
        assert_eq!(run("(null? '())"), "#t");
        assert_eq!(run("(pair? '())"), "#f");
    }

    #[test]
    fn mutation_is_visible_through_aliases() {
        assert_eq!(run("(define p (list 1 2)) (define q p) (set-car! q 9) p"), "(9 2)");
        assert_eq!(run("(define p (list 1 2)) (set-cdr! p 3) p"), "(1 . 3)");
    }
}
