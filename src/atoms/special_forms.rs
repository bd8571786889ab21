//! # Special Forms
//!
//! Primitives that control the evaluation of their own operands.
//!
//! ## Forms Provided
//!
//! - **Quotation**: `quote`
//! - **Control**: `if`, `cond`, `begin`
//! - **Binding**: `let`, `define`, `set!`, `lambda`
//! - **Macros**: `define-syntax`, `syntax-rules`
//!
//! `cond` is a derived form: it is rewritten into nested `if` calls and the
//! rewrite is evaluated. The rewrite uses primitive values directly as
//! operators so that user rebindings of `if` or `lambda` cannot change it.

use std::rc::Rc;

use crate::atoms::helpers::{check_arity, check_arity_range, check_min_arity, extract_symbol};
use crate::atoms::{AtomRegistry, NativeFn, Primitive, PrimitiveKind};
use crate::errors::{invalid_syntax, type_mismatch, unbound_variable, SchemeError};
use crate::macros::MacroProcedure;
use crate::runtime::environment::Environment;
use crate::runtime::eval::{apply_compound, evaluate, evaluate_all, evaluate_sequence};
use crate::runtime::symbol::Symbol;
use crate::runtime::Interpreter;
use crate::value::{CompoundProcedure, EvalResult, Value};

// ============================================================================
// QUOTATION AND CONTROL
// ============================================================================

/// Returns its operand unevaluated.
///
/// Usage: (quote <datum>)
///
///   Returns: <datum>
///
/// Example:
///   (quote (a b)) ; => (a b)
pub const ATOM_QUOTE: NativeFn = |args, _interp, _env| {
    check_arity("quote", args, 1)?;
    Ok(args[0].clone())
};

/// Conditional evaluation. Only `#f` is false.
///
/// Usage: (if <test> <then> [<else>])
///
///   Returns: the chosen branch, or () when the test fails and no else is given
///
/// Example:
///   (if (< 1 2) 'yes 'no) ; => yes
pub const ATOM_IF: NativeFn = |args, interp, env| {
    check_arity_range("if", args, 2, 3)?;
    let test = evaluate(interp, &args[0], env)?;
    if test.is_true() {
        evaluate(interp, &args[1], env)
    } else if let Some(alternative) = args.get(2) {
        evaluate(interp, alternative, env)
    } else {
        Ok(Value::Nil)
    }
};

/// Multi-way conditional.
///
/// Usage: (cond (<test> <body> ...) ... (<test> => <recipient>) ... (else <body> ...))
///
///   Returns: the body value of the first clause whose test is true
///
/// Example:
///   (cond ((= 1 2) 'a) (else 'b)) ; => b
pub const ATOM_COND: NativeFn = |args, interp, env| {
    let clauses = args
        .iter()
        .enumerate()
        .map(|(i, clause)| parse_cond_clause(interp, clause, i + 1 == args.len()))
        .collect::<Result<Vec<_>, _>>()?;
    let Some(first) = clauses.into_iter().next() else {
        return Ok(Value::Nil);
    };
    let rewritten = rewrite_cond(interp, first, &args[1..], env)?;
    evaluate(interp, &rewritten, env)
};

/// Evaluates forms in order.
///
/// Usage: (begin <form> ...)
///
///   Returns: the value of the last form, () when empty
pub const ATOM_BEGIN: NativeFn = |args, interp, env| evaluate_sequence(interp, args, env);

// ============================================================================
// BINDING FORMS
// ============================================================================

/// Local bindings. Initializers are evaluated in the enclosing environment.
///
/// Usage: (let ((<name> <init>) ...) <body> ...)
///        (let <loop-name> ((<name> <init>) ...) <body> ...)
///
/// Example:
///   (let ((x 1) (y 2)) (+ x y)) ; => 3
pub const ATOM_LET: NativeFn = |args, interp, env| {
    check_min_arity("let", args, 2)?;
    if let Some(loop_name) = args[0].as_symbol() {
        return named_let(interp, loop_name, &args[1..], env);
    }

    let (names, inits) = let_bindings(&args[0])?;
    let values = evaluate_all(interp, &inits, env)?;
    let frame = Environment::extend(env);
    for (name, value) in names.into_iter().zip(values) {
        frame.put(name, value);
    }
    evaluate_sequence(interp, &args[1..], &frame)
};

/// Binds a name in the current frame.
///
/// Usage: (define <name> <expr>)
///        (define (<name> <param> ... [. <rest>]) <body> ...)
///
///   Returns: ()
pub const ATOM_DEFINE: NativeFn = |args, interp, env| {
    check_min_arity("define", args, 2)?;
    match &args[0] {
        Value::Symbol(name) => {
            check_arity("define", args, 2)?;
            let value = evaluate(interp, &args[1], env)?;
            log::debug!("define {}", interp.symbol_name(*name));
            env.put(*name, value);
            Ok(Value::Nil)
        }
        Value::Pair(head) => {
            let name = head
                .car()
                .as_symbol()
                .ok_or_else(|| invalid_syntax("define", "procedure name must be a symbol"))?;
            let procedure = make_procedure(&head.cdr(), &args[1..], env, Some(name))?;
            log::debug!("define procedure {}", interp.symbol_name(name));
            env.put(name, procedure);
            Ok(Value::Nil)
        }
        other => Err(type_mismatch("define", 0, other.type_name(), "symbol")),
    }
};

/// Assigns an existing binding anywhere on the environment chain.
///
/// Usage: (set! <name> <expr>)
///
///   Returns: ()
pub const ATOM_SET: NativeFn = |args, interp, env| {
    check_arity("set!", args, 2)?;
    let name = extract_symbol(&args[0], "set!", 0)?;
    let value = evaluate(interp, &args[1], env)?;
    if env.assign(name, value) {
        Ok(Value::Nil)
    } else {
        Err(unbound_variable(interp.symbol_name(name)))
    }
};

/// Creates a procedure closing over the current environment.
///
/// Usage: (lambda (<param> ... [. <rest>]) <body> ...)
///        (lambda <args> <body> ...)
///
/// Example:
///   ((lambda (x . more) more) 1 2 3) ; => (2 3)
pub const ATOM_LAMBDA: NativeFn = |args, _interp, env| {
    check_min_arity("lambda", args, 1)?;
    make_procedure(&args[0], &args[1..], env, None)
};

// ============================================================================
// MACROS
// ============================================================================

/// Binds a syntax-rules transformer.
///
/// Usage: (define-syntax <name> (syntax-rules (<literal> ...) (<pattern> <template>) ...))
///
///   Returns: ()
pub const ATOM_DEFINE_SYNTAX: NativeFn = |args, interp, env| {
    check_arity("define-syntax", args, 2)?;
    let name = extract_symbol(&args[0], "define-syntax", 0)?;
    let transformer = evaluate(interp, &args[1], env)?;
    if !matches!(transformer, Value::Macro(_)) {
        return Err(invalid_syntax("define-syntax", "expected a syntax-rules transformer"));
    }
    log::debug!("define-syntax {}", interp.symbol_name(name));
    env.put(name, transformer);
    Ok(Value::Nil)
};

/// Builds a macro value.
///
/// Usage: (syntax-rules (<literal> ...) (<pattern> <template>) ...)
pub const ATOM_SYNTAX_RULES: NativeFn = |args, interp, _env| {
    check_min_arity("syntax-rules", args, 1)?;
    let compiled = MacroProcedure::compile(&args[0], &args[1..], interp.well_known.rule_symbols())?;
    Ok(Value::Macro(Rc::new(compiled)))
};

// ============================================================================
// SUPPORT
// ============================================================================

/// Builds a compound procedure, validating every formal parameter now.
pub fn make_procedure(formals: &Value, body: &[Value], env: &Environment, name: Option<Symbol>) -> EvalResult {
    if body.is_empty() {
        return Err(invalid_syntax("lambda", "procedure body must not be empty"));
    }
    let (items, tail) = formals.list_parts();
    let mut params = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let symbol = item
            .as_symbol()
            .ok_or_else(|| type_mismatch("lambda", index, item.type_name(), "symbol"))?;
        if params.contains(&symbol) {
            return Err(invalid_syntax("lambda", "duplicate parameter"));
        }
        params.push(symbol);
    }
    let rest = match tail {
        Value::Nil => None,
        Value::Symbol(symbol) if !params.contains(&symbol) => Some(symbol),
        Value::Symbol(_) => return Err(invalid_syntax("lambda", "duplicate parameter")),
        other => return Err(type_mismatch("lambda", items.len(), other.type_name(), "symbol")),
    };
    Ok(Value::Compound(Rc::new(CompoundProcedure {
        params,
        rest,
        body: body.to_vec(),
        env: env.clone(),
        name,
    })))
}

fn let_bindings(bindings: &Value) -> Result<(Vec<Symbol>, Vec<Value>), SchemeError> {
    let mut names = Vec::new();
    let mut inits = Vec::new();
    for binding in bindings.to_vec("let")? {
        let parts = binding.to_vec("let")?;
        let [name, init] = parts.as_slice() else {
            return Err(invalid_syntax("let", "each binding must be (name init)"));
        };
        let name = name
            .as_symbol()
            .ok_or_else(|| invalid_syntax("let", "binding name must be a symbol"))?;
        if names.contains(&name) {
            return Err(invalid_syntax("let", "duplicate binding"));
        }
        names.push(name);
        inits.push(init.clone());
    }
    Ok((names, inits))
}

/// `(let loop ((v init) ...) body ...)`: binds `loop` to a procedure over
/// the variables in a frame only the procedure can see, then calls it.
fn named_let(interp: &mut Interpreter, loop_name: Symbol, args: &[Value], env: &Environment) -> EvalResult {
    check_min_arity("let", args, 2)?;
    let (names, inits) = let_bindings(&args[0])?;
    let values = evaluate_all(interp, &inits, env)?;
    let frame = Environment::extend(env);
    let procedure = Rc::new(CompoundProcedure {
        params: names,
        rest: None,
        body: args[1..].to_vec(),
        env: frame.clone(),
        name: Some(loop_name),
    });
    frame.put(loop_name, Value::Compound(procedure.clone()));
    apply_compound(interp, &procedure, values)
}

/// A special form as a first-class operator value.
fn core_form(name: &'static str, func: NativeFn) -> Value {
    Value::Primitive(Rc::new(Primitive {
        name,
        func,
        kind: PrimitiveKind::SpecialForm,
    }))
}

enum CondClause {
    Else(Vec<Value>),
    /// `(test)`: the test value is the result.
    TestOnly(Value),
    /// `(test => recipient)`
    Arrow(Value, Value),
    Body(Value, Vec<Value>),
}

fn parse_cond_clause(interp: &Interpreter, clause: &Value, last: bool) -> Result<CondClause, SchemeError> {
    let parts = clause.to_vec("cond")?;
    let Some((test, body)) = parts.split_first() else {
        return Err(invalid_syntax("cond", "empty clause"));
    };
    if test.as_symbol() == Some(interp.well_known.else_) {
        if !last {
            return Err(invalid_syntax("cond", "else clause must be last"));
        }
        if body.is_empty() {
            return Err(invalid_syntax("cond", "else clause needs a body"));
        }
        return Ok(CondClause::Else(body.to_vec()));
    }
    match body {
        [] => Ok(CondClause::TestOnly(test.clone())),
        [arrow, recipient] if arrow.as_symbol() == Some(interp.well_known.arrow) => {
            Ok(CondClause::Arrow(test.clone(), recipient.clone()))
        }
        [arrow, ..] if arrow.as_symbol() == Some(interp.well_known.arrow) => {
            Err(invalid_syntax("cond", "=> clause needs exactly one recipient"))
        }
        _ => Ok(CondClause::Body(test.clone(), body.to_vec())),
    }
}

/// Rewrites the first clause into `(if test body (cond rest ...))`. Tests
/// whose value is reused are evaluated here, once, and spliced in quoted.
fn rewrite_cond(interp: &mut Interpreter, clause: CondClause, rest: &[Value], env: &Environment) -> EvalResult {
    let (test, consequent) = match clause {
        CondClause::Else(body) => return Ok(sequence(&body)),
        CondClause::Body(test, body) => (test, sequence(&body)),
        CondClause::TestOnly(test) => {
            let value = quoted(evaluate(interp, &test, env)?);
            (value.clone(), value)
        }
        CondClause::Arrow(test, recipient) => {
            let value = quoted(evaluate(interp, &test, env)?);
            (value.clone(), Value::list(vec![recipient, value]))
        }
    };
    let mut branch = vec![core_form("if", ATOM_IF), test, consequent];
    if !rest.is_empty() {
        let mut alternative = vec![core_form("cond", ATOM_COND)];
        alternative.extend(rest.iter().cloned());
        branch.push(Value::list(alternative));
    }
    Ok(Value::list(branch))
}

fn quoted(value: Value) -> Value {
    Value::list(vec![core_form("quote", ATOM_QUOTE), value])
}

/// A single form stays as is; several are wrapped in `begin`.
fn sequence(body: &[Value]) -> Value {
    match body {
        [single] => single.clone(),
        _ => {
            let mut forms = vec![core_form("begin", ATOM_BEGIN)];
            forms.extend(body.iter().cloned());
            Value::list(forms)
        }
    }
}

// ============================================================================
// REGISTRATION
// ============================================================================

pub fn register_special_forms(registry: &mut AtomRegistry) {
    let forms: [(&'static str, NativeFn); 10] = [
        ("quote", ATOM_QUOTE),
        ("if", ATOM_IF),
        ("cond", ATOM_COND),
        ("begin", ATOM_BEGIN),
        ("let", ATOM_LET),
        ("define", ATOM_DEFINE),
        ("set!", ATOM_SET),
        ("lambda", ATOM_LAMBDA),
        ("define-syntax", ATOM_DEFINE_SYNTAX),
        ("syntax-rules", ATOM_SYNTAX_RULES),
    ];
    for (name, func) in forms {
        registry.register(name, func, PrimitiveKind::SpecialForm);
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
        let last = values.last().cloned().unwrap_or_default();
        interp.print(&last, &global)
    }

    fn error_kind(source: &str) -> ErrorKind {
        let mut interp = Interpreter::new();
        let values = interp.eval_source(source).unwrap();
        let last = values.last().cloned().unwrap_or_default();
        last.as_error().map(|e| e.kind.clone()).expect("expected an error value")
    }

    #[test]
    fn quote_requires_exactly_one_operand() {
        assert_eq!(run("(quote (a . b))"), "(a . b)");
        assert!(matches!(error_kind("(quote a b)"), ErrorKind::ArityMismatch { .. }));
    }

    #[test]
    fn if_without_alternative_is_nil() {
        assert_eq!(run("(if #f 1)"), "()");
        assert_eq!(run("(if '() 1 2)"), "1");
    }

    #[test]
    fn cond_clauses() {
        assert_eq!(run("(cond (#f 1) ((= 1 1) 2 3) (else 4))"), "3");
        assert_eq!(run("(cond (#f 1))"), "()");
        assert_eq!(run("(cond ((car '(7 8)) => (lambda (x) (* x 2))) (else 0))"), "14");
        assert_eq!(run("(cond (#f => car) (else 'none))"), "none");
        assert_eq!(run("(cond ((+ 1 1)) (else 0))"), "2");
        assert!(matches!(error_kind("(cond (else 1) (#t 2))"), ErrorKind::InvalidSyntax { .. }));
        assert!(matches!(error_kind("(cond (#t 1) (else 2) (#f 3))"), ErrorKind::InvalidSyntax { .. }));
        assert!(matches!(error_kind("(cond (#t => car cdr))"), ErrorKind::InvalidSyntax { .. }));
    }

    #[test]
    fn cond_reused_test_values_are_not_reevaluated() {
        assert_eq!(run("(cond ((list 1 2) => cdr))"), "(2)");
        assert_eq!(run("(cond ((list 'a 'b)))"), "(a b)");
    }

    #[test]
    fn later_cond_clauses_run_in_the_cond_environment() {
        assert_eq!(run("(cond (#f) (else (define y 7))) y"), "7");
        assert_eq!(run("(cond (#f => car) (#t (define z 8))) z"), "8");
        assert_eq!(run("(define (f) (cond (#f) (else (define w 1))) w) (f)"), "1");
    }

    #[test]
    fn let_initializers_see_enclosing_scope() {
        assert_eq!(run("(define x 1) (let ((x 2) (y x)) y)"), "1");
        assert_eq!(run("(let loop ((i 0) (acc '())) (if (= i 3) acc (loop (+ i 1) (cons i acc))))"), "(2 1 0)");
    }

    #[test]
    fn define_returns_nil_and_binds() {
        assert_eq!(run("(define x 5)"), "()");
        assert_eq!(run("(define (f x . rest) (cons x rest)) (f 1 2 3)"), "(1 2 3)");
        assert_eq!(run("(define (f) 1) f"), "#<procedure f>");
    }

    #[test]
    fn lambda_rejects_non_symbol_formals_immediately() {
        match error_kind("(lambda (x 1) x)") {
            ErrorKind::TypeMismatch { function, index, actual, expected } => {
                assert_eq!(function, "lambda");
                assert_eq!(index, 1);
                assert_eq!(actual, "number");
                assert_eq!(expected, "symbol");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn set_requires_existing_binding() {
        assert_eq!(run("(define x 1) (define (bump) (set! x (+ x 1))) (bump) (bump) x"), "3");
        assert!(matches!(error_kind("(set! nope 1)"), ErrorKind::UnboundVariable { .. }));
    }

    #[test]
    fn syntax_rules_rejects_reserved_literals() {
        assert!(matches!(
            error_kind("(syntax-rules (...) ((_ a) a))"),
            ErrorKind::InvalidSyntax { .. }
        ));
        assert!(matches!(
            error_kind("(syntax-rules (_) ((_ a) a))"),
            ErrorKind::InvalidSyntax { .. }
        ));
        assert!(matches!(error_kind("(define-syntax m 5)"), ErrorKind::InvalidSyntax { .. }));
    }
}
