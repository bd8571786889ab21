//! End-to-end evaluation through the public `Interpreter` API.

mod common;

use common::{eval_all, eval_last, eval_last_with};
use quill::{ErrorKind, Interpreter, InterpreterConfig, Value};

// ============================================================================
// CORE FORMS
// ============================================================================

#[test]
fn nested_arithmetic() {
    assert_eq!(eval_last("(+ 1 (* 2 3) (- 10 4))"), "13");
}

#[test]
fn recursive_definition() {
    assert_eq!(
        eval_last("(define (fact n) (if (= n 0) 1 (* n (fact (- n 1))))) (fact 10)"),
        "3628800"
    );
}

#[test]
fn closures_keep_private_state() {
    let results = eval_all(
        "(define (make-counter)
           (let ((n 0))
             (lambda () (set! n (+ n 1)) n)))
         (define a (make-counter))
         (define b (make-counter))
         (a) (a) (b)",
    );
    assert_eq!(results[3..], ["1", "2", "1"]);
}

#[test]
fn named_let_loops() {
    assert_eq!(
        eval_last("(let loop ((i 0) (acc '())) (if (= i 3) acc (loop (+ i 1) (cons i acc))))"),
        "(2 1 0)"
    );
}

#[test]
fn let_initializers_see_outer_scope() {
    assert_eq!(eval_last("(define x 1) (let ((x 2) (y x)) (list x y))"), "(2 1)");
}

#[test]
fn variadic_parameters() {
    assert_eq!(eval_last("((lambda (x . more) more) 1 2 3)"), "(2 3)");
    assert_eq!(eval_last("((lambda args args))"), "()");
    assert_eq!(eval_last("(define (f a . rest) (length rest)) (f 1 2 3 4)"), "3");
}

#[test]
fn cond_clauses() {
    assert_eq!(eval_last("(cond ((= 1 2) 'a) (else 'b))"), "b");
    assert_eq!(eval_last("(cond (#f 1) ((+ 1 2) => (lambda (x) (* x 10))) (else 0))"), "30");
    assert_eq!(eval_last("(cond (#f) (7))"), "7");
    assert_eq!(eval_last("(cond (#f 1))"), "()");
}

#[test]
fn cond_arrow_evaluates_test_once() {
    let results = eval_all(
        "(define n 0)
         (cond ((begin (set! n (+ n 1)) n) => (lambda (v) v)))
         n",
    );
    assert_eq!(results[1..], ["1", "1"]);
}

#[test]
fn only_false_is_false() {
    assert_eq!(eval_last("(if '() 'yes 'no)"), "yes");
    assert_eq!(eval_last("(if 0 'yes 'no)"), "yes");
    assert_eq!(eval_last("(if #f 'yes)"), "()");
}

#[test]
fn pair_mutation() {
    assert_eq!(eval_last("(define p (cons 1 2)) (set-car! p 10) (set-cdr! p '(20)) p"), "(10 20)");
}

#[test]
fn equivalence_predicates() {
    let results = eval_all(
        "(eq? 'a 'a) (eqv? 2 2) (eqv? 2 2.0) (equal? '(1 (2 \"s\")) '(1 (2 \"s\"))) (eq? '(1) '(1))",
    );
    assert_eq!(results, ["#t", "#t", "#f", "#t", "#f"]);
}

// ============================================================================
// PRINTING
// ============================================================================

#[test]
fn procedures_print_with_their_binding_name() {
    let results = eval_all("(define (sq x) (* x x)) sq car (lambda (x) x)");
    assert_eq!(results[1..], ["#<procedure sq>", "#<procedure car>", "#<procedure>"]);
}

#[test]
fn macros_print_with_their_binding_name() {
    assert_eq!(
        eval_last("(define-syntax swap! (syntax-rules () ((_ a b) (let ((t a)) (set! a b) (set! b t))))) swap!"),
        "#<macro swap!>"
    );
}

#[test]
fn strings_print_escaped_and_read_back() {
    let mut interp = Interpreter::new();
    let printed = common::eval_all_in(&mut interp, r#""say \"hi\"\n""#).pop().unwrap();
    assert_eq!(printed, r#""say \"hi\"\n""#);
    assert_eq!(common::eval_all_in(&mut interp, &printed), [printed.clone()]);
}

#[test]
fn dotted_and_nested_lists_print() {
    assert_eq!(eval_last("'(1 (2 . 3) . 4)"), "(1 (2 . 3) . 4)");
}

// ============================================================================
// ERRORS AS VALUES
// ============================================================================

fn error_kind(source: &str) -> ErrorKind {
    let mut interp = Interpreter::new();
    let value = interp.eval_source(source).unwrap().pop().unwrap();
    match value {
        Value::Error(error) => error.kind.clone(),
        other => panic!("expected an error, got {:?}", other),
    }
}

#[test]
fn unbound_variable_in_operand() {
    assert_eq!(eval_last("(+ x 1)"), "Variable 'x' is not bound");
    assert!(matches!(error_kind("(+ x 1)"), ErrorKind::UnboundVariable { ref symbol } if symbol == "x"));
}

#[test]
fn set_requires_existing_binding() {
    assert!(matches!(error_kind("(set! nowhere 1)"), ErrorKind::UnboundVariable { .. }));
}

#[test]
fn accessor_type_errors_name_the_primitive() {
    assert_eq!(
        error_kind("(car 5)"),
        ErrorKind::TypeMismatch {
            function: "car".into(),
            index: 0,
            actual: "number".into(),
            expected: "pair".into(),
        }
    );
}

#[test]
fn applying_a_non_procedure() {
    assert!(matches!(error_kind("(\"f\" 1)"), ErrorKind::NotApplicable { .. }));
}

#[test]
fn malformed_special_forms() {
    assert!(matches!(error_kind("(if)"), ErrorKind::ArityMismatch { .. }));
    assert!(matches!(error_kind("(lambda (1) 1)"), ErrorKind::TypeMismatch { .. }));
    assert!(matches!(error_kind("(let ((x)) x)"), ErrorKind::InvalidSyntax { .. }));
    assert!(matches!(error_kind("(cond (else 1) (#t 2))"), ErrorKind::InvalidSyntax { .. }));
}

#[test]
fn errors_do_not_stop_later_forms() {
    let results = eval_all("(car '()) (define y 3) (* y 2)");
    assert!(results[0].starts_with("Function 'car'"));
    assert_eq!(results[2], "6");
}

#[test]
fn runaway_recursion_reports_recursion_limit() {
    let config = InterpreterConfig::default().with_max_depth(50);
    assert_eq!(
        eval_last_with(config, "(define (forever n) (+ 1 (forever n))) (forever 0)"),
        "Recursion limit of 50 exceeded"
    );
}

const COUNT: &str = "(define (count n) (if (= n 0) 0 (+ 1 (count (- n 1)))))";

/// Runs `f` on a thread with a deliberately small native stack.
fn on_small_stack<F: FnOnce() -> String + Send + 'static>(f: F) -> String {
    std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(f)
        .expect("spawn test thread")
        .join()
        .expect("evaluation thread panicked")
}

#[test]
fn bounded_recursion_fits_the_default_limit_on_a_small_stack() {
    let result = on_small_stack(|| eval_last(&format!("{} (count 300)", COUNT)));
    assert_eq!(result, "300");
}

#[test]
fn deep_recursion_grows_the_native_stack() {
    let result = on_small_stack(|| {
        let config = InterpreterConfig::default().with_max_depth(10_000);
        eval_last_with(config, &format!("{} (count 2000)", COUNT))
    });
    assert_eq!(result, "2000");
}

#[test]
fn default_limit_is_reached_before_the_native_stack_runs_out() {
    let result = on_small_stack(|| eval_last("(define (forever n) (+ 1 (forever n))) (forever 0)"));
    assert_eq!(result, "Recursion limit of 1000 exceeded");
}

#[test]
fn interpreters_do_not_share_state() {
    let mut first = Interpreter::new();
    let mut second = Interpreter::new();
    common::eval_all_in(&mut first, "(define shared 1)");
    assert_eq!(common::eval_all_in(&mut second, "shared"), ["Variable 'shared' is not bound"]);
}
