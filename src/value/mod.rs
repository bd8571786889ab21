//! # Values
//!
//! The object graph the interpreter evaluates. Heap variants sit behind `Rc`,
//! so cloning a [`Value`] is a retain and dropping it is a release; `Nil` and
//! booleans are immediates that carry no count.
//!
//! ## Ownership
//!
//! - Pairs own their `car` and `cdr` and may be mutated in place
//!   (`set-car!`, `set-cdr!`).
//! - Compound procedures own their body and share their captured
//!   [`Environment`].
//! - Numbers are stored packed and unzipped on demand for arithmetic.
//!
//! A closure stored in the frame it captures forms a reference cycle that
//! plain counting never reclaims. The interpreter clears its global frame on
//! drop; cycles rooted in inner frames leak.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::errors::{type_mismatch, SchemeError};
use crate::macros::MacroProcedure;
use crate::numeric::{Number, PackedNumber};
use crate::runtime::environment::Environment;
use crate::runtime::symbol::Symbol;
use crate::runtime::Interpreter;

pub mod printer;

pub use printer::to_display_string;

/// Result type threaded through evaluation and every primitive.
pub type EvalResult = Result<Value, SchemeError>;

/// Native primitive signature: unevaluated operands plus the caller's
/// environment. Primitives evaluate their own operands.
pub type NativeFn = fn(args: &[Value], interp: &mut Interpreter, env: &Environment) -> EvalResult;

// ============================================================================
// CORE TYPES
// ============================================================================

#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Nil,
    Boolean(bool),
    Number(Rc<PackedNumber>),
    String(Rc<str>),
    Symbol(Symbol),
    Pair(Rc<Pair>),
    Error(Rc<SchemeError>),
    Primitive(Rc<Primitive>),
    Compound(Rc<CompoundProcedure>),
    Macro(Rc<MacroProcedure>),
}

/// A mutable cons cell.
#[derive(Debug)]
pub struct Pair {
    car: RefCell<Value>,
    cdr: RefCell<Value>,
}

impl Pair {
    pub fn car(&self) -> Value {
        self.car.borrow().clone()
    }

    pub fn cdr(&self) -> Value {
        self.cdr.borrow().clone()
    }

    pub fn set_car(&self, value: Value) {
        *self.car.borrow_mut() = value;
    }

    pub fn set_cdr(&self, value: Value) {
        *self.cdr.borrow_mut() = value;
    }
}

impl Drop for Pair {
    // Unlink uniquely owned tails one cell at a time so that releasing a long
    // list does not recurse once per element.
    fn drop(&mut self) {
        let mut next = std::mem::take(self.cdr.get_mut());
        while let Value::Pair(cell) = next {
            match Rc::try_unwrap(cell) {
                Ok(mut pair) => next = std::mem::take(pair.cdr.get_mut()),
                Err(_) => break,
            }
        }
    }
}

/// Whether a primitive evaluates its operands itself in a non-applicative
/// order. Purely descriptive: both kinds receive unevaluated operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    SpecialForm,
    Procedure,
}

/// A native procedure or special form.
#[derive(Clone)]
pub struct Primitive {
    pub name: &'static str,
    pub func: NativeFn,
    pub kind: PrimitiveKind,
}

impl fmt::Debug for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Primitive")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// A user procedure created by `lambda` or `define`.
#[derive(Debug)]
pub struct CompoundProcedure {
    pub params: Vec<Symbol>,
    /// Variadic tail parameter collecting extra arguments as a list.
    pub rest: Option<Symbol>,
    pub body: Vec<Value>,
    pub env: Environment,
    /// Name given by `(define (name ...) ...)`, used in arity errors.
    pub name: Option<Symbol>,
}

impl CompoundProcedure {
    pub fn arity(&self) -> String {
        match self.rest {
            Some(_) => format!("at least {}", self.params.len()),
            None => self.params.len().to_string(),
        }
    }
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

impl Value {
    pub fn integer(value: i64) -> Value {
        Value::number(Number::integer(value))
    }

    pub fn number(number: Number) -> Value {
        Value::Number(Rc::new(PackedNumber::zip(&number)))
    }

    pub fn string(text: &str) -> Value {
        Value::String(Rc::from(text))
    }

    pub fn boolean(value: bool) -> Value {
        Value::Boolean(value)
    }

    pub fn symbol(symbol: Symbol) -> Value {
        Value::Symbol(symbol)
    }

    pub fn error(error: SchemeError) -> Value {
        Value::Error(Rc::new(error))
    }

    pub fn cons(car: Value, cdr: Value) -> Value {
        Value::Pair(Rc::new(Pair {
            car: RefCell::new(car),
            cdr: RefCell::new(cdr),
        }))
    }

    /// Builds a proper list.
    ///
    /// ```rust
    /// use quill::value::Value;
    /// let list = Value::list(vec![Value::integer(1), Value::integer(2)]);
    /// assert_eq!(list.list_len(), Some(2));
    /// ```
    pub fn list(items: Vec<Value>) -> Value {
        Value::list_with_tail(items, Value::Nil)
    }

    /// Builds `(a b ... . tail)`.
    pub fn list_with_tail(items: Vec<Value>, tail: Value) -> Value {
        items
            .into_iter()
            .rev()
            .fold(tail, |rest, item| Value::cons(item, rest))
    }

    // ========================================================================
    // REFERENCE COUNTING
    // ========================================================================

    /// Takes a new owning reference.
    pub fn retain(&self) -> Value {
        self.clone()
    }

    /// Gives up an owning reference; the last release frees the object.
    pub fn release(self) {
        drop(self)
    }

    /// Current reference count, or `None` for immediates.
    pub fn ref_count(&self) -> Option<usize> {
        match self {
            Value::Nil | Value::Boolean(_) | Value::Symbol(_) => None,
            Value::Number(rc) => Some(Rc::strong_count(rc)),
            Value::String(rc) => Some(Rc::strong_count(rc)),
            Value::Pair(rc) => Some(Rc::strong_count(rc)),
            Value::Error(rc) => Some(Rc::strong_count(rc)),
            Value::Primitive(rc) => Some(Rc::strong_count(rc)),
            Value::Compound(rc) => Some(Rc::strong_count(rc)),
            Value::Macro(rc) => Some(Rc::strong_count(rc)),
        }
    }

    // ========================================================================
    // INSPECTION
    // ========================================================================

    /// Type name used in error messages.
    ///
    /// ```rust
    /// use quill::value::Value;
    /// assert_eq!(Value::Nil.type_name(), "()");
    /// assert_eq!(Value::integer(3).type_name(), "number");
    /// ```
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "()",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Pair(_) => "pair",
            Value::Error(_) => "error",
            Value::Primitive(_) | Value::Compound(_) => "procedure",
            Value::Macro(_) => "macro",
        }
    }

    /// Everything except `#f` counts as true.
    pub fn is_true(&self) -> bool {
        !matches!(self, Value::Boolean(false))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_pair(&self) -> bool {
        matches!(self, Value::Pair(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn is_procedure(&self) -> bool {
        matches!(self, Value::Primitive(_) | Value::Compound(_))
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(packed) => Some(packed.unzip()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        self.as_number().and_then(|n| n.as_integer())
    }

    pub fn as_symbol(&self) -> Option<Symbol> {
        match self {
            Value::Symbol(symbol) => Some(*symbol),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&SchemeError> {
        match self {
            Value::Error(error) => Some(error.as_ref()),
            _ => None,
        }
    }

    // ========================================================================
    // PAIR ACCESSORS
    // ========================================================================

    pub fn first(&self) -> EvalResult {
        self.pair("car").map(Pair::car)
    }

    pub fn rest(&self) -> EvalResult {
        self.pair("cdr").map(Pair::cdr)
    }

    pub fn set_first(&self, value: Value) -> Result<(), SchemeError> {
        self.pair("set-car!").map(|pair| pair.set_car(value))
    }

    pub fn set_rest(&self, value: Value) -> Result<(), SchemeError> {
        self.pair("set-cdr!").map(|pair| pair.set_cdr(value))
    }

    fn pair(&self, function: &str) -> Result<&Pair, SchemeError> {
        match self {
            Value::Pair(pair) => Ok(pair.as_ref()),
            other => Err(type_mismatch(function, 0, other.type_name(), "pair")),
        }
    }

    // ========================================================================
    // LIST WALKING
    // ========================================================================

    /// Splits a possibly improper list into its elements and final tail.
    pub fn list_parts(&self) -> (Vec<Value>, Value) {
        let mut items = Vec::new();
        let mut current = self.clone();
        while let Value::Pair(pair) = current {
            items.push(pair.car());
            current = pair.cdr();
        }
        (items, current)
    }

    /// Elements of a proper list; `TypeMismatch` naming `function` otherwise.
    pub fn to_vec(&self, function: &str) -> Result<Vec<Value>, SchemeError> {
        let (items, tail) = self.list_parts();
        if tail.is_nil() {
            Ok(items)
        } else {
            Err(type_mismatch(function, 0, self.type_name(), "list"))
        }
    }

    /// Length of a proper list, `None` for improper lists and non-lists.
    pub fn list_len(&self) -> Option<usize> {
        let (items, tail) = self.list_parts();
        tail.is_nil().then_some(items.len())
    }

    // ========================================================================
    // EQUIVALENCE
    // ========================================================================

    /// `eq?`: same object. Immediates and numbers compare by value.
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => {
                Rc::ptr_eq(a, b) || a.unzip().eqv(&b.unzip())
            }
            (Value::String(a), Value::String(b)) => Rc::ptr_eq(a, b),
            (Value::Pair(a), Value::Pair(b)) => Rc::ptr_eq(a, b),
            (Value::Error(a), Value::Error(b)) => Rc::ptr_eq(a, b),
            (Value::Primitive(a), Value::Primitive(b)) => Rc::ptr_eq(a, b),
            (Value::Compound(a), Value::Compound(b)) => Rc::ptr_eq(a, b),
            (Value::Macro(a), Value::Macro(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// `eqv?`: identical, with numbers compared by exactness and value.
    pub fn eqv(&self, other: &Value) -> bool {
        self.is_identical(other)
    }

    /// `equal?`: structural equality over pairs and strings.
    pub fn equal(&self, other: &Value) -> bool {
        let (mut left, mut right) = (self.clone(), other.clone());
        loop {
            match (&left, &right) {
                (Value::Pair(a), Value::Pair(b)) => {
                    if Rc::ptr_eq(a, b) {
                        return true;
                    }
                    if !a.car().equal(&b.car()) {
                        return false;
                    }
                    let (next_left, next_right) = (a.cdr(), b.cdr());
                    left = next_left;
                    right = next_right;
                }
                (Value::String(a), Value::String(b)) => return a == b,
                _ => return left.eqv(&right),
            }
        }
    }
}

impl From<Number> for Value {
    fn from(number: Number) -> Self {
        Value::number(number)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<SchemeError> for Value {
    fn from(error: SchemeError) -> Self {
        Value::error(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn retain_release_round_trip() {
        let list = Value::list(vec![Value::integer(1), Value::string("a")]);
        let before = list.ref_count();
        let extra = list.retain();
        assert_eq!(list.ref_count(), before.map(|n| n + 1));
        extra.release();
        assert_eq!(list.ref_count(), before);
        assert_eq!(list.list_len(), Some(2));
        assert_eq!(Value::Nil.ref_count(), None);
    }

    #[test]
    fn first_of_empty_list_is_type_mismatch() {
        let err = Value::Nil.first().unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::TypeMismatch {
                function: "car".into(),
                index: 0,
                actual: "()".into(),
                expected: "pair".into(),
            }
        );
    }

    #[test]
    fn set_rest_mutates_shared_pair() {
        let pair = Value::cons(Value::integer(1), Value::Nil);
        let alias = pair.retain();
        alias.set_rest(Value::integer(2)).unwrap();
        assert_eq!(pair.rest().unwrap().as_integer(), Some(2));
        assert!(Value::Boolean(true).set_first(Value::Nil).is_err());
    }

    #[test]
    fn list_parts_keeps_dotted_tail() {
        let dotted = Value::list_with_tail(vec![Value::integer(1)], Value::integer(2));
        let (items, tail) = dotted.list_parts();
        assert_eq!(items.len(), 1);
        assert_eq!(tail.as_integer(), Some(2));
        assert!(dotted.to_vec("length").is_err());
        assert_eq!(dotted.list_len(), None);
    }

    #[test]
    fn equivalence_levels() {
        let a = Value::list(vec![Value::integer(1), Value::string("x")]);
        let b = Value::list(vec![Value::integer(1), Value::string("x")]);
        assert!(a.equal(&b));
        assert!(!a.eqv(&b));
        assert!(Value::integer(7).eqv(&Value::integer(7)));
        assert!(!Value::string("s").eqv(&Value::string("s")));
    }

    #[test]
    fn long_lists_release_without_recursion() {
        let list = Value::list((0..200_000).map(Value::integer).collect());
        list.release();
    }

    #[test]
    fn only_false_is_false() {
        assert!(!Value::Boolean(false).is_true());
        assert!(Value::Nil.is_true());
        assert!(Value::integer(0).is_true());
    }
}
