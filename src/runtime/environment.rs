//! # Environments
//!
//! An environment is a frame of parallel symbol/value arrays plus a link to
//! its parent. Lookups walk the chain outward; `put` always writes to the
//! innermost frame, shadowing any outer binding.
//!
//! Frames are shared (`Rc<RefCell<..>>`) because closures capture them.
//! Parent links are strong: an inner closure returned out of its defining
//! call must keep every enclosing frame alive. A closure stored in the frame
//! it captures forms a cycle; [`Environment::clear`] breaks it.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::symbol::Symbol;
use crate::value::Value;

/// Slots added to a frame each time it fills up.
pub const FRAME_GROWTH: usize = 10;

struct Frame {
    parent: Option<Environment>,
    symbols: Vec<Symbol>,
    values: Vec<Value>,
}

#[derive(Clone)]
pub struct Environment(Rc<RefCell<Frame>>);

impl Environment {
    /// A root environment with no parent.
    pub fn new() -> Self {
        Self::with_parent(None)
    }

    /// A child frame whose lookups fall back to `parent`.
    pub fn extend(parent: &Environment) -> Self {
        Self::with_parent(Some(parent.clone()))
    }

    fn with_parent(parent: Option<Environment>) -> Self {
        Environment(Rc::new(RefCell::new(Frame {
            parent,
            symbols: Vec::with_capacity(FRAME_GROWTH),
            values: Vec::with_capacity(FRAME_GROWTH),
        })))
    }

    pub fn parent(&self) -> Option<Environment> {
        self.0.borrow().parent.clone()
    }

    /// Finds the nearest binding of `symbol`.
    pub fn get(&self, symbol: Symbol) -> Option<Value> {
        let mut current = self.clone();
        loop {
            let next = {
                let frame = current.0.borrow();
                if let Some(index) = frame.position(symbol) {
                    return Some(frame.values[index].clone());
                }
                frame.parent.clone()
            };
            current = next?;
        }
    }

    /// Binds or rebinds `symbol` in this frame only.
    pub fn put(&self, symbol: Symbol, value: Value) {
        let mut frame = self.0.borrow_mut();
        if let Some(index) = frame.position(symbol) {
            frame.values[index] = value;
            return;
        }
        if frame.symbols.len() == frame.symbols.capacity() {
            frame.symbols.reserve_exact(FRAME_GROWTH);
            frame.values.reserve_exact(FRAME_GROWTH);
        }
        frame.symbols.push(symbol);
        frame.values.push(value);
    }

    /// Replaces the nearest existing binding. Returns `false` when `symbol`
    /// is unbound everywhere in the chain.
    pub fn assign(&self, symbol: Symbol, value: Value) -> bool {
        let mut current = self.clone();
        loop {
            let next = {
                let mut frame = current.0.borrow_mut();
                if let Some(index) = frame.position(symbol) {
                    frame.values[index] = value;
                    return true;
                }
                frame.parent.clone()
            };
            match next {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Finds a symbol bound to exactly this value (by identity), searching
    /// this frame and then its ancestors.
    pub fn reverse_lookup(&self, value: &Value) -> Option<Symbol> {
        let mut current = self.clone();
        loop {
            let next = {
                let frame = current.0.borrow();
                let found = frame
                    .values
                    .iter()
                    .position(|bound| bound.is_identical(value));
                if let Some(index) = found {
                    return Some(frame.symbols[index]);
                }
                frame.parent.clone()
            };
            current = next?;
        }
    }

    /// Number of bindings in this frame.
    pub fn len(&self) -> usize {
        self.0.borrow().symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots currently allocated in this frame.
    pub fn capacity(&self) -> usize {
        self.0.borrow().symbols.capacity()
    }

    /// Drops every binding in this frame and detaches it from its parent.
    pub fn clear(&self) {
        let (values, parent) = {
            let mut frame = self.0.borrow_mut();
            frame.symbols.clear();
            (std::mem::take(&mut frame.values), frame.parent.take())
        };
        drop(values);
        drop(parent);
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Frame {
    fn position(&self, symbol: Symbol) -> Option<usize> {
        self.symbols.iter().position(|bound| *bound == symbol)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frame = self.0.borrow();
        f.debug_struct("Environment")
            .field("bindings", &frame.symbols.len())
            .field("has_parent", &frame.parent.is_some())
            .finish()
    }
}
