//! # Reader
//!
//! Turns source text into the same [`Value`](crate::value::Value) graph the
//! evaluator consumes. Symbols are interned through the caller's symbol
//! table so they are identity-comparable as soon as they are read.

pub mod parser;

pub use parser::{parse, read};
