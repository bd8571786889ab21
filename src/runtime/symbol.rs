//! # Symbol Table
//!
//! Interns symbol names so that every occurrence of a name maps to the same
//! [`Symbol`] handle. Identity comparison (`eq?`) on symbols is a plain
//! integer comparison.
//!
//! The table is a fixed array of hash buckets with chained entries. Names are
//! hashed with `h = h * 9 ^ byte` over the UTF-8 bytes.

use std::fmt;

/// Number of hash buckets.
pub const BUCKET_COUNT: usize = 9997;

/// Interned symbol handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

impl Symbol {
    pub fn id(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub fn symbol_hash(name: &str) -> usize {
    let hash = name
        .bytes()
        .fold(0u32, |h, byte| h.wrapping_mul(9) ^ byte as u32);
    hash as usize % BUCKET_COUNT
}

pub struct SymbolTable {
    buckets: Vec<Vec<Symbol>>,
    names: Vec<Box<str>>,
    gensym_counter: u64,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            buckets: vec![Vec::new(); BUCKET_COUNT],
            names: Vec::new(),
            gensym_counter: 0,
        }
    }

    /// Returns the symbol for `name`, creating it on first use.
    pub fn intern(&mut self, name: &str) -> Symbol {
        let bucket = symbol_hash(name);
        if let Some(symbol) = self.lookup_in(bucket, name) {
            return symbol;
        }
        let symbol = self.allocate(name);
        self.buckets[bucket].push(symbol);
        symbol
    }

    /// Looks up an already interned name without creating it.
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.lookup_in(symbol_hash(name), name)
    }

    /// Creates a fresh symbol that no source text can ever name. Used for
    /// hygienic temporaries introduced by derived forms.
    pub fn gensym(&mut self, prefix: &str) -> Symbol {
        self.gensym_counter += 1;
        let name = format!("{} {}", prefix, self.gensym_counter);
        self.allocate(&name)
    }

    pub fn name(&self, symbol: Symbol) -> &str {
        self.names
            .get(symbol.0 as usize)
            .map(|name| &**name)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn lookup_in(&self, bucket: usize, name: &str) -> Option<Symbol> {
        self.buckets[bucket]
            .iter()
            .copied()
            .find(|symbol| &*self.names[symbol.0 as usize] == name)
    }

    fn allocate(&mut self, name: &str) -> Symbol {
        let symbol = Symbol(self.names.len() as u32);
        self.names.push(name.into());
        symbol
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolTable")
            .field("symbols", &self.names.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut table = SymbolTable::new();
        let a = table.intern("lambda");
        let b = table.intern("lambda");
        let c = table.intern("lambada");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(table.name(a), "lambda");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn hash_matches_multiply_xor() {
        // ((0 * 9) ^ 'a') * 9 ^ 'b' = 97 * 9 ^ 98
        assert_eq!(symbol_hash("ab"), ((97 * 9) ^ 98) % BUCKET_COUNT);
        assert!(symbol_hash("a-very-long-symbol-name-to-wrap") < BUCKET_COUNT);
    }

    #[test]
    fn gensyms_are_unreachable_by_name() {
        let mut table = SymbolTable::new();
        let g = table.gensym("temp");
        assert!(table.get(table.name(g)).is_none());
        assert_ne!(table.gensym("temp"), g);
    }

    #[test]
    fn get_does_not_intern() {
        let mut table = SymbolTable::new();
        assert!(table.get("x").is_none());
        let x = table.intern("x");
        assert_eq!(table.get("x"), Some(x));
    }
}
