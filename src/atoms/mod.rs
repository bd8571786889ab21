//! # Primitives
//!
//! Native procedures and special forms, registered by name in an
//! [`AtomRegistry`] and bound into the global environment at startup.
//!
//! ## Module Structure
//!
//! - **`helpers`**: arity checks, operand evaluation, type extraction
//! - **`special_forms`**: `quote if cond begin let define set! lambda
//!   define-syntax syntax-rules`
//! - **`math`**: arithmetic, comparison and numeric predicates
//! - **`lists`**: pair and list operations
//! - **`logic`**: `not`, equivalence and type predicates
//!
//! ## Calling Convention
//!
//! Every primitive has the [`NativeFn`] signature and receives its operands
//! unevaluated. Ordinary procedures evaluate them first thing with
//! [`helpers::eval_args`]; special forms control evaluation themselves.

use im::HashMap;

pub use crate::value::{NativeFn, Primitive, PrimitiveKind};

pub mod helpers;
pub mod lists;
pub mod logic;
pub mod math;
pub mod special_forms;

// ============================================================================
// REGISTRY
// ============================================================================

/// Registry for all primitives, inspectable at runtime.
#[derive(Debug, Clone, Default)]
pub struct AtomRegistry {
    pub atoms: HashMap<String, Primitive>,
}

impl AtomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Primitive> {
        self.atoms.get(name)
    }

    /// Registered names in sorted order.
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.atoms.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn register(&mut self, name: &'static str, func: NativeFn, kind: PrimitiveKind) {
        self.atoms
            .insert(name.to_string(), Primitive { name, func, kind });
    }

    pub fn has(&self, name: &str) -> bool {
        self.atoms.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Primitive> {
        self.atoms.values()
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
}

// ============================================================================
// REGISTRATION
// ============================================================================

/// Registers every primitive and special form.
pub fn register_all_atoms(registry: &mut AtomRegistry) {
    special_forms::register_special_forms(registry);
    math::register_math_atoms(registry);
    lists::register_list_atoms(registry);
    logic::register_logic_atoms(registry);
}

pub fn build_default_atom_registry() -> AtomRegistry {
    let mut registry = AtomRegistry::new();
    register_all_atoms(&mut registry);
    registry
}
