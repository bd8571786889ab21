//! # Interpreter Runtime
//!
//! [`Interpreter`] is the single, explicitly owned context every evaluation
//! runs in. It holds the symbol table, the global environment, the primitive
//! registry, configuration and the evaluation depth counter. Nothing is
//! global: two interpreters never share symbols or bindings.
//!
//! ## Lifecycle
//!
//! `Interpreter::new` → `read` / `eval` / `print` → drop. Dropping clears
//! the global frame, releasing top-level closures that would otherwise keep
//! themselves alive through the frame they captured.

use std::rc::Rc;

use crate::atoms::{self, AtomRegistry};
use crate::config::InterpreterConfig;
use crate::errors::{ErrorKind, SchemeError, SourceContext};
use crate::macros::{MacroExpansionStep, RuleSymbols};
use crate::syntax;
use crate::value::{to_display_string, EvalResult, Value};

pub mod environment;
pub mod eval;
pub mod stack;
pub mod symbol;

use environment::Environment;
use symbol::{Symbol, SymbolTable};

/// Symbols the evaluator recognises structurally.
#[derive(Debug, Clone, Copy)]
pub struct WellKnownSymbols {
    pub else_: Symbol,
    pub arrow: Symbol,
    pub ellipsis: Symbol,
    pub underscore: Symbol,
}

impl WellKnownSymbols {
    fn intern(table: &mut SymbolTable) -> Self {
        Self {
            else_: table.intern("else"),
            arrow: table.intern("=>"),
            ellipsis: table.intern("..."),
            underscore: table.intern("_"),
        }
    }

    pub fn rule_symbols(&self) -> RuleSymbols {
        RuleSymbols {
            ellipsis: self.ellipsis,
            underscore: self.underscore,
        }
    }
}

pub struct Interpreter {
    pub symbols: SymbolTable,
    pub well_known: WellKnownSymbols,
    global: Environment,
    registry: AtomRegistry,
    config: InterpreterConfig,
    depth: usize,
    macro_trace: Vec<MacroExpansionStep>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    pub fn with_config(config: InterpreterConfig) -> Self {
        let mut symbols = SymbolTable::new();
        let well_known = WellKnownSymbols::intern(&mut symbols);
        let mut interpreter = Self {
            symbols,
            well_known,
            global: Environment::new(),
            registry: atoms::build_default_atom_registry(),
            config,
            depth: 0,
            macro_trace: Vec::new(),
        };
        let global = interpreter.global.clone();
        interpreter.bind_builtins(&global);
        interpreter
    }

    // ========================================================================
    // ENVIRONMENTS
    // ========================================================================

    /// The top-level environment, with builtins bound.
    pub fn global(&self) -> Environment {
        self.global.clone()
    }

    /// A fresh frame, rooted when `parent` is `None`.
    pub fn new_environment(&self, parent: Option<&Environment>) -> Environment {
        match parent {
            Some(parent) => Environment::extend(parent),
            None => Environment::new(),
        }
    }

    /// Binds every registered primitive and special form into `env`.
    pub fn bind_builtins(&mut self, env: &Environment) {
        for primitive in self.registry.iter() {
            let symbol = self.symbols.intern(primitive.name);
            env.put(symbol, Value::Primitive(Rc::new(primitive.clone())));
        }
    }

    // ========================================================================
    // READ / EVAL / PRINT
    // ========================================================================

    /// Parses every datum in `source`, interning symbols in this interpreter.
    pub fn read(&mut self, source: &str) -> Result<Vec<Value>, SchemeError> {
        syntax::read(source, &mut self.symbols)
    }

    /// Like [`read`](Self::read), labelling reader errors with `name`.
    pub fn read_named(&mut self, name: &str, source: &str) -> Result<Vec<Value>, SchemeError> {
        syntax::parse(source, &SourceContext::from_file(name, source), &mut self.symbols)
    }

    /// Evaluates `expr`; failures come back as `Value::Error`.
    pub fn eval(&mut self, expr: &Value, env: &Environment) -> Value {
        self.try_eval(expr, env).unwrap_or_else(Value::error)
    }

    pub fn try_eval(&mut self, expr: &Value, env: &Environment) -> EvalResult {
        eval::evaluate(self, expr, env)
    }

    /// Reads `source` and evaluates each form in the global environment.
    /// Reader errors abort; evaluation errors become values in the result.
    pub fn eval_source(&mut self, source: &str) -> Result<Vec<Value>, SchemeError> {
        let forms = self.read(source)?;
        Ok(self.eval_forms(&forms))
    }

    /// [`eval_source`](Self::eval_source) for a named file or buffer.
    pub fn eval_named(&mut self, name: &str, source: &str) -> Result<Vec<Value>, SchemeError> {
        let forms = self.read_named(name, source)?;
        Ok(self.eval_forms(&forms))
    }

    fn eval_forms(&mut self, forms: &[Value]) -> Vec<Value> {
        let global = self.global();
        forms.iter().map(|form| self.eval(form, &global)).collect()
    }

    /// Renders a value, naming procedures by their binding in `env`.
    pub fn print(&self, value: &Value, env: &Environment) -> String {
        to_display_string(value, &self.symbols, Some(env))
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn intern(&mut self, name: &str) -> Symbol {
        self.symbols.intern(name)
    }

    pub fn symbol_name(&self, symbol: Symbol) -> &str {
        self.symbols.name(symbol)
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    pub fn registry(&self) -> &AtomRegistry {
        &self.registry
    }

    /// Returns and clears the recorded macro expansions.
    pub fn take_macro_trace(&mut self) -> Vec<MacroExpansionStep> {
        std::mem::take(&mut self.macro_trace)
    }

    pub(crate) fn record_expansion(&mut self, step: MacroExpansionStep) {
        if self.config.trace_macros {
            self.macro_trace.push(step);
        }
    }

    // ========================================================================
    // DEPTH GUARD
    // ========================================================================

    pub(crate) fn enter(&mut self) -> Result<(), SchemeError> {
        if self.depth >= self.config.max_depth {
            return Err(SchemeError::new(ErrorKind::RecursionLimit {
                depth: self.config.max_depth,
            }));
        }
        self.depth += 1;
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        self.global.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_bound_in_global() {
        let mut interp = Interpreter::new();
        let car = interp.intern("car");
        let global = interp.global();
        let value = global.get(car).unwrap();
        assert!(value.is_procedure());
        assert_eq!(interp.print(&value, &global), "#<procedure car>");
    }

    #[test]
    fn eval_folds_errors_into_values() {
        let mut interp = Interpreter::new();
        let results = interp.eval_source("(car '())").unwrap();
        assert!(results[0].is_error());
    }

    #[test]
    fn fresh_environments_are_empty() {
        let interp = Interpreter::new();
        let root = interp.new_environment(None);
        assert!(root.is_empty());
        let child = interp.new_environment(Some(&root));
        assert!(child.parent().is_some_and(|p| p.ptr_eq(&root)));
    }

    #[test]
    fn depth_guard_reports_recursion_limit() {
        let mut interp = Interpreter::with_config(InterpreterConfig::default().with_max_depth(50));
        let results = interp
            .eval_source("(define (loop n) (+ 1 (loop n))) (loop 0)")
            .unwrap();
        let error = results[1].as_error().unwrap();
        assert!(matches!(error.kind, ErrorKind::RecursionLimit { depth: 50 }));
    }
}
