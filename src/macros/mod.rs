//! # Syntax-Rules Macros
//!
//! A macro is a literal set plus an ordered list of `(pattern template)`
//! rules. Expansion picks the first rule whose pattern matches the call's
//! operands (the rule's leading keyword position is ignored) and
//! instantiates its template with the resulting bindings.
//!
//! ## Stages
//!
//! - **Compile** (`syntax-rules`): rules are parsed once into [`Pattern`] and
//!   [`Template`] trees. Malformed ellipses and forbidden literals are
//!   reported here as `InvalidSyntax`.
//! - **Match** ([`matcher`]): structural recursion producing [`Bindings`].
//! - **Instantiate** ([`expander`]): template substitution, repeating
//!   ellipsis sub-templates once per matched repetition.
//!
//! Expansion is purely syntactic. The expanded form is evaluated by the
//! caller in the call-site environment.

use im::HashMap;

use crate::errors::{invalid_syntax, SchemeError};
use crate::runtime::symbol::Symbol;
use crate::value::{EvalResult, Value};

pub mod expander;
pub mod matcher;

pub use expander::instantiate;
pub use matcher::match_pattern;

// ============================================================================
// CORE DATA STRUCTURES
// ============================================================================

/// Compiled pattern.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// `_`: matches anything, binds nothing.
    Underscore,
    /// A literal identifier: matches only the same symbol.
    Literal(Symbol),
    /// A pattern variable.
    Variable(Symbol),
    /// Non-symbol atom, matched with `equal?`.
    Datum(Value),
    /// `(p ... q ellipsis r ... . tail)`.
    List {
        before: Vec<Pattern>,
        ellipsis: Option<Box<Pattern>>,
        after: Vec<Pattern>,
        tail: Option<Box<Pattern>>,
    },
}

/// Compiled template.
#[derive(Debug, Clone)]
pub enum Template {
    Variable(Symbol),
    Datum(Value),
    List {
        elements: Vec<TemplateElement>,
        tail: Option<Box<Template>>,
    },
}

/// A template list element followed by `depth` ellipses.
#[derive(Debug, Clone)]
pub struct TemplateElement {
    pub template: Template,
    pub depth: usize,
}

/// What a pattern variable matched. Variables under `n` ellipses hold
/// sequences nested `n` deep.
#[derive(Debug, Clone)]
pub enum Binding {
    Single(Value),
    Sequence(Vec<Binding>),
}

/// Pattern variable bindings for one rule application.
pub type Bindings = HashMap<Symbol, Binding>;

#[derive(Debug, Clone)]
pub struct SyntaxRule {
    pub pattern: Pattern,
    pub template: Template,
}

/// The value produced by `syntax-rules`.
#[derive(Debug)]
pub struct MacroProcedure {
    pub literals: Vec<Symbol>,
    pub rules: Vec<SyntaxRule>,
}

/// A single macro expansion, recorded when tracing is enabled.
#[derive(Debug, Clone)]
pub struct MacroExpansionStep {
    /// Name the macro was invoked under.
    pub macro_name: String,
    /// The call form before expansion.
    pub input: Value,
    /// The expanded form.
    pub output: Value,
}

/// Symbols with fixed meaning inside `syntax-rules`.
#[derive(Debug, Clone, Copy)]
pub struct RuleSymbols {
    pub ellipsis: Symbol,
    pub underscore: Symbol,
}

// ============================================================================
// COMPILATION
// ============================================================================

impl MacroProcedure {
    /// Compiles `(syntax-rules (literal ...) (pattern template) ...)` operands.
    pub fn compile(literals: &Value, rules: &[Value], symbols: RuleSymbols) -> Result<Self, SchemeError> {
        let mut literal_symbols = Vec::new();
        for literal in literals.to_vec("syntax-rules")? {
            let Some(symbol) = literal.as_symbol() else {
                return Err(invalid_syntax("syntax-rules", "literals must be identifiers"));
            };
            if symbol == symbols.ellipsis || symbol == symbols.underscore {
                return Err(invalid_syntax(
                    "syntax-rules",
                    "'...' and '_' cannot be used as literals",
                ));
            }
            literal_symbols.push(symbol);
        }

        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let parts = rule.to_vec("syntax-rules")?;
            let [pattern, template] = parts.as_slice() else {
                return Err(invalid_syntax("syntax-rules", "each rule must be (pattern template)"));
            };
            let Value::Pair(pattern_pair) = pattern else {
                return Err(invalid_syntax("syntax-rules", "rule pattern must be a list"));
            };
            let compiler = Compiler {
                literals: &literal_symbols,
                symbols,
            };
            let mut variables = Vec::new();
            let pattern = compiler.pattern(&pattern_pair.cdr(), &mut variables)?;
            let template = compiler.template(template, &variables, true)?;
            compiled.push(SyntaxRule { pattern, template });
        }

        Ok(MacroProcedure {
            literals: literal_symbols,
            rules: compiled,
        })
    }

    /// Expands a whole call form `(keyword operand ...)`.
    pub fn expand(&self, name: &str, form: &Value) -> EvalResult {
        let operands = form.rest()?;
        for (index, rule) in self.rules.iter().enumerate() {
            let mut bindings = Bindings::new();
            if match_pattern(&rule.pattern, &operands, &mut bindings) {
                log::debug!("macro '{}' matched rule {}", name, index);
                return instantiate(&rule.template, &bindings);
            }
        }
        Err(invalid_syntax(name, "no syntax rule matches"))
    }
}

struct Compiler<'a> {
    literals: &'a [Symbol],
    symbols: RuleSymbols,
}

impl Compiler<'_> {
    fn pattern(&self, value: &Value, variables: &mut Vec<Symbol>) -> Result<Pattern, SchemeError> {
        match value {
            Value::Symbol(symbol) if *symbol == self.symbols.underscore => Ok(Pattern::Underscore),
            Value::Symbol(symbol) if *symbol == self.symbols.ellipsis => {
                Err(invalid_syntax("syntax-rules", "'...' must follow a pattern"))
            }
            Value::Symbol(symbol) if self.literals.contains(symbol) => Ok(Pattern::Literal(*symbol)),
            Value::Symbol(symbol) => {
                if variables.contains(symbol) {
                    return Err(invalid_syntax("syntax-rules", "duplicate pattern variable"));
                }
                variables.push(*symbol);
                Ok(Pattern::Variable(*symbol))
            }
            Value::Pair(_) | Value::Nil => self.list_pattern(value, variables),
            other => Ok(Pattern::Datum(other.clone())),
        }
    }

    fn list_pattern(&self, value: &Value, variables: &mut Vec<Symbol>) -> Result<Pattern, SchemeError> {
        let (items, tail) = value.list_parts();
        let mut before = Vec::new();
        let mut ellipsis = None;
        let mut after = Vec::new();

        let mut index = 0;
        while index < items.len() {
            let followed_by_ellipsis = items
                .get(index + 1)
                .is_some_and(|next| self.is_ellipsis(next));
            if self.is_ellipsis(&items[index]) {
                return Err(invalid_syntax("syntax-rules", "'...' must follow a pattern"));
            }
            let compiled = self.pattern(&items[index], variables)?;
            if followed_by_ellipsis {
                if ellipsis.is_some() {
                    return Err(invalid_syntax("syntax-rules", "only one '...' is allowed per list"));
                }
                ellipsis = Some(Box::new(compiled));
                index += 2;
                continue;
            }
            if ellipsis.is_some() {
                after.push(compiled);
            } else {
                before.push(compiled);
            }
            index += 1;
        }

        let tail = match tail {
            Value::Nil => None,
            other => Some(Box::new(self.pattern(&other, variables)?)),
        };
        Ok(Pattern::List {
            before,
            ellipsis,
            after,
            tail,
        })
    }

    /// `escapes` is false inside `(... template)`, where `...` is literal.
    fn template(&self, value: &Value, variables: &[Symbol], escapes: bool) -> Result<Template, SchemeError> {
        match value {
            Value::Symbol(symbol) if escapes && *symbol == self.symbols.ellipsis => {
                Err(invalid_syntax("syntax-rules", "'...' must follow a template"))
            }
            Value::Symbol(symbol) if variables.contains(symbol) => Ok(Template::Variable(*symbol)),
            Value::Pair(_) => {
                let (items, tail) = value.list_parts();
                if escapes && items.len() == 2 && tail.is_nil() && self.is_ellipsis(&items[0]) {
                    return self.template(&items[1], variables, false);
                }
                let mut elements: Vec<TemplateElement> = Vec::new();
                for item in &items {
                    if escapes && self.is_ellipsis(item) {
                        let Some(last) = elements.last_mut() else {
                            return Err(invalid_syntax("syntax-rules", "'...' must follow a template"));
                        };
                        last.depth += 1;
                        continue;
                    }
                    elements.push(TemplateElement {
                        template: self.template(item, variables, escapes)?,
                        depth: 0,
                    });
                }
                let tail = match tail {
                    Value::Nil => None,
                    other => Some(Box::new(self.template(&other, variables, escapes)?)),
                };
                Ok(Template::List { elements, tail })
            }
            other => Ok(Template::Datum(other.clone())),
        }
    }

    fn is_ellipsis(&self, value: &Value) -> bool {
        value.as_symbol() == Some(self.symbols.ellipsis)
    }
}

// ============================================================================
// INTROSPECTION
// ============================================================================

impl Pattern {
    /// Every pattern variable bound somewhere inside this pattern.
    pub fn variables(&self) -> Vec<Symbol> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut Vec<Symbol>) {
        match self {
            Pattern::Variable(symbol) => out.push(*symbol),
            Pattern::List {
                before,
                ellipsis,
                after,
                tail,
            } => {
                before
                    .iter()
                    .chain(ellipsis.as_deref())
                    .chain(after.iter())
                    .chain(tail.as_deref())
                    .for_each(|pattern| pattern.collect_variables(out));
            }
            Pattern::Underscore | Pattern::Literal(_) | Pattern::Datum(_) => {}
        }
    }
}

impl Template {
    /// Every pattern variable referenced inside this template.
    pub fn variables(&self) -> Vec<Symbol> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut Vec<Symbol>) {
        match self {
            Template::Variable(symbol) => out.push(*symbol),
            Template::List { elements, tail } => {
                for element in elements {
                    element.template.collect_variables(out);
                }
                if let Some(tail) = tail {
                    tail.collect_variables(out);
                }
            }
            Template::Datum(_) => {}
        }
    }
}
