//! Template instantiation for syntax-rules.
//!
//! An element followed by `n` ellipses is instantiated once per repetition
//! of the sequence variables it mentions. Iteration stops as soon as any of
//! those variables has no item at the current index, so mismatched sequence
//! lengths truncate instead of failing.

use super::{Binding, Bindings, Template};
use crate::errors::{invalid_syntax, SchemeError};
use crate::value::{EvalResult, Value};

/// Builds the expansion of `template` under `bindings`.
pub fn instantiate(template: &Template, bindings: &Bindings) -> EvalResult {
    match template {
        Template::Datum(value) => Ok(value.clone()),
        Template::Variable(symbol) => match bindings.get(symbol) {
            Some(Binding::Single(value)) => Ok(value.clone()),
            Some(Binding::Sequence(_)) => Err(invalid_syntax(
                "syntax-rules",
                "pattern variable used without enough '...' in template",
            )),
            None => Ok(Value::Symbol(*symbol)),
        },
        Template::List { elements, tail } => {
            let mut items = Vec::with_capacity(elements.len());
            for element in elements {
                if element.depth == 0 {
                    items.push(instantiate(&element.template, bindings)?);
                } else {
                    repeat(&element.template, element.depth, bindings, &mut items)?;
                }
            }
            let tail = match tail {
                Some(tail) => instantiate(tail, bindings)?,
                None => Value::Nil,
            };
            Ok(Value::list_with_tail(items, tail))
        }
    }
}

fn repeat(template: &Template, depth: usize, bindings: &Bindings, out: &mut Vec<Value>) -> Result<(), SchemeError> {
    let drivers: Vec<_> = template
        .variables()
        .into_iter()
        .filter(|symbol| matches!(bindings.get(symbol), Some(Binding::Sequence(_))))
        .collect();
    if drivers.is_empty() {
        return Err(invalid_syntax(
            "syntax-rules",
            "'...' follows a template without pattern variables",
        ));
    }

    for index in 0.. {
        let mut iteration = bindings.clone();
        for symbol in &drivers {
            let Some(Binding::Sequence(items)) = bindings.get(symbol) else {
                continue;
            };
            match items.get(index) {
                Some(item) => {
                    iteration.insert(*symbol, item.clone());
                }
                None => return Ok(()),
            }
        }
        if depth > 1 {
            repeat(template, depth - 1, &iteration, out)?;
        } else {
            out.push(instantiate(template, &iteration)?);
        }
    }
    Ok(())
}
