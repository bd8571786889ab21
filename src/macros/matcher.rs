//! Pattern matching for syntax-rules.
//!
//! A list pattern with an ellipsis reserves exactly enough trailing input for
//! the patterns after the ellipsis; everything in between is matched
//! repeatedly against the ellipsis sub-pattern. Each pattern variable inside
//! the repetition collects one binding per repetition, in order.

use super::{Binding, Bindings, Pattern};
use crate::value::Value;

/// Matches `form` against `pattern`, extending `bindings`. On failure the
/// bindings may hold partial results and should be discarded.
pub fn match_pattern(pattern: &Pattern, form: &Value, bindings: &mut Bindings) -> bool {
    match pattern {
        Pattern::Underscore => true,
        Pattern::Literal(symbol) => form.as_symbol() == Some(*symbol),
        Pattern::Variable(symbol) => {
            bindings.insert(*symbol, Binding::Single(form.clone()));
            true
        }
        Pattern::Datum(datum) => datum.equal(form),
        Pattern::List {
            before,
            ellipsis,
            after,
            tail,
        } => match_list(before, ellipsis.as_deref(), after, tail.as_deref(), form, bindings),
    }
}

fn match_list(
    before: &[Pattern],
    ellipsis: Option<&Pattern>,
    after: &[Pattern],
    tail: Option<&Pattern>,
    form: &Value,
    bindings: &mut Bindings,
) -> bool {
    let (items, form_tail) = form.list_parts();
    let fixed = before.len() + after.len();
    if items.len() < fixed {
        return false;
    }

    let repeated = match ellipsis {
        Some(_) => items.len() - fixed,
        None if tail.is_some() => 0,
        None if items.len() == fixed => 0,
        None => return false,
    };

    for (pattern, item) in before.iter().zip(&items) {
        if !match_pattern(pattern, item, bindings) {
            return false;
        }
    }

    if let Some(sub_pattern) = ellipsis {
        let repetitions = &items[before.len()..before.len() + repeated];
        if !match_repetitions(sub_pattern, repetitions, bindings) {
            return false;
        }
    }

    let after_start = before.len() + repeated;
    let after_end = after_start + after.len();
    for (pattern, item) in after.iter().zip(&items[after_start..after_end]) {
        if !match_pattern(pattern, item, bindings) {
            return false;
        }
    }

    match tail {
        Some(tail_pattern) => {
            let remainder = Value::list_with_tail(items[after_end..].to_vec(), form_tail);
            match_pattern(tail_pattern, &remainder, bindings)
        }
        None => form_tail.is_nil(),
    }
}

fn match_repetitions(pattern: &Pattern, items: &[Value], bindings: &mut Bindings) -> bool {
    let variables = pattern.variables();
    let mut sequences: Vec<Vec<Binding>> = vec![Vec::with_capacity(items.len()); variables.len()];

    for item in items {
        let mut local = Bindings::new();
        if !match_pattern(pattern, item, &mut local) {
            return false;
        }
        for (variable, sequence) in variables.iter().zip(sequences.iter_mut()) {
            if let Some(binding) = local.get(variable) {
                sequence.push(binding.clone());
            }
        }
    }

    for (variable, sequence) in variables.into_iter().zip(sequences) {
        bindings.insert(variable, Binding::Sequence(sequence));
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::symbol::SymbolTable;

    fn var(table: &mut SymbolTable, name: &str) -> Pattern {
        Pattern::Variable(table.intern(name))
    }

    #[test]
    fn ellipsis_reserves_trailing_patterns() {
        let mut table = SymbolTable::new();
        let xs = table.intern("xs");
        let last = table.intern("last");
        let pattern = Pattern::List {
            before: vec![],
            ellipsis: Some(Box::new(var(&mut table, "xs"))),
            after: vec![var(&mut table, "last")],
            tail: None,
        };
        let form = Value::list((1..=4).map(Value::integer).collect());
        let mut bindings = Bindings::new();
        assert!(match_pattern(&pattern, &form, &mut bindings));
        match bindings.get(&xs) {
            Some(Binding::Sequence(items)) => assert_eq!(items.len(), 3),
            other => panic!("unexpected binding {:?}", other),
        }
        match bindings.get(&last) {
            Some(Binding::Single(value)) => assert_eq!(value.as_integer(), Some(4)),
            other => panic!("unexpected binding {:?}", other),
        }
    }

    #[test]
    fn zero_repetitions_bind_empty_sequences() {
        let mut table = SymbolTable::new();
        let xs = table.intern("xs");
        let pattern = Pattern::List {
            before: vec![],
            ellipsis: Some(Box::new(Pattern::Variable(xs))),
            after: vec![],
            tail: None,
        };
        let mut bindings = Bindings::new();
        assert!(match_pattern(&pattern, &Value::Nil, &mut bindings));
        assert!(matches!(bindings.get(&xs), Some(Binding::Sequence(items)) if items.is_empty()));
    }

    #[test]
    fn length_mismatch_fails() {
        let mut table = SymbolTable::new();
        let pattern = Pattern::List {
            before: vec![var(&mut table, "a"), var(&mut table, "b")],
            ellipsis: None,
            after: vec![],
            tail: None,
        };
        let mut bindings = Bindings::new();
        assert!(!match_pattern(&pattern, &Value::list(vec![Value::integer(1)]), &mut bindings));
        let three = Value::list((1..=3).map(Value::integer).collect());
        assert!(!match_pattern(&pattern, &three, &mut Bindings::new()));
    }

    #[test]
    fn literals_match_only_themselves() {
        let mut table = SymbolTable::new();
        let else_symbol = table.intern("else");
        let other = table.intern("other");
        let pattern = Pattern::Literal(else_symbol);
        assert!(match_pattern(&pattern, &Value::Symbol(else_symbol), &mut Bindings::new()));
        assert!(!match_pattern(&pattern, &Value::Symbol(other), &mut Bindings::new()));
    }

    #[test]
    fn atoms_match_by_equal() {
        let pattern = Pattern::Datum(Value::integer(1));
        assert!(match_pattern(&pattern, &Value::integer(1), &mut Bindings::new()));
        assert!(!match_pattern(&pattern, &Value::integer(2), &mut Bindings::new()));
        let text = Pattern::Datum(Value::string("a"));
        assert!(match_pattern(&text, &Value::string("a"), &mut Bindings::new()));
    }
}
