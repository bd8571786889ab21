//! External representation of values.
//!
//! Procedures and macros are named by whatever symbol they are currently
//! bound to in the supplied environment, so printing needs the environment
//! as well as the symbol table.

use std::fmt::Write;

use super::Value;
use crate::runtime::environment::Environment;
use crate::runtime::symbol::SymbolTable;

/// Renders `value` the way the REPL shows it.
pub fn to_display_string(value: &Value, symbols: &SymbolTable, env: Option<&Environment>) -> String {
    let mut out = String::new();
    write_value(&mut out, value, symbols, env);
    out
}

fn write_value(out: &mut String, value: &Value, symbols: &SymbolTable, env: Option<&Environment>) {
    match value {
        Value::Nil => out.push_str("()"),
        Value::Boolean(true) => out.push_str("#t"),
        Value::Boolean(false) => out.push_str("#f"),
        Value::Number(packed) => {
            let _ = write!(out, "{}", packed.unzip());
        }
        Value::String(text) => write_string(out, text),
        Value::Symbol(symbol) => out.push_str(symbols.name(*symbol)),
        Value::Error(error) => out.push_str(&error.message()),
        Value::Pair(_) => write_list(out, value, symbols, env),
        Value::Primitive(primitive) => {
            let name = bound_name(value, symbols, env).unwrap_or(primitive.name);
            let _ = write!(out, "#<procedure {}>", name);
        }
        Value::Compound(_) => match bound_name(value, symbols, env) {
            Some(name) => {
                let _ = write!(out, "#<procedure {}>", name);
            }
            None => out.push_str("#<procedure>"),
        },
        Value::Macro(_) => match bound_name(value, symbols, env) {
            Some(name) => {
                let _ = write!(out, "#<macro {}>", name);
            }
            None => out.push_str("#<macro>"),
        },
    }
}

fn write_list(out: &mut String, value: &Value, symbols: &SymbolTable, env: Option<&Environment>) {
    out.push('(');
    let mut current = value.clone();
    let mut first = true;
    loop {
        match current {
            Value::Pair(pair) => {
                if !first {
                    out.push(' ');
                }
                first = false;
                write_value(out, &pair.car(), symbols, env);
                current = pair.cdr();
            }
            Value::Nil => break,
            tail => {
                out.push_str(" . ");
                write_value(out, &tail, symbols, env);
                break;
            }
        }
    }
    out.push(')');
}

fn write_string(out: &mut String, text: &str) {
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
}

fn bound_name<'a>(value: &Value, symbols: &'a SymbolTable, env: Option<&Environment>) -> Option<&'a str> {
    env?.reverse_lookup(value).map(|symbol| symbols.name(symbol))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_dotted_pairs_and_empty() {
        let mut symbols = SymbolTable::new();
        let a = Value::Symbol(symbols.intern("a"));
        let proper = Value::list(vec![a.clone(), Value::integer(2), Value::list(vec![])]);
        assert_eq!(to_display_string(&proper, &symbols, None), "(a 2 ())");
        let dotted = Value::list_with_tail(vec![a, Value::Boolean(true)], Value::Boolean(false));
        assert_eq!(to_display_string(&dotted, &symbols, None), "(a #t . #f)");
    }

    #[test]
    fn strings_are_escaped() {
        let symbols = SymbolTable::new();
        let text = Value::string("say \"hi\"\n");
        assert_eq!(to_display_string(&text, &symbols, None), "\"say \\\"hi\\\"\\n\"");
    }

    #[test]
    fn errors_print_their_message() {
        let symbols = SymbolTable::new();
        let error = Value::error(crate::errors::unbound_variable("x"));
        assert_eq!(to_display_string(&error, &symbols, None), "Variable 'x' is not bound");
    }
}
