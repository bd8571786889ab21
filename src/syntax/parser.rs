//! Pest-based reader.
//!
//! Converts source text into values, one per top-level datum. Reader errors
//! carry the named source and span for miette rendering.

use pest::error::{Error, InputLocation};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::errors::{ErrorReporting, SchemeError, SourceContext};
use crate::numeric::parse_number;
use crate::runtime::symbol::{Symbol, SymbolTable};
use crate::value::Value;

#[derive(Parser)]
#[grammar = "syntax/grammar.pest"]
struct SchemeParser;

// ============================================================================
// PUBLIC API
// ============================================================================

/// Reads anonymous input (REPL lines, `eval` strings).
pub fn read(source_text: &str, symbols: &mut SymbolTable) -> Result<Vec<Value>, SchemeError> {
    parse(source_text, &SourceContext::from_file("<input>", source_text), symbols)
}

/// Reads every datum in `source_text`.
pub fn parse(
    source_text: &str,
    source: &SourceContext,
    symbols: &mut SymbolTable,
) -> Result<Vec<Value>, SchemeError> {
    let mut pairs = SchemeParser::parse(Rule::program, source_text).map_err(|e| convert_parse_error(e, source))?;
    let Some(program) = pairs.next() else {
        return Ok(Vec::new());
    };
    let quote = symbols.intern("quote");
    let mut reader = Reader {
        source,
        symbols,
        quote,
    };
    program
        .into_inner()
        .filter(|p| p.as_rule() != Rule::EOI)
        .map(|p| reader.build(p))
        .collect()
}

// ============================================================================
// VALUE BUILDERS
// ============================================================================

struct Reader<'a> {
    source: &'a SourceContext,
    symbols: &'a mut SymbolTable,
    quote: Symbol,
}

impl Reader<'_> {
    fn build(&mut self, pair: Pair<Rule>) -> Result<Value, SchemeError> {
        let span = (pair.as_span().start(), pair.as_span().end() - pair.as_span().start());
        match pair.as_rule() {
            Rule::list => {
                let mut items = Vec::new();
                let mut tail = Value::Nil;
                let mut inner = pair.into_inner();
                while let Some(child) = inner.next() {
                    if child.as_rule() == Rule::dot {
                        let datum = inner
                            .next()
                            .ok_or_else(|| self.source.malformed("expected a datum after '.'", span.into()))?;
                        tail = self.build(datum)?;
                        break;
                    }
                    items.push(self.build(child)?);
                }
                if items.is_empty() && !tail.is_nil() {
                    return Err(self.source.malformed("dotted list needs an element before '.'", span.into()));
                }
                Ok(Value::list_with_tail(items, tail))
            }
            Rule::quoted => {
                let datum = pair
                    .into_inner()
                    .next()
                    .ok_or_else(|| self.source.malformed("expected a datum after quote", span.into()))?;
                let quoted = self.build(datum)?;
                Ok(Value::list(vec![Value::Symbol(self.quote), quoted]))
            }
            Rule::boolean => Ok(Value::Boolean(matches!(pair.as_str(), "#t" | "#true"))),
            Rule::string => {
                let text = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
                let content = unescape_string(text).ok_or_else(|| self.source.invalid_literal("string", text, span.into()))?;
                Ok(Value::string(&content))
            }
            Rule::atom => {
                let text = pair.as_str();
                if let Some(number) = parse_number(text) {
                    return Ok(Value::number(number));
                }
                if text.starts_with('#') {
                    return Err(self.source.invalid_literal("datum", text, span.into()));
                }
                Ok(Value::Symbol(self.symbols.intern(text)))
            }
            rule => Err(self
                .source
                .malformed(&format!("unexpected syntax: {:?}", rule), span.into())),
        }
    }
}

// ============================================================================
// UTILITIES
// ============================================================================

/// Resolves `\n \t \r \\ \"`; any other escape is invalid.
fn unescape_string(text: &str) -> Option<String> {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next()? {
            'n' => result.push('\n'),
            't' => result.push('\t'),
            'r' => result.push('\r'),
            '\\' => result.push('\\'),
            '"' => result.push('"'),
            _ => return None,
        }
    }
    Some(result)
}

fn convert_parse_error(error: Error<Rule>, source: &SourceContext) -> SchemeError {
    let (start, end) = match error.location {
        InputLocation::Pos(pos) => (pos, pos),
        InputLocation::Span((start, end)) => (start, end),
    };
    let message = if start >= source.content.len() {
        "unexpected end of input (missing closing parenthesis or quote?)"
    } else if source.content[start..].starts_with([')', ']']) {
        "unexpected closing parenthesis"
    } else if source.content[start..].starts_with('"') {
        "unterminated string"
    } else {
        "syntax error"
    };
    source.malformed(message, (start, end.saturating_sub(start)).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::value::to_display_string;

    fn round_trip(source: &str) -> String {
        let mut symbols = SymbolTable::new();
        let values = read(source, &mut symbols).unwrap();
        values
            .iter()
            .map(|v| to_display_string(v, &symbols, None))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn reads_lists_and_dotted_pairs() {
        assert_eq!(round_trip("(a (b c) . d)"), "(a (b c) . d)");
        assert_eq!(round_trip("[1 2]"), "(1 2)");
        assert_eq!(round_trip("()"), "()");
        assert_eq!(round_trip("(a . (b . (c . ())))"), "(a b c)");
    }

    #[test]
    fn quote_shorthand_and_comments() {
        assert_eq!(round_trip("'x ; trailing comment\n'(1 2)"), "(quote x) (quote (1 2))");
    }

    #[test]
    fn atoms_become_numbers_or_symbols() {
        assert_eq!(round_trip("42 -1/2 3.50 +inf.0 ... + x1 #t #false"), "42 -1/2 3.50 +inf.0 ... + x1 #t #f");
    }

    #[test]
    fn strings_unescape() {
        let mut symbols = SymbolTable::new();
        let values = read(r#""a\"b\n""#, &mut symbols).unwrap();
        assert!(matches!(&values[0], Value::String(s) if &**s == "a\"b\n"));
    }

    #[test]
    fn symbols_are_interned_once() {
        let mut symbols = SymbolTable::new();
        let values = read("(foo foo)", &mut symbols).unwrap();
        let (items, _) = values[0].list_parts();
        assert_eq!(items[0].as_symbol(), items[1].as_symbol());
    }

    #[test]
    fn unbalanced_input_is_malformed() {
        let mut symbols = SymbolTable::new();
        for source in ["(define x", "(1 2))", "\"open", "( . 1)"] {
            let err = read(source, &mut symbols).unwrap_err();
            assert!(matches!(err.kind, ErrorKind::MalformedSyntax { .. }), "{}", source);
            assert!(err.source_info.primary_span.is_some());
        }
    }

    #[test]
    fn unknown_hash_syntax_is_invalid_literal() {
        let mut symbols = SymbolTable::new();
        let err = read("#q", &mut symbols).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidLiteral { .. }));
    }
}
