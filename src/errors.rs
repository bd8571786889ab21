//! Quill Error Handling - Unified Error API
//!
//! Every failure the interpreter can report is a [`SchemeError`]: a structured
//! [`ErrorKind`] plus optional source information for `miette` rendering.
//!
//! ## Errors as values
//!
//! Inside the engine errors travel as `Result<Value, SchemeError>` and are
//! propagated with `?`. At the public boundary (`Interpreter::eval`) they are
//! folded into `Value::Error`, so a driver sees them as ordinary values.
//!
//! ## Construction
//!
//! Use the helper constructors (`type_mismatch`, `arity_mismatch`, ...) or the
//! `scheme_err!` macro:
//!
//! ```rust
//! use quill::scheme_err;
//! let err = scheme_err!(UnboundVariable { symbol: "x" });
//! assert_eq!(err.to_string(), "Variable 'x' is not bound");
//! ```

use std::fmt;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode, SourceSpan};
use thiserror::Error;

// ============================================================================
// SOURCE CONTEXT
// ============================================================================

/// Named source text used to label reader errors.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    /// Create a source context from real file (or REPL line) content.
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Create a fallback when real source is unavailable.
    pub fn fallback(context: &str) -> Self {
        Self {
            name: "fallback".to_string(),
            content: format!("; {}", context),
        }
    }

    /// Convert to NamedSource for use with miette error reporting.
    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

impl Default for SourceContext {
    fn default() -> Self {
        Self::fallback("default context")
    }
}

// ============================================================================
// ERROR KINDS
// ============================================================================

/// All error types the interpreter reports.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    // Reader errors
    MalformedSyntax {
        message: String,
    },
    InvalidLiteral {
        literal_type: String,
        value: String,
    },

    // Runtime errors
    TypeMismatch {
        function: String,
        index: usize,
        actual: String,
        expected: String,
    },
    ArityMismatch {
        function: String,
        expected: String,
        actual: usize,
    },
    UnboundVariable {
        symbol: String,
    },
    NotApplicable {
        value: String,
    },
    DivisionByZero {
        function: String,
    },
    RecursionLimit {
        depth: usize,
    },

    // Special form and macro errors
    InvalidSyntax {
        form: String,
        reason: String,
    },

    // Driver errors
    Config {
        message: String,
    },
}

/// Coarse grouping used for error codes and test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Parse,
    Runtime,
    Syntax,
    Config,
}

impl ErrorCategory {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Parse => "parse",
            ErrorCategory::Runtime => "eval",
            ErrorCategory::Syntax => "syntax",
            ErrorCategory::Config => "config",
        }
    }
}

impl ErrorKind {
    /// Get the error category for test assertions.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedSyntax { .. } | Self::InvalidLiteral { .. } => ErrorCategory::Parse,

            Self::TypeMismatch { .. }
            | Self::ArityMismatch { .. }
            | Self::UnboundVariable { .. }
            | Self::NotApplicable { .. }
            | Self::DivisionByZero { .. }
            | Self::RecursionLimit { .. } => ErrorCategory::Runtime,

            Self::InvalidSyntax { .. } => ErrorCategory::Syntax,

            Self::Config { .. } => ErrorCategory::Config,
        }
    }

    /// Get error code suffix for diagnostic codes.
    pub const fn code_suffix(&self) -> &'static str {
        match self {
            Self::MalformedSyntax { .. } => "malformed_syntax",
            Self::InvalidLiteral { .. } => "invalid_literal",
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::ArityMismatch { .. } => "arity_mismatch",
            Self::UnboundVariable { .. } => "unbound_variable",
            Self::NotApplicable { .. } => "not_applicable",
            Self::DivisionByZero { .. } => "division_by_zero",
            Self::RecursionLimit { .. } => "recursion_limit",
            Self::InvalidSyntax { .. } => "invalid_syntax",
            Self::Config { .. } => "config",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedSyntax { message } => write!(f, "Malformed input: {}", message),
            Self::InvalidLiteral {
                literal_type,
                value,
            } => write!(f, "Invalid {} literal: {}", literal_type, value),
            Self::TypeMismatch {
                function,
                index,
                actual,
                expected,
            } => write!(
                f,
                "Function '{}' passed incorrect type for argument {}. Got {}, expected {}.",
                function, index, actual, expected
            ),
            Self::ArityMismatch {
                function,
                expected,
                actual,
            } => write!(
                f,
                "Function '{}' expected {} argument(s), got {}",
                function, expected, actual
            ),
            Self::UnboundVariable { symbol } => write!(f, "Variable '{}' is not bound", symbol),
            Self::NotApplicable { value } => {
                write!(f, "Attempt to apply non-procedure {}", value)
            }
            Self::DivisionByZero { function } => write!(f, "Division by zero in '{}'", function),
            Self::RecursionLimit { depth } => {
                write!(f, "Recursion limit of {} exceeded", depth)
            }
            Self::InvalidSyntax { form, reason } => {
                write!(f, "Invalid syntax in '{}': {}", form, reason)
            }
            Self::Config { message } => write!(f, "Configuration error: {}", message),
        }
    }
}

// ============================================================================
// THE ERROR TYPE
// ============================================================================

/// Where an error happened, when known. Runtime errors usually carry none:
/// evaluated values do not remember their source positions.
#[derive(Debug, Clone, Default)]
pub struct SourceInfo {
    pub source: Option<Arc<NamedSource<String>>>,
    pub primary_span: Option<SourceSpan>,
}

/// The single error type.
#[derive(Debug, Clone, Error)]
#[error("{kind}")]
pub struct SchemeError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Where it happened.
    pub source_info: SourceInfo,
    /// How to help.
    pub help: Option<String>,
}

impl SchemeError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            source_info: SourceInfo::default(),
            help: None,
        }
    }

    pub fn with_source(mut self, source: &SourceContext, span: SourceSpan) -> Self {
        self.source_info = SourceInfo {
            source: Some(source.to_named_source()),
            primary_span: Some(span),
        };
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Message shown to users in place of a value.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

impl Diagnostic for SchemeError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!(
            "quill::{}::{}",
            self.kind.category().as_str(),
            self.kind.code_suffix()
        )))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.source_info
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.source_info.primary_span?;
        let label = LabeledSpan::new(Some(self.kind.to_string()), span.offset(), span.len().max(1));
        Some(Box::new(std::iter::once(label)))
    }
}

// ============================================================================
// CONSTRUCTORS
// ============================================================================

/// Wrong variant passed to an accessor or primitive.
pub fn type_mismatch(function: &str, index: usize, actual: &str, expected: &str) -> SchemeError {
    SchemeError::new(ErrorKind::TypeMismatch {
        function: function.into(),
        index,
        actual: actual.into(),
        expected: expected.into(),
    })
}

/// Wrong argument count.
pub fn arity_mismatch(function: &str, expected: impl ToString, actual: usize) -> SchemeError {
    SchemeError::new(ErrorKind::ArityMismatch {
        function: function.into(),
        expected: expected.to_string(),
        actual,
    })
}

pub fn unbound_variable(symbol: &str) -> SchemeError {
    SchemeError::new(ErrorKind::UnboundVariable {
        symbol: symbol.into(),
    })
}

pub fn not_applicable(value: impl Into<String>) -> SchemeError {
    SchemeError::new(ErrorKind::NotApplicable {
        value: value.into(),
    })
}

pub fn division_by_zero(function: &str) -> SchemeError {
    SchemeError::new(ErrorKind::DivisionByZero {
        function: function.into(),
    })
}

pub fn invalid_syntax(form: &str, reason: impl Into<String>) -> SchemeError {
    SchemeError::new(ErrorKind::InvalidSyntax {
        form: form.into(),
        reason: reason.into(),
    })
}

/// Context-aware error creation for the reader: each report carries the
/// named source so miette can label the offending span.
pub trait ErrorReporting {
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> SchemeError;

    fn malformed(&self, message: &str, span: SourceSpan) -> SchemeError {
        self.report(
            ErrorKind::MalformedSyntax {
                message: message.into(),
            },
            span,
        )
    }

    fn invalid_literal(&self, literal_type: &str, value: &str, span: SourceSpan) -> SchemeError {
        self.report(
            ErrorKind::InvalidLiteral {
                literal_type: literal_type.into(),
                value: value.into(),
            },
            span,
        )
    }
}

impl ErrorReporting for SourceContext {
    fn report(&self, kind: ErrorKind, span: SourceSpan) -> SchemeError {
        SchemeError::new(kind).with_source(self, span)
    }
}

/// Renders an error as a miette report on stderr.
pub fn print_error(error: SchemeError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}

/// Builds a `SchemeError` from an `ErrorKind` variant, converting each field with `.into()`.
#[macro_export]
macro_rules! scheme_err {
    ($variant:ident { $($field:ident : $value:expr),* $(,)? }) => {
        $crate::errors::SchemeError::new($crate::errors::ErrorKind::$variant {
            $($field: $value.into()),*
        })
    };
}
