pub use crate::config::InterpreterConfig;
pub use crate::errors::{ErrorKind, SchemeError, SourceContext};
pub use crate::numeric::Number;
pub use crate::runtime::environment::Environment;
pub use crate::runtime::symbol::{Symbol, SymbolTable};
pub use crate::runtime::Interpreter;
pub use crate::value::{EvalResult, Value};

pub mod atoms;
pub mod cli;
pub mod config;
pub mod errors;
pub mod macros;
pub mod numeric;
pub mod repl;
pub mod runtime;
pub mod syntax;
pub mod testing;
pub mod value;
