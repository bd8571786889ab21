//! Interpreter configuration.
//!
//! Loaded from a YAML file and then overridden by command-line flags:
//!
//! ```yaml
//! max_depth: 2000
//! trace_macros: true
//! prompt: "λ> "
//! ```
//!
//! Missing keys fall back to their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{ErrorKind, SchemeError};

pub const DEFAULT_MAX_DEPTH: usize = 1000;
pub const DEFAULT_PROMPT: &str = "quill> ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Maximum nesting of evaluation before `RecursionLimit` is reported.
    pub max_depth: usize,
    /// Record every macro expansion for `take_macro_trace`.
    pub trace_macros: bool,
    /// REPL prompt.
    pub prompt: String,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            trace_macros: false,
            prompt: DEFAULT_PROMPT.to_string(),
        }
    }
}

impl InterpreterConfig {
    /// Reads a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemeError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| config_error(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_yaml(&text)?;
        log::debug!("loaded configuration from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, SchemeError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| config_error(e.to_string()))
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_trace_macros(mut self, trace_macros: bool) -> Self {
        self.trace_macros = trace_macros;
        self
    }
}

fn config_error(message: String) -> SchemeError {
    SchemeError::new(ErrorKind::Config { message })
}
