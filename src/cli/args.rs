//! Command-line arguments and subcommands for the `quill` binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "quill",
    version,
    about = "A small Scheme-like interpreter with syntax-rules macros and a full numeric tower."
)]
pub struct QuillArgs {
    /// YAML configuration file.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Maximum evaluation depth before a recursion-limit error is reported.
    #[arg(long, global = true, value_name = "N")]
    pub max_depth: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the interactive read-eval-print loop (the default).
    Repl,
    /// Evaluate every top-level form in a file and print the results.
    Run {
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Evaluate an expression given on the command line.
    Eval {
        #[arg(required = true)]
        expr: String,
    },
    /// Show each macro expansion step of a file with diffs.
    Macrotrace {
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Run every `.scm` transcript in a directory against its `.expected` file.
    Test {
        #[arg(default_value = "tests/scripts")]
        path: PathBuf,
    },
    /// List registered primitives and special forms.
    ListPrimitives,
}
