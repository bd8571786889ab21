//! Quill REPL (Read-Eval-Print Loop)
//!
//! Interactive shell with state that persists across inputs. Input is
//! accumulated until brackets balance, then every datum in it is evaluated
//! and its result (or error message) printed.

use std::io::{self, Write};

use crate::config::InterpreterConfig;
use crate::errors::print_error;
use crate::runtime::Interpreter;

/// REPL state that persists across evaluations.
pub struct ReplState {
    interp: Interpreter,
    config: InterpreterConfig,
    line_number: usize,
}

impl ReplState {
    pub fn new(config: InterpreterConfig) -> Self {
        Self {
            interp: Interpreter::with_config(config.clone()),
            config,
            line_number: 1,
        }
    }

    /// Evaluates one complete input and returns the printed results.
    /// Reader errors are reported on stderr and yield no results.
    pub fn eval_line(&mut self, input: &str) -> Vec<String> {
        let source_name = format!("<repl:{}>", self.line_number);
        self.line_number += 1;
        match self.interp.eval_named(&source_name, input) {
            Ok(values) => {
                let global = self.interp.global();
                values.iter().map(|v| self.interp.print(v, &global)).collect()
            }
            Err(e) => {
                print_error(e);
                Vec::new()
            }
        }
    }

    /// Drops every user definition by starting a fresh interpreter.
    pub fn reset(&mut self) {
        self.interp = Interpreter::with_config(self.config.clone());
    }
}

/// Main REPL entry point.
pub fn run_repl(config: InterpreterConfig) {
    println!("Quill REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type :help for help, :quit to exit, :clear to reset the state");
    println!();

    let prompt = config.prompt.clone();
    let continuation = format!("{:>width$}", "-> ", width = prompt.chars().count());
    let mut state = ReplState::new(config);
    let mut input_buffer = String::new();

    loop {
        print!("{}", if input_buffer.is_empty() { &prompt } else { &continuation });
        let _ = io::stdout().flush();

        let mut line = String::new();
        match io::stdin().read_line(&mut line) {
            Ok(0) => {
                println!();
                break;
            }
            Ok(_) => {
                let line = line.trim_end();

                if input_buffer.is_empty() && line.trim_start().starts_with(':') {
                    match handle_repl_command(line.trim(), &mut state) {
                        ReplCommand::Continue => continue,
                        ReplCommand::Quit => break,
                    }
                }

                if !input_buffer.is_empty() {
                    input_buffer.push('\n');
                }
                input_buffer.push_str(line);

                // A blank line submits an unbalanced buffer so the reader reports it.
                if is_complete_expression(&input_buffer) || (line.is_empty() && !input_buffer.trim().is_empty()) {
                    for result in state.eval_line(&input_buffer) {
                        println!("{}", result);
                    }
                    input_buffer.clear();
                } else if input_buffer.trim().is_empty() {
                    input_buffer.clear();
                }
            }
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                break;
            }
        }
    }
}

enum ReplCommand {
    Continue,
    Quit,
}

fn handle_repl_command(command: &str, state: &mut ReplState) -> ReplCommand {
    match command.to_ascii_lowercase().as_str() {
        ":help" | ":h" => {
            println!("Quill REPL Commands:");
            println!("  :help, :h     Show this help");
            println!("  :quit, :q     Exit the REPL");
            println!("  :clear, :c    Discard all definitions");
            println!();
            println!("Multi-line input is read until brackets balance.");
            ReplCommand::Continue
        }
        ":quit" | ":q" => ReplCommand::Quit,
        ":clear" | ":c" => {
            state.reset();
            println!("Context cleared.");
            ReplCommand::Continue
        }
        _ => {
            println!("Unknown command: {}. Type :help for available commands.", command);
            ReplCommand::Continue
        }
    }
}

/// True when brackets balance outside strings and comments.
pub fn is_complete_expression(input: &str) -> bool {
    if input.trim().is_empty() {
        return false;
    }

    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut in_comment = false;
    let mut escape_next = false;

    for ch in input.chars() {
        if in_comment {
            in_comment = ch != '\n';
            continue;
        }
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            ';' if !in_string => in_comment = true,
            '(' | '[' if !in_string => depth += 1,
            ')' | ']' if !in_string => depth -= 1,
            _ => {}
        }
    }

    depth <= 0 && !in_string
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_complete_expression() {
        assert!(is_complete_expression("42"));
        assert!(is_complete_expression("(+ 1 2)"));
        assert!(is_complete_expression("(begin (define x 10) (+ x 5))"));
        assert!(is_complete_expression("\"hello (world\""));
        assert!(is_complete_expression("(f 1) ; (unbalanced comment"));
        assert!(is_complete_expression("(+ 1 2))"));

        assert!(!is_complete_expression("(+ 1"));
        assert!(!is_complete_expression("[let ((x 1)"));
        assert!(!is_complete_expression("\"unclosed string"));
        assert!(!is_complete_expression(""));
    }

    #[test]
    fn state_persists_and_resets() {
        let mut state = ReplState::new(InterpreterConfig::default());
        assert!(state.eval_line("(define x 5)").len() == 1);
        assert_eq!(state.eval_line("(+ x 1)"), vec!["6"]);
        state.reset();
        assert_eq!(state.eval_line("x"), vec!["Variable 'x' is not bound"]);
    }
}
