//! Pipeline driver: scanner → parser → resolver → interpreter.
//!
//! A [`Lox`] session owns one interpreter (so globals persist across
//! interactive lines) and the diagnostic sink.  Every stage's errors are
//! written to the sink using their `Display` form; the `had_error` and
//! `had_runtime_error` flags tell the front‑end which exit status to use.

use std::io::{self, Write};

use log::{debug, info};

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner;
use crate::stmt::Stmt;

/// Native stack a session's thread needs to reach
/// [`MAX_CALL_DEPTH`](crate::interpreter::MAX_CALL_DEPTH) in unoptimised builds.
pub const STACK_SIZE: usize = 128 * 1024 * 1024;

pub struct Lox {
    interpreter: Interpreter,
    err: Box<dyn Write>,
    pub had_error: bool,
    pub had_runtime_error: bool,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    /// A session printing to stdout and reporting to stderr.
    pub fn new() -> Self {
        Self::with_writers(Box::new(io::stdout()), Box::new(io::stderr()))
    }

    pub fn with_writers(out: Box<dyn Write>, err: Box<dyn Write>) -> Self {
        Self {
            interpreter: Interpreter::with_output(out),
            err,
            had_error: false,
            had_runtime_error: false,
        }
    }

    /// Runs a whole script.
    pub fn run(&mut self, source: &str) {
        if let Some(statements) = self.compile(source) {
            self.execute(&statements);
        }
    }

    /// Runs one interactive line.  A line holding a single expression
    /// statement echoes its value.
    pub fn run_line(&mut self, source: &str) {
        let Some(statements) = self.compile(source) else {
            return;
        };

        match statements.as_slice() {
            [Stmt::Expression(expr)] => {
                if let Err(e) = self.interpreter.interpret_expression(expr) {
                    self.runtime_error(e);
                }
            }
            _ => self.execute(&statements),
        }
    }

    /// Clears both error flags; the prompt calls this after every line.
    pub fn reset_errors(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }

    /// Scans, parses and resolves.  `None` when any static error was
    /// reported: such a tree is never executed.
    fn compile(&mut self, source: &str) -> Option<Vec<Stmt>> {
        let (tokens, lex_errors) = scanner::scan_tokens(source);
        self.report_all(lex_errors);

        let statements = match Parser::new(&tokens).parse() {
            Ok(statements) => statements,
            Err(errors) => {
                self.report_all(errors);
                return None;
            }
        };

        if self.had_error {
            return None;
        }

        if let Err(errors) = Resolver::new(&mut self.interpreter).resolve(&statements) {
            self.report_all(errors);
            return None;
        }

        debug!("Compiled {} top-level statement(s)", statements.len());

        Some(statements)
    }

    fn execute(&mut self, statements: &[Stmt]) {
        if let Err(e) = self.interpreter.interpret(statements) {
            self.runtime_error(e);
        }
    }

    fn report_all(&mut self, errors: Vec<LoxError>) {
        for error in errors {
            self.report(&error);
        }
    }

    /// Writes a static diagnostic to the sink.
    fn report(&mut self, error: &LoxError) {
        info!("Reporting: {}", error);

        let _ = writeln!(self.err, "{}", error);
        self.had_error = true;
    }

    fn runtime_error(&mut self, error: LoxError) {
        info!("Reporting runtime error: {}", error);

        let _ = writeln!(self.err, "{}", error);

        if error.is_runtime() {
            self.had_runtime_error = true;
        } else {
            self.had_error = true;
        }
    }
}
