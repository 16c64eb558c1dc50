//! A Lox session: one interpreter plus the reporter every phase writes to.
//!
//! [`Lox::run`] pushes source through scan → parse → resolve → interpret and
//! stops after the first phase that reports a compile-time error.  Globals
//! persist across calls, which is what the REPL relies on.

use std::io::{self, Write};

use log::{debug, info};

use crate::ast::Stmt;
use crate::error::Reporter;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;
use crate::token::Token;

/// Outcome of one [`Lox::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    CompileError,
    RuntimeError,
}

pub struct Lox<W: Write = io::Stdout> {
    interpreter: Interpreter<W>,
    reporter: Reporter,
}

impl Lox<io::Stdout> {
    /// A session printing to stdout and reporting to stderr.
    pub fn new(interactive: bool) -> Self {
        Self {
            interpreter: Interpreter::new(interactive),
            reporter: Reporter::echoing(),
        }
    }
}

impl<W: Write> Lox<W> {
    /// A session printing to `out`.  Diagnostics are only recorded, see
    /// [`Lox::reporter`].
    pub fn with_output(out: W, interactive: bool) -> Self {
        Self {
            interpreter: Interpreter::with_output(out, interactive),
            reporter: Reporter::new(),
        }
    }

    pub fn run(&mut self, source: &str) -> Status {
        self.reporter.reset();

        let tokens: Vec<Token> = scan_tokens(source, &mut self.reporter);
        if self.reporter.had_error() {
            debug!("Stopping after scan errors");
            return Status::CompileError;
        }

        let statements: Vec<Stmt> = Parser::new(&tokens, &mut self.reporter).parse();
        if self.reporter.had_error() {
            debug!("Stopping after parse errors");
            return Status::CompileError;
        }

        let mut resolver: Resolver = Resolver::new(&mut self.reporter);
        resolver.resolve(&statements);
        let locals = resolver.finish();
        if self.reporter.had_error() {
            debug!("Stopping after resolve errors");
            return Status::CompileError;
        }

        self.interpreter.resolve(locals);
        self.interpreter.interpret(&statements, &mut self.reporter);

        if self.reporter.had_runtime_error() {
            return Status::RuntimeError;
        }

        info!("Run finished cleanly");
        Status::Ok
    }

    /// Diagnostics from the most recent run.
    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn output(&self) -> &W {
        self.interpreter.output()
    }
}
