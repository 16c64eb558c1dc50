//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime) convert their internal
//! failure modes into one of the variants defined here.  Compile-time phases
//! never abort on the first problem: they hand each error to a [`Reporter`],
//! which latches the two flags the driver uses to gate the next phase.
//!
//! The module **does not** decide exit codes; that belongs to the binary.

use std::io;
use thiserror::Error;

use log::{debug, info};

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error, anchored at the offending token.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        location: String,
    },

    /// Static‑analysis failure (self reference, redeclaration, misplaced
    /// `return` / `this` / `super`).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Runtime evaluation error.  Unwinds to the top-level `interpret` call.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Where an error sits relative to its token: `" at end"` for EOF,
/// `" at '<lexeme>'"` for everything else.
fn location(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            location: location(token),
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            line: token.line,
            location: location(token),
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Runtime error: line={}, msg={}", token.line, message);

        LoxError::Runtime {
            message,
            line: token.line,
        }
    }

    /// `true` for the classes of error that stop a script *before* it runs.
    pub fn is_compile_time(&self) -> bool {
        matches!(
            self,
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. }
        )
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Collects diagnostics from every phase and latches whether a compile-time
/// or a runtime error has been seen since the last [`Reporter::reset`].
#[derive(Debug, Default)]
pub struct Reporter {
    diagnostics: Vec<String>,
    had_error: bool,
    had_runtime_error: bool,
    echo: bool,
}

impl Reporter {
    /// A reporter that only records diagnostics.
    pub fn new() -> Self {
        Self::default()
    }

    /// A reporter that also writes every diagnostic to stderr as it arrives.
    pub fn echoing() -> Self {
        Self {
            echo: true,
            ..Self::default()
        }
    }

    /// Report a line-anchored error (scanner).
    pub fn error(&mut self, line: usize, message: &str) {
        self.report(LoxError::lex(line, message));
    }

    /// Report a token-anchored syntax error.
    pub fn error_at(&mut self, token: &Token, message: &str) {
        self.report(LoxError::parse(token, message));
    }

    /// Report the error that aborted execution.
    pub fn runtime_error(&mut self, error: LoxError) {
        self.report(error);
    }

    /// Record `error`, flipping whichever latch its class belongs to.
    pub fn report(&mut self, error: LoxError) {
        if error.is_compile_time() {
            self.had_error = true;
        } else {
            self.had_runtime_error = true;
        }

        let rendered: String = error.to_string();
        info!("Reported: {}", rendered);

        if self.echo {
            eprintln!("{}", rendered);
        }

        self.diagnostics.push(rendered);
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Rendered diagnostics, oldest first.
    pub fn diagnostics(&self) -> &[String] {
        &self.diagnostics
    }

    /// Clear both latches and forget recorded diagnostics.
    pub fn reset(&mut self) {
        self.diagnostics.clear();
        self.had_error = false;
        self.had_runtime_error = false;
    }
}
