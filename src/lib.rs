//! AxScript: a small dynamically typed scripting language with keyword
//! comparison statements, counted loops, arrays and first-class closures.
//!
//! The pipeline is scanner → parser → tree-walking interpreter.  Each stage
//! is usable on its own; [`run`] chains all three.

pub mod ast_printer;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod native;
pub mod parser;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use std::io::{BufRead, Write};

use log::info;

use crate::error::AxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::scanner::Scanner;
use crate::stmt::Stmt;
use crate::token::Token;

/// Exit status for lexical/parse diagnostics.
pub const EXIT_STATIC_ERROR: i32 = 65;

/// Exit status for runtime errors.
pub const EXIT_RUNTIME_ERROR: i32 = 70;

/// Scan `source` completely.  Lexing never stops early: every error is
/// collected and the token list always ends with `EOF`.
pub fn tokenize(source: &str) -> (Vec<Token<'_>>, Vec<AxError>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();

    for result in Scanner::new(source) {
        match result {
            Ok(token) => tokens.push(token),
            Err(e) => errors.push(e),
        }
    }

    (tokens, errors)
}

/// Parse a token list into statements, recovering after each error.
pub fn parse(tokens: &[Token<'_>]) -> (Vec<Stmt>, Vec<AxError>) {
    Parser::new(tokens).parse()
}

/// Everything that went wrong during one [`run`].
#[derive(Debug, Default)]
pub struct RunReport {
    pub lex_errors: Vec<AxError>,
    pub parse_errors: Vec<AxError>,
    pub runtime_error: Option<AxError>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.lex_errors.is_empty() && self.parse_errors.is_empty() && self.runtime_error.is_none()
    }

    /// Every diagnostic in pipeline order.
    pub fn errors(&self) -> impl Iterator<Item = &AxError> {
        self.lex_errors
            .iter()
            .chain(&self.parse_errors)
            .chain(self.runtime_error.as_ref())
    }

    /// Process exit status: 65 for static diagnostics, else 70 for a runtime
    /// error, else 0.
    pub fn exit_code(&self) -> i32 {
        if !self.lex_errors.is_empty() || !self.parse_errors.is_empty() {
            EXIT_STATIC_ERROR
        } else if self.runtime_error.is_some() {
            EXIT_RUNTIME_ERROR
        } else {
            0
        }
    }
}

/// Lex, parse and execute `source` on `interpreter`.  Statements that
/// parsed still run when others were dropped by error recovery.
pub fn run<W: Write, R: BufRead>(source: &str, interpreter: &mut Interpreter<W, R>) -> RunReport {
    let (tokens, lex_errors) = tokenize(source);
    let (statements, parse_errors) = parse(&tokens);

    info!(
        "Running {} statements ({} lex errors, {} parse errors)",
        statements.len(),
        lex_errors.len(),
        parse_errors.len()
    );

    let runtime_error = interpreter.interpret(&statements).err();

    RunReport {
        lex_errors,
        parse_errors,
        runtime_error,
    }
}
