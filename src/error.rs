//! Centralised error hierarchy for the **AxScript interpreter**.
//!
//! Every stage (scanner, parser, evaluator, CLI) converts its failure modes
//! into one of the variants defined here.  Lexical and parse errors are
//! diagnostics the pipeline recovers from; every other variant is a runtime
//! condition surfaced by [`Interpreter::interpret`](crate::interpreter::Interpreter::interpret).
//!
//! The module **does not** print diagnostics itself

use std::io;
use thiserror::Error;

use log::info;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Read of, or assignment to, a name bound nowhere in the scope chain.
    #[error("[line {line}] Runtime error: Undefined variable '{name}'.")]
    UndefinedVariable { name: String, line: usize },

    /// Operand types the operator is not defined for.
    #[error("[line {line}] Runtime error: {message}")]
    Type { message: String, line: usize },

    #[error("[line {line}] Runtime error: Division by zero.")]
    DivisionByZero { line: usize },

    #[error("[line {line}] Runtime error: Modulo by zero.")]
    ModuloByZero { line: usize },

    /// Call with a different number of arguments than parameters.
    #[error("[line {line}] Runtime error: Expected {expected} arguments but got {got}.")]
    ArityMismatch {
        expected: usize,
        got: usize,
        line: usize,
    },

    #[error("[line {line}] Runtime error: Index {index} out of bounds for array of length {len}.")]
    IndexOutOfBounds { index: f64, len: usize, line: usize },

    /// Index assignment into something that is not an array.
    #[error("[line {line}] Runtime error: Invalid assignment target.")]
    InvalidAssignmentTarget { line: usize },

    /// `break` / `continue` executed outside any loop body.
    #[error("[line {line}] Runtime error: '{keyword}' outside of a loop.")]
    LoopControlOutsideLoop { keyword: &'static str, line: usize },

    #[error("[line {line}] Runtime error: 'return' outside of a function.")]
    ReturnOutsideFunction { line: usize },

    #[error("[line {line}] Runtime error: Can only call functions.")]
    NotCallable { line: usize },

    #[error("[line {line}] Runtime error: Loop step cannot be zero.")]
    ZeroStep { line: usize },

    #[error("[line {line}] Runtime error: Maximum call depth of {limit} exceeded.")]
    CallDepthExceeded { limit: usize, line: usize },

    /// Failure reported by a built‑in function.
    #[error("[line {line}] Runtime error: {name}(): {message}")]
    Native {
        name: String,
        message: String,
        line: usize,
    },

    /// Several runtime errors collected under the skip‑statement policy.
    #[error("{}", render_all(.0))]
    Many(Vec<AxError>),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl AxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        AxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", line, message);

        AxError::Parse { message, line }
    }

    /// Helper constructor for operator/operand type mismatches.
    pub fn type_error<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Type error: line={}, msg={}", line, message);

        AxError::Type { message, line }
    }

    /// Source line of the error, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            AxError::Lex { line, .. }
            | AxError::Parse { line, .. }
            | AxError::UndefinedVariable { line, .. }
            | AxError::Type { line, .. }
            | AxError::DivisionByZero { line }
            | AxError::ModuloByZero { line }
            | AxError::ArityMismatch { line, .. }
            | AxError::IndexOutOfBounds { line, .. }
            | AxError::InvalidAssignmentTarget { line }
            | AxError::LoopControlOutsideLoop { line, .. }
            | AxError::ReturnOutsideFunction { line }
            | AxError::NotCallable { line }
            | AxError::ZeroStep { line }
            | AxError::CallDepthExceeded { line, .. }
            | AxError::Native { line, .. } => Some(*line),
            AxError::Many(_) | AxError::Io(_) => None,
        }
    }
}

fn render_all(errors: &[AxError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, AxError>;
