//! # spinel
//!
//! spinel is an embeddable interpreter for a small Ruby-flavored teaching
//! language. It parses and evaluates short, untrusted snippets and renders
//! their textual output as a single string, so a caller can grade the result
//! against an expected string byte for byte. Execution is bounded by an
//! operation counter and a wall-clock budget, so a hostile or buggy snippet
//! cannot hang the host.

#![warn(
    clippy::redundant_clone,
    clippy::needless_pass_by_value,
    clippy::similar_names,
    clippy::large_enum_variant,
    clippy::string_lit_as_bytes,
    clippy::match_same_arms,
    clippy::cargo,
    clippy::nursery,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    clippy::correctness,
    clippy::complexity,
    clippy::pedantic
)]
#![allow(clippy::missing_errors_doc)]

use crate::{
    error::{Error, ExecutionError},
    interpreter::{evaluator::core::Session, lexer::tokenize, parser::core::parse_program},
};

/// Defines the structure of parsed code.
///
/// This module declares the statement and expression types that represent
/// the syntactic structure of source code as a tree. The tree is built by
/// the parser and traversed by the evaluator.
///
/// # Responsibilities
/// - Defines statement and expression types for all language constructs.
/// - Attaches source lines to nodes for error reporting.
pub mod ast;
/// Provides unified error types for parsing and evaluation.
///
/// This module defines all errors that can be raised while lexing, parsing
/// or evaluating code, standardizes their human-readable messages, and
/// carries the machine-distinguishable kind plus any partial output back to
/// the caller.
///
/// # Responsibilities
/// - Defines error enums for all failure modes (lexer, parser, evaluator).
/// - Attaches line numbers and detailed messages for user feedback.
/// - Supports integration with standard error handling traits.
pub mod error;
/// Orchestrates the entire process of code execution.
///
/// This module ties together lexing, parsing, evaluation, value
/// representations and error handling to provide a complete runtime for
/// snippet execution. It exposes the public API for executing programs.
///
/// # Responsibilities
/// - Coordinates all core components: lexer, parser, evaluator, values.
/// - Provides the `execute` entry point.
/// - Manages the flow of data and errors between phases.
pub mod interpreter;

/// Executes a program and returns everything it printed.
///
/// Each call builds an entirely fresh interpreter session — scopes, method
/// tables, output buffer and resource counters — so concurrent or repeated
/// executions can never observe each other. The returned string is exactly
/// the program's output, including trailing line terminators; callers
/// grading a snippet compare it byte for byte against their expected string.
///
/// # Errors
/// Returns an [`ExecutionError`] when the source fails to parse or the
/// program fails at run time. Runtime failures carry the output produced
/// before the failure, so a caller can show what the program printed before
/// it stopped.
///
/// # Examples
/// ```
/// let output = spinel::execute("puts 1 + 2").unwrap();
/// assert_eq!(output, "3\n");
///
/// // Undefined variables are reported, not silently ignored.
/// assert!(spinel::execute("puts missing").is_err());
/// ```
pub fn execute(source: &str) -> Result<String, ExecutionError> {
    let tokens = match tokenize(source, 1) {
        Ok(tokens) => tokens,
        Err(e) => {
            return Err(ExecutionError { error: Error::Parse(e), output: String::new() });
        },
    };

    let mut iter = tokens.iter().peekable();
    let program = match parse_program(&mut iter) {
        Ok(program) => program,
        Err(e) => {
            return Err(ExecutionError { error: Error::Parse(e), output: String::new() });
        },
    };

    let mut session = Session::new();
    match session.run(&program) {
        Ok(_) => Ok(session.into_output()),
        Err(e) => Err(ExecutionError {
            error:  Error::Runtime(e),
            output: session.into_output(),
        }),
    }
}
