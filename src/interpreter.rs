/// The lexer module tokenizes source code for further parsing.
///
/// The lexer reads the raw source text and produces a stream of tokens, each
/// corresponding to meaningful language elements such as numbers, text
/// literals, identifiers, operators, delimiters and keywords. It tracks
/// quote state while scanning, so a comment marker inside a text literal is
/// content and an interpolation span cannot terminate its literal early.
///
/// # Responsibilities
/// - Converts the input character stream into tokens with source lines.
/// - Handles numeric, text and symbol literals, identifiers and operators.
/// - Reports lexical errors for unterminated literals or malformed input.
pub mod lexer;
/// The parser module builds the executable tree from tokens.
///
/// The parser processes the token stream produced by the lexer and
/// constructs the tree of statements and expressions that the evaluator
/// walks. Expression parsing is precedence-aware; statement parsing
/// recognizes the control constructs and locates each opener's matching
/// terminator.
///
/// # Responsibilities
/// - Converts tokens into structured statement and expression nodes.
/// - Validates grammar, rejecting unmatched terminators with location info.
/// - Supports the full statement surface: output, assignment, control flow,
///   definitions and iteration forms.
pub mod parser;
/// The evaluator module executes parsed programs and computes results.
///
/// The evaluator traverses the tree, evaluates expressions and statements,
/// dispatches built-in methods per value kind, manages the scope stack and
/// accumulates output. Every step is metered by the execution guard.
///
/// # Responsibilities
/// - Evaluates nodes, performing all supported operations.
/// - Handles variables, methods, control flow and block arguments.
/// - Reports runtime errors such as division by zero or unknown names.
pub mod evaluator;
/// The value module defines the runtime data types for evaluation.
///
/// This module declares the closed set of value kinds the language
/// manipulates and provides conversion, truthiness, equality and rendering
/// for them. Collections are reference-shared so aliased bindings observe
/// in-place mutation.
///
/// # Responsibilities
/// - Defines the `Value` enum and all supported kinds.
/// - Implements textual and inspect rendering.
/// - Provides structural equality and explicit copying.
pub mod value;
