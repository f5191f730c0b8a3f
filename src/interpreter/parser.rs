/// Expression parsing entry points and the ternary level.
///
/// Contains the `parse_expression` entry point that begins the precedence
/// descent, plus top-level program parsing.
pub mod core;

/// Binary operator parsing.
///
/// Implements the precedence ladder from logical OR down to exponentiation,
/// including the range level (`..` / `...`).
pub mod binary;

/// Unary, postfix and primary expression parsing.
///
/// Handles prefix `!`/`-`, method-call chains with arguments and one-line
/// blocks, indexing, literals of every kind, and the segmentation of
/// interpolated text.
pub mod unary;

/// Statement parsing.
///
/// Recognizes output statements, the assignment family, appends, control
/// transfers, postfix modifiers, and bare expression statements, delegating
/// compound constructs to the block parser.
pub mod statement;

/// Compound construct parsing.
///
/// Parses `if`/`elsif`/`else`, `unless`, `while`, `until`, `for`, `case`,
/// `def`, `class` and `module` bodies, locating each opener's matching `end`
/// across nesting and rejecting unterminated constructs.
pub mod block;

/// Shared parsing utilities.
///
/// Comma-separated lists, identifier extraction and token expectation
/// helpers used across the parser.
pub mod utils;
