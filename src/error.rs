/// Errors raised while lexing or parsing, before any evaluation occurs.
pub mod parse_error;
/// Errors raised while evaluating a parsed program.
pub mod runtime_error;

pub use parse_error::ParseError;
pub use runtime_error::{ResourceLimit, RuntimeError};

/// Any failure an execution request can produce, parse-time or run-time.
#[derive(Debug)]
pub enum Error {
    /// The source failed to lex or parse. No output was produced.
    Parse(ParseError),
    /// Evaluation failed after parsing succeeded. Output produced before the
    /// failure is still available to the caller.
    Runtime(RuntimeError),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(e) => write!(f, "{e}"),
            Self::Runtime(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<RuntimeError> for Error {
    fn from(e: RuntimeError) -> Self {
        Self::Runtime(e)
    }
}

/// A failed execution request: the structured error plus whatever output the
/// program had produced before failing.
///
/// Callers that grade snippets can show the partial output ("your code
/// printed X before failing") alongside the error message.
#[derive(Debug)]
pub struct ExecutionError {
    /// What went wrong.
    pub error:  Error,
    /// Output buffered before the failure. Empty for parse errors.
    pub output: String,
}

impl std::fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for ExecutionError {}
