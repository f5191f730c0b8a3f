#[derive(Debug)]
/// Represents all errors that can occur during lexing or parsing.
pub enum ParseError {
    /// Found an unexpected token while parsing.
    UnexpectedToken {
        /// The token encountered, or a description of what was expected.
        token: String,
        /// The source line where the error occurred.
        line:  usize,
    },
    /// Reached the end of input unexpectedly.
    UnexpectedEndOfInput {
        /// The source line where the error occurred.
        line: usize,
    },
    /// A quoted literal was never closed.
    UnterminatedText {
        /// The source line where the literal starts.
        line: usize,
    },
    /// A block-opening construct has no matching `end`.
    MissingEnd {
        /// The keyword that opened the construct (`if`, `while`, `def`, ...).
        construct: String,
        /// The source line of the opener.
        line:      usize,
    },
    /// A keyword that only makes sense inside a compound construct appeared
    /// with no opener (`end`, `else`, `elsif`, `when`).
    DanglingKeyword {
        /// The stray keyword.
        keyword: String,
        /// The source line where it appeared.
        line:    usize,
    },
    /// A method definition header was malformed.
    InvalidParameter {
        /// Details about what is wrong with the parameter list.
        details: String,
        /// The source line of the definition.
        line:    usize,
    },
    /// An interpolation span `#{...}` was left unclosed inside a text literal.
    UnterminatedInterpolation {
        /// The source line of the literal.
        line: usize,
    },
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedToken { token, line } => {
                write!(f, "Error on line {line}: Unexpected token: {token}.")
            },

            Self::UnexpectedEndOfInput { line } => {
                write!(f, "Error on line {line}: Unexpected end of input.")
            },

            Self::UnterminatedText { line } => {
                write!(f, "Error on line {line}: Unterminated string literal.")
            },

            Self::MissingEnd { construct, line } => {
                write!(f, "Error on line {line}: Missing 'end' for '{construct}'.")
            },

            Self::DanglingKeyword { keyword, line } => {
                write!(f, "Error on line {line}: '{keyword}' without a matching opener.")
            },

            Self::InvalidParameter { details, line } => {
                write!(f, "Error on line {line}: Invalid method definition: {details}.")
            },

            Self::UnterminatedInterpolation { line } => {
                write!(f, "Error on line {line}: Unterminated interpolation in string literal.")
            },
        }
    }
}

impl std::error::Error for ParseError {}
