use logos::Logos;

use crate::error::ParseError;

/// Represents a lexical token in the source input.
/// A token is a minimal but meaningful unit of text produced by the lexer.
/// This enum defines all recognized tokens in the language.
#[derive(Logos, Debug, PartialEq, Clone)]
#[logos(extras = LexerExtras)]
pub enum Token {
    /// Floating-point literal tokens, such as `3.14`.
    #[regex(r"[0-9]+\.[0-9]+", parse_float)]
    Float(f64),
    /// Integer literal tokens, such as `42`.
    #[regex(r"[0-9]+", parse_integer)]
    Integer(i64),
    /// Boolean literal tokens, `true` or `false`.
    #[token("true", parse_bool)]
    #[token("false", parse_bool)]
    Bool(bool),
    /// `nil`
    #[token("nil")]
    Nil,
    /// A double-quoted text literal. The stored contents are raw: escape
    /// sequences and `#{...}` interpolation spans are processed by the
    /// parser, but the lexer tracks interpolation braces and nested quotes so
    /// that a `"` or `#` inside an interpolation span does not terminate the
    /// literal or start a comment.
    #[token("\"", lex_double_quoted)]
    Text(String),
    /// A single-quoted text literal, verbatim except for `\'` and `\\`.
    #[token("'", lex_single_quoted)]
    RawText(String),
    /// A `:name` symbol literal.
    #[regex(r":[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice()[1..].to_string())]
    Symbol(String),
    /// `if`
    #[token("if")]
    If,
    /// `elsif`
    #[token("elsif")]
    Elsif,
    /// `else`
    #[token("else")]
    Else,
    /// `unless`
    #[token("unless")]
    Unless,
    /// `while`
    #[token("while")]
    While,
    /// `until`
    #[token("until")]
    Until,
    /// `for`
    #[token("for")]
    For,
    /// `in`
    #[token("in")]
    In,
    /// `do`
    #[token("do")]
    Do,
    /// `end`
    #[token("end")]
    End,
    /// `def`
    #[token("def")]
    Def,
    /// `class`
    #[token("class")]
    Class,
    /// `module`
    #[token("module")]
    Module,
    /// `case`
    #[token("case")]
    Case,
    /// `when`
    #[token("when")]
    When,
    /// `then`
    #[token("then")]
    Then,
    /// `return`
    #[token("return")]
    Return,
    /// `break`
    #[token("break")]
    Break,
    /// `next`
    #[token("next")]
    Next,
    /// Identifier tokens; variable or method names such as `x` or `even?`.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*\??", |lex| lex.slice().to_string())]
    Identifier(String),
    /// `# Comments.`
    #[regex(r"#[^\n]*", logos::skip)]
    Comment,
    /// `**`
    #[token("**")]
    StarStar,
    /// `==`
    #[token("==")]
    EqualEqual,
    /// `!=`
    #[token("!=")]
    BangEqual,
    /// `<=`
    #[token("<=")]
    LessEqual,
    /// `>=`
    #[token(">=")]
    GreaterEqual,
    /// `&&`
    #[token("&&")]
    AndAnd,
    /// `||`
    #[token("||")]
    OrOr,
    /// `...`
    #[token("...")]
    DotDotDot,
    /// `..`
    #[token("..")]
    DotDot,
    /// `=>`
    #[token("=>")]
    HashRocket,
    /// `<<`
    #[token("<<")]
    Shovel,
    /// `->`
    #[token("->")]
    Arrow,
    /// `+=`
    #[token("+=")]
    PlusAssign,
    /// `-=`
    #[token("-=")]
    MinusAssign,
    /// `*=`
    #[token("*=")]
    MulAssign,
    /// `/=`
    #[token("/=")]
    DivAssign,
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,
    /// `%`
    #[token("%")]
    Percent,
    /// `<`
    #[token("<")]
    Less,
    /// `>`
    #[token(">")]
    Greater,
    /// `=`
    #[token("=")]
    Equals,
    /// `!`
    #[token("!")]
    Bang,
    /// `?`
    #[token("?")]
    Question,
    /// `:`
    #[token(":")]
    Colon,
    /// `.`
    #[token(".")]
    Dot,
    /// `,`
    #[token(",")]
    Comma,
    /// `|`
    #[token("|")]
    Pipe,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,

    /// Statement separator.
    #[token("\n", |lex| {
        lex.extras.line += 1;
    })]
    NewLine,
    /// Spaces, tabs and carriage returns.
    #[regex(r"[ \t\r\f]+", logos::skip)]
    Ignored,
}

/// Additional information carried by the lexer during tokenization.
///
/// Tracks the current line number for error reporting and diagnostics.
#[derive(Default)]
pub struct LexerExtras {
    /// The current line number in the source being tokenized.
    pub line: usize,
}

/// Tokenizes a source string into `(Token, line)` pairs.
///
/// `first_line` seeds the line counter so that interpolation spans embedded
/// in text literals report errors against the enclosing literal's line.
///
/// # Errors
/// Returns a [`ParseError`] when the input contains an unterminated quoted
/// literal or a character sequence that is not part of the language.
pub fn tokenize(source: &str, first_line: usize) -> Result<Vec<(Token, usize)>, ParseError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer_with_extras(source, LexerExtras { line: first_line });

    while let Some(token) = lexer.next() {
        match token {
            Ok(tok) => tokens.push((tok, lexer.extras.line)),
            Err(()) => {
                let slice = lexer.slice();
                let line = lexer.extras.line;
                if slice.starts_with('"') || slice.starts_with('\'') {
                    return Err(ParseError::UnterminatedText { line });
                }
                return Err(ParseError::UnexpectedToken { token: slice.to_string(), line });
            },
        }
    }

    Ok(tokens)
}

/// Parses a floating-point literal from the current token slice.
fn parse_float(lex: &logos::Lexer<Token>) -> Option<f64> {
    lex.slice().parse().ok()
}
/// Parses an integer literal from the current token slice.
fn parse_integer(lex: &logos::Lexer<Token>) -> Option<i64> {
    lex.slice().parse().ok()
}
/// Parses a boolean literal from the current token slice (`true` or `false`).
fn parse_bool(lex: &logos::Lexer<Token>) -> Option<bool> {
    match lex.slice() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Consumes the body of a double-quoted literal, starting just after the
/// opening quote, and returns its raw contents.
///
/// The scan tracks three pieces of state so the literal ends at the right
/// quote: backslash escapes, the brace depth of `#{...}` interpolation spans,
/// and quote characters nested inside an interpolation span. A `"` only
/// terminates the literal at interpolation depth zero.
///
/// Returns `None` (a lexer error) when the input ends before the closing
/// quote.
fn lex_double_quoted(lex: &mut logos::Lexer<Token>) -> Option<String> {
    let remainder = lex.remainder();
    let bytes = remainder.as_bytes();
    let mut i = 0;
    let mut depth = 0usize;
    let mut inner_quote: Option<u8> = None;
    let mut newlines = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' {
            i += 2;
            continue;
        }
        if b == b'\n' {
            newlines += 1;
            i += 1;
            continue;
        }
        if depth == 0 {
            if b == b'"' {
                let contents = remainder[..i].to_string();
                lex.extras.line += newlines;
                lex.bump(i + 1);
                return Some(contents);
            }
            if b == b'#' && bytes.get(i + 1) == Some(&b'{') {
                depth = 1;
                i += 2;
                continue;
            }
        } else if let Some(q) = inner_quote {
            if b == q {
                inner_quote = None;
            }
        } else {
            match b {
                b'"' | b'\'' => inner_quote = Some(b),
                b'{' => depth += 1,
                b'}' => depth -= 1,
                _ => {},
            }
        }
        i += 1;
    }

    None
}

/// Consumes the body of a single-quoted literal, starting just after the
/// opening quote, and returns its raw contents.
///
/// Single-quoted text is verbatim: the only recognized escapes are `\'` and
/// `\\`. Returns `None` (a lexer error) when the input ends before the
/// closing quote.
fn lex_single_quoted(lex: &mut logos::Lexer<Token>) -> Option<String> {
    let remainder = lex.remainder();
    let bytes = remainder.as_bytes();
    let mut i = 0;
    let mut newlines = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' if matches!(bytes.get(i + 1), Some(b'\'' | b'\\')) => i += 2,
            b'\'' => {
                let contents = remainder[..i].to_string();
                lex.extras.line += newlines;
                lex.bump(i + 1);
                return Some(contents);
            },
            b'\n' => {
                newlines += 1;
                i += 1;
            },
            _ => i += 1,
        }
    }

    None
}
