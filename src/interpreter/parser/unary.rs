use std::iter::Peekable;

use crate::{
    ast::{Argument, Expr, LiteralValue, TextSegment, UnaryOperator},
    error::ParseError,
    interpreter::{
        lexer::{tokenize, Token},
        parser::{
            block::parse_brace_block,
            core::{parse_expression, ParseResult},
            utils::{parse_comma_separated, parse_identifier, skip_newlines},
        },
    },
};

/// Parses a unary expression.
///
/// Supports the prefix operators `-` (numeric negation) and `!` (logical
/// not), both right-associative. A `-` directly in front of a numeric
/// literal still parses as negation and folds to the same result at
/// evaluation time.
///
/// Grammar:
/// ```text
///     unary := ("-" | "!") unary
///            | primary postfix*
/// ```
pub(crate) fn parse_unary<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    if let Some((Token::Minus, line)) = tokens.peek() {
        let line = *line;
        tokens.next();
        // A '-' directly in front of a numeric literal folds into a negative
        // literal before postfix parsing, so `-7 / 2` floors to -4 and
        // `-5.abs` is 5; in front of anything else it stays a negation that
        // binds tighter than postfix, as usual for a prefix operator.
        match tokens.peek() {
            Some((Token::Integer(n), _)) => {
                let value = LiteralValue::Integer(-n);
                tokens.next();
                let literal = Expr::Literal { value, line };
                return parse_postfix(tokens, literal);
            },
            Some((Token::Float(r), _)) => {
                let value = LiteralValue::Float(-r);
                tokens.next();
                let literal = Expr::Literal { value, line };
                return parse_postfix(tokens, literal);
            },
            _ => {},
        }
        let expr = parse_unary(tokens)?;
        return Ok(Expr::UnaryOp {
            op: UnaryOperator::Negate,
            expr: Box::new(expr),
            line,
        });
    }
    if let Some((Token::Bang, line)) = tokens.peek() {
        let line = *line;
        tokens.next();
        let expr = parse_unary(tokens)?;
        return Ok(Expr::UnaryOp {
            op: UnaryOperator::Not,
            expr: Box::new(expr),
            line,
        });
    }

    let primary = parse_primary(tokens)?;
    parse_postfix(tokens, primary)
}

/// Parses a primary (atomic) expression.
///
/// Primary expressions form the base of the expression grammar and include:
/// - numeric, boolean and `nil` literals
/// - double- and single-quoted text literals (with interpolation)
/// - `:name` symbol literals
/// - identifiers and receiver-less calls `name(args)`
/// - parenthesized expressions
/// - array literals `[ ... ]`
/// - mapping literals `{ k => v }` / `{ key: v }`
///
/// An identifier that matches nothing else becomes a plain variable
/// reference, resolved at evaluation time as "variable, else error".
pub(crate) fn parse_primary<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let (token, line) = match tokens.next() {
        Some((token, line)) => (token, *line),
        None => return Err(ParseError::UnexpectedEndOfInput { line: 0 }),
    };

    match token {
        Token::Integer(n) => Ok(Expr::Literal { value: LiteralValue::Integer(*n), line }),
        Token::Float(r) => Ok(Expr::Literal { value: LiteralValue::Float(*r), line }),
        Token::Bool(b) => Ok(Expr::Literal { value: LiteralValue::Bool(*b), line }),
        Token::Nil => Ok(Expr::Literal { value: LiteralValue::Nil, line }),

        Token::Text(raw) => parse_text_literal(raw, line),
        Token::RawText(raw) => Ok(Expr::Text {
            segments: vec![TextSegment::Literal(unescape_single_quoted(raw))],
            line,
        }),
        Token::Symbol(name) => Ok(Expr::Symbol { name: name.clone(), line }),

        Token::Identifier(name) => {
            if let Some((Token::LParen, _)) = tokens.peek() {
                tokens.next();
                let arguments = parse_arguments(tokens)?;
                let block = match tokens.peek() {
                    Some((Token::LBrace, _)) => Some(parse_brace_block(tokens)?),
                    _ => None,
                };
                return Ok(Expr::MethodCall {
                    receiver: None,
                    name: name.clone(),
                    arguments,
                    block,
                    line,
                });
            }
            Ok(Expr::Variable { name: name.clone(), line })
        },

        Token::Arrow => {
            let params = match tokens.peek() {
                Some((Token::LParen, _)) => {
                    tokens.next();
                    parse_comma_separated(tokens, parse_identifier, &Token::RParen)?
                },
                _ => Vec::new(),
            };
            let block = parse_brace_block(tokens)?;
            let params = if params.is_empty() { block.params } else { params };
            Ok(Expr::Lambda { params, body: block.body, line })
        },

        Token::LParen => {
            let expr = parse_expression(tokens)?;
            match tokens.next() {
                Some((Token::RParen, _)) => Ok(expr),
                Some((tok, l)) => Err(ParseError::UnexpectedToken {
                    token: format!("Expected ')', found {tok:?}"),
                    line:  *l,
                }),
                None => Err(ParseError::UnexpectedEndOfInput { line }),
            }
        },

        Token::LBracket => {
            let elements = parse_comma_separated(tokens, parse_expression, &Token::RBracket)?;
            Ok(Expr::ArrayLiteral { elements, line })
        },

        Token::LBrace => parse_mapping_literal(tokens, line),

        tok => Err(ParseError::UnexpectedToken {
            token: format!("{tok:?}"),
            line,
        }),
    }
}

/// Parses the postfix chain that may follow a primary expression: method
/// calls (with optional argument lists and one-line `{ |x| ... }` blocks)
/// and indexing.
///
/// Grammar:
/// ```text
///     postfix := "." name ("(" arguments ")")? brace_block?
///              | "[" expression "]"
/// ```
fn parse_postfix<'a, I>(tokens: &mut Peekable<I>, mut expr: Expr) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    loop {
        match tokens.peek() {
            Some((Token::Dot, line)) => {
                let line = *line;
                tokens.next();

                let name = match tokens.next() {
                    Some((Token::Identifier(s), _)) => s.clone(),
                    Some((tok, l)) => {
                        return Err(ParseError::UnexpectedToken {
                            token: format!("Expected method name after '.', found {tok:?}"),
                            line:  *l,
                        });
                    },
                    None => return Err(ParseError::UnexpectedEndOfInput { line }),
                };

                let arguments = match tokens.peek() {
                    Some((Token::LParen, _)) => {
                        tokens.next();
                        parse_arguments(tokens)?
                    },
                    _ => Vec::new(),
                };

                let block = match tokens.peek() {
                    Some((Token::LBrace, _)) => Some(parse_brace_block(tokens)?),
                    _ => None,
                };

                expr = Expr::MethodCall {
                    receiver: Some(Box::new(expr)),
                    name,
                    arguments,
                    block,
                    line,
                };
            },
            Some((Token::LBracket, line)) => {
                let line = *line;
                tokens.next();
                let index = parse_expression(tokens)?;
                match tokens.next() {
                    Some((Token::RBracket, _)) => {},
                    Some((tok, l)) => {
                        return Err(ParseError::UnexpectedToken {
                            token: format!("Expected ']', found {tok:?}"),
                            line:  *l,
                        });
                    },
                    None => return Err(ParseError::UnexpectedEndOfInput { line }),
                }
                expr = Expr::Index {
                    target: Box::new(expr),
                    index: Box::new(index),
                    line,
                };
            },
            _ => break,
        }
    }

    Ok(expr)
}

/// Parses a call argument list up to and including the closing `)`.
///
/// Each element is positional unless it takes the `name: value` form, which
/// produces a keyword argument.
pub(crate) fn parse_arguments<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Vec<Argument>>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    parse_comma_separated(
        tokens,
        |tokens| {
            let mut lookahead = tokens.clone();
            let keyword = matches!(lookahead.next(), Some((Token::Identifier(_), _)))
                && matches!(lookahead.peek(), Some((Token::Colon, _)));

            if keyword {
                let name = parse_identifier(tokens)?;
                tokens.next(); // the ':'
                let value = parse_expression(tokens)?;
                Ok(Argument::Keyword { name, value })
            } else {
                Ok(Argument::Positional(parse_expression(tokens)?))
            }
        },
        &Token::RParen,
    )
}

/// Parses a mapping literal after its opening `{` has been consumed.
///
/// Both pair forms are accepted: `key => value` with an arbitrary key
/// expression, and `name: value` which implicitly produces a symbol key.
fn parse_mapping_literal<'a, I>(tokens: &mut Peekable<I>, line: usize) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let pairs = parse_comma_separated(
        tokens,
        |tokens| {
            let mut lookahead = tokens.clone();
            let shorthand = matches!(lookahead.next(), Some((Token::Identifier(_), _)))
                && matches!(lookahead.peek(), Some((Token::Colon, _)));

            if shorthand {
                let key_line = tokens.peek().map_or(line, |(_, l)| *l);
                let name = parse_identifier(tokens)?;
                tokens.next(); // the ':'
                let value = parse_expression(tokens)?;
                return Ok((Expr::Symbol { name, line: key_line }, value));
            }

            let key = parse_expression(tokens)?;
            match tokens.next() {
                Some((Token::HashRocket, _)) => {},
                Some((tok, l)) => {
                    return Err(ParseError::UnexpectedToken {
                        token: format!("Expected '=>' in hash literal, found {tok:?}"),
                        line:  *l,
                    });
                },
                None => return Err(ParseError::UnexpectedEndOfInput { line }),
            }
            let value = parse_expression(tokens)?;
            Ok((key, value))
        },
        &Token::RBrace,
    )?;

    Ok(Expr::MappingLiteral { pairs, line })
}

/// Parses the raw contents of a double-quoted literal into text segments.
///
/// Escape sequences are processed here (`\n`, `\t`, `\r`, `\\`, `\"`, `\'`
/// and `\#`; anything else keeps its backslash), and each `#{...}` span is
/// recursively tokenized and parsed as a full expression, to be spliced in at
/// evaluation time. The span scan tracks brace depth and nested quotes, so
/// interpolations may themselves contain text literals with interpolations.
pub(in crate::interpreter::parser) fn parse_text_literal(raw: &str,
                                                         line: usize)
                                                         -> ParseResult<Expr> {
    let chars: Vec<char> = raw.chars().collect();
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' && i + 1 < chars.len() {
            let next = chars[i + 1];
            match next {
                'n' => literal.push('\n'),
                't' => literal.push('\t'),
                'r' => literal.push('\r'),
                '\\' | '"' | '\'' | '#' => literal.push(next),
                other => {
                    literal.push('\\');
                    literal.push(other);
                },
            }
            i += 2;
            continue;
        }

        if c == '#' && chars.get(i + 1) == Some(&'{') {
            let mut depth = 1usize;
            let mut quote: Option<char> = None;
            let mut escaped = false;
            let mut j = i + 2;

            while j < chars.len() {
                let cj = chars[j];
                if escaped {
                    escaped = false;
                    j += 1;
                    continue;
                }
                if cj == '\\' {
                    escaped = true;
                    j += 1;
                    continue;
                }
                if let Some(q) = quote {
                    if cj == q {
                        quote = None;
                    }
                } else {
                    match cj {
                        '"' | '\'' => quote = Some(cj),
                        '{' => depth += 1,
                        '}' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        },
                        _ => {},
                    }
                }
                j += 1;
            }

            if j >= chars.len() {
                return Err(ParseError::UnterminatedInterpolation { line });
            }

            if !literal.is_empty() {
                segments.push(TextSegment::Literal(std::mem::take(&mut literal)));
            }

            let inner: String = chars[i + 2..j].iter().collect();
            let inner_tokens = tokenize(&inner, line)?;
            let mut iter = inner_tokens.iter().peekable();
            let expr = parse_expression(&mut iter)?;
            skip_newlines(&mut iter);
            if let Some((tok, l)) = iter.peek() {
                return Err(ParseError::UnexpectedToken {
                    token: format!("Trailing input in interpolation: {tok:?}"),
                    line:  *l,
                });
            }
            segments.push(TextSegment::Interpolation(Box::new(expr)));

            i = j + 1;
            continue;
        }

        literal.push(c);
        i += 1;
    }

    if !literal.is_empty() || segments.is_empty() {
        segments.push(TextSegment::Literal(literal));
    }

    Ok(Expr::Text { segments, line })
}

/// Undoes the two escapes single-quoted text supports: `\'` and `\\`.
fn unescape_single_quoted(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('\'') => {
                    out.push('\'');
                    chars.next();
                },
                Some('\\') => {
                    out.push('\\');
                    chars.next();
                },
                _ => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }

    out
}
