use std::iter::Peekable;

use crate::{
    ast::{Block, BlockArg, MethodDef, Param, ParamKind, Statement},
    error::ParseError,
    interpreter::{
        lexer::Token,
        parser::{
            core::{parse_expression, ParseResult},
            statement::parse_statement,
            utils::{expect_token, parse_identifier, skip_newlines},
        },
    },
};

/// Parses a statement body up to (but not consuming) one of the `stops`
/// tokens, tracking nested constructs through recursive statement parsing so
/// an inner construct's own terminator never closes the outer one.
///
/// # Errors
/// Returns [`ParseError::MissingEnd`] naming the opening `construct` and its
/// line when the input ends before a stop token is found.
pub(crate) fn parse_body<'a, I>(tokens: &mut Peekable<I>,
                                construct: &str,
                                open_line: usize,
                                stops: &[Token])
                                -> ParseResult<Block>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut statements = Vec::new();

    loop {
        skip_newlines(tokens);
        match tokens.peek() {
            None => {
                return Err(ParseError::MissingEnd {
                    construct: construct.to_string(),
                    line:      open_line,
                });
            },
            Some((tok, _)) if stops.contains(tok) => break,
            Some(_) => statements.push(parse_statement(tokens)?),
        }
        match tokens.peek() {
            Some((Token::NewLine, _)) | None => {},
            Some((tok, _)) if stops.contains(tok) => {},
            Some((tok, line)) => {
                return Err(ParseError::UnexpectedToken {
                    token: format!("Trailing input after statement: {tok:?}"),
                    line:  *line,
                });
            },
        }
    }

    Ok(Block { statements })
}

/// Parses an `if` statement with optional `elsif` chains and `else`.
///
/// Syntax:
/// ```text
///     if <condition> [then]
///       ...
///     elsif <condition> [then]
///       ...
///     else
///       ...
///     end
/// ```
pub(crate) fn parse_if<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let line = expect_token(tokens, &Token::If)?;
    let mut branches = Vec::new();
    let mut else_body = None;

    let condition = parse_expression(tokens)?;
    consume_optional(tokens, &Token::Then);
    let body = parse_body(tokens, "if", line, &[Token::End, Token::Elsif, Token::Else])?;
    branches.push((condition, body));

    loop {
        match tokens.peek() {
            Some((Token::Elsif, elsif_line)) => {
                let elsif_line = *elsif_line;
                tokens.next();
                let condition = parse_expression(tokens)?;
                consume_optional(tokens, &Token::Then);
                let body = parse_body(tokens,
                                      "if",
                                      elsif_line,
                                      &[Token::End, Token::Elsif, Token::Else])?;
                branches.push((condition, body));
            },
            Some((Token::Else, else_line)) => {
                let else_line = *else_line;
                tokens.next();
                else_body = Some(parse_body(tokens, "if", else_line, &[Token::End])?);
            },
            Some((Token::End, _)) => {
                tokens.next();
                break;
            },
            _ => return Err(ParseError::MissingEnd { construct: "if".to_string(), line }),
        }
    }

    Ok(Statement::If { branches, else_body, line })
}

/// Parses an `unless` statement with an optional `else`.
pub(crate) fn parse_unless<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let line = expect_token(tokens, &Token::Unless)?;
    let condition = parse_expression(tokens)?;
    consume_optional(tokens, &Token::Then);

    let body = parse_body(tokens, "unless", line, &[Token::End, Token::Else])?;
    let else_body = match tokens.peek() {
        Some((Token::Else, else_line)) => {
            let else_line = *else_line;
            tokens.next();
            Some(parse_body(tokens, "unless", else_line, &[Token::End])?)
        },
        _ => None,
    };
    expect_token(tokens, &Token::End)?;

    Ok(Statement::Unless { condition, body, else_body, line })
}

/// Parses a `while` loop.
pub(crate) fn parse_while<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let line = expect_token(tokens, &Token::While)?;
    let condition = parse_expression(tokens)?;
    consume_optional(tokens, &Token::Do);

    let body = parse_body(tokens, "while", line, &[Token::End])?;
    expect_token(tokens, &Token::End)?;

    Ok(Statement::While { condition, body, line })
}

/// Parses an `until` loop.
pub(crate) fn parse_until<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let line = expect_token(tokens, &Token::Until)?;
    let condition = parse_expression(tokens)?;
    consume_optional(tokens, &Token::Do);

    let body = parse_body(tokens, "until", line, &[Token::End])?;
    expect_token(tokens, &Token::End)?;

    Ok(Statement::Until { condition, body, line })
}

/// Parses a `for <variable> in <iterable>` loop.
pub(crate) fn parse_for<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let line = expect_token(tokens, &Token::For)?;
    let variable = parse_identifier(tokens)?;
    expect_token(tokens, &Token::In)?;
    let iterable = parse_expression(tokens)?;
    consume_optional(tokens, &Token::Do);

    let body = parse_body(tokens, "for", line, &[Token::End])?;
    expect_token(tokens, &Token::End)?;

    Ok(Statement::For { variable, iterable, body, line })
}

/// Parses a `case`/`when` statement.
///
/// The subject is evaluated once; each `when` arm may carry a
/// comma-separated value list and an optional `then`.
pub(crate) fn parse_case<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let line = expect_token(tokens, &Token::Case)?;
    let subject = parse_expression(tokens)?;
    let mut branches = Vec::new();
    let mut else_body = None;

    loop {
        skip_newlines(tokens);
        match tokens.peek() {
            Some((Token::When, when_line)) => {
                let when_line = *when_line;
                tokens.next();
                let mut values = vec![parse_expression(tokens)?];
                while let Some((Token::Comma, _)) = tokens.peek() {
                    tokens.next();
                    values.push(parse_expression(tokens)?);
                }
                consume_optional(tokens, &Token::Then);
                let body = parse_body(tokens,
                                      "when",
                                      when_line,
                                      &[Token::When, Token::Else, Token::End])?;
                branches.push((values, body));
            },
            Some((Token::Else, else_line)) => {
                let else_line = *else_line;
                tokens.next();
                else_body = Some(parse_body(tokens, "case", else_line, &[Token::End])?);
            },
            Some((Token::End, _)) => {
                tokens.next();
                break;
            },
            Some((tok, l)) => {
                return Err(ParseError::UnexpectedToken {
                    token: format!("Expected 'when' in case statement, found {tok:?}"),
                    line:  *l,
                });
            },
            None => {
                return Err(ParseError::MissingEnd { construct: "case".to_string(), line });
            },
        }
    }

    Ok(Statement::Case { subject, branches, else_body, line })
}

/// Parses a method definition.
///
/// Syntax: `def name(required, optional = expr, *rest, keyword:, other: expr)`
/// with the parameter list optional. Parameters must appear in declaration
/// order: required, optional, rest, keyword.
pub(crate) fn parse_def<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let line = expect_token(tokens, &Token::Def)?;
    let name = parse_identifier(tokens)?;

    let params = match tokens.peek() {
        Some((Token::LParen, _)) => {
            tokens.next();
            parse_params(tokens, line)?
        },
        _ => Vec::new(),
    };

    let body = parse_body(tokens, "def", line, &[Token::End])?;
    expect_token(tokens, &Token::End)?;

    Ok(Statement::MethodDef(MethodDef { name, params, body, line }))
}

/// Parses a class definition with an optional superclass.
pub(crate) fn parse_class<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let line = expect_token(tokens, &Token::Class)?;
    let name = parse_constant_name(tokens, "class")?;

    let superclass = match tokens.peek() {
        Some((Token::Less, _)) => {
            tokens.next();
            Some(parse_constant_name(tokens, "class")?)
        },
        _ => None,
    };

    let body = parse_body(tokens, "class", line, &[Token::End])?;
    expect_token(tokens, &Token::End)?;

    Ok(Statement::ClassDef { name, superclass, body, line })
}

/// Parses a module definition.
pub(crate) fn parse_module<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let line = expect_token(tokens, &Token::Module)?;
    let name = parse_constant_name(tokens, "module")?;

    let body = parse_body(tokens, "module", line, &[Token::End])?;
    expect_token(tokens, &Token::End)?;

    Ok(Statement::ModuleDef { name, body, line })
}

/// Parses a multi-line `do |params| ... end` block argument.
pub(crate) fn parse_do_block<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<BlockArg>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let line = expect_token(tokens, &Token::Do)?;
    let params = parse_block_params(tokens)?;

    let body = parse_body(tokens, "do", line, &[Token::End])?;
    expect_token(tokens, &Token::End)?;

    Ok(BlockArg { params, body })
}

/// Parses a one-line `{ |params| ... }` block argument.
pub(crate) fn parse_brace_block<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<BlockArg>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let line = expect_token(tokens, &Token::LBrace)?;
    let params = parse_block_params(tokens)?;

    let mut statements = Vec::new();
    loop {
        skip_newlines(tokens);
        match tokens.peek() {
            None => return Err(ParseError::UnexpectedEndOfInput { line }),
            Some((Token::RBrace, _)) => {
                tokens.next();
                break;
            },
            Some(_) => statements.push(parse_statement(tokens)?),
        }
    }

    Ok(BlockArg { params, body: Block { statements } })
}

/// Parses an optional `|a, b|` block parameter list.
fn parse_block_params<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Vec<String>>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut params = Vec::new();

    if let Some((Token::Pipe, _)) = tokens.peek() {
        tokens.next();
        loop {
            params.push(parse_identifier(tokens)?);
            match tokens.next() {
                Some((Token::Comma, _)) => {},
                Some((Token::Pipe, _)) => break,
                Some((tok, l)) => {
                    return Err(ParseError::UnexpectedToken {
                        token: format!("Expected ',' or '|' in block parameters, found {tok:?}"),
                        line:  *l,
                    });
                },
                None => return Err(ParseError::UnexpectedEndOfInput { line: 0 }),
            }
        }
    }

    Ok(params)
}

/// Parses a declared parameter list up to and including the closing `)`.
fn parse_params<'a, I>(tokens: &mut Peekable<I>, line: usize) -> ParseResult<Vec<Param>>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut params: Vec<Param> = Vec::new();
    let mut seen_optional = false;
    let mut seen_rest = false;

    if let Some((Token::RParen, _)) = tokens.peek() {
        tokens.next();
        return Ok(params);
    }

    loop {
        let param = match tokens.next() {
            Some((Token::Star, _)) => {
                if seen_rest {
                    return Err(ParseError::InvalidParameter {
                        details: "only one rest parameter is allowed".to_string(),
                        line,
                    });
                }
                seen_rest = true;
                Param { name: parse_identifier(tokens)?, kind: ParamKind::Rest }
            },
            Some((Token::Identifier(name), _)) => {
                let name = name.clone();
                match tokens.peek() {
                    Some((Token::Equals, _)) => {
                        tokens.next();
                        if seen_rest {
                            return Err(ParseError::InvalidParameter {
                                details: "optional parameter after rest parameter".to_string(),
                                line,
                            });
                        }
                        seen_optional = true;
                        let default = parse_expression(tokens)?;
                        Param { name, kind: ParamKind::Optional(default) }
                    },
                    Some((Token::Colon, _)) => {
                        tokens.next();
                        let default = match tokens.peek() {
                            Some((Token::Comma | Token::RParen, _)) => None,
                            _ => Some(parse_expression(tokens)?),
                        };
                        Param { name, kind: ParamKind::Keyword(default) }
                    },
                    _ => {
                        if seen_optional || seen_rest {
                            return Err(ParseError::InvalidParameter {
                                details: format!(
                                    "required parameter '{name}' after optional or rest parameter"
                                ),
                                line,
                            });
                        }
                        Param { name, kind: ParamKind::Required }
                    },
                }
            },
            Some((tok, l)) => {
                return Err(ParseError::UnexpectedToken {
                    token: format!("Expected parameter name, found {tok:?}"),
                    line:  *l,
                });
            },
            None => return Err(ParseError::UnexpectedEndOfInput { line }),
        };

        params.push(param);

        match tokens.next() {
            Some((Token::Comma, _)) => {},
            Some((Token::RParen, _)) => break,
            Some((tok, l)) => {
                return Err(ParseError::UnexpectedToken {
                    token: format!("Expected ',' or ')' in parameter list, found {tok:?}"),
                    line:  *l,
                });
            },
            None => return Err(ParseError::UnexpectedEndOfInput { line }),
        }
    }

    Ok(params)
}

/// Consumes the next token when it equals `expected`.
fn consume_optional<'a, I>(tokens: &mut Peekable<I>, expected: &Token)
    where I: Iterator<Item = &'a (Token, usize)>
{
    if let Some((tok, _)) = tokens.peek() {
        if *tok == *expected {
            tokens.next();
        }
    }
}

/// Parses a class or module name, which must start with an uppercase letter.
fn parse_constant_name<'a, I>(tokens: &mut Peekable<I>, construct: &str) -> ParseResult<String>
    where I: Iterator<Item = &'a (Token, usize)>
{
    match tokens.next() {
        Some((Token::Identifier(name), line)) => {
            if name.chars().next().is_some_and(char::is_uppercase) {
                Ok(name.clone())
            } else {
                Err(ParseError::UnexpectedToken {
                    token: format!("{construct} name '{name}' must start with an uppercase letter"),
                    line:  *line,
                })
            }
        },
        Some((tok, line)) => Err(ParseError::UnexpectedToken {
            token: format!("Expected {construct} name, found {tok:?}"),
            line:  *line,
        }),
        None => Err(ParseError::UnexpectedEndOfInput { line: 0 }),
    }
}
