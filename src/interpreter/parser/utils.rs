use std::iter::Peekable;

use crate::{error::ParseError, interpreter::lexer::Token};

use super::core::ParseResult;

/// Parses a comma-separated list of items until a closing token.
///
/// This utility is shared by array literals and argument lists. It repeatedly
/// calls `parse_item` to parse one element, expecting either a comma to
/// continue the list or the specified closing token to end it. An immediately
/// encountered closing token produces an empty list.
///
/// Grammar (simplified): `list := item ("," item)*`
///
/// # Errors
/// Returns a `ParseError` if an item fails to parse, an unexpected token is
/// encountered, or the stream ends before the closing token.
pub(in crate::interpreter::parser) fn parse_comma_separated<'a, I, T>(
    tokens: &mut Peekable<I>,
    parse_item: impl Fn(&mut Peekable<I>) -> ParseResult<T>,
    closing: &Token,
) -> ParseResult<Vec<T>>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut items = Vec::new();
    if let Some((tok, _)) = tokens.peek() {
        if *tok == *closing {
            tokens.next();
            return Ok(items);
        }
    }
    loop {
        items.push(parse_item(tokens)?);
        match tokens.peek() {
            Some((Token::Comma, _)) => {
                tokens.next();
            },
            Some((tok, _)) if *tok == *closing => {
                tokens.next();
                break;
            },
            Some((tok, line)) => {
                return Err(ParseError::UnexpectedToken {
                    token: format!("Expected ',' or {closing:?}, found {tok:?}"),
                    line:  *line,
                });
            },
            None => return Err(ParseError::UnexpectedEndOfInput { line: 0 }),
        }
    }
    Ok(items)
}

/// Parses a plain identifier and returns its name.
///
/// # Errors
/// Returns a `ParseError` if the next token is not an identifier or the input
/// ends unexpectedly.
pub(in crate::interpreter::parser) fn parse_identifier<'a, I>(
    tokens: &mut Peekable<I>,
) -> ParseResult<String>
    where I: Iterator<Item = &'a (Token, usize)>
{
    match tokens.next() {
        Some((Token::Identifier(s), _)) => Ok(s.clone()),
        Some((tok, line)) => Err(ParseError::UnexpectedToken {
            token: format!("Expected identifier, found {tok:?}"),
            line:  *line,
        }),
        None => Err(ParseError::UnexpectedEndOfInput { line: 0 }),
    }
}

/// Consumes the next token, which must equal `expected`, and returns its
/// line.
///
/// # Errors
/// Returns a `ParseError` naming the expected token otherwise.
pub(in crate::interpreter::parser) fn expect_token<'a, I>(
    tokens: &mut Peekable<I>,
    expected: &Token,
) -> ParseResult<usize>
    where I: Iterator<Item = &'a (Token, usize)>
{
    match tokens.next() {
        Some((tok, line)) if *tok == *expected => Ok(*line),
        Some((tok, line)) => Err(ParseError::UnexpectedToken {
            token: format!("Expected {expected:?}, found {tok:?}"),
            line:  *line,
        }),
        None => Err(ParseError::UnexpectedEndOfInput { line: 0 }),
    }
}

/// Skips any run of newline tokens.
pub(in crate::interpreter::parser) fn skip_newlines<'a, I>(tokens: &mut Peekable<I>)
    where I: Iterator<Item = &'a (Token, usize)>
{
    while let Some((Token::NewLine, _)) = tokens.peek() {
        tokens.next();
    }
}
