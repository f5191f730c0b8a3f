use std::iter::Peekable;

use crate::{
    ast::{Block, Expr},
    error::ParseError,
    interpreter::{
        lexer::Token,
        parser::{binary::parse_logical_or, statement::parse_statement, utils::skip_newlines},
    },
};

pub type ParseResult<T> = Result<T, ParseError>;

/// Parses a whole program into a block of statements.
///
/// Statements are separated by newlines. Blank lines are skipped; a stray
/// block terminator at the top level is rejected by the statement parser.
///
/// # Errors
/// Propagates any parse error from the statement level, and rejects trailing
/// tokens left on a line after a complete statement.
pub fn parse_program<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Block>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut statements = Vec::new();

    loop {
        skip_newlines(tokens);
        if tokens.peek().is_none() {
            break;
        }
        statements.push(parse_statement(tokens)?);
        match tokens.peek() {
            Some((Token::NewLine, _)) | None => {},
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

/// Parses a full expression.
///
/// This is the entry point for expression parsing. It begins at the
/// lowest-precedence level, the ternary conditional, and recursively descends
/// through the precedence hierarchy.
///
/// Grammar: `expression := ternary`
pub fn parse_expression<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    parse_ternary(tokens)
}

/// Parses a ternary conditional expression.
///
/// Grammar: `ternary := logical_or ("?" ternary ":" ternary)?`
///
/// The branches are themselves ternary expressions, giving the usual
/// right-associative nesting.
fn parse_ternary<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let condition = parse_logical_or(tokens)?;

    if let Some((Token::Question, line)) = tokens.peek() {
        let line = *line;
        tokens.next();

        let then_expr = parse_ternary(tokens)?;

        match tokens.next() {
            Some((Token::Colon, _)) => {},
            Some((tok, l)) => {
                return Err(ParseError::UnexpectedToken {
                    token: format!("Expected ':' in ternary expression, found {tok:?}"),
                    line:  *l,
                });
            },
            None => return Err(ParseError::UnexpectedEndOfInput { line }),
        }

        let else_expr = parse_ternary(tokens)?;

        return Ok(Expr::Ternary {
            condition: Box::new(condition),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
            line,
        });
    }

    Ok(condition)
}
