use std::iter::Peekable;

use crate::{
    ast::{BinaryOperator, Block, Expr, OutputStyle, Statement},
    error::ParseError,
    interpreter::{
        lexer::Token,
        parser::{
            block::{
                parse_case, parse_class, parse_def, parse_do_block, parse_for, parse_if,
                parse_module, parse_unless, parse_until, parse_while,
            },
            core::{parse_expression, ParseResult},
        },
    },
};

/// Parses a single statement.
///
/// Compound constructs (`if`, `unless`, `while`, `until`, `for`, `case`,
/// `def`, `class`, `module`) are delegated to the block parser and consume
/// their own terminators. Everything else is a simple statement — output,
/// assignment, append, control transfer or bare expression — optionally
/// wrapped by a postfix `if`/`unless` modifier.
///
/// A stray `end`, `else`, `elsif` or `when` is rejected here: those keywords
/// only close or separate a compound construct and never open a statement.
pub fn parse_statement<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    match tokens.peek() {
        Some((Token::If, _)) => return parse_if(tokens),
        Some((Token::Unless, _)) => return parse_unless(tokens),
        Some((Token::While, _)) => return parse_while(tokens),
        Some((Token::Until, _)) => return parse_until(tokens),
        Some((Token::For, _)) => return parse_for(tokens),
        Some((Token::Case, _)) => return parse_case(tokens),
        Some((Token::Def, _)) => return parse_def(tokens),
        Some((Token::Class, _)) => return parse_class(tokens),
        Some((Token::Module, _)) => return parse_module(tokens),
        Some((tok @ (Token::End | Token::Else | Token::Elsif | Token::When), line)) => {
            let keyword = match tok {
                Token::End => "end",
                Token::Else => "else",
                Token::Elsif => "elsif",
                _ => "when",
            };
            return Err(ParseError::DanglingKeyword {
                keyword: keyword.to_string(),
                line:    *line,
            });
        },
        _ => {},
    }

    let statement = parse_simple_statement(tokens)?;
    attach_postfix_modifier(tokens, statement)
}

/// Parses a simple (single-line) statement.
fn parse_simple_statement<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    match tokens.peek() {
        Some((Token::Return, line)) => {
            let line = *line;
            tokens.next();
            let value = if ends_statement(tokens) {
                None
            } else {
                Some(parse_expression(tokens)?)
            };
            return Ok(Statement::Return { value, line });
        },
        Some((Token::Break, line)) => {
            let line = *line;
            tokens.next();
            return Ok(Statement::Break { line });
        },
        Some((Token::Next, line)) => {
            let line = *line;
            tokens.next();
            return Ok(Statement::Next { line });
        },
        _ => {},
    }

    if let Some(statement) = parse_assignment_like(tokens)? {
        return Ok(statement);
    }
    if let Some(statement) = parse_output(tokens)? {
        return Ok(statement);
    }

    let line = tokens.peek().map_or(0, |(_, l)| *l);
    let expr = parse_expression_with_block(tokens)?;
    Ok(Statement::Expression { expr, line })
}

/// Parses the assignment family with limited lookahead, without consuming
/// tokens when no assignment shape matches.
///
/// Recognized shapes, all starting with an identifier:
/// - `name = expr` and the compound forms `+= -= *= /=`
/// - `name[index] = expr`
/// - `name << expr`
///
/// The lookahead rejects `==`, `!=`, `<=`, `>=` as false positives: those
/// lines parse as plain expressions.
fn parse_assignment_like<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Option<Statement>>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    if !matches!(tokens.peek(), Some((Token::Identifier(_), _))) {
        return Ok(None);
    }

    let mut lookahead = tokens.clone();
    lookahead.next();

    match lookahead.peek() {
        Some((Token::Equals, line)) => {
            let line = *line;
            let name = take_identifier(tokens);
            tokens.next(); // '='
            let value = parse_expression_with_block(tokens)?;
            Ok(Some(Statement::Assignment { name, op: None, value, line }))
        },
        Some((
            op_token @ (Token::PlusAssign | Token::MinusAssign | Token::MulAssign
            | Token::DivAssign),
            line,
        )) => {
            let line = *line;
            let op = match op_token {
                Token::PlusAssign => BinaryOperator::Add,
                Token::MinusAssign => BinaryOperator::Sub,
                Token::MulAssign => BinaryOperator::Mul,
                _ => BinaryOperator::Div,
            };
            let name = take_identifier(tokens);
            tokens.next(); // the operator
            let value = parse_expression_with_block(tokens)?;
            Ok(Some(Statement::Assignment { name, op: Some(op), value, line }))
        },
        Some((Token::Shovel, line)) => {
            let line = *line;
            let name = take_identifier(tokens);
            tokens.next(); // '<<'
            let value = parse_expression(tokens)?;
            Ok(Some(Statement::Append { name, value, line }))
        },
        Some((Token::LBracket, _)) => {
            // Scan past the bracketed index; only `] =` makes this an
            // element assignment.
            lookahead.next();
            let mut depth = 1usize;
            while depth > 0 {
                match lookahead.next() {
                    Some((Token::LBracket, _)) => depth += 1,
                    Some((Token::RBracket, _)) => depth -= 1,
                    Some(_) => {},
                    None => return Ok(None),
                }
            }
            if !matches!(lookahead.peek(), Some((Token::Equals, _))) {
                return Ok(None);
            }

            let target = take_identifier(tokens);
            let line = tokens.peek().map_or(0, |(_, l)| *l);
            tokens.next(); // '['
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
            tokens.next(); // '='
            let value = parse_expression(tokens)?;
            Ok(Some(Statement::IndexAssignment { target, index, value, line }))
        },
        _ => Ok(None),
    }
}

/// Parses an output statement (`puts`, `p`, `print`) with a comma-separated
/// argument list, or returns `Ok(None)` when the line starts with anything
/// else.
///
/// A bare `puts` with no arguments is valid and emits a single newline.
fn parse_output<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Option<Statement>>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let (style, line) = match tokens.peek() {
        Some((Token::Identifier(name), line)) => match name.as_str() {
            "puts" => (OutputStyle::Puts, *line),
            "p" => (OutputStyle::Inspect, *line),
            "print" => (OutputStyle::Print, *line),
            _ => return Ok(None),
        },
        _ => return Ok(None),
    };
    tokens.next();

    let mut expressions = Vec::new();
    if !ends_statement(tokens) {
        expressions.push(parse_expression(tokens)?);
        while let Some((Token::Comma, _)) = tokens.peek() {
            tokens.next();
            expressions.push(parse_expression(tokens)?);
        }
    }

    Ok(Some(Statement::Output { style, expressions, line }))
}

/// Parses an expression and attaches a trailing `do |x| ... end` block to its
/// outermost method call, when one follows.
fn parse_expression_with_block<'a, I>(tokens: &mut Peekable<I>) -> ParseResult<Expr>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    let mut expr = parse_expression(tokens)?;

    if let Some((Token::Do, line)) = tokens.peek() {
        let line = *line;
        match &mut expr {
            Expr::MethodCall { block: block_slot @ None, .. } => {
                *block_slot = Some(parse_do_block(tokens)?);
            },
            _ => {
                return Err(ParseError::UnexpectedToken {
                    token: "'do' without a preceding method call".to_string(),
                    line,
                });
            },
        }
    }

    Ok(expr)
}

/// Wraps a simple statement in a postfix `if`/`unless` modifier when one
/// follows on the same line.
fn attach_postfix_modifier<'a, I>(tokens: &mut Peekable<I>,
                                  statement: Statement)
                                  -> ParseResult<Statement>
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    match tokens.peek() {
        Some((Token::If, line)) => {
            let line = *line;
            tokens.next();
            let condition = parse_expression(tokens)?;
            Ok(Statement::If {
                branches:  vec![(condition, Block { statements: vec![statement] })],
                else_body: None,
                line,
            })
        },
        Some((Token::Unless, line)) => {
            let line = *line;
            tokens.next();
            let condition = parse_expression(tokens)?;
            Ok(Statement::Unless {
                condition,
                body: Block { statements: vec![statement] },
                else_body: None,
                line,
            })
        },
        _ => Ok(statement),
    }
}

/// Returns `true` when the statement has no further tokens on its line.
fn ends_statement<'a, I>(tokens: &mut Peekable<I>) -> bool
    where I: Iterator<Item = &'a (Token, usize)> + Clone
{
    matches!(
        tokens.peek(),
        None | Some((
            Token::NewLine | Token::If | Token::Unless | Token::RBrace | Token::End,
            _
        ))
    )
}

/// Consumes an identifier token whose presence the caller has already
/// established by lookahead.
fn take_identifier<'a, I>(tokens: &mut Peekable<I>) -> String
    where I: Iterator<Item = &'a (Token, usize)>
{
    match tokens.next() {
        Some((Token::Identifier(name), _)) => name.clone(),
        _ => String::new(),
    }
}
