use crate::{
    ast::BlockArg,
    error::RuntimeError,
    interpreter::{
        evaluator::{
            binary::{floor_div, floor_mod},
            core::{EvalResult, Flow, Session},
            methods::{as_integer, check_arity, no_method, ok_value, require_block},
        },
        value::core::Value,
    },
};

/// The built-in operation catalog for Integer and Float receivers.
///
/// Arithmetic is covered by operators; this table holds the parity and sign
/// predicates, rounding, conversions, and the iteration entry points
/// (`times`, `upto`, `downto`, `step`) that invoke the supplied block once
/// per count with an optional bound loop variable.
pub(crate) fn dispatch(session: &mut Session,
                       receiver: &Value,
                       name: &str,
                       args: &[Value],
                       block: Option<&BlockArg>,
                       line: usize)
                       -> EvalResult<Flow> {
    match (receiver, name) {
        (Value::Integer(n), "abs") => {
            check_arity(args, 0, line)?;
            let n = n.checked_abs().ok_or(RuntimeError::Overflow { line })?;
            ok_value(Value::Integer(n))
        },
        (Value::Float(r), "abs") => {
            check_arity(args, 0, line)?;
            ok_value(Value::Float(r.abs()))
        },

        (Value::Integer(n), "even?") => {
            check_arity(args, 0, line)?;
            ok_value(Value::Bool(n % 2 == 0))
        },
        (Value::Integer(n), "odd?") => {
            check_arity(args, 0, line)?;
            ok_value(Value::Bool(n % 2 != 0))
        },

        (_, "zero?") => {
            check_arity(args, 0, line)?;
            ok_value(Value::Bool(receiver.as_f64() == Some(0.0)))
        },
        (_, "positive?") => {
            check_arity(args, 0, line)?;
            ok_value(Value::Bool(receiver.as_f64().is_some_and(|v| v > 0.0)))
        },
        (_, "negative?") => {
            check_arity(args, 0, line)?;
            ok_value(Value::Bool(receiver.as_f64().is_some_and(|v| v < 0.0)))
        },

        (Value::Integer(n), "round" | "ceil" | "floor" | "to_i") => {
            check_arity(args, 0, line)?;
            ok_value(Value::Integer(*n))
        },
        (Value::Float(r), "round") => {
            check_arity(args, 0, line)?;
            ok_value(Value::Integer(r.round() as i64))
        },
        (Value::Float(r), "ceil") => {
            check_arity(args, 0, line)?;
            ok_value(Value::Integer(r.ceil() as i64))
        },
        (Value::Float(r), "floor" | "to_i") => {
            check_arity(args, 0, line)?;
            ok_value(Value::Integer(r.floor() as i64))
        },

        (Value::Integer(n), "to_f") => {
            check_arity(args, 0, line)?;
            ok_value(Value::Float(*n as f64))
        },
        (Value::Float(r), "to_f") => {
            check_arity(args, 0, line)?;
            ok_value(Value::Float(*r))
        },

        (Value::Integer(n), "succ") => {
            check_arity(args, 0, line)?;
            let n = n.checked_add(1).ok_or(RuntimeError::Overflow { line })?;
            ok_value(Value::Integer(n))
        },
        (Value::Integer(n), "divmod") => {
            check_arity(args, 1, line)?;
            let divisor = as_integer(&args[0], name, line)?;
            let quotient = floor_div(*n, divisor, line)?;
            let remainder = floor_mod(*n, divisor, line)?;
            ok_value(Value::from(vec![Value::Integer(quotient), Value::Integer(remainder)]))
        },

        (Value::Integer(n), "times") => {
            check_arity(args, 0, line)?;
            let block = require_block(block, name, line)?;
            for i in 0..*n {
                session.guard.tick(line)?;
                match session.call_block(block, &[Value::Integer(i)])? {
                    Flow::Break(_) => break,
                    Flow::Next(_) | Flow::Value(_) => {},
                    ret @ Flow::Return(_) => return Ok(ret),
                }
            }
            ok_value(receiver.clone())
        },
        (Value::Integer(n), "upto") => {
            check_arity(args, 1, line)?;
            let limit = as_integer(&args[0], name, line)?;
            let block = require_block(block, name, line)?;
            for i in *n..=limit {
                session.guard.tick(line)?;
                match session.call_block(block, &[Value::Integer(i)])? {
                    Flow::Break(_) => break,
                    Flow::Next(_) | Flow::Value(_) => {},
                    ret @ Flow::Return(_) => return Ok(ret),
                }
            }
            ok_value(receiver.clone())
        },
        (Value::Integer(n), "downto") => {
            check_arity(args, 1, line)?;
            let limit = as_integer(&args[0], name, line)?;
            let block = require_block(block, name, line)?;
            let mut i = *n;
            while i >= limit {
                session.guard.tick(line)?;
                match session.call_block(block, &[Value::Integer(i)])? {
                    Flow::Break(_) => break,
                    Flow::Next(_) | Flow::Value(_) => {},
                    ret @ Flow::Return(_) => return Ok(ret),
                }
                i = match i.checked_sub(1) {
                    Some(next) => next,
                    None => break,
                };
            }
            ok_value(receiver.clone())
        },
        (Value::Integer(n), "step") => {
            check_arity(args, 2, line)?;
            let limit = as_integer(&args[0], name, line)?;
            let step = as_integer(&args[1], name, line)?;
            if step == 0 {
                return Err(RuntimeError::TypeError {
                    details: "step can't be 0".to_string(),
                    line,
                });
            }
            let block = require_block(block, name, line)?;
            let mut i = *n;
            while (step > 0 && i <= limit) || (step < 0 && i >= limit) {
                session.guard.tick(line)?;
                match session.call_block(block, &[Value::Integer(i)])? {
                    Flow::Break(_) => break,
                    Flow::Next(_) | Flow::Value(_) => {},
                    ret @ Flow::Return(_) => return Ok(ret),
                }
                i = match i.checked_add(step) {
                    Some(next) => next,
                    None => break,
                };
            }
            ok_value(receiver.clone())
        },

        _ => no_method(receiver, name, line),
    }
}
