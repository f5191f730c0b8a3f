use crate::{
    ast::BlockArg,
    error::RuntimeError,
    interpreter::{
        evaluator::{
            core::{EvalResult, Flow, Session},
            methods::{check_arity, no_method, ok_value, require_block},
        },
        value::core::{RangeValue, Value},
    },
};

/// The built-in operation catalog for Range receivers.
///
/// Ranges are lazy until asked to materialize; `to_a`, `each` and `sum`
/// tick the execution guard per produced element, so a pathologically large
/// literal range cannot run unbounded inside a single call.
pub(crate) fn dispatch(session: &mut Session,
                       range: RangeValue,
                       name: &str,
                       args: &[Value],
                       block: Option<&BlockArg>,
                       line: usize)
                       -> EvalResult<Flow> {
    match name {
        "to_a" => {
            check_arity(args, 0, line)?;
            let mut values = Vec::new();
            if let Some(last) = range.last() {
                for i in range.start..=last {
                    session.guard.tick(line)?;
                    values.push(Value::Integer(i));
                }
            }
            ok_value(Value::from(values))
        },
        "each" => {
            check_arity(args, 0, line)?;
            let block = require_block(block, name, line)?;
            if let Some(last) = range.last() {
                for i in range.start..=last {
                    session.guard.tick(line)?;
                    match session.call_block(block, &[Value::Integer(i)])? {
                        Flow::Break(_) => break,
                        Flow::Next(_) | Flow::Value(_) => {},
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
            }
            ok_value(Value::Range(range))
        },
        "sum" => {
            check_arity(args, 0, line)?;
            let mut total: i64 = 0;
            if let Some(last) = range.last() {
                for i in range.start..=last {
                    session.guard.tick(line)?;
                    total = total.checked_add(i).ok_or(RuntimeError::Overflow { line })?;
                }
            }
            ok_value(Value::Integer(total))
        },
        "include?" | "cover?" => {
            check_arity(args, 1, line)?;
            let result = match &args[0] {
                Value::Integer(n) => range.contains(*n),
                Value::Float(r) => {
                    let upper_ok = if range.exclusive {
                        *r < range.end as f64
                    } else {
                        *r <= range.end as f64
                    };
                    *r >= range.start as f64 && upper_ok
                },
                _ => false,
            };
            ok_value(Value::Bool(result))
        },
        "first" | "min" => {
            check_arity(args, 0, line)?;
            if range.is_empty() {
                ok_value(Value::Nil)
            } else {
                ok_value(Value::Integer(range.start))
            }
        },
        "last" | "max" => {
            check_arity(args, 0, line)?;
            match range.last() {
                Some(last) => ok_value(Value::Integer(last)),
                None => ok_value(Value::Nil),
            }
        },
        "size" | "count" => {
            check_arity(args, 0, line)?;
            ok_value(Value::Integer(range.len() as i64))
        },
        _ => no_method(&Value::Range(range), name, line),
    }
}
