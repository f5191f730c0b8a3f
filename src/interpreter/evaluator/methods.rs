use crate::{
    ast::BlockArg,
    error::RuntimeError,
    interpreter::{
        evaluator::core::{EvalResult, Flow, Session},
        value::core::Value,
    },
};

/// Text operations.
pub mod text;
/// Integer and Float operations, including the numeric iteration entry
/// points.
pub mod numeric;
/// Array operations.
pub mod array;
/// Mapping operations.
pub mod mapping;
/// Range operations.
pub mod range;

/// Dispatches a built-in method call: receiver kind first, then method name.
///
/// A few operations are universal and resolved before the per-kind tables:
/// `nil?`, `to_s`, `inspect` and `dup`/`clone`. An unknown
/// (kind, name) combination raises `NoMethodError` naming both.
pub(crate) fn dispatch(session: &mut Session,
                       receiver: &Value,
                       name: &str,
                       args: &[Value],
                       block: Option<&BlockArg>,
                       line: usize)
                       -> EvalResult<Flow> {
    match name {
        "nil?" => {
            check_arity(args, 0, line)?;
            return ok_value(Value::Bool(receiver.is_nil()));
        },
        "to_s" => {
            check_arity(args, 0, line)?;
            return ok_value(Value::Text(receiver.to_display()));
        },
        "inspect" => {
            check_arity(args, 0, line)?;
            return ok_value(Value::Text(receiver.inspect()));
        },
        "dup" | "clone" => {
            check_arity(args, 0, line)?;
            return ok_value(receiver.dup());
        },
        _ => {},
    }

    match receiver {
        Value::Text(s) => text::dispatch(session, s, name, args, block, line),
        Value::Integer(_) | Value::Float(_) => {
            numeric::dispatch(session, receiver, name, args, block, line)
        },
        Value::Array(items) => array::dispatch(session, items, name, args, block, line),
        Value::Mapping(map) => mapping::dispatch(session, map, name, args, block, line),
        Value::Range(r) => range::dispatch(session, *r, name, args, block, line),
        Value::Callable(lambda) => match name {
            "call" => {
                // A lambda's body is a method boundary: an explicit `return`
                // yields the call's value, and loop signals may not escape.
                match session.call_block(lambda, args)? {
                    Flow::Value(value) | Flow::Return(value) => ok_value(value),
                    Flow::Break(l) => Err(RuntimeError::LoopControlOutsideLoop {
                        keyword: "break".to_string(),
                        line:    l,
                    }),
                    Flow::Next(l) => Err(RuntimeError::LoopControlOutsideLoop {
                        keyword: "next".to_string(),
                        line:    l,
                    }),
                }
            },
            _ => no_method(receiver, name, line),
        },
        Value::Symbol(sym) => match name {
            "length" | "size" => {
                check_arity(args, 0, line)?;
                ok_value(Value::Integer(sym.chars().count() as i64))
            },
            "to_sym" => {
                check_arity(args, 0, line)?;
                ok_value(receiver.clone())
            },
            _ => no_method(receiver, name, line),
        },
        _ => no_method(receiver, name, line),
    }
}

/// Wraps a plain value in a normal-completion flow.
pub(crate) fn ok_value(value: Value) -> EvalResult<Flow> {
    Ok(Flow::Value(value))
}

/// The `NoMethodError` for an unknown (receiver kind, name) combination.
pub(crate) fn no_method(receiver: &Value, name: &str, line: usize) -> EvalResult<Flow> {
    Err(RuntimeError::NoMethodFor {
        name: name.to_string(),
        kind: receiver.kind_name().to_string(),
        line,
    })
}

/// Checks that a built-in received exactly `expected` arguments.
pub(crate) fn check_arity(args: &[Value], expected: usize, line: usize) -> EvalResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(arity_error(args.len(), &format!("{expected}"), line))
    }
}

/// Builds the arity-mismatch error for a built-in with a non-fixed shape
/// (e.g. `0..1` for an optional argument).
pub(crate) fn arity_error(given: usize, expected: &str, line: usize) -> RuntimeError {
    RuntimeError::ArgumentCountMismatch { given, expected: expected.to_string(), line }
}

/// Unwraps the block argument an iteration-style built-in requires.
pub(crate) fn require_block<'a>(block: Option<&'a BlockArg>,
                                method: &str,
                                line: usize)
                                -> EvalResult<&'a BlockArg> {
    block.ok_or_else(|| RuntimeError::TypeError {
        details: format!("no block given for '{method}'"),
        line,
    })
}

/// Extracts a text argument.
pub(crate) fn as_text<'a>(value: &'a Value, method: &str, line: usize) -> EvalResult<&'a str> {
    match value {
        Value::Text(s) => Ok(s),
        other => Err(RuntimeError::TypeError {
            details: format!("'{method}' expects a string argument, got {}", other.kind_name()),
            line,
        }),
    }
}

/// Extracts an integer argument.
pub(crate) fn as_integer(value: &Value, method: &str, line: usize) -> EvalResult<i64> {
    match value {
        Value::Integer(n) => Ok(*n),
        other => Err(RuntimeError::TypeError {
            details: format!("'{method}' expects an integer argument, got {}", other.kind_name()),
            line,
        }),
    }
}
