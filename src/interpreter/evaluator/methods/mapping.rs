use std::{cell::RefCell, rc::Rc};

use crate::{
    ast::BlockArg,
    error::RuntimeError,
    interpreter::{
        evaluator::{
            core::{EvalResult, Flow, Session},
            methods::{check_arity, no_method, ok_value, require_block},
        },
        value::{core::Value, mapping::Mapping},
    },
};

/// The built-in operation catalog for Mapping receivers.
///
/// Element access goes through indexing (`h[key]`, `h[key] = value`); this
/// table holds the key/value views, membership tests, merge and pair
/// iteration. Keys declared with colon syntax are symbols and print as
/// symbols.
pub(crate) fn dispatch(session: &mut Session,
                       map: &Rc<RefCell<Mapping>>,
                       name: &str,
                       args: &[Value],
                       block: Option<&BlockArg>,
                       line: usize)
                       -> EvalResult<Flow> {
    match name {
        "keys" => {
            check_arity(args, 0, line)?;
            let keys: Vec<Value> = map.borrow().iter().map(|(k, _)| k.to_value()).collect();
            ok_value(Value::from(keys))
        },
        "values" => {
            check_arity(args, 0, line)?;
            let values: Vec<Value> = map.borrow().iter().map(|(_, v)| v.clone()).collect();
            ok_value(Value::from(values))
        },
        "size" | "length" => {
            check_arity(args, 0, line)?;
            ok_value(Value::Integer(map.borrow().len() as i64))
        },
        "empty?" => {
            check_arity(args, 0, line)?;
            ok_value(Value::Bool(map.borrow().is_empty()))
        },
        "key?" | "has_key?" | "include?" | "member?" => {
            check_arity(args, 1, line)?;
            let key = crate::interpreter::evaluator::core::value_to_map_key(&args[0], line)?;
            ok_value(Value::Bool(map.borrow().contains_key(&key)))
        },
        "value?" | "has_value?" => {
            check_arity(args, 1, line)?;
            ok_value(Value::Bool(map.borrow().contains_value(&args[0])))
        },
        "merge" => {
            check_arity(args, 1, line)?;
            match &args[0] {
                Value::Mapping(other) => {
                    let merged = map.borrow().merged(&other.borrow());
                    ok_value(Value::from(merged))
                },
                other => Err(RuntimeError::TypeError {
                    details: format!("'merge' expects a hash argument, got {}", other.kind_name()),
                    line,
                }),
            }
        },
        "each" | "each_pair" => {
            check_arity(args, 0, line)?;
            let block = require_block(block, name, line)?;
            let snapshot: Vec<(Value, Value)> = map
                .borrow()
                .iter()
                .map(|(k, v)| (k.to_value(), v.clone()))
                .collect();
            for (key, value) in snapshot {
                session.guard.tick(line)?;
                match session.call_block(block, &[key, value])? {
                    Flow::Break(_) => break,
                    Flow::Next(_) | Flow::Value(_) => {},
                    ret @ Flow::Return(_) => return Ok(ret),
                }
            }
            ok_value(Value::Mapping(map.clone()))
        },
        _ => no_method(&Value::Mapping(map.clone()), name, line),
    }
}
