use std::{cell::RefCell, rc::Rc};

use ordered_float::OrderedFloat;

use crate::{
    ast::BlockArg,
    error::RuntimeError,
    interpreter::{
        evaluator::{
            core::{EvalResult, Flow, Session},
            methods::{arity_error, as_integer, check_arity, no_method, ok_value, require_block},
        },
        value::core::Value,
    },
};

/// The built-in operation catalog for Array receivers.
///
/// Non-mutating transforms (`map`, `select`, `reject`, `sort`, `uniq`,
/// `reverse`, `flatten`, `compact`, `join`, `sum`, `min`/`max`,
/// `first`/`last`, ...) return fresh arrays and evaluate the actual supplied
/// block per element. Mutating forms (`push`/`pop`/`shift`/`unshift`)
/// operate in place and return the same array identity, so mutation is
/// visible through every alias of the receiver.
///
/// Iteration works over a snapshot of the elements, so a block may mutate
/// the receiver without invalidating the traversal.
pub(crate) fn dispatch(session: &mut Session,
                       items: &Rc<RefCell<Vec<Value>>>,
                       name: &str,
                       args: &[Value],
                       block: Option<&BlockArg>,
                       line: usize)
                       -> EvalResult<Flow> {
    match name {
        "length" | "size" => {
            check_arity(args, 0, line)?;
            ok_value(Value::Integer(items.borrow().len() as i64))
        },
        "empty?" => {
            check_arity(args, 0, line)?;
            ok_value(Value::Bool(items.borrow().is_empty()))
        },
        "first" => match args {
            [] => ok_value(items.borrow().first().cloned().unwrap_or(Value::Nil)),
            [count] => {
                let count = usize_arg(count, name, line)?;
                let taken: Vec<Value> = items.borrow().iter().take(count).cloned().collect();
                ok_value(Value::from(taken))
            },
            _ => return Err(arity_error(args.len(), "0..1", line)),
        },
        "last" => match args {
            [] => ok_value(items.borrow().last().cloned().unwrap_or(Value::Nil)),
            [count] => {
                let count = usize_arg(count, name, line)?;
                let all = items.borrow();
                let skip = all.len().saturating_sub(count);
                ok_value(Value::from(all[skip..].to_vec()))
            },
            _ => return Err(arity_error(args.len(), "0..1", line)),
        },
        "include?" => {
            check_arity(args, 1, line)?;
            ok_value(Value::Bool(items.borrow().contains(&args[0])))
        },
        "index" => {
            check_arity(args, 1, line)?;
            let position = items.borrow().iter().position(|v| *v == args[0]);
            match position {
                Some(i) => ok_value(Value::Integer(i as i64)),
                None => ok_value(Value::Nil),
            }
        },
        "count" => match args {
            [] => ok_value(Value::Integer(items.borrow().len() as i64)),
            [needle] => {
                let count = items.borrow().iter().filter(|v| *v == needle).count();
                ok_value(Value::Integer(count as i64))
            },
            _ => return Err(arity_error(args.len(), "0..1", line)),
        },

        "push" => {
            if args.is_empty() {
                return Err(RuntimeError::ArgumentCountMismatch {
                    given:    0,
                    expected: "1+".to_string(),
                    line,
                });
            }
            items.borrow_mut().extend(args.iter().cloned());
            ok_value(Value::Array(items.clone()))
        },
        "pop" => {
            check_arity(args, 0, line)?;
            ok_value(items.borrow_mut().pop().unwrap_or(Value::Nil))
        },
        "shift" => {
            check_arity(args, 0, line)?;
            let mut items = items.borrow_mut();
            if items.is_empty() {
                ok_value(Value::Nil)
            } else {
                ok_value(items.remove(0))
            }
        },
        "unshift" => {
            if args.is_empty() {
                return Err(RuntimeError::ArgumentCountMismatch {
                    given:    0,
                    expected: "1+".to_string(),
                    line,
                });
            }
            let mut borrowed = items.borrow_mut();
            for (offset, value) in args.iter().enumerate() {
                borrowed.insert(offset, value.clone());
            }
            drop(borrowed);
            ok_value(Value::Array(items.clone()))
        },

        "reverse" => {
            check_arity(args, 0, line)?;
            let reversed: Vec<Value> = items.borrow().iter().rev().cloned().collect();
            ok_value(Value::from(reversed))
        },
        "sort" => {
            check_arity(args, 0, line)?;
            ok_value(sorted(&items.borrow(), line)?)
        },
        "uniq" => {
            check_arity(args, 0, line)?;
            let mut unique: Vec<Value> = Vec::new();
            for value in items.borrow().iter() {
                session.guard.tick(line)?;
                if !unique.contains(value) {
                    unique.push(value.clone());
                }
            }
            ok_value(Value::from(unique))
        },
        "flatten" => {
            check_arity(args, 0, line)?;
            let mut flat = Vec::new();
            flatten_into(session, &items.borrow(), &mut flat, line)?;
            ok_value(Value::from(flat))
        },
        "compact" => {
            check_arity(args, 0, line)?;
            let kept: Vec<Value> =
                items.borrow().iter().filter(|v| !v.is_nil()).cloned().collect();
            ok_value(Value::from(kept))
        },
        "join" => {
            let separator = match args {
                [] => String::new(),
                [Value::Text(s)] => s.clone(),
                [other] => other.to_display(),
                _ => return Err(arity_error(args.len(), "0..1", line)),
            };
            let rendered: Vec<String> =
                items.borrow().iter().map(Value::to_display).collect();
            ok_value(Value::Text(rendered.join(&separator)))
        },
        "sum" => {
            check_arity(args, 0, line)?;
            sum(&items.borrow(), line)
        },
        "min" => {
            check_arity(args, 0, line)?;
            extremum(&items.borrow(), true, line)
        },
        "max" => {
            check_arity(args, 0, line)?;
            extremum(&items.borrow(), false, line)
        },
        "take" => {
            check_arity(args, 1, line)?;
            let count = usize_arg(&args[0], name, line)?;
            let taken: Vec<Value> = items.borrow().iter().take(count).cloned().collect();
            ok_value(Value::from(taken))
        },
        "drop" => {
            check_arity(args, 1, line)?;
            let count = usize_arg(&args[0], name, line)?;
            let kept: Vec<Value> = items.borrow().iter().skip(count).cloned().collect();
            ok_value(Value::from(kept))
        },
        "to_a" => {
            check_arity(args, 0, line)?;
            ok_value(Value::Array(items.clone()))
        },

        "each" => {
            check_arity(args, 0, line)?;
            let block = require_block(block, name, line)?;
            let snapshot: Vec<Value> = items.borrow().clone();
            for element in snapshot {
                session.guard.tick(line)?;
                match session.call_block(block, &[element])? {
                    Flow::Break(_) => break,
                    Flow::Next(_) | Flow::Value(_) => {},
                    ret @ Flow::Return(_) => return Ok(ret),
                }
            }
            ok_value(Value::Array(items.clone()))
        },
        "each_with_index" => {
            check_arity(args, 0, line)?;
            let block = require_block(block, name, line)?;
            let snapshot: Vec<Value> = items.borrow().clone();
            for (index, element) in snapshot.into_iter().enumerate() {
                session.guard.tick(line)?;
                match session.call_block(block, &[element, Value::Integer(index as i64)])? {
                    Flow::Break(_) => break,
                    Flow::Next(_) | Flow::Value(_) => {},
                    ret @ Flow::Return(_) => return Ok(ret),
                }
            }
            ok_value(Value::Array(items.clone()))
        },

        "map" | "collect" => {
            check_arity(args, 0, line)?;
            let block = require_block(block, name, line)?;
            let snapshot: Vec<Value> = items.borrow().clone();
            let mut mapped = Vec::with_capacity(snapshot.len());
            for element in snapshot {
                session.guard.tick(line)?;
                match session.call_block(block, &[element])? {
                    Flow::Value(value) => mapped.push(value),
                    Flow::Next(_) => mapped.push(Value::Nil),
                    Flow::Break(_) => return ok_value(Value::Nil),
                    ret @ Flow::Return(_) => return Ok(ret),
                }
            }
            ok_value(Value::from(mapped))
        },
        "select" | "filter" => {
            check_arity(args, 0, line)?;
            let block = require_block(block, name, line)?;
            filtered(session, items, block, true, line)
        },
        "reject" => {
            check_arity(args, 0, line)?;
            let block = require_block(block, name, line)?;
            filtered(session, items, block, false, line)
        },
        "find" | "detect" => {
            check_arity(args, 0, line)?;
            let block = require_block(block, name, line)?;
            let snapshot: Vec<Value> = items.borrow().clone();
            for element in snapshot {
                session.guard.tick(line)?;
                match session.call_block(block, &[element.clone()])? {
                    Flow::Value(value) => {
                        if value.is_truthy() {
                            return ok_value(element);
                        }
                    },
                    Flow::Next(_) => {},
                    Flow::Break(_) => return ok_value(Value::Nil),
                    ret @ Flow::Return(_) => return Ok(ret),
                }
            }
            ok_value(Value::Nil)
        },
        "any?" | "all?" | "none?" => {
            check_arity(args, 0, line)?;
            quantifier(session, items, name, block, line)
        },

        _ => no_method(&Value::Array(items.clone()), name, line),
    }
}

/// `select` (keep truthy) and `reject` (keep falsy) share one traversal.
fn filtered(session: &mut Session,
            items: &Rc<RefCell<Vec<Value>>>,
            block: &BlockArg,
            keep_truthy: bool,
            line: usize)
            -> EvalResult<Flow> {
    let snapshot: Vec<Value> = items.borrow().clone();
    let mut kept = Vec::new();

    for element in snapshot {
        session.guard.tick(line)?;
        match session.call_block(block, &[element.clone()])? {
            Flow::Value(value) => {
                if value.is_truthy() == keep_truthy {
                    kept.push(element);
                }
            },
            Flow::Next(_) => {},
            Flow::Break(_) => return ok_value(Value::Nil),
            ret @ Flow::Return(_) => return Ok(ret),
        }
    }

    ok_value(Value::from(kept))
}

/// `any?`, `all?` and `none?`; with a block the predicate is the block's
/// result, without one it is each element's own truthiness.
fn quantifier(session: &mut Session,
              items: &Rc<RefCell<Vec<Value>>>,
              name: &str,
              block: Option<&BlockArg>,
              line: usize)
              -> EvalResult<Flow> {
    let snapshot: Vec<Value> = items.borrow().clone();
    let mut matched_any = false;
    let mut matched_all = true;

    for element in snapshot {
        session.guard.tick(line)?;
        let truthy = match block {
            Some(block) => match session.call_block(block, &[element])? {
                Flow::Value(value) => value.is_truthy(),
                Flow::Next(_) => false,
                Flow::Break(_) => return ok_value(Value::Nil),
                ret @ Flow::Return(_) => return Ok(ret),
            },
            None => element.is_truthy(),
        };
        matched_any = matched_any || truthy;
        matched_all = matched_all && truthy;
    }

    let result = match name {
        "any?" => matched_any,
        "all?" => matched_all,
        _ => !matched_any,
    };
    ok_value(Value::Bool(result))
}

/// Appends `values` into `out`, recursing into nested arrays.
fn flatten_into(session: &mut Session,
                values: &[Value],
                out: &mut Vec<Value>,
                line: usize)
                -> EvalResult<()> {
    for value in values {
        session.guard.tick(line)?;
        match value {
            Value::Array(nested) => {
                let nested = nested.borrow().clone();
                flatten_into(session, &nested, out, line)?;
            },
            other => out.push(other.clone()),
        }
    }
    Ok(())
}

/// Sorts a copy of the elements: numerically when every element is numeric
/// (mixed Integer/Float totals via `OrderedFloat`), lexicographically when
/// every element is text.
fn sorted(values: &[Value], line: usize) -> EvalResult<Value> {
    if values.iter().all(Value::is_numeric) {
        let mut sorted = values.to_vec();
        sorted.sort_by_key(|v| OrderedFloat(v.as_f64().unwrap_or(0.0)));
        return Ok(Value::from(sorted));
    }
    if values.iter().all(|v| matches!(v, Value::Text(_))) {
        let mut sorted = values.to_vec();
        sorted.sort_by_key(|v| v.to_display());
        return Ok(Value::from(sorted));
    }
    Err(RuntimeError::TypeError {
        details: "'sort' requires elements that are all numbers or all strings".to_string(),
        line,
    })
}

/// Numeric sum; stays Integer until a Float appears.
fn sum(values: &[Value], line: usize) -> EvalResult<Flow> {
    let mut int_total: i64 = 0;
    let mut float_total: f64 = 0.0;
    let mut is_float = false;

    for value in values {
        match value {
            Value::Integer(n) if !is_float => {
                int_total = int_total
                    .checked_add(*n)
                    .ok_or(RuntimeError::Overflow { line })?;
            },
            Value::Integer(n) => float_total += *n as f64,
            Value::Float(r) => {
                if !is_float {
                    is_float = true;
                    float_total = int_total as f64;
                }
                float_total += r;
            },
            other => {
                return Err(RuntimeError::TypeError {
                    details: format!("'sum' expects numeric elements, got {}", other.kind_name()),
                    line,
                });
            },
        }
    }

    if is_float {
        ok_value(Value::Float(float_total))
    } else {
        ok_value(Value::Integer(int_total))
    }
}

/// `min` / `max` over all-numeric or all-text elements; empty arrays yield
/// `nil`.
fn extremum(values: &[Value], minimum: bool, line: usize) -> EvalResult<Flow> {
    if values.is_empty() {
        return ok_value(Value::Nil);
    }

    if values.iter().all(Value::is_numeric) {
        let keyed = values.iter().map(|v| (OrderedFloat(v.as_f64().unwrap_or(0.0)), v));
        let found = if minimum {
            keyed.min_by_key(|(key, _)| *key)
        } else {
            keyed.max_by_key(|(key, _)| *key)
        };
        return match found {
            Some((_, value)) => ok_value(value.clone()),
            None => ok_value(Value::Nil),
        };
    }

    if values.iter().all(|v| matches!(v, Value::Text(_))) {
        let keyed = values.iter().map(|v| (v.to_display(), v));
        let found = if minimum {
            keyed.min_by_key(|(key, _)| key.clone())
        } else {
            keyed.max_by_key(|(key, _)| key.clone())
        };
        return match found {
            Some((_, value)) => ok_value(value.clone()),
            None => ok_value(Value::Nil),
        };
    }

    Err(RuntimeError::TypeError {
        details: format!("'{}' requires elements that are all numbers or all strings",
                         if minimum { "min" } else { "max" }),
        line,
    })
}

/// A non-negative integer argument, as a `usize`.
fn usize_arg(value: &Value, method: &str, line: usize) -> EvalResult<usize> {
    let n = as_integer(value, method, line)?;
    usize::try_from(n).map_err(|_| RuntimeError::TypeError {
        details: format!("'{method}' expects a non-negative count"),
        line,
    })
}
