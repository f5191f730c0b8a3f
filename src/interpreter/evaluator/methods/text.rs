use crate::{
    ast::BlockArg,
    interpreter::{
        evaluator::{
            core::{EvalResult, Flow, Session},
            methods::{arity_error, as_text, check_arity, no_method, ok_value, require_block},
        },
        value::core::Value,
    },
};

/// The built-in operation catalog for Text receivers.
///
/// Covers case conversion, trimming, length, search predicates, splitting,
/// substring replacement (first-match `sub` and all-match `gsub`), numeric
/// coercions with a `0`/`0.0` fallback, and character decomposition.
pub(crate) fn dispatch(session: &mut Session,
                       s: &str,
                       name: &str,
                       args: &[Value],
                       block: Option<&BlockArg>,
                       line: usize)
                       -> EvalResult<Flow> {
    match name {
        "upcase" => {
            check_arity(args, 0, line)?;
            ok_value(Value::Text(s.to_uppercase()))
        },
        "downcase" => {
            check_arity(args, 0, line)?;
            ok_value(Value::Text(s.to_lowercase()))
        },
        "capitalize" => {
            check_arity(args, 0, line)?;
            ok_value(Value::Text(capitalize(s)))
        },
        "swapcase" => {
            check_arity(args, 0, line)?;
            let swapped: String = s
                .chars()
                .flat_map(|c| {
                    if c.is_uppercase() {
                        c.to_lowercase().collect::<Vec<_>>()
                    } else {
                        c.to_uppercase().collect::<Vec<_>>()
                    }
                })
                .collect();
            ok_value(Value::Text(swapped))
        },
        "strip" => {
            check_arity(args, 0, line)?;
            ok_value(Value::Text(s.trim().to_string()))
        },
        "lstrip" => {
            check_arity(args, 0, line)?;
            ok_value(Value::Text(s.trim_start().to_string()))
        },
        "rstrip" => {
            check_arity(args, 0, line)?;
            ok_value(Value::Text(s.trim_end().to_string()))
        },
        "length" | "size" => {
            check_arity(args, 0, line)?;
            ok_value(Value::Integer(s.chars().count() as i64))
        },
        "reverse" => {
            check_arity(args, 0, line)?;
            ok_value(Value::Text(s.chars().rev().collect()))
        },
        "empty?" => {
            check_arity(args, 0, line)?;
            ok_value(Value::Bool(s.is_empty()))
        },
        "include?" => {
            check_arity(args, 1, line)?;
            let needle = as_text(&args[0], name, line)?;
            ok_value(Value::Bool(s.contains(needle)))
        },
        "start_with?" => {
            check_arity(args, 1, line)?;
            let prefix = as_text(&args[0], name, line)?;
            ok_value(Value::Bool(s.starts_with(prefix)))
        },
        "end_with?" => {
            check_arity(args, 1, line)?;
            let suffix = as_text(&args[0], name, line)?;
            ok_value(Value::Bool(s.ends_with(suffix)))
        },
        "split" => {
            let pieces: Vec<Value> = match args {
                [] => s.split_whitespace().map(Value::from).collect(),
                [separator] => {
                    let separator = as_text(separator, name, line)?;
                    s.split(separator).map(Value::from).collect()
                },
                _ => return Err(arity_error(args.len(), "0..1", line)),
            };
            ok_value(Value::from(pieces))
        },
        "chars" => {
            check_arity(args, 0, line)?;
            let chars: Vec<Value> = s.chars().map(|c| Value::Text(c.to_string())).collect();
            ok_value(Value::from(chars))
        },
        "each_char" => {
            check_arity(args, 0, line)?;
            let block = require_block(block, name, line)?;
            for c in s.chars() {
                session.guard.tick(line)?;
                match session.call_block(block, &[Value::Text(c.to_string())])? {
                    Flow::Break(_) => break,
                    Flow::Next(_) | Flow::Value(_) => {},
                    ret @ Flow::Return(_) => return Ok(ret),
                }
            }
            ok_value(Value::Text(s.to_string()))
        },
        "sub" => {
            check_arity(args, 2, line)?;
            let pattern = as_text(&args[0], name, line)?;
            let replacement = as_text(&args[1], name, line)?;
            ok_value(Value::Text(s.replacen(pattern, replacement, 1)))
        },
        "gsub" => {
            check_arity(args, 2, line)?;
            let pattern = as_text(&args[0], name, line)?;
            let replacement = as_text(&args[1], name, line)?;
            ok_value(Value::Text(s.replace(pattern, replacement)))
        },
        "to_i" => {
            check_arity(args, 0, line)?;
            ok_value(Value::Integer(leading_integer(s)))
        },
        "to_f" => {
            check_arity(args, 0, line)?;
            ok_value(Value::Float(leading_float(s)))
        },
        "to_sym" => {
            check_arity(args, 0, line)?;
            ok_value(Value::Symbol(s.to_string()))
        },
        _ => no_method(&Value::Text(s.to_string()), name, line),
    }
}

/// First character uppercased, the rest lowercased.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => {
            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
        },
        None => String::new(),
    }
}

/// Parses the longest numeric prefix as an integer, after leading
/// whitespace; anything without one coerces to `0` rather than erroring.
fn leading_integer(s: &str) -> i64 {
    let trimmed = s.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }

    trimmed[..end].parse().unwrap_or(0)
}

/// Parses the longest numeric prefix as a float; non-numeric prefixes
/// coerce to `0.0`.
fn leading_float(s: &str) -> f64 {
    let trimmed = s.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        let mut frac = end + 1;
        while frac < bytes.len() && bytes[frac].is_ascii_digit() {
            frac += 1;
        }
        if frac > end + 1 {
            end = frac;
        }
    }

    trimmed[..end].parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_prefixes_coerce_leniently() {
        assert_eq!(leading_integer("42abc"), 42);
        assert_eq!(leading_integer("  -7"), -7);
        assert_eq!(leading_integer("abc"), 0);
        assert_eq!(leading_float("3.5kg"), 3.5);
        assert_eq!(leading_float("x"), 0.0);
        assert_eq!(leading_float("2."), 2.0);
    }
}
