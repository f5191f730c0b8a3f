use crate::{
    ast::UnaryOperator,
    error::RuntimeError,
    interpreter::{
        evaluator::core::{EvalResult, Session},
        value::core::Value,
    },
};

impl Session {
    /// Evaluates a unary operation.
    ///
    /// `-` negates Integer and Float values; `!` inverts truthiness, so
    /// `!nil` and `!false` are `true` and everything else maps to `false`.
    pub(crate) fn eval_unary(op: UnaryOperator, value: &Value, line: usize) -> EvalResult<Value> {
        match op {
            UnaryOperator::Negate => match value {
                Value::Integer(n) => n.checked_neg()
                                      .map(Value::Integer)
                                      .ok_or(RuntimeError::Overflow { line }),
                Value::Float(r) => Ok(Value::Float(-r)),
                other => Err(RuntimeError::TypeError {
                    details: format!("cannot negate a {}", other.kind_name()),
                    line,
                }),
            },
            UnaryOperator::Not => Ok(Value::Bool(!value.is_truthy())),
        }
    }
}
