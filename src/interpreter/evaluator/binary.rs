use crate::{
    ast::BinaryOperator,
    error::RuntimeError,
    interpreter::{
        evaluator::core::{EvalResult, Session},
        value::core::Value,
    },
};

impl Session {
    /// Evaluates a binary operation between two values.
    ///
    /// Arithmetic stays in Integer when both operands are Integer and
    /// promotes to Float when either is Float. Integer division floors
    /// toward negative infinity and modulo follows the sign of the divisor,
    /// so `a == b * (a / b) + a % b` holds. Text participates in `+` (by
    /// coercing the other operand to its textual form) and in `* Integer`
    /// (repetition, metered by the execution guard). Division or modulo by
    /// zero raises `DivisionByZero` for both numeric kinds.
    pub fn eval_binary(&mut self,
                       op: BinaryOperator,
                       left: &Value,
                       right: &Value,
                       line: usize)
                       -> EvalResult<Value> {
        use BinaryOperator::{
            Add, And, Div, Equal, Greater, GreaterEqual, Less, LessEqual, Mod, Mul, NotEqual, Or,
            Pow, Sub,
        };

        match op {
            Add => self.eval_add(left, right, line),
            Sub => match (left, right) {
                (Value::Integer(a), Value::Integer(b)) => {
                    a.checked_sub(*b)
                     .map(Value::Integer)
                     .ok_or(RuntimeError::Overflow { line })
                },
                _ => {
                    let (a, b) = both_numeric(left, right, op, line)?;
                    Ok(Value::Float(a - b))
                },
            },
            Mul => self.eval_mul(left, right, line),
            Div => match (left, right) {
                (Value::Integer(a), Value::Integer(b)) => floor_div(*a, *b, line).map(Value::Integer),
                _ => {
                    let (a, b) = both_numeric(left, right, op, line)?;
                    if b == 0.0 {
                        return Err(RuntimeError::DivisionByZero { line });
                    }
                    Ok(Value::Float(a / b))
                },
            },
            Mod => match (left, right) {
                (Value::Integer(a), Value::Integer(b)) => floor_mod(*a, *b, line).map(Value::Integer),
                _ => {
                    let (a, b) = both_numeric(left, right, op, line)?;
                    if b == 0.0 {
                        return Err(RuntimeError::DivisionByZero { line });
                    }
                    Ok(Value::Float(a - b * (a / b).floor()))
                },
            },
            Pow => match (left, right) {
                (Value::Integer(a), Value::Integer(b)) if *b >= 0 => {
                    let exponent =
                        u32::try_from(*b).map_err(|_| RuntimeError::Overflow { line })?;
                    a.checked_pow(exponent)
                     .map(Value::Integer)
                     .ok_or(RuntimeError::Overflow { line })
                },
                _ => {
                    let (a, b) = both_numeric(left, right, op, line)?;
                    Ok(Value::Float(a.powf(b)))
                },
            },

            Equal => Ok(Value::Bool(left == right)),
            NotEqual => Ok(Value::Bool(left != right)),

            Less | Greater | LessEqual | GreaterEqual => {
                Self::eval_comparison(op, left, right, line)
            },

            // Short-circuit forms are handled at the expression level; this
            // arm only serves compound contexts that re-enter eval_binary.
            And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
            Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
        }
    }

    /// `+` over numbers, text (coercing the other side) and arrays.
    fn eval_add(&mut self, left: &Value, right: &Value, line: usize) -> EvalResult<Value> {
        match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => a.checked_add(*b)
                                                       .map(Value::Integer)
                                                       .ok_or(RuntimeError::Overflow { line }),
            (Value::Text(a), b) => Ok(Value::Text(format!("{a}{}", b.to_display()))),
            (a, Value::Text(b)) => Ok(Value::Text(format!("{}{b}", a.to_display()))),
            (Value::Array(a), Value::Array(b)) => {
                let mut combined = a.borrow().clone();
                combined.extend(b.borrow().iter().cloned());
                Ok(Value::from(combined))
            },
            _ => {
                let (a, b) = both_numeric(left, right, BinaryOperator::Add, line)?;
                Ok(Value::Float(a + b))
            },
        }
    }

    /// `*` over numbers and text repetition.
    fn eval_mul(&mut self, left: &Value, right: &Value, line: usize) -> EvalResult<Value> {
        match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => a.checked_mul(*b)
                                                       .map(Value::Integer)
                                                       .ok_or(RuntimeError::Overflow { line }),
            (Value::Text(text), Value::Integer(count)) => {
                if *count < 0 {
                    return Err(RuntimeError::TypeError {
                        details: "negative repeat count".to_string(),
                        line,
                    });
                }
                let mut repeated = String::new();
                for _ in 0..*count {
                    // One guard tick per repetition keeps a pathological
                    // count from materializing unbounded text.
                    self.guard.tick(line)?;
                    repeated.push_str(text);
                }
                Ok(Value::Text(repeated))
            },
            _ => {
                let (a, b) = both_numeric(left, right, BinaryOperator::Mul, line)?;
                Ok(Value::Float(a * b))
            },
        }
    }

    /// Relational comparison over numbers (mixed Integer/Float allowed) and
    /// text (lexicographic).
    fn eval_comparison(op: BinaryOperator,
                       left: &Value,
                       right: &Value,
                       line: usize)
                       -> EvalResult<Value> {
        let ordering = match (left, right) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            _ => {
                let (a, b) = both_numeric(left, right, op, line)?;
                a.partial_cmp(&b).ok_or(RuntimeError::TypeError {
                    details: "cannot compare these values".to_string(),
                    line,
                })?
            },
        };

        let result = match op {
            BinaryOperator::Less => ordering.is_lt(),
            BinaryOperator::Greater => ordering.is_gt(),
            BinaryOperator::LessEqual => ordering.is_le(),
            _ => ordering.is_ge(),
        };
        Ok(Value::Bool(result))
    }
}

/// Extracts both operands as `f64`, or reports a type error naming the
/// operator and operand kinds.
fn both_numeric(left: &Value,
                right: &Value,
                op: BinaryOperator,
                line: usize)
                -> EvalResult<(f64, f64)> {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(RuntimeError::TypeError {
            details: format!(
                "cannot apply '{op}' to {} and {}",
                left.kind_name(),
                right.kind_name()
            ),
            line,
        }),
    }
}

/// Integer division flooring toward negative infinity.
pub(crate) fn floor_div(a: i64, b: i64, line: usize) -> EvalResult<i64> {
    if b == 0 {
        return Err(RuntimeError::DivisionByZero { line });
    }
    let quotient = a.checked_div(b).ok_or(RuntimeError::Overflow { line })?;
    let remainder = a % b;
    if remainder != 0 && (remainder < 0) != (b < 0) {
        Ok(quotient - 1)
    } else {
        Ok(quotient)
    }
}

/// Integer modulo whose result follows the sign of the divisor.
pub(crate) fn floor_mod(a: i64, b: i64, line: usize) -> EvalResult<i64> {
    if b == 0 {
        return Err(RuntimeError::DivisionByZero { line });
    }
    let remainder = a.checked_rem(b).ok_or(RuntimeError::Overflow { line })?;
    if remainder != 0 && (remainder < 0) != (b < 0) {
        Ok(remainder + b)
    } else {
        Ok(remainder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_division_rounds_toward_negative_infinity() {
        assert_eq!(floor_div(7, 2, 1).unwrap(), 3);
        assert_eq!(floor_div(-7, 2, 1).unwrap(), -4);
        assert_eq!(floor_div(7, -2, 1).unwrap(), -4);
        assert_eq!(floor_div(-7, -2, 1).unwrap(), 3);
    }

    #[test]
    fn modulo_follows_divisor_sign() {
        assert_eq!(floor_mod(7, 3, 1).unwrap(), 1);
        assert_eq!(floor_mod(-7, 3, 1).unwrap(), 2);
        assert_eq!(floor_mod(7, -3, 1).unwrap(), -2);
        assert_eq!(floor_mod(-7, -3, 1).unwrap(), -1);
    }

    #[test]
    fn identity_holds_for_floor_div_and_mod() {
        for a in [-9i64, -4, -1, 0, 1, 4, 9] {
            for b in [-3i64, -2, 2, 3] {
                let q = floor_div(a, b, 1).unwrap();
                let r = floor_mod(a, b, 1).unwrap();
                assert_eq!(a, b * q + r, "identity failed for {a} / {b}");
            }
        }
    }
}
