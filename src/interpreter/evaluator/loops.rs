use crate::{
    ast::{Block, Expr},
    error::RuntimeError,
    interpreter::{
        evaluator::core::{eval_value, EvalResult, Flow, Session},
        value::core::Value,
    },
};

impl Session {
    /// Evaluates a `while` loop.
    ///
    /// The condition is re-evaluated before every iteration. A `break`
    /// signal from the body ends the loop; a `next` signal skips to the next
    /// condition check. A `return` signal is not consumed here and keeps
    /// travelling toward its method boundary.
    pub(crate) fn exec_while(&mut self,
                             condition: &Expr,
                             body: &Block,
                             line: usize)
                             -> EvalResult<Flow> {
        loop {
            self.guard.tick(line)?;
            let value = eval_value!(self.eval_expr(condition)?);
            if !value.is_truthy() {
                break;
            }
            match self.exec_block(body)? {
                Flow::Break(_) => break,
                Flow::Next(_) | Flow::Value(_) => {},
                ret @ Flow::Return(_) => return Ok(ret),
            }
        }
        Ok(Flow::Value(Value::Nil))
    }

    /// Evaluates an `until` loop, which runs while the condition is falsy.
    pub(crate) fn exec_until(&mut self,
                             condition: &Expr,
                             body: &Block,
                             line: usize)
                             -> EvalResult<Flow> {
        loop {
            self.guard.tick(line)?;
            let value = eval_value!(self.eval_expr(condition)?);
            if value.is_truthy() {
                break;
            }
            match self.exec_block(body)? {
                Flow::Break(_) => break,
                Flow::Next(_) | Flow::Value(_) => {},
                ret @ Flow::Return(_) => return Ok(ret),
            }
        }
        Ok(Flow::Value(Value::Nil))
    }

    /// Evaluates a `for <var> in <iterable>` loop over a range or an array.
    ///
    /// The loop variable is assigned in the enclosing scope (it does not get
    /// a frame of its own and stays visible after the loop), matching the
    /// language's `for` semantics as opposed to block-parameter binding.
    pub(crate) fn exec_for(&mut self,
                           variable: &str,
                           iterable: &Expr,
                           body: &Block,
                           line: usize)
                           -> EvalResult<Flow> {
        let iterable = eval_value!(self.eval_expr(iterable)?);

        match iterable {
            Value::Range(range) => {
                let last = match range.last() {
                    Some(last) => last,
                    None => return Ok(Flow::Value(Value::Nil)),
                };
                for i in range.start..=last {
                    self.guard.tick(line)?;
                    self.assign_variable(variable, Value::Integer(i));
                    match self.exec_block(body)? {
                        Flow::Break(_) => break,
                        Flow::Next(_) | Flow::Value(_) => {},
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Value(Value::Nil))
            },
            Value::Array(items) => {
                // Iterate over a snapshot so the body may mutate the array.
                let snapshot: Vec<Value> = items.borrow().clone();
                for element in snapshot {
                    self.guard.tick(line)?;
                    self.assign_variable(variable, element);
                    match self.exec_block(body)? {
                        Flow::Break(_) => break,
                        Flow::Next(_) | Flow::Value(_) => {},
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
                Ok(Flow::Value(Value::Nil))
            },
            other => Err(RuntimeError::TypeError {
                details: format!("'for' needs a range or array to iterate, got {}",
                                 other.kind_name()),
                line,
            }),
        }
    }
}
