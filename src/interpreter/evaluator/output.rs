use crate::{
    ast::{Expr, OutputStyle},
    interpreter::{
        evaluator::core::{eval_value, EvalResult, Flow, Session},
        value::core::Value,
    },
};

impl Session {
    /// Evaluates the arguments of an output statement and appends their
    /// rendering to the session's output buffer.
    ///
    /// - `puts` appends each argument's textual form followed by a newline;
    ///   with no arguments it appends a single newline. Arrays render as a
    ///   bracketed comma-joined list of their elements' textual forms.
    /// - `p` appends each argument's inspect form followed by a newline.
    /// - `print` appends the textual form with no terminator.
    pub(crate) fn write_output(&mut self,
                               style: OutputStyle,
                               expressions: &[Expr])
                               -> EvalResult<Flow> {
        if expressions.is_empty() && style == OutputStyle::Puts {
            self.output.push('\n');
            return Ok(Flow::Value(Value::Nil));
        }

        for expr in expressions {
            let value = eval_value!(self.eval_expr(expr)?);
            match style {
                OutputStyle::Puts => {
                    self.output.push_str(&value.to_display());
                    self.output.push('\n');
                },
                OutputStyle::Inspect => {
                    self.output.push_str(&value.inspect());
                    self.output.push('\n');
                },
                OutputStyle::Print => self.output.push_str(&value.to_display()),
            }
        }

        Ok(Flow::Value(Value::Nil))
    }
}
