use std::{collections::HashMap, rc::Rc};

use crate::{
    ast::{BinaryOperator, Block, BlockArg, Expr, LiteralValue, MethodDef, Statement, TextSegment},
    error::RuntimeError,
    interpreter::{
        evaluator::guard::ExecutionGuard,
        value::{
            core::{RangeValue, Value},
            mapping::{MapKey, Mapping},
        },
    },
};

/// Result type used by the evaluator.
///
/// All evaluation functions return either a value of type `T` or a
/// `RuntimeError` describing the failure.
pub type EvalResult<T> = Result<T, RuntimeError>;

/// The outcome of evaluating a statement or expression.
///
/// Control transfer is modeled as an explicit result kind rather than
/// host-level exception propagation, so loop and method boundaries can
/// pattern-match and consume exactly the signal meant for them. `Break` and
/// `Next` carry the line they were raised on, for the error produced when a
/// signal escapes past every loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Normal completion with a value.
    Value(Value),
    /// A `break` signal travelling toward the nearest enclosing loop.
    Break(usize),
    /// A `next` signal travelling toward the nearest enclosing iteration.
    Next(usize),
    /// A `return` signal travelling toward the nearest method boundary.
    Return(Value),
}

/// Extracts the value from a `Flow`, propagating any control signal to the
/// caller unchanged.
macro_rules! eval_value {
    ($flow:expr) => {
        match $flow {
            $crate::interpreter::evaluator::core::Flow::Value(value) => value,
            other => return Ok(other),
        }
    };
}
pub(crate) use eval_value;

/// What kind of definitional container a name denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Defined with `class`.
    Class,
    /// Defined with `module`.
    Module,
}

/// A class or module record: a named container of methods.
///
/// There is no instance model and no inheritance dispatch; the superclass
/// name is recorded for fidelity only. Methods defined inside a container are
/// reachable as `Name.method` and, lexically, from sibling methods.
pub struct Container {
    /// Whether this is a class or a module.
    pub kind:       ContainerKind,
    /// The declared superclass name, if any.
    pub superclass: Option<String>,
    /// Methods owned by this container.
    pub methods:    HashMap<String, Rc<MethodDef>>,
}

/// Stores the state of one execution request.
///
/// A `Session` is created fresh per `execute` call and owns everything the
/// run touches: the scope stack, the global and per-container method tables,
/// the output buffer and the execution guard. Nothing survives between
/// requests.
pub struct Session {
    pub(crate) scope_stack:     Vec<HashMap<String, Value>>,
    /// Methods defined at the top level.
    pub(crate) methods:         HashMap<String, Rc<MethodDef>>,
    /// Class and module records by name.
    pub(crate) containers:      HashMap<String, Container>,
    /// The container currently being defined, receiving `def`s.
    pub(crate) open_definition: Option<String>,
    /// The container owning the currently executing method, for lexical
    /// lookup of sibling methods.
    pub(crate) current_owner:   Option<String>,
    pub(crate) output:          String,
    pub(crate) guard:           ExecutionGuard,
}

#[allow(clippy::new_without_default)]
impl Session {
    /// Creates a fresh session with an empty global scope and a newly
    /// started execution guard.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scope_stack:     vec![HashMap::new()],
            methods:         HashMap::new(),
            containers:      HashMap::new(),
            open_definition: None,
            current_owner:   None,
            output:          String::new(),
            guard:           ExecutionGuard::new(),
        }
    }

    /// Runs a whole program and returns its final value.
    ///
    /// A `return` at the top level ends evaluation with its value; a `break`
    /// or `next` that escaped every loop is an error raised at the line it
    /// was reached.
    ///
    /// # Errors
    /// Propagates any runtime error from the program.
    pub fn run(&mut self, program: &Block) -> EvalResult<Value> {
        match self.exec_block(program)? {
            Flow::Value(value) | Flow::Return(value) => Ok(value),
            Flow::Break(line) => {
                Err(RuntimeError::LoopControlOutsideLoop { keyword: "break".to_string(), line })
            },
            Flow::Next(line) => {
                Err(RuntimeError::LoopControlOutsideLoop { keyword: "next".to_string(), line })
            },
        }
    }

    /// Consumes the session, yielding the buffered output.
    #[must_use]
    pub fn into_output(self) -> String {
        self.output
    }

    /// Executes the statements of a block in order.
    ///
    /// Completes with the value of the last statement (`nil` for an empty
    /// block); any control signal ends the block early and propagates.
    pub fn exec_block(&mut self, block: &Block) -> EvalResult<Flow> {
        let mut last = Value::Nil;

        for statement in &block.statements {
            match self.exec_statement(statement)? {
                Flow::Value(value) => last = value,
                other => return Ok(other),
            }
        }

        Ok(Flow::Value(last))
    }

    /// Evaluates a single statement.
    pub fn exec_statement(&mut self, statement: &Statement) -> EvalResult<Flow> {
        self.guard.tick(statement.line_number())?;

        match statement {
            Statement::Output { style, expressions, .. } => self.write_output(*style, expressions),

            Statement::Assignment { name, op, value, line } => {
                self.exec_assignment(name, *op, value, *line)
            },

            Statement::IndexAssignment { target, index, value, line } => {
                self.exec_index_assignment(target, index, value, *line)
            },

            Statement::Append { name, value, line } => self.exec_append(name, value, *line),

            Statement::Expression { expr, .. } => self.eval_expr(expr),

            Statement::If { branches, else_body, .. } => {
                for (condition, body) in branches {
                    let value = eval_value!(self.eval_expr(condition)?);
                    if value.is_truthy() {
                        return self.exec_block(body);
                    }
                }
                match else_body {
                    Some(body) => self.exec_block(body),
                    None => Ok(Flow::Value(Value::Nil)),
                }
            },

            Statement::Unless { condition, body, else_body, .. } => {
                let value = eval_value!(self.eval_expr(condition)?);
                if value.is_truthy() {
                    match else_body {
                        Some(body) => self.exec_block(body),
                        None => Ok(Flow::Value(Value::Nil)),
                    }
                } else {
                    self.exec_block(body)
                }
            },

            Statement::While { condition, body, line } => self.exec_while(condition, body, *line),
            Statement::Until { condition, body, line } => self.exec_until(condition, body, *line),
            Statement::For { variable, iterable, body, line } => {
                self.exec_for(variable, iterable, body, *line)
            },

            Statement::Case { subject, branches, else_body, .. } => {
                let subject = eval_value!(self.eval_expr(subject)?);
                for (values, body) in branches {
                    for value_expr in values {
                        let value = eval_value!(self.eval_expr(value_expr)?);
                        if value == subject {
                            return self.exec_block(body);
                        }
                    }
                }
                match else_body {
                    Some(body) => self.exec_block(body),
                    None => Ok(Flow::Value(Value::Nil)),
                }
            },

            Statement::MethodDef(def) => {
                self.define_method(def);
                Ok(Flow::Value(Value::Nil))
            },

            Statement::ClassDef { name, superclass, body, .. } => {
                self.exec_container_def(name, ContainerKind::Class, superclass.clone(), body)
            },

            Statement::ModuleDef { name, body, .. } => {
                self.exec_container_def(name, ContainerKind::Module, None, body)
            },

            Statement::Return { value, .. } => {
                let value = match value {
                    Some(expr) => eval_value!(self.eval_expr(expr)?),
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            },

            Statement::Break { line } => Ok(Flow::Break(*line)),
            Statement::Next { line } => Ok(Flow::Next(*line)),
        }
    }

    /// Evaluates an expression to a value, or propagates a control signal
    /// originating inside it (e.g. a `return` in a block argument).
    pub fn eval_expr(&mut self, expr: &Expr) -> EvalResult<Flow> {
        self.guard.tick(expr.line_number())?;

        match expr {
            Expr::Literal { value, .. } => Ok(Flow::Value(match value {
                LiteralValue::Integer(n) => Value::Integer(*n),
                LiteralValue::Float(r) => Value::Float(*r),
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Nil => Value::Nil,
            })),

            Expr::Text { segments, .. } => {
                let mut rendered = String::new();
                for segment in segments {
                    match segment {
                        TextSegment::Literal(text) => rendered.push_str(text),
                        TextSegment::Interpolation(inner) => {
                            let value = eval_value!(self.eval_expr(inner)?);
                            rendered.push_str(&value.to_display());
                        },
                    }
                }
                Ok(Flow::Value(Value::Text(rendered)))
            },

            Expr::Symbol { name, .. } => Ok(Flow::Value(Value::Symbol(name.clone()))),

            Expr::Variable { name, line } => match self.lookup_variable(name) {
                Some(value) => Ok(Flow::Value(value)),
                None => Err(RuntimeError::UnknownVariable { name: name.clone(), line: *line }),
            },

            Expr::UnaryOp { op, expr, line } => {
                let value = eval_value!(self.eval_expr(expr)?);
                Ok(Flow::Value(Self::eval_unary(*op, &value, *line)?))
            },

            Expr::BinaryOp { left, op: BinaryOperator::And, right, .. } => {
                let left = eval_value!(self.eval_expr(left)?);
                if !left.is_truthy() {
                    return Ok(Flow::Value(Value::Bool(false)));
                }
                let right = eval_value!(self.eval_expr(right)?);
                Ok(Flow::Value(Value::Bool(right.is_truthy())))
            },

            Expr::BinaryOp { left, op: BinaryOperator::Or, right, .. } => {
                let left = eval_value!(self.eval_expr(left)?);
                if left.is_truthy() {
                    return Ok(Flow::Value(Value::Bool(true)));
                }
                let right = eval_value!(self.eval_expr(right)?);
                Ok(Flow::Value(Value::Bool(right.is_truthy())))
            },

            Expr::BinaryOp { left, op, right, line } => {
                let left = eval_value!(self.eval_expr(left)?);
                let right = eval_value!(self.eval_expr(right)?);
                Ok(Flow::Value(self.eval_binary(*op, &left, &right, *line)?))
            },

            Expr::Ternary { condition, then_expr, else_expr, .. } => {
                let condition = eval_value!(self.eval_expr(condition)?);
                if condition.is_truthy() {
                    self.eval_expr(then_expr)
                } else {
                    self.eval_expr(else_expr)
                }
            },

            Expr::Range { start, end, exclusive, line } => {
                let start = eval_value!(self.eval_expr(start)?);
                let end = eval_value!(self.eval_expr(end)?);
                match (&start, &end) {
                    (Value::Integer(start), Value::Integer(end)) => {
                        Ok(Flow::Value(Value::Range(RangeValue {
                            start:     *start,
                            end:       *end,
                            exclusive: *exclusive,
                        })))
                    },
                    _ => Err(RuntimeError::TypeError {
                        details: format!(
                            "range bounds must be integers, got {} and {}",
                            start.kind_name(),
                            end.kind_name()
                        ),
                        line:    *line,
                    }),
                }
            },

            Expr::ArrayLiteral { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(eval_value!(self.eval_expr(element)?));
                }
                Ok(Flow::Value(Value::from(values)))
            },

            Expr::MappingLiteral { pairs, line } => {
                let mut mapping = Mapping::new();
                for (key_expr, value_expr) in pairs {
                    let key = eval_value!(self.eval_expr(key_expr)?);
                    let key = value_to_map_key(&key, *line)?;
                    let value = eval_value!(self.eval_expr(value_expr)?);
                    mapping.insert(key, value);
                }
                Ok(Flow::Value(Value::from(mapping)))
            },

            Expr::Index { target, index, line } => {
                let target = eval_value!(self.eval_expr(target)?);
                let index = eval_value!(self.eval_expr(index)?);
                Ok(Flow::Value(Self::eval_index(&target, &index, *line)?))
            },

            Expr::Lambda { params, body, .. } => {
                Ok(Flow::Value(Value::Callable(Rc::new(BlockArg {
                    params: params.clone(),
                    body:   body.clone(),
                }))))
            },

            Expr::MethodCall { receiver, name, arguments, block, line } => {
                self.eval_method_call(receiver.as_deref(), name, arguments, block.as_ref(), *line)
            },
        }
    }

    /// Executes a plain or compound assignment.
    fn exec_assignment(&mut self,
                       name: &str,
                       op: Option<BinaryOperator>,
                       value: &Expr,
                       line: usize)
                       -> EvalResult<Flow> {
        let rhs = eval_value!(self.eval_expr(value)?);

        let new_value = match op {
            None => rhs,
            Some(op) => {
                let old = self
                    .lookup_variable(name)
                    .ok_or_else(|| RuntimeError::UnknownVariable { name: name.to_string(), line })?;
                self.eval_binary(op, &old, &rhs, line)?
            },
        };

        self.assign_variable(name, new_value.clone());
        Ok(Flow::Value(new_value))
    }

    /// Executes an element assignment on an array or mapping binding.
    fn exec_index_assignment(&mut self,
                             target: &str,
                             index: &Expr,
                             value: &Expr,
                             line: usize)
                             -> EvalResult<Flow> {
        let collection = self
            .lookup_variable(target)
            .ok_or_else(|| RuntimeError::UnknownVariable { name: target.to_string(), line })?;
        let index = eval_value!(self.eval_expr(index)?);
        let value = eval_value!(self.eval_expr(value)?);

        match &collection {
            Value::Array(items) => {
                let position = match index {
                    Value::Integer(i) => i,
                    other => {
                        return Err(RuntimeError::TypeError {
                            details: format!("array index must be an integer, got {}",
                                             other.kind_name()),
                            line,
                        });
                    },
                };
                let mut items = items.borrow_mut();
                let len = items.len();
                let resolved = if position < 0 { position + len as i64 } else { position };
                if resolved < 0 || resolved > len as i64 {
                    return Err(RuntimeError::IndexOutOfBounds { len, found: position, line });
                }
                let resolved = resolved as usize;
                if resolved == len {
                    items.push(value.clone());
                } else {
                    items[resolved] = value.clone();
                }
            },
            Value::Mapping(map) => {
                let key = value_to_map_key(&index, line)?;
                map.borrow_mut().insert(key, value.clone());
            },
            other => {
                return Err(RuntimeError::TypeError {
                    details: format!("cannot assign into a {}", other.kind_name()),
                    line,
                });
            },
        }

        Ok(Flow::Value(value))
    }

    /// Executes `name << expr`, appending in place to an existing Array
    /// binding.
    fn exec_append(&mut self, name: &str, value: &Expr, line: usize) -> EvalResult<Flow> {
        let target = self
            .lookup_variable(name)
            .ok_or_else(|| RuntimeError::UnknownVariable { name: name.to_string(), line })?;
        let value = eval_value!(self.eval_expr(value)?);

        match &target {
            Value::Array(items) => {
                items.borrow_mut().push(value);
                Ok(Flow::Value(target))
            },
            other => Err(RuntimeError::TypeError {
                details: format!("cannot append with '<<' to a {}", other.kind_name()),
                line,
            }),
        }
    }

    /// Reads an element out of an array or mapping. Out-of-range indexes and
    /// missing keys produce `nil`, matching the language's lenient access
    /// semantics; negative array indexes count from the end.
    fn eval_index(target: &Value, index: &Value, line: usize) -> EvalResult<Value> {
        match target {
            Value::Array(items) => {
                let position = match index {
                    Value::Integer(i) => *i,
                    other => {
                        return Err(RuntimeError::TypeError {
                            details: format!("array index must be an integer, got {}",
                                             other.kind_name()),
                            line,
                        });
                    },
                };
                let items = items.borrow();
                let len = items.len() as i64;
                let resolved = if position < 0 { position + len } else { position };
                if resolved < 0 || resolved >= len {
                    return Ok(Value::Nil);
                }
                Ok(items[resolved as usize].clone())
            },
            Value::Mapping(map) => {
                let key = value_to_map_key(index, line)?;
                Ok(map.borrow().get(&key).cloned().unwrap_or(Value::Nil))
            },
            other => Err(RuntimeError::TypeError {
                details: format!("cannot index into a {}", other.kind_name()),
                line,
            }),
        }
    }

    /// Looks up a variable, walking frames from innermost to outermost.
    pub(crate) fn lookup_variable(&self, name: &str) -> Option<Value> {
        self.scope_stack
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).cloned())
    }

    /// Assigns to the innermost frame that already defines `name`, or
    /// creates the binding in the innermost frame if none does.
    pub(crate) fn assign_variable(&mut self, name: &str, value: Value) {
        for frame in self.scope_stack.iter_mut().rev() {
            if frame.contains_key(name) {
                frame.insert(name.to_string(), value);
                return;
            }
        }
        self.define_local(name, value);
    }

    /// Creates or replaces a binding in the innermost frame.
    pub(crate) fn define_local(&mut self, name: &str, value: Value) {
        if let Some(frame) = self.scope_stack.last_mut() {
            frame.insert(name.to_string(), value);
        }
    }

    /// Pushes a fresh scope frame.
    pub(crate) fn push_scope(&mut self) {
        self.scope_stack.push(HashMap::new());
    }

    /// Pops the innermost scope frame. The outermost frame is never popped.
    pub(crate) fn pop_scope(&mut self) {
        if self.scope_stack.len() > 1 {
            self.scope_stack.pop();
        }
    }
}

/// Converts a value into a mapping key.
///
/// # Errors
/// Returns [`RuntimeError::InvalidMapKey`] for kinds other than Symbol, Text
/// and Integer.
pub(crate) fn value_to_map_key(value: &Value, line: usize) -> EvalResult<MapKey> {
    match value {
        Value::Symbol(name) => Ok(MapKey::Symbol(name.clone())),
        Value::Text(text) => Ok(MapKey::Text(text.clone())),
        Value::Integer(n) => Ok(MapKey::Integer(*n)),
        other => Err(RuntimeError::InvalidMapKey { kind: other.kind_name().to_string(), line }),
    }
}
