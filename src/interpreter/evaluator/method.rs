use std::{collections::HashMap, rc::Rc};

use crate::{
    ast::{Argument, Block, BlockArg, Expr, MethodDef, Param, ParamKind},
    error::RuntimeError,
    interpreter::{
        evaluator::{
            core::{eval_value, Container, ContainerKind, EvalResult, Flow, Session},
            methods,
        },
        value::core::Value,
    },
};

impl Session {
    /// Stores a method definition in the current definitional scope: the
    /// open class/module when one is being defined, the global table
    /// otherwise. Redefinition replaces the previous body.
    pub(crate) fn define_method(&mut self, def: &MethodDef) {
        let def = Rc::new(def.clone());
        match &self.open_definition {
            Some(container) => {
                if let Some(record) = self.containers.get_mut(container) {
                    record.methods.insert(def.name.clone(), def);
                }
            },
            None => {
                self.methods.insert(def.name.clone(), def);
            },
        }
    }

    /// Executes a `class` or `module` body with the container open as the
    /// definitional scope, so nested `def`s land in its method table.
    /// Reopening an existing container adds to it.
    pub(crate) fn exec_container_def(&mut self,
                                     name: &str,
                                     kind: ContainerKind,
                                     superclass: Option<String>,
                                     body: &Block)
                                     -> EvalResult<Flow> {
        if let Some(existing) = self.containers.get(name) {
            if existing.kind != kind {
                let expected = match existing.kind {
                    ContainerKind::Class => "class",
                    ContainerKind::Module => "module",
                };
                return Err(RuntimeError::TypeError {
                    details: format!("{name} is already defined as a {expected}"),
                    line:    body.statements.first().map_or(0, |s| s.line_number()),
                });
            }
        } else {
            self.containers.insert(name.to_string(), Container {
                kind,
                superclass,
                methods: HashMap::new(),
            });
        }

        let previous = self.open_definition.replace(name.to_string());
        let result = self.exec_block(body);
        self.open_definition = previous;

        match result? {
            Flow::Value(_) => Ok(Flow::Value(Value::Nil)),
            other => Ok(other),
        }
    }

    /// Evaluates a method call expression.
    ///
    /// Resolution order:
    /// 1. Receiver-less calls look up user-defined methods — first in the
    ///    container owning the currently executing method (lexical
    ///    convenience), then in the global table.
    /// 2. A capitalized receiver naming a class or module (and not shadowed
    ///    by a variable) calls one of that container's methods.
    /// 3. Anything else evaluates the receiver and dispatches against the
    ///    built-in method table for its kind.
    pub(crate) fn eval_method_call(&mut self,
                                   receiver: Option<&Expr>,
                                   name: &str,
                                   arguments: &[Argument],
                                   block: Option<&BlockArg>,
                                   line: usize)
                                   -> EvalResult<Flow> {
        match receiver {
            None => {
                let def = self.find_user_method(name).ok_or_else(|| {
                    RuntimeError::UnknownMethod { name: name.to_string(), line }
                })?;
                let owner = self.current_owner.clone();
                let (args, kwargs) = self.collect_arguments(arguments)?;
                self.call_user_method(&def, owner, &args, &kwargs, line)
            },
            Some(expr) => {
                if let Some(container) = self.container_receiver(expr) {
                    let def = self
                        .containers
                        .get(&container)
                        .and_then(|record| record.methods.get(name))
                        .cloned()
                        .ok_or_else(|| RuntimeError::NoMethodFor {
                            name: name.to_string(),
                            kind: container.clone(),
                            line,
                        })?;
                    let (args, kwargs) = self.collect_arguments(arguments)?;
                    return self.call_user_method(&def, Some(container), &args, &kwargs, line);
                }

                let receiver_value = eval_value!(self.eval_expr(expr)?);
                let (args, kwargs) = self.collect_arguments(arguments)?;
                if let Some((keyword, _)) = kwargs.first() {
                    return Err(RuntimeError::UnknownKeywordArgument {
                        name: keyword.clone(),
                        line,
                    });
                }
                methods::dispatch(self, &receiver_value, name, &args, block, line)
            },
        }
    }

    /// Invokes a user-defined method: pushes a fresh scope frame, binds
    /// parameters, executes the body and pops the frame on every exit path.
    ///
    /// The call completes with the explicit `return` value or the value of
    /// the body's last statement. A `break` or `next` that reaches the call
    /// boundary escaped its loop and is an error at that point.
    pub(crate) fn call_user_method(&mut self,
                                   def: &Rc<MethodDef>,
                                   owner: Option<String>,
                                   args: &[Value],
                                   kwargs: &[(String, Value)],
                                   line: usize)
                                   -> EvalResult<Flow> {
        self.push_scope();
        let saved_owner = std::mem::replace(&mut self.current_owner, owner);
        let result = self.bind_and_execute(def, args, kwargs, line);
        self.current_owner = saved_owner;
        self.pop_scope();

        match result? {
            Flow::Return(value) | Flow::Value(value) => Ok(Flow::Value(value)),
            Flow::Break(l) => {
                Err(RuntimeError::LoopControlOutsideLoop { keyword: "break".to_string(), line: l })
            },
            Flow::Next(l) => {
                Err(RuntimeError::LoopControlOutsideLoop { keyword: "next".to_string(), line: l })
            },
        }
    }

    /// Invokes a block argument with the given values bound positionally to
    /// its parameters (missing values bind `nil`, extras are dropped).
    ///
    /// The returned flow is the caller's to interpret: iteration built-ins
    /// consume `Break`/`Next` and propagate `Return`.
    pub(crate) fn call_block(&mut self, block: &BlockArg, args: &[Value]) -> EvalResult<Flow> {
        self.push_scope();
        for (index, param) in block.params.iter().enumerate() {
            let value = args.get(index).cloned().unwrap_or(Value::Nil);
            self.define_local(param, value);
        }
        let result = self.exec_block(&block.body);
        self.pop_scope();
        result
    }

    /// Binds declared parameters against the supplied arguments inside the
    /// already-pushed callee frame, then executes the body.
    fn bind_and_execute(&mut self,
                        def: &Rc<MethodDef>,
                        args: &[Value],
                        kwargs: &[(String, Value)],
                        line: usize)
                        -> EvalResult<Flow> {
        let required = count_params(&def.params, |kind| matches!(kind, ParamKind::Required));
        let optional = count_params(&def.params, |kind| matches!(kind, ParamKind::Optional(_)));
        let has_rest = def.params.iter().any(|p| matches!(p.kind, ParamKind::Rest));

        if args.len() < required || (!has_rest && args.len() > required + optional) {
            let expected = if has_rest {
                format!("{required}+")
            } else if optional > 0 {
                format!("{required}..{}", required + optional)
            } else {
                format!("{required}")
            };
            return Err(RuntimeError::ArgumentCountMismatch { given: args.len(), expected, line });
        }

        for (keyword, _) in kwargs {
            let declared = def.params.iter().any(|p| {
                matches!(p.kind, ParamKind::Keyword(_)) && p.name == *keyword
            });
            if !declared {
                return Err(RuntimeError::UnknownKeywordArgument {
                    name: keyword.clone(),
                    line,
                });
            }
        }

        let mut cursor = 0usize;
        for Param { name, kind } in &def.params {
            match kind {
                ParamKind::Required => {
                    self.define_local(name, args[cursor].clone());
                    cursor += 1;
                },
                ParamKind::Optional(default) => {
                    if cursor < args.len() {
                        self.define_local(name, args[cursor].clone());
                        cursor += 1;
                    } else {
                        // Defaults are evaluated lazily, in the callee's new
                        // scope, only when no argument was supplied.
                        let value = eval_value!(self.eval_expr(default)?);
                        self.define_local(name, value);
                    }
                },
                ParamKind::Rest => {
                    let rest: Vec<Value> = args[cursor..].to_vec();
                    cursor = args.len();
                    self.define_local(name, Value::from(rest));
                },
                ParamKind::Keyword(default) => {
                    let supplied = kwargs.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone());
                    match (supplied, default) {
                        (Some(value), _) => self.define_local(name, value),
                        (None, Some(default)) => {
                            let value = eval_value!(self.eval_expr(default)?);
                            self.define_local(name, value);
                        },
                        (None, None) => {
                            return Err(RuntimeError::MissingKeywordArgument {
                                name: name.clone(),
                                line,
                            });
                        },
                    }
                },
            }
        }

        self.exec_block(&def.body)
    }

    /// Evaluates a call's argument list into positional and keyword values.
    fn collect_arguments(&mut self,
                         arguments: &[Argument])
                         -> EvalResult<(Vec<Value>, Vec<(String, Value)>)> {
        let mut args = Vec::new();
        let mut kwargs = Vec::new();

        for argument in arguments {
            match argument {
                Argument::Positional(expr) => match self.eval_expr(expr)? {
                    Flow::Value(value) => args.push(value),
                    Flow::Break(l) => {
                        return Err(RuntimeError::LoopControlOutsideLoop {
                            keyword: "break".to_string(),
                            line:    l,
                        });
                    },
                    Flow::Next(l) => {
                        return Err(RuntimeError::LoopControlOutsideLoop {
                            keyword: "next".to_string(),
                            line:    l,
                        });
                    },
                    Flow::Return(_) => {
                        return Err(RuntimeError::TypeError {
                            details: "unexpected control transfer in argument".to_string(),
                            line:    expr.line_number(),
                        });
                    },
                },
                Argument::Keyword { name, value } => match self.eval_expr(value)? {
                    Flow::Value(evaluated) => kwargs.push((name.clone(), evaluated)),
                    _ => {
                        return Err(RuntimeError::TypeError {
                            details: "unexpected control transfer in argument".to_string(),
                            line:    value.line_number(),
                        });
                    },
                },
            }
        }

        Ok((args, kwargs))
    }

    /// Finds a user-defined method for a receiver-less call: the container
    /// owning the currently executing method first, then the global table.
    fn find_user_method(&self, name: &str) -> Option<Rc<MethodDef>> {
        if let Some(owner) = &self.current_owner {
            if let Some(def) = self
                .containers
                .get(owner)
                .and_then(|record| record.methods.get(name))
            {
                return Some(def.clone());
            }
        }
        self.methods.get(name).cloned()
    }

    /// Recognizes a receiver expression that names a class or module: a
    /// capitalized identifier, not shadowed by a variable, with a container
    /// record.
    fn container_receiver(&self, expr: &Expr) -> Option<String> {
        if let Expr::Variable { name, .. } = expr {
            let capitalized = name.chars().next().is_some_and(char::is_uppercase);
            if capitalized && self.lookup_variable(name).is_none() && self.containers.contains_key(name)
            {
                return Some(name.clone());
            }
        }
        None
    }

}

/// Counts parameters whose kind matches the predicate.
fn count_params(params: &[Param], matches: impl Fn(&ParamKind) -> bool) -> usize {
    params.iter().filter(|p| matches(&p.kind)).count()
}
