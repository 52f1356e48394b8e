use std::{collections::HashMap, rc::Rc};

use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    ast::{Callee, Instruction, Literal},
    value::{Function, FunctionBody, Value},
};

/// One frame of the lexical environment.
pub type Scope = HashMap<String, Value>;

/// Nesting of calls to named kol functions allowed before evaluation is
/// aborted.
pub const DEFAULT_MAX_DEPTH: usize = 256;

const ANONYMOUS: &str = "<anonymous>";

/// Errors that can occur while running an instruction tree.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    /// Name not bound in any frame
    #[error("unbound name '{0}'")]
    UnboundName(String),

    /// Argument count differs from the callee's parameter list
    #[error("{callee} expects {expected} argument(s), got {found}")]
    Arity {
        callee: String,
        expected: usize,
        found: usize,
    },

    #[error("cannot call a value of type {0}")]
    NotCallable(&'static str),

    /// Type mismatch or invalid operation for the given type
    #[error("type error: {0}")]
    TypeError(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow")]
    IntegerOverflow,

    #[error("call depth limit of {0} exceeded")]
    CallDepthExceeded(usize),
}

/// Tree-walking evaluator over a stack of scopes.
///
/// The innermost frame is the last one on the stack. Function calls push a
/// frame binding the parameters and always pop it again, whether the body
/// returns a value or an error.
///
/// The depth limit counts calls that reach a function with a kol body
/// through a name, which is how every recursion in source text re-enters a
/// function. Calls of natives and of the functions desugaring creates for
/// groups and conditional chains are not counted.
///
/// # Examples
///
/// ```
/// use kol_lang::{Evaluator, Instruction, Value};
///
/// let mut evaluator = Evaluator::new();
/// let program = vec![
///     Instruction::assign("x", Instruction::int(4)),
///     Instruction::lookup("x"),
/// ];
///
/// assert_eq!(evaluator.eval(&program).unwrap(), Value::Integer(4));
/// ```
pub struct Evaluator {
    scopes: Vec<Scope>,
    depth: usize,
    max_depth: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::with_scopes(vec![Scope::new()])
    }
}

impl Evaluator {
    /// Creates an evaluator with a single, empty global frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an evaluator over caller-provided frames, outermost first.
    pub fn with_scopes(mut scopes: Vec<Scope>) -> Self {
        if scopes.is_empty() {
            scopes.push(Scope::new());
        }
        Evaluator {
            scopes,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn scopes(&self) -> &[Scope] {
        &self.scopes
    }

    pub fn into_scopes(self) -> Vec<Scope> {
        self.scopes
    }

    /// Binds `name` in the innermost frame, shadowing outer bindings.
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.current().insert(name.into(), value);
    }

    /// Searches the frames innermost first.
    pub fn lookup(&self, name: &str) -> Result<Value, EvalError> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .cloned()
            .ok_or_else(|| EvalError::UnboundName(name.to_string()))
    }

    /// Updates `name` in the nearest frame that binds it, or creates it in
    /// the innermost frame when no frame does.
    pub fn assign(&mut self, name: &str, value: Value) -> Value {
        let frame = match self.scopes.iter().rposition(|scope| scope.contains_key(name)) {
            Some(index) => &mut self.scopes[index],
            None => self.current(),
        };
        frame.insert(name.to_string(), value.clone());
        value
    }

    /// Runs `program` in order and returns the last value (`nil` if empty).
    pub fn eval(&mut self, program: &[Instruction]) -> Result<Value, EvalError> {
        let mut last = Value::Nil;
        for instruction in program {
            last = self.eval_instruction(instruction)?;
        }
        Ok(last)
    }

    pub fn eval_instruction(&mut self, instruction: &Instruction) -> Result<Value, EvalError> {
        match instruction {
            Instruction::Literal(Literal::Integer(n)) => Ok(Value::Integer(*n)),
            Instruction::Literal(Literal::Float(n)) => Ok(Value::Float(*n)),
            Instruction::Literal(Literal::Nil) => Ok(Value::Nil),
            Instruction::Lookup(name) => self.lookup(name),
            Instruction::Assign { name, value } => {
                let value = self.eval_instruction(value)?;
                Ok(self.assign(name, value))
            }
            Instruction::Function(literal) => {
                Ok(Value::Function(Rc::new(Function::from(literal))))
            }
            Instruction::Call { callee, args } => {
                let (label, function, named) = match callee {
                    Callee::Name(name) => (name.as_str(), self.lookup(name)?, true),
                    Callee::Resolved(f) => (ANONYMOUS, Value::Function(Rc::clone(f)), false),
                };
                let args = args
                    .iter()
                    .map(|arg| self.eval_instruction(arg))
                    .collect::<Result<Vec<_>, _>>()?;
                self.invoke(label, &function, args, named)
            }
        }
    }

    /// Calls a function value with already evaluated arguments.
    ///
    /// This is the entry point natives use to call back into kol code.
    pub fn call(&mut self, function: &Value, args: Vec<Value>) -> Result<Value, EvalError> {
        self.invoke(ANONYMOUS, function, args, false)
    }

    fn invoke(
        &mut self,
        label: &str,
        function: &Value,
        args: Vec<Value>,
        named: bool,
    ) -> Result<Value, EvalError> {
        let Value::Function(function) = function else {
            return Err(EvalError::NotCallable(function.type_name()));
        };
        if args.len() != function.arity() {
            return Err(EvalError::Arity {
                callee: label.to_string(),
                expected: function.arity(),
                found: args.len(),
            });
        }

        trace!(callee = label, depth = self.depth, "call");
        let frame: Scope = function
            .params
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect();

        match &function.body {
            FunctionBody::Native(native) => {
                let native = Rc::clone(native);
                self.with_frame(frame, |ev| native(ev, args))
            }
            FunctionBody::Instructions(body) if named => {
                if self.depth >= self.max_depth {
                    return Err(EvalError::CallDepthExceeded(self.max_depth));
                }
                let body = Rc::clone(body);
                self.depth += 1;
                let result = self.with_frame(frame, |ev| ev.eval(&body));
                self.depth -= 1;
                result
            }
            FunctionBody::Instructions(body) => {
                let body = Rc::clone(body);
                self.with_frame(frame, |ev| ev.eval(&body))
            }
        }
    }

    /// Runs `body` inside `frame`, popping the frame on every exit path.
    fn with_frame<T>(
        &mut self,
        frame: Scope,
        body: impl FnOnce(&mut Self) -> Result<T, EvalError>,
    ) -> Result<T, EvalError> {
        self.scopes.push(frame);
        let result = body(self);
        self.scopes.pop();
        if let Err(e) = &result {
            debug!(error = %e, depth = self.depth, "frame unwound with error");
        }
        result
    }

    fn current(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }
}
