use std::fmt;
use std::rc::Rc;

use crate::{
    ast::{FnLiteral, Instruction},
    evaluator::{EvalError, Evaluator},
};

/// Host-provided callable: receives the evaluator and the evaluated
/// arguments in call order.
pub type NativeFn = Rc<dyn Fn(&mut Evaluator, Vec<Value>) -> Result<Value, EvalError>>;

/// A runtime value of the kol language.
///
/// # Examples
///
/// ```
/// use kol_lang::Value;
///
/// assert!(Value::Integer(3).is_truthy());
/// assert!(!Value::Nil.is_truthy());
/// assert_eq!(Value::Float(2.5).to_string(), "2.5");
/// ```
#[derive(Debug, Clone)]
pub enum Value {
    Nil,

    Integer(i64),

    Float(f64),

    /// User-defined or native function; compared by identity
    Function(Rc<Function>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Value {
    /// `nil` and numeric zero are false, everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Integer(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::Function(_) => true,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Rc<Function>> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Function(_) => "function",
        }
    }

    pub fn from_bool(b: bool) -> Self {
        Value::Integer(b as i64)
    }

    /// Wraps a native callable with named parameters.
    pub fn native(
        params: &[&str],
        f: impl Fn(&mut Evaluator, Vec<Value>) -> Result<Value, EvalError> + 'static,
    ) -> Self {
        Value::Function(Rc::new(Function::native(params, f)))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Function(func) => {
                let kind = match func.body {
                    FunctionBody::Instructions(_) => "fn",
                    FunctionBody::Native(_) => "native",
                };
                write!(f, "<{} [{}]>", kind, func.params.join(", "))
            }
        }
    }
}

#[derive(Clone)]
pub enum FunctionBody {
    Instructions(Rc<[Instruction]>),
    Native(NativeFn),
}

/// A function value: positional parameter names and a body.
#[derive(Clone)]
pub struct Function {
    pub params: Vec<String>,
    pub body: FunctionBody,
}

impl Function {
    pub fn native(
        params: &[&str],
        f: impl Fn(&mut Evaluator, Vec<Value>) -> Result<Value, EvalError> + 'static,
    ) -> Self {
        Function {
            params: params.iter().map(|p| p.to_string()).collect(),
            body: FunctionBody::Native(Rc::new(f)),
        }
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl From<&FnLiteral> for Function {
    fn from(literal: &FnLiteral) -> Self {
        Function {
            params: literal.params.clone(),
            body: FunctionBody::Instructions(Rc::clone(&literal.body)),
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Function");
        out.field("params", &self.params);
        match &self.body {
            FunctionBody::Instructions(body) => out.field("body", body),
            FunctionBody::Native(_) => out.field("body", &"<native>"),
        };
        out.finish()
    }
}
