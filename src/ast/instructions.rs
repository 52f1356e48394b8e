use std::fmt;
use std::rc::Rc;

use crate::value::Function;

/// Constant values that can appear directly in the instruction tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Nil,
}

/// A function literal: parameter names plus the instructions of its body.
#[derive(Debug, Clone, PartialEq)]
pub struct FnLiteral {
    pub params: Vec<String>,
    pub body: Rc<[Instruction]>,
}

/// What a call instruction invokes.
#[derive(Clone)]
pub enum Callee {
    /// Looked up in the scope stack at call time
    Name(String),
    /// A function value fixed when the tree was built
    Resolved(Rc<Function>),
}

impl PartialEq for Callee {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callee::Name(a), Callee::Name(b)) => a == b,
            (Callee::Resolved(a), Callee::Resolved(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Callee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callee::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Callee::Resolved(func) => f.debug_tuple("Resolved").field(func).finish(),
        }
    }
}

/// The minimal executable tree consumed by the evaluator.
///
/// Built once per parse and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    Literal(Literal),

    /// Read a name from the nearest scope that binds it
    Lookup(String),

    /// Write a name, see [`crate::Evaluator::assign`]
    Assign {
        name: String,
        value: Box<Instruction>,
    },

    /// Create a function value
    Function(FnLiteral),

    /// Evaluate the arguments left to right, then invoke the callee
    Call { callee: Callee, args: Vec<Instruction> },
}

impl Instruction {
    pub fn int(n: i64) -> Self {
        Instruction::Literal(Literal::Integer(n))
    }

    pub fn lookup(name: &str) -> Self {
        Instruction::Lookup(name.to_string())
    }

    pub fn call(name: &str, args: Vec<Instruction>) -> Self {
        Instruction::Call {
            callee: Callee::Name(name.to_string()),
            args,
        }
    }

    pub fn assign(name: &str, value: Instruction) -> Self {
        Instruction::Assign {
            name: name.to_string(),
            value: Box::new(value),
        }
    }
}
