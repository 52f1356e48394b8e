//! Standard native functions.
//!
//! Operators desugar into calls of the function bound under the operator's
//! name (`a + b` becomes `plus(a, b)`, `-x` becomes `neg(x)`), so installing
//! this library into an evaluator gives the standard operator table its
//! meaning. Hosts can shadow or extend any of these bindings.

use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::{
    evaluator::{EvalError, Evaluator},
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Arith {
    Add,
    Sub,
    Mul,
    Div,
}

impl Arith {
    fn verb(self) -> &'static str {
        match self {
            Arith::Add => "add",
            Arith::Sub => "subtract",
            Arith::Mul => "multiply",
            Arith::Div => "divide",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Compare {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

/// Every standard binding, in definition order.
pub fn standard_library() -> Vec<(&'static str, Value)> {
    let arith = |op: Arith| {
        Value::native(&["lhs", "rhs"], move |_, args| arithmetic(op, &args[0], &args[1]))
    };
    let compare = |op: Compare| {
        Value::native(&["lhs", "rhs"], move |_, args| comparison(op, &args[0], &args[1]))
    };

    vec![
        ("plus", arith(Arith::Add)),
        ("minus", arith(Arith::Sub)),
        ("mul", arith(Arith::Mul)),
        ("div", arith(Arith::Div)),
        ("neg", Value::native(&["operand"], |_, args| negate(&args[0]))),
        ("eq", compare(Compare::Eq)),
        ("ne", compare(Compare::Ne)),
        ("gt", compare(Compare::Gt)),
        ("gte", compare(Compare::Gte)),
        ("lt", compare(Compare::Lt)),
        ("lte", compare(Compare::Lte)),
        ("id", Value::native(&["value"], |_, mut args| Ok(args.remove(0)))),
    ]
}

/// Binds the standard library in the evaluator's current frame.
pub fn install(evaluator: &mut Evaluator) {
    for (name, value) in standard_library() {
        evaluator.define(name, value);
    }
}

fn arithmetic(op: Arith, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => {
            let result = match op {
                Arith::Add => a.checked_add(*b),
                Arith::Sub => a.checked_sub(*b),
                Arith::Mul => a.checked_mul(*b),
                Arith::Div if *b == 0 => return Err(EvalError::DivisionByZero),
                Arith::Div => a.checked_div(*b),
            };
            result.map(Value::Integer).ok_or(EvalError::IntegerOverflow)
        }
        (Value::Float(a), Value::Float(b)) => {
            if op == Arith::Div && *b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            Ok(Value::Float(float_op(op, *a, *b)))
        }
        (Value::Integer(_), Value::Float(_)) | (Value::Float(_), Value::Integer(_)) => {
            mixed_arithmetic(op, left, right)
        }
        (a, b) => Err(EvalError::TypeError(format!(
            "Cannot {} {} and {}",
            op.verb(),
            a.type_name(),
            b.type_name()
        ))),
    }
}

/// Integer/float mixes go through decimals so whole results stay integers.
fn mixed_arithmetic(op: Arith, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let to_decimal = |v: &Value| match v {
        Value::Integer(n) => Decimal::from_i64(*n),
        Value::Float(n) => Decimal::from_f64(*n),
        _ => None,
    };

    if let Some(ad) = to_decimal(left)
        && let Some(bd) = to_decimal(right)
    {
        if op == Arith::Div && bd.is_zero() {
            return Err(EvalError::DivisionByZero);
        }
        let rd = match op {
            Arith::Add => ad.checked_add(bd),
            Arith::Sub => ad.checked_sub(bd),
            Arith::Mul => ad.checked_mul(bd),
            Arith::Div => ad.checked_div(bd),
        };
        if let Some(rd) = rd {
            if rd.is_integer()
                && let Some(r) = rd.to_i64()
            {
                return Ok(Value::Integer(r));
            } else if let Some(r) = rd.to_f64() {
                return Ok(Value::Float(r));
            }
        }
    }

    match (left.as_float(), right.as_float()) {
        (Some(_), Some(b)) if op == Arith::Div && b == 0.0 => Err(EvalError::DivisionByZero),
        (Some(a), Some(b)) => Ok(Value::Float(float_op(op, a, b))),
        _ => Err(EvalError::TypeError(format!(
            "Cannot {} {} and {}",
            op.verb(),
            left.type_name(),
            right.type_name()
        ))),
    }
}

fn float_op(op: Arith, a: f64, b: f64) -> f64 {
    match op {
        Arith::Add => a + b,
        Arith::Sub => a - b,
        Arith::Mul => a * b,
        Arith::Div => a / b,
    }
}

fn negate(value: &Value) -> Result<Value, EvalError> {
    match value {
        Value::Integer(n) => n.checked_neg().map(Value::Integer).ok_or(EvalError::IntegerOverflow),
        Value::Float(n) => Ok(Value::Float(-n)),
        v => Err(EvalError::TypeError(format!("Cannot negate {}", v.type_name()))),
    }
}

fn comparison(op: Compare, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let ordering = match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (a, b) => match (a.as_float(), b.as_float()) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    };

    let result = match (op, ordering) {
        (Compare::Eq, Some(o)) => o.is_eq(),
        (Compare::Ne, Some(o)) => o.is_ne(),
        (Compare::Eq, None) => left == right,
        (Compare::Ne, None) => left != right,
        (Compare::Gt, Some(o)) => o.is_gt(),
        (Compare::Gte, Some(o)) => o.is_ge(),
        (Compare::Lt, Some(o)) => o.is_lt(),
        (Compare::Lte, Some(o)) => o.is_le(),
        (_, None) => {
            return Err(EvalError::TypeError(format!(
                "Cannot order {} and {}",
                left.type_name(),
                right.type_name()
            )));
        }
    };
    Ok(Value::from_bool(result))
}
