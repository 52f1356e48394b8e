//! Lowers the [`Expr`] tree into the minimal [`Instruction`] set.
//!
//! Surface forms map onto five instruction kinds:
//!
//! | surface                   | instruction                                   |
//! |---------------------------|-----------------------------------------------|
//! | `12`, `1.5`, `nil`        | `Literal`                                     |
//! | `x`                       | `Lookup`                                      |
//! | `x = e`                   | `Assign`                                      |
//! | `a + b`, `-a`             | `Call(plus, [a, b])`, `Call(neg, [a])`        |
//! | `f(a, b)`                 | `Call(f, [a, b])`                             |
//! | `g(a)(b)`                 | `Call(<apply>, [g(a)])`, calling `b`          |
//! | `(e)`                     | `Call(<identity>, [e])`                       |
//! | `[a, b]{ ... }`           | `Function`                                    |
//! | `? x \| g => { ... } ...` | nested `Call(<branch>, [g, then, else])`      |
//!
//! Which operators mean assignment, argument separation and the three
//! encloser roles is configured through [`Sugar`].

use std::cell::Cell;
use std::rc::Rc;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::{
    ast::{Callee, CondArm, Expr, FnLiteral, Guard, Instruction, Literal, OpId, OperatorTable},
    resolver::{MAX_NESTING, ResolveError},
    value::{Function, FunctionBody},
};

/// Name the scrutinee of a conditional chain is bound under.
///
/// Contains a glyph, so source text can never refer to it directly.
pub const SCRUTINEE: &str = "?it";

/// Name a computed callee is bound under while its arguments are evaluated.
pub const CALLEE: &str = "?callee";

static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+$").unwrap());
static FLOAT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]*\.[0-9]+$").unwrap());

const NIL: &str = "nil";

/// Operator names that carry syntactic meaning beyond "call the function
/// of the same name".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sugar {
    /// Infix operator lowered to `Assign`
    pub assign: String,
    /// Infix operator splitting argument and parameter lists
    pub separator: String,
    /// Opener of grouping and argument lists: `(`
    pub group: String,
    /// Opener of parameter lists: `[`
    pub params: String,
    /// Opener of statement blocks: `{`
    pub block: String,
}

impl Default for Sugar {
    fn default() -> Self {
        Sugar {
            assign: "ass".to_string(),
            separator: "comma".to_string(),
            group: "lparen".to_string(),
            params: "fnargdef".to_string(),
            block: "fnbody".to_string(),
        }
    }
}

pub struct Desugarer<'t> {
    operators: &'t OperatorTable,
    assign: Option<OpId>,
    separator: Option<OpId>,
    group: Option<OpId>,
    params: Option<OpId>,
    block: Option<OpId>,
    identity: Rc<Function>,
    branch: Rc<Function>,
    depth: Cell<usize>,
}

impl<'t> Desugarer<'t> {
    pub fn new(operators: &'t OperatorTable, sugar: &Sugar) -> Self {
        Desugarer {
            operators,
            assign: operators.by_name(&sugar.assign),
            separator: operators.by_name(&sugar.separator),
            group: operators.by_name(&sugar.group),
            params: operators.by_name(&sugar.params),
            block: operators.by_name(&sugar.block),
            identity: Rc::new(Function::native(&["?value"], |_, mut args| Ok(args.remove(0)))),
            branch: Rc::new(Function::native(&["?guard", "?then", "?else"], |ev, args| {
                let taken = if args[0].is_truthy() { &args[1] } else { &args[2] };
                ev.call(taken, Vec::new())
            })),
            depth: Cell::new(0),
        }
    }

    pub fn program(&self, statements: &[Expr]) -> Result<Vec<Instruction>, ResolveError> {
        statements.iter().map(|stmt| self.lower(stmt, false)).collect()
    }

    /// `captured` is true while lowering a guard of a chain that binds
    /// [`SCRUTINEE`].
    fn lower(&self, expr: &Expr, captured: bool) -> Result<Instruction, ResolveError> {
        let depth = self.depth.get();
        if depth >= MAX_NESTING {
            return Err(ResolveError::TooDeep { limit: MAX_NESTING });
        }
        self.depth.set(depth + 1);
        let lowered = self.lower_expr(expr, captured);
        self.depth.set(depth);
        lowered
    }

    fn lower_expr(&self, expr: &Expr, captured: bool) -> Result<Instruction, ResolveError> {
        match expr {
            Expr::Ident(text) => classify(text),
            Expr::Capture if captured => Ok(Instruction::lookup(SCRUTINEE)),
            Expr::Capture => Err(ResolveError::MissingScrutinee),
            Expr::Binary { op, lhs, rhs } if Some(*op) == self.assign => {
                let Expr::Ident(name) = lhs.as_ref() else {
                    return Err(ResolveError::InvalidAssignTarget);
                };
                if !is_name(name) {
                    return Err(ResolveError::InvalidAssignTarget);
                }
                Ok(Instruction::assign(name, self.lower(rhs, captured)?))
            }
            Expr::Binary { op, .. } if Some(*op) == self.separator => {
                Err(ResolveError::StraySeparator)
            }
            Expr::Binary { op, lhs, rhs } => Ok(Instruction::call(
                &self.operators[*op].name,
                vec![self.lower(lhs, captured)?, self.lower(rhs, captured)?],
            )),
            Expr::Unary { op, operand } => Ok(Instruction::call(
                &self.operators[*op].name,
                vec![self.lower(operand, captured)?],
            )),
            Expr::Enclosed { op, .. } => Err(self.misplaced(*op)),
            Expr::Call { callee, args } => {
                let args = self.arguments(args, captured)?;
                let callee = match callee.as_deref() {
                    None => Callee::Resolved(Rc::clone(&self.identity)),
                    Some(Expr::Ident(name)) if is_name(name) => Callee::Name(name.clone()),
                    Some(callee) => return self.computed_call(callee, args, captured),
                };
                Ok(Instruction::Call { callee, args })
            }
            Expr::Function { params, body } => Ok(Instruction::Function(FnLiteral {
                params: self.parameters(params)?,
                body: self.block(body)?.into(),
            })),
            Expr::Conditional { arms, .. } if arms.len() > MAX_NESTING => {
                Err(ResolveError::TooDeep { limit: MAX_NESTING })
            }
            Expr::Conditional { scrutinee, arms } => {
                self.conditional(scrutinee.as_deref(), arms, captured)
            }
        }
    }

    /// A callee that is not a plain name is evaluated first and bound to
    /// [`CALLEE`] in a wrapper frame; the wrapper then calls it by that name
    /// with the arguments.
    fn computed_call(
        &self,
        callee: &Expr,
        args: Vec<Instruction>,
        captured: bool,
    ) -> Result<Instruction, ResolveError> {
        let apply = Function {
            params: vec![CALLEE.to_string()],
            body: FunctionBody::Instructions(Rc::from(vec![Instruction::call(CALLEE, args)])),
        };
        Ok(Instruction::Call {
            callee: Callee::Resolved(Rc::new(apply)),
            args: vec![self.lower(callee, captured)?],
        })
    }

    fn arguments(&self, args: &Expr, captured: bool) -> Result<Vec<Instruction>, ResolveError> {
        let items = self.enclosed_by(args, self.group)?;
        items
            .iter()
            .flat_map(|item| self.separated(item))
            .map(|item| self.lower(item, captured))
            .collect()
    }

    fn parameters(&self, params: &Expr) -> Result<Vec<String>, ResolveError> {
        let items = self.enclosed_by(params, self.params)?;
        items
            .iter()
            .flat_map(|item| self.separated(item))
            .map(|item| match item {
                Expr::Ident(name) if is_name(name) => Ok(name.clone()),
                _ => Err(ResolveError::InvalidParameter),
            })
            .collect()
    }

    fn block(&self, body: &Expr) -> Result<Vec<Instruction>, ResolveError> {
        self.enclosed_by(body, self.block)?
            .iter()
            .map(|stmt| self.lower(stmt, false))
            .collect()
    }

    fn enclosed_by<'e>(
        &self,
        expr: &'e Expr,
        role: Option<OpId>,
    ) -> Result<&'e [Expr], ResolveError> {
        match expr {
            Expr::Enclosed { op, body } if Some(*op) == role => Ok(body),
            Expr::Enclosed { op, .. } => Err(self.misplaced(*op)),
            _ => Err(ResolveError::UnexpectedNode {
                tag: "enclosed".to_string(),
            }),
        }
    }

    /// In-order operands of a separator tree, whichever way it associates.
    fn separated<'e>(&self, expr: &'e Expr) -> Vec<&'e Expr> {
        match expr {
            Expr::Binary { op, lhs, rhs } if Some(*op) == self.separator => {
                let mut items = self.separated(lhs);
                items.extend(self.separated(rhs));
                items
            }
            _ => vec![expr],
        }
    }

    /// A chain with a scrutinee becomes a call of a one-parameter function
    /// binding [`SCRUTINEE`], whose body is the arm cascade.
    fn conditional(
        &self,
        scrutinee: Option<&Expr>,
        arms: &[CondArm],
        captured: bool,
    ) -> Result<Instruction, ResolveError> {
        let Some(scrutinee) = scrutinee else {
            return self.arms(arms, false);
        };

        let cascade = self.arms(arms, true)?;
        let wrapper = Function {
            params: vec![SCRUTINEE.to_string()],
            body: FunctionBody::Instructions(Rc::from(vec![cascade])),
        };
        Ok(Instruction::Call {
            callee: Callee::Resolved(Rc::new(wrapper)),
            args: vec![self.lower(scrutinee, captured)?],
        })
    }

    fn arms(&self, arms: &[CondArm], captured: bool) -> Result<Instruction, ResolveError> {
        let Some((first, rest)) = arms.split_first() else {
            return Ok(Instruction::Literal(Literal::Nil));
        };

        let then = self.block(&first.body)?;
        match &first.guard {
            Guard::CatchAll => {
                if !rest.is_empty() {
                    warn!(dropped = rest.len(), "arms after a catch-all arm are unreachable");
                }
                let body = Function {
                    params: Vec::new(),
                    body: FunctionBody::Instructions(then.into()),
                };
                Ok(Instruction::Call {
                    callee: Callee::Resolved(Rc::new(body)),
                    args: Vec::new(),
                })
            }
            Guard::Test(test) => {
                let otherwise = self.arms(rest, captured)?;
                let guard = self.lower(test, captured)?;
                Ok(Instruction::Call {
                    callee: Callee::Resolved(Rc::clone(&self.branch)),
                    args: vec![guard, thunk(then), thunk(vec![otherwise])],
                })
            }
        }
    }

    fn misplaced(&self, op: OpId) -> ResolveError {
        ResolveError::MisplacedEncloser {
            operator: self.operators[op].symbol.clone(),
        }
    }
}

fn thunk(body: Vec<Instruction>) -> Instruction {
    Instruction::Function(FnLiteral {
        params: Vec::new(),
        body: body.into(),
    })
}

fn is_name(text: &str) -> bool {
    matches!(classify(text), Ok(Instruction::Lookup(_)))
}

/// Numbers and `nil` become literals; any other text is a name.
fn classify(text: &str) -> Result<Instruction, ResolveError> {
    let invalid = || ResolveError::InvalidLiteral(text.to_string());
    if text == NIL {
        Ok(Instruction::Literal(Literal::Nil))
    } else if INTEGER.is_match(text) {
        text.parse().map(Instruction::int).map_err(|_| invalid())
    } else if FLOAT.is_match(text) {
        text.parse()
            .map(|n| Instruction::Literal(Literal::Float(n)))
            .map_err(|_| invalid())
    } else {
        Ok(Instruction::lookup(text))
    }
}

