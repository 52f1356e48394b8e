//! Turns a concrete syntax tree into a precedence-correct [`Expr`] tree.
//!
//! The grammar parses binary chains flat (`head (op operand)*`), which says
//! nothing about precedence. Each maximal chain is re-associated with
//! shunting-yard against the [`OperatorTable`]. Operands are resolved before
//! they are pushed, so resolution is bottom-up.
//!
//! The resolver understands the rule, branch and field names of the
//! standard grammar ([`crate::lang::STANDARD_GRAMMAR`]); grammars supplied by
//! a host must keep those names for the constructs they want resolved.

use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{
        Associativity, Category, CondArm, Expr, Guard, Instruction, OpId, OperatorTable,
        Precedence,
    },
    desugar::{Desugarer, Sugar},
    parser::Match,
};

/// Deepest expression tree the resolver and desugarer build.
pub const MAX_NESTING: usize = 256;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolveError {
    #[error("no precedence defined between '{left}' and '{right}'")]
    PrecedenceConflict { left: String, right: String },

    #[error("operator '{operator}' is non-associative and cannot be chained")]
    NonAssociative { operator: String },

    #[error("no {category} operator with symbol '{symbol}'")]
    UnknownOperator { symbol: String, category: Category },

    #[error("unexpected syntax node '{tag}'")]
    UnexpectedNode { tag: String },

    #[error("syntax node '{tag}' has no field '{field}'")]
    MissingField { tag: String, field: String },

    #[error("operator chain is malformed")]
    MalformedChain,

    #[error("closing '{found}' does not match opening '{opener}'")]
    MismatchedEncloser { opener: String, found: String },

    #[error("'{operator}' cannot enclose this expression")]
    MisplacedEncloser { operator: String },

    #[error("left side of an assignment must be a name")]
    InvalidAssignTarget,

    #[error("function parameters must be plain names")]
    InvalidParameter,

    #[error("argument separator outside of an argument or parameter list")]
    StraySeparator,

    #[error("partial guard in a conditional chain that has no scrutinee")]
    MissingScrutinee,

    #[error("literal '{0}' is out of range")]
    InvalidLiteral(String),

    #[error("expression nests deeper than {limit} levels")]
    TooDeep { limit: usize },
}

/// Resolves and desugars a program parsed with the standard grammar.
///
/// `cst` must be a `stmts` match; the result is the program's instruction
/// list in statement order.
pub fn resolve(
    cst: &Match,
    operators: &OperatorTable,
) -> Result<Vec<Instruction>, ResolveError> {
    resolve_with(cst, operators, &Sugar::default())
}

pub fn resolve_with(
    cst: &Match,
    operators: &OperatorTable,
    sugar: &Sugar,
) -> Result<Vec<Instruction>, ResolveError> {
    let statements = Resolver::new(operators).statements(cst)?;
    let program = Desugarer::new(operators, sugar).program(&statements)?;
    debug!(statements = program.len(), "resolved");
    Ok(program)
}

enum Item {
    Operand(Expr),
    Operator(OpId),
}

/// CST to [`Expr`] conversion against one operator table.
pub struct Resolver<'t> {
    operators: &'t OperatorTable,
}

impl<'t> Resolver<'t> {
    pub fn new(operators: &'t OperatorTable) -> Self {
        Resolver { operators }
    }

    /// Collects the statements of a `stmts` match in source order.
    pub fn statements(&self, m: &Match) -> Result<Vec<Expr>, ResolveError> {
        if (m.rule(), m.branch()) != ("stmts", Some("seq")) {
            return Err(unexpected(m));
        }

        let mut out = vec![self.expr(child(m, "stmt")?)?];
        for next in m.children("rest") {
            match next.branch() {
                Some("more") => out.push(self.expr(child(next, "stmt")?)?),
                Some("last") => {}
                _ => return Err(unexpected(next)),
            }
        }
        Ok(out)
    }

    pub fn expr(&self, m: &Match) -> Result<Expr, ResolveError> {
        match (m.rule(), m.branch()) {
            ("expr", _) => {
                let (operands, ops) = self.flatten(m)?;
                self.reassociate(operands, ops)
            }
            ("expr'", Some("unop")) => Ok(Expr::Unary {
                op: self.operator(m, "unop", Category::Prefix)?,
                operand: Box::new(self.expr(child(m, "operand")?)?),
            }),
            ("expr'", Some("apply")) => {
                let mut callee = self.expr(child(m, "callee")?)?;
                for args in m.children("args") {
                    callee = Expr::call(callee, self.enclosed(args)?);
                }
                Ok(callee)
            }
            ("primary", Some("function")) => Ok(Expr::Function {
                params: Box::new(self.enclosed(child(m, "params")?)?),
                body: Box::new(self.enclosed(child(m, "body")?)?),
            }),
            ("primary", Some("group")) => Ok(Expr::Call {
                callee: None,
                args: Box::new(self.enclosed(child(m, "group")?)?),
            }),
            ("primary", Some("cond")) => self.conditional(child(m, "cond")?),
            ("primary", Some("ident")) => Ok(Expr::Ident(text(m, "ident")?.to_string())),
            ("cond", _) => self.conditional(m),
            ("group" | "params" | "block", _) => self.enclosed(m),
            _ => Err(unexpected(m)),
        }
    }

    /// Splits an `expr` chain into operands and the infix operators between
    /// them.
    fn flatten(&self, m: &Match) -> Result<(Vec<Expr>, Vec<OpId>), ResolveError> {
        if (m.rule(), m.branch()) != ("expr", Some("chain")) {
            return Err(unexpected(m));
        }

        let mut operands = vec![self.expr(child(m, "head")?)?];
        let mut ops = Vec::new();
        for link in m.children("link") {
            ops.push(self.operator(link, "binop", Category::Infix)?);
            operands.push(self.expr(child(link, "rhs")?)?);
        }
        Ok((operands, ops))
    }

    /// Shunting-yard over `operands[0] ops[0] operands[1] ...`.
    pub fn reassociate(&self, operands: Vec<Expr>, ops: Vec<OpId>) -> Result<Expr, ResolveError> {
        if operands.len() != ops.len() + 1 {
            return Err(ResolveError::MalformedChain);
        }

        let mut output = Vec::with_capacity(operands.len() + ops.len());
        let mut pending: Vec<OpId> = Vec::new();
        let mut operands = operands.into_iter();
        output.extend(operands.next().map(Item::Operand));

        for (op, operand) in ops.into_iter().zip(operands) {
            while let Some(&top) = pending.last() {
                if !self.pops_before(top, op)? {
                    break;
                }
                output.push(Item::Operator(top));
                pending.pop();
            }
            pending.push(op);
            output.push(Item::Operand(operand));
        }
        output.extend(pending.into_iter().rev().map(Item::Operator));

        // Nodes carry the height of the operator tree built so far.
        let mut nodes: Vec<(Expr, usize)> = Vec::new();
        for item in output {
            match item {
                Item::Operand(expr) => nodes.push((expr, 0)),
                Item::Operator(op) => {
                    let (Some((rhs, right)), Some((lhs, left))) = (nodes.pop(), nodes.pop()) else {
                        return Err(ResolveError::MalformedChain);
                    };
                    let height = left.max(right) + 1;
                    if height > MAX_NESTING {
                        return Err(ResolveError::TooDeep { limit: MAX_NESTING });
                    }
                    nodes.push((Expr::binary(op, lhs, rhs), height));
                }
            }
        }

        match (nodes.pop(), nodes.is_empty()) {
            (Some((root, _)), true) => Ok(root),
            _ => Err(ResolveError::MalformedChain),
        }
    }

    /// Whether the stacked operator `top` is applied before `incoming` is
    /// pushed.
    fn pops_before(&self, top: OpId, incoming: OpId) -> Result<bool, ResolveError> {
        match self.operators.precedence_of(top, incoming) {
            Precedence::Higher => Ok(true),
            Precedence::Lower => Ok(false),
            Precedence::Equal => match self.operators[incoming].assoc {
                Associativity::Left => Ok(true),
                Associativity::Right => Ok(false),
                Associativity::NonAssoc => Err(ResolveError::NonAssociative {
                    operator: self.operators[incoming].symbol.clone(),
                }),
            },
            Precedence::Undefined => Err(ResolveError::PrecedenceConflict {
                left: self.operators[top].symbol.clone(),
                right: self.operators[incoming].symbol.clone(),
            }),
        }
    }

    /// Unwraps an encloser match, keeping the opening operator's identity.
    fn enclosed(&self, m: &Match) -> Result<Expr, ResolveError> {
        let op = self.operator(m, "opener", Category::Opener)?;
        let close = self.operator(m, "closer", Category::Closer)?;
        if self.operators[op].partner() != Some(close) {
            return Err(ResolveError::MismatchedEncloser {
                opener: self.operators[op].symbol.clone(),
                found: self.operators[close].symbol.clone(),
            });
        }

        let body = match (m.child("stmts"), m.child("expr")) {
            (Some(stmts), _) => self.statements(stmts)?,
            (None, Some(expr)) => vec![self.expr(expr)?],
            (None, None) => Vec::new(),
        };
        Ok(Expr::Enclosed { op, body })
    }

    fn conditional(&self, m: &Match) -> Result<Expr, ResolveError> {
        if m.rule() != "cond" {
            return Err(unexpected(m));
        }
        let scrutinee = match m.child("scrutinee") {
            Some(scrutinee) => Some(Box::new(self.expr(scrutinee)?)),
            None => None,
        };
        let arms = m
            .children("arm")
            .map(|arm| self.arm(arm))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Expr::Conditional { scrutinee, arms })
    }

    /// Partial guards get the scrutinee spliced into their chain as
    /// [`Expr::Capture`] before re-association.
    fn arm(&self, m: &Match) -> Result<CondArm, ResolveError> {
        let g = child(m, "guard")?;
        let guard = match g.branch() {
            Some("catch-all") => Guard::CatchAll,
            Some("left") => {
                let op = self.operator(g, "binop", Category::Infix)?;
                let (mut operands, mut ops) = self.flatten(child(g, "rhs")?)?;
                operands.insert(0, Expr::Capture);
                ops.insert(0, op);
                Guard::Test(self.reassociate(operands, ops)?)
            }
            Some("test") if g.field("op").is_some() => {
                let op = self.operator(g, "op", Category::Infix)?;
                let (mut operands, mut ops) = self.flatten(child(g, "expr")?)?;
                operands.push(Expr::Capture);
                ops.push(op);
                Guard::Test(self.reassociate(operands, ops)?)
            }
            Some("test") => Guard::Test(self.expr(child(g, "expr")?)?),
            _ => return Err(unexpected(g)),
        };

        Ok(CondArm {
            guard,
            body: self.enclosed(child(m, "body")?)?,
        })
    }

    fn operator(&self, m: &Match, field: &str, category: Category) -> Result<OpId, ResolveError> {
        let symbol = m.token(field).ok_or_else(|| missing(m, field))?.as_str();
        self.operators
            .find(symbol, category)
            .ok_or_else(|| ResolveError::UnknownOperator {
                symbol: symbol.to_string(),
                category,
            })
    }
}

fn child<'m>(m: &'m Match, field: &str) -> Result<&'m Match, ResolveError> {
    m.child(field).ok_or_else(|| missing(m, field))
}

fn text<'m>(m: &'m Match, field: &str) -> Result<&'m str, ResolveError> {
    m.token(field)
        .map(|token| token.as_str())
        .ok_or_else(|| missing(m, field))
}

fn missing(m: &Match, field: &str) -> ResolveError {
    ResolveError::MissingField {
        tag: m.tag(),
        field: field.to_string(),
    }
}

fn unexpected(m: &Match) -> ResolveError {
    ResolveError::UnexpectedNode { tag: m.tag() }
}
