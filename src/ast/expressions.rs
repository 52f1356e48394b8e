use super::operators::OpId;

/// Precedence-correct expression tree.
///
/// Produced by the resolver from a concrete syntax tree: binary chains are
/// already re-associated and every operator glyph is bound to its entry in
/// the operator table. Desugaring into instructions happens afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Identifier or literal text, not yet classified
    Ident(String),

    /// The implicit scrutinee of a conditional chain
    ///
    /// Stands in for the missing operand of a partial arm guard such as
    /// `> 0` or `10 <`.
    Capture,

    /// Binary operator application
    Binary {
        op: OpId,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },

    /// Prefix operator application
    Unary { op: OpId, operand: Box<Expr> },

    /// Contents of an encloser pair, tagged with the opening operator
    ///
    /// `body` is empty for `()`, holds one expression for a grouped
    /// expression and one entry per statement for a block.
    Enclosed { op: OpId, body: Vec<Expr> },

    /// Function call; `callee` is `None` for an anonymous call such as `(x)`
    ///
    /// Any expression can be called: `f(1)`, `mk()(2)`, `[x]{ x }(3)`.
    Call {
        callee: Option<Box<Expr>>,
        args: Box<Expr>,
    },

    /// Function literal: `[a, b]{ a * b }`
    Function { params: Box<Expr>, body: Box<Expr> },

    /// Conditional chain: `? x | > 0 => { 1 } | ... => { 0 }`
    Conditional {
        scrutinee: Option<Box<Expr>>,
        arms: Vec<CondArm>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CondArm {
    pub guard: Guard,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Guard {
    /// `...`: always taken
    CatchAll,
    /// Taken when the expression is truthy
    Test(Expr),
}

impl Expr {
    pub fn binary(op: OpId, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn ident(name: &str) -> Self {
        Expr::Ident(name.to_string())
    }

    /// Call of `callee` with an argument encloser.
    pub fn call(callee: Expr, args: Expr) -> Self {
        Expr::Call {
            callee: Some(Box::new(callee)),
            args: Box::new(args),
        }
    }
}
