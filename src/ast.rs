//! # kol - Syntax Trees
//!
//! The kol toolchain moves a program through three tree shapes:
//!
//! - **CST** ([`crate::parser::Match`]) - the raw record of which grammar rule
//!   and branch matched which tokens. Binary operator chains come out
//!   right-nested, independent of precedence.
//! - **[expressions]** - the precedence-correct tree built by the resolver,
//!   with operator glyphs bound to their [`operators::OperatorTable`] entries.
//! - **[instructions]** - the minimal executable tree: lookups, assignments,
//!   function literals, calls and literal values.
//!
//! ## Submodules
//!
//! - **[tokens]** - `Glyph` / `Text` tokens consumed by the parser
//! - **[operators]** - operators and their pairwise precedence relation
//! - **[expressions]** - resolved expression nodes
//! - **[instructions]** - instruction nodes run by the evaluator
//!
//! ## Surface syntax
//!
//! ```text
//! square = [x]{ x * x };
//! sign = [n]{ ? n | < 0 => { 0 - 1 } | == 0 => { 0 } | ... => { 1 } };
//! square(sign(0 - 7) + 2)
//! ```
pub mod expressions;
pub mod instructions;
pub mod operators;
pub mod tokens;

pub use expressions::{CondArm, Expr, Guard};
pub use instructions::{Callee, FnLiteral, Instruction, Literal};
pub use operators::{Associativity, Category, OpId, Operator, OperatorTable, Precedence};
pub use tokens::Token;
