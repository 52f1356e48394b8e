pub mod ast;
pub mod builtins;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod cursor;
pub mod desugar;
pub mod error;
pub mod evaluator;
pub mod grammar;
pub mod lang;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod value;

pub use ast::{
    Associativity, Callee, Category, Expr, FnLiteral, Instruction, Literal, OpId, Operator,
    OperatorTable, Precedence, Token,
};
pub use config::{ConfigError, OperatorConfig};
pub use cursor::TokenCursor;
pub use desugar::Sugar;
pub use error::Error;
pub use evaluator::{EvalError, Evaluator, Scope};
pub use grammar::{GrammarBuilder, GrammarError, RuleGraph, RuleId};
pub use lang::{Language, LanguageBuilder, STANDARD_GRAMMAR, standard_operators};
pub use lexer::Lexer;
pub use parser::{Match, Matcher, Node, ParseError, parse};
pub use resolver::{ResolveError, Resolver, resolve};
pub use value::{Function, FunctionBody, NativeFn, Value};
