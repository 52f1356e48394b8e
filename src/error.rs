use thiserror::Error;

use crate::{
    config::ConfigError, evaluator::EvalError, grammar::GrammarError, parser::ParseError,
    resolver::ResolveError,
};

/// Any failure along the source-to-value pipeline.
#[derive(Debug, Error)]
pub enum Error {
    #[error("grammar error: {0}")]
    Grammar(#[from] GrammarError),

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("runtime error: {0}")]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
