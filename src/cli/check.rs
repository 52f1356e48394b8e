//! Check and run kol programs

use super::CliError;
use crate::{Language, OperatorTable, Value};

/// Options shared by `kol run` and `kol check`
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Program source
    pub source: String,
    /// Replacement grammar in the rule meta-format
    pub grammar: Option<String>,
    /// Replacement operator table as JSON
    pub operators: Option<String>,
    /// Only parse and resolve, don't execute
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Program parsed and resolved
    SyntaxValid,
    /// Program ran; the value of its last statement
    Success(Value),
}

fn language(options: &CheckOptions) -> Result<Language, CliError> {
    let mut builder = Language::builder();
    if let Some(grammar) = &options.grammar {
        builder = builder.grammar(grammar.as_str());
    }
    if let Some(operators) = &options.operators {
        builder = builder.operators(OperatorTable::from_json(operators)?);
    }
    Ok(builder.build()?)
}

/// Execute a kol check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let language = language(options)?;

    if options.syntax_only {
        language.compile(&options.source)?;
        return Ok(CheckResult::SyntaxValid);
    }

    let value = language.run(&options.source)?;
    Ok(CheckResult::Success(value))
}
