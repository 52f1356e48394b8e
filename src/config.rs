//! JSON operator-table configuration.
//!
//! ```json
//! {
//!   "operators": [
//!     { "name": "plus", "symbol": "+", "category": "infix", "assoc": "left" },
//!     { "name": "neg", "symbol": "-", "category": "prefix" }
//!   ],
//!   "enclosers": [
//!     {
//!       "open": { "name": "lparen", "symbol": "(" },
//!       "close": { "name": "rparen", "symbol": ")" }
//!     }
//!   ],
//!   "equal": [["plus", "minus"]],
//!   "greater": [{ "group": ["mul"], "than": ["plus"] }]
//! }
//! ```
//!
//! Relations refer to operators by name. Encloser halves get their own
//! names and can be referenced like any other operator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::ast::{Associativity, OpId, OperatorTable};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid operator configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("operator '{0}' is defined more than once")]
    DuplicateOperator(String),

    #[error("relation references unknown operator '{0}'")]
    UnknownOperator(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fixity {
    Infix,
    Prefix,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorEntry {
    pub name: String,
    pub symbol: String,
    pub category: Fixity,
    /// Defaults to `left` for infix operators; ignored for prefix ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assoc: Option<Associativity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSymbol {
    pub name: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncloserEntry {
    pub open: NamedSymbol,
    pub close: NamedSymbol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GreaterEntry {
    pub group: Vec<String>,
    pub than: Vec<String>,
}

/// Serializable description of an [`OperatorTable`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatorConfig {
    #[serde(default)]
    pub operators: Vec<OperatorEntry>,
    #[serde(default)]
    pub enclosers: Vec<EncloserEntry>,
    #[serde(default)]
    pub equal: Vec<Vec<String>>,
    #[serde(default)]
    pub greater: Vec<GreaterEntry>,
}

impl OperatorConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn into_table(self) -> Result<OperatorTable, ConfigError> {
        let mut table = OperatorTable::new();
        let mut ids: HashMap<String, OpId> = HashMap::new();
        let mut register = |name: &str, id: OpId| match ids.insert(name.to_string(), id) {
            Some(_) => Err(ConfigError::DuplicateOperator(name.to_string())),
            None => Ok(()),
        };

        for entry in &self.operators {
            let id = match entry.category {
                Fixity::Infix => table.infix(
                    &entry.name,
                    &entry.symbol,
                    entry.assoc.unwrap_or(Associativity::Left),
                ),
                Fixity::Prefix => table.prefix(&entry.name, &entry.symbol),
            };
            register(&entry.name, id)?;
        }
        for pair in &self.enclosers {
            let (open, close) = table.encloser(
                &pair.open.name,
                &pair.open.symbol,
                &pair.close.name,
                &pair.close.symbol,
            );
            register(&pair.open.name, open)?;
            register(&pair.close.name, close)?;
        }

        let resolve = |names: &[String]| -> Result<Vec<OpId>, ConfigError> {
            names
                .iter()
                .map(|name| {
                    ids.get(name)
                        .copied()
                        .ok_or_else(|| ConfigError::UnknownOperator(name.clone()))
                })
                .collect()
        };
        for group in &self.equal {
            table.make_equal(&resolve(group)?);
        }
        for relation in &self.greater {
            table.make_greater(&resolve(&relation.group)?, &resolve(&relation.than)?);
        }

        debug!(operators = table.len(), "operator table loaded");
        Ok(table)
    }
}

impl OperatorTable {
    /// Builds a table from its JSON description, see [`OperatorConfig`].
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        OperatorConfig::from_json(text)?.into_table()
    }
}
