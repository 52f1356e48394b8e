//! Grammar model: a graph of named rules linked by stable ids.
//!
//! Composite rules come from the textual meta-format, one rule per line:
//!
//! ```text
//! rule_name === branch_a ==> arm arm ... ||| branch_b ==> field:::rule ...
//! ```
//!
//! Each arm is either a bare rule name (recorded under the same field name)
//! or `field:::rule`. A trailing `?` makes the arm optional and a trailing
//! `*` repeats it zero or more times; every repetition is recorded under the
//! same field. Terminal rules cannot be written in text; they are registered
//! on the [`GrammarBuilder`] as `(name, field, predicate)` triples.
//!
//! Linking happens in two passes: every rule gets an id first, then every
//! arm's textual reference is replaced by the id of its target. Declaration
//! order is therefore irrelevant and mutual recursion needs no special care.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use tracing::debug;

use crate::ast::Token;

const RULE_SEP: &str = "===";
const BRANCH_SEP: &str = "|||";
const ARMS_SEP: &str = "==>";
const FIELD_SEP: &str = ":::";

/// Stable handle of a rule inside a [`RuleGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(usize);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GrammarError {
    #[error("grammar line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("rule '{0}' is defined more than once")]
    DuplicateRule(String),

    #[error("rule '{rule}' (branch '{branch}') references undefined rule '{target}'")]
    UndefinedRule {
        rule: String,
        branch: String,
        target: String,
    },
}

/// Single-token predicate of a terminal rule.
pub struct Detector {
    /// Field under which the matched token is recorded
    pub field: String,
    predicate: Box<dyn Fn(&Token) -> bool>,
}

impl Detector {
    pub fn new(field: impl Into<String>, predicate: impl Fn(&Token) -> bool + 'static) -> Self {
        Detector {
            field: field.into(),
            predicate: Box::new(predicate),
        }
    }

    pub fn accepts(&self, token: &Token) -> bool {
        (self.predicate)(token)
    }
}

impl fmt::Debug for Detector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Detector")
            .field("field", &self.field)
            .finish_non_exhaustive()
    }
}

/// How many times an arm may match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repeat {
    #[default]
    Once,
    /// `rule?`
    Optional,
    /// `rule*`; stops at the first failure or at a repetition that consumes nothing
    Many,
}

impl Repeat {
    /// Splits a trailing `?` or `*` off an arm target.
    fn split(target: &str) -> (&str, Repeat) {
        if let Some(rule) = target.strip_suffix('*') {
            (rule, Repeat::Many)
        } else if let Some(rule) = target.strip_suffix('?') {
            (rule, Repeat::Optional)
        } else {
            (target, Repeat::Once)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arm {
    pub field: String,
    pub rule: RuleId,
    pub repeat: Repeat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub name: String,
    pub arms: Vec<Arm>,
}

#[derive(Debug)]
pub enum RuleKind {
    /// Ordered alternatives; the first branch that matches wins
    Composite(Vec<Branch>),
    /// Consumes exactly one token accepted by the detector
    Terminal(Detector),
}

#[derive(Debug)]
pub struct Rule {
    pub name: String,
    pub kind: RuleKind,
}

/// A fully linked grammar.
#[derive(Debug)]
pub struct RuleGraph {
    rules: Vec<Rule>,
    index: HashMap<String, RuleId>,
}

impl RuleGraph {
    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.0]
    }

    pub fn id(&self, name: &str) -> Option<RuleId> {
        self.index.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.id(name).map(|id| self.rule(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.rules.iter().enumerate().map(|(i, r)| (RuleId(i), r))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// A composite rule as written, before linking.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSpec {
    pub name: String,
    pub branches: Vec<BranchSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchSpec {
    pub name: String,
    pub arms: Vec<ArmSpec>,
}

/// An arm as written: field name, target rule name and repetition.
#[derive(Debug, Clone, PartialEq)]
pub struct ArmSpec {
    pub field: String,
    pub rule: String,
    pub repeat: Repeat,
}

impl ArmSpec {
    pub fn new(field: impl Into<String>, rule: impl Into<String>) -> Self {
        ArmSpec {
            field: field.into(),
            rule: rule.into(),
            repeat: Repeat::Once,
        }
    }

    pub fn repeated(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }
}

/// Collects composite and terminal rules, then links them into a [`RuleGraph`].
///
/// # Examples
///
/// ```
/// use kol_lang::{GrammarBuilder, Token};
///
/// let grammar = GrammarBuilder::new()
///     .rules("pair === both ==> first:::word second:::word")
///     .unwrap()
///     .terminal("word", "text", Token::is_text)
///     .build()
///     .unwrap();
///
/// assert!(grammar.get("pair").is_some());
/// ```
#[derive(Default)]
pub struct GrammarBuilder {
    composites: Vec<RuleSpec>,
    terminals: Vec<(String, Detector)>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every rule in `text`. Blank lines and lines starting with `#`
    /// are skipped.
    pub fn rules(mut self, text: &str) -> Result<Self, GrammarError> {
        for (index, line) in text.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            self.composites.push(parse_rule_line(trimmed, index + 1)?);
        }
        Ok(self)
    }

    pub fn rule(mut self, spec: RuleSpec) -> Self {
        self.composites.push(spec);
        self
    }

    pub fn terminal(
        mut self,
        name: impl Into<String>,
        field: impl Into<String>,
        predicate: impl Fn(&Token) -> bool + 'static,
    ) -> Self {
        self.terminals.push((name.into(), Detector::new(field, predicate)));
        self
    }

    pub fn build(self) -> Result<RuleGraph, GrammarError> {
        let mut index = HashMap::new();
        let names = self
            .composites
            .iter()
            .map(|spec| spec.name.as_str())
            .chain(self.terminals.iter().map(|(name, _)| name.as_str()));

        for (i, name) in names.enumerate() {
            if index.insert(name.to_string(), RuleId(i)).is_some() {
                return Err(GrammarError::DuplicateRule(name.to_string()));
            }
        }

        let mut rules = Vec::with_capacity(index.len());
        for spec in self.composites {
            let mut branches = Vec::with_capacity(spec.branches.len());
            for branch in spec.branches {
                let mut arms = Vec::with_capacity(branch.arms.len());
                for arm in branch.arms {
                    let rule = index.get(&arm.rule).copied().ok_or_else(|| {
                        GrammarError::UndefinedRule {
                            rule: spec.name.clone(),
                            branch: branch.name.clone(),
                            target: arm.rule.clone(),
                        }
                    })?;
                    arms.push(Arm {
                        field: arm.field,
                        rule,
                        repeat: arm.repeat,
                    });
                }
                branches.push(Branch {
                    name: branch.name,
                    arms,
                });
            }
            rules.push(Rule {
                name: spec.name,
                kind: RuleKind::Composite(branches),
            });
        }
        for (name, detector) in self.terminals {
            rules.push(Rule {
                name,
                kind: RuleKind::Terminal(detector),
            });
        }

        debug!(rules = rules.len(), "grammar linked");
        Ok(RuleGraph { rules, index })
    }
}

/// Parses one `name === branch ==> arms ||| ...` line.
///
/// A branch written without `==>` uses its text both as its name and as its
/// arm list, so `ident` alone is a branch named `ident` with one arm.
pub fn parse_rule_line(line: &str, line_no: usize) -> Result<RuleSpec, GrammarError> {
    let syntax = |message: String| GrammarError::Syntax {
        line: line_no,
        message,
    };

    let (name, body) = line
        .split_once(RULE_SEP)
        .ok_or_else(|| syntax(format!("expected '{}' after the rule name", RULE_SEP)))?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(syntax(format!("invalid rule name '{}'", name)));
    }

    let mut branches = Vec::new();
    for branch in body.split(BRANCH_SEP) {
        let (branch_name, arms_text) = match branch.split_once(ARMS_SEP) {
            Some((branch_name, arms)) => (branch_name.trim(), arms),
            None => (branch.trim(), branch),
        };
        if branch_name.is_empty() {
            return Err(syntax(format!("rule '{}' has an unnamed branch", name)));
        }

        let mut arms = Vec::new();
        for arm in arms_text.split_whitespace() {
            let (target, repeat) = Repeat::split(arm);
            let (field, target) = target.split_once(FIELD_SEP).unwrap_or((target, target));
            if field.is_empty() || target.is_empty() {
                return Err(syntax(format!("malformed arm '{}'", arm)));
            }
            arms.push(ArmSpec::new(field, target).repeated(repeat));
        }

        branches.push(BranchSpec {
            name: branch_name.to_string(),
            arms,
        });
    }

    Ok(RuleSpec {
        name: name.to_string(),
        branches,
    })
}
