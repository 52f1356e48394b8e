use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    ast::Token,
    cursor::TokenCursor,
    grammar::{Arm, Repeat, RuleGraph, RuleId, RuleKind},
};

/// Rule nesting the matcher follows before giving up with
/// [`ParseError::TooDeep`].
pub const DEFAULT_MAX_DEPTH: usize = 256;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("unknown start rule '{0}'")]
    UnknownRule(String),

    #[error("input does not match rule '{rule}'")]
    NoMatch { rule: String },

    #[error("rule '{rule}' matched, but input continues at {next}")]
    TrailingTokens { rule: String, next: Token },

    #[error("input nests deeper than {limit} rules")]
    TooDeep { limit: usize },
}

/// A field value inside a [`Match`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Match(Match),
    Token(Token),
}

impl Node {
    /// Returns every consumed token to the cursor, last token first.
    fn unwind<I: Iterator<Item = Token>>(self, cursor: &mut TokenCursor<I>) {
        match self {
            Node::Token(token) => cursor.push_front(token),
            Node::Match(m) => m.unwind(cursor),
        }
    }

    fn collect_tokens<'a>(&'a self, out: &mut Vec<&'a Token>) {
        match self {
            Node::Token(token) => out.push(token),
            Node::Match(m) => m.fields.iter().for_each(|(_, n)| n.collect_tokens(out)),
        }
    }
}

/// One node of the concrete syntax tree.
///
/// Composite matches are tagged `rule:branch`; terminal matches carry only
/// their rule name and a single token field. Fields are kept in the order
/// they were parsed, which makes the unwind order simply their reverse.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    rule: String,
    branch: Option<String>,
    fields: Vec<(String, Node)>,
}

impl Match {
    pub fn rule(&self) -> &str {
        &self.rule
    }

    pub fn branch(&self) -> Option<&str> {
        self.branch.as_deref()
    }

    pub fn tag(&self) -> String {
        match &self.branch {
            Some(branch) => format!("{}:{}", self.rule, branch),
            None => self.rule.clone(),
        }
    }

    pub fn fields(&self) -> &[(String, Node)] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Node> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, node)| node)
    }

    /// Every sub-match recorded under `name`, in parse order. Repeated arms
    /// record one entry per repetition.
    pub fn children<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Match> + 'a {
        self.fields.iter().filter_map(move |(field, node)| match node {
            Node::Match(m) if field == name => Some(m),
            _ => None,
        })
    }

    /// The sub-match recorded under `name`.
    pub fn child(&self, name: &str) -> Option<&Match> {
        match self.field(name)? {
            Node::Match(m) => Some(m),
            Node::Token(_) => None,
        }
    }

    /// The token recorded under `name`, looking through a terminal sub-match.
    pub fn token(&self, name: &str) -> Option<&Token> {
        match self.field(name)? {
            Node::Token(token) => Some(token),
            Node::Match(m) => match m.fields.as_slice() {
                [(_, Node::Token(token))] => Some(token),
                _ => None,
            },
        }
    }

    pub fn unwind_order(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().rev().map(|(field, _)| field.as_str())
    }

    /// True when the match consumed no tokens.
    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|(_, node)| match node {
            Node::Token(_) => false,
            Node::Match(m) => m.is_empty(),
        })
    }

    /// Every token covered by this match, in source order.
    pub fn tokens(&self) -> Vec<&Token> {
        let mut out = Vec::new();
        self.fields.iter().for_each(|(_, n)| n.collect_tokens(&mut out));
        out
    }

    /// Pushes every consumed token back onto `cursor` so that it replays
    /// exactly what this match read.
    pub fn unwind<I: Iterator<Item = Token>>(self, cursor: &mut TokenCursor<I>) {
        unwind_fields(self.fields, cursor);
    }
}

fn unwind_fields<I: Iterator<Item = Token>>(
    fields: Vec<(String, Node)>,
    cursor: &mut TokenCursor<I>,
) {
    for (_, node) in fields.into_iter().rev() {
        node.unwind(cursor);
    }
}

/// Ordered-choice backtracking matcher over a [`RuleGraph`].
///
/// A failed match leaves the cursor exactly as it found it: every branch
/// that gives up returns the tokens its successful arms consumed before the
/// next branch is tried.
///
/// Rule nesting is bounded by `max_depth`; input that nests deeper fails
/// with [`ParseError::TooDeep`] instead of exhausting the stack. Grammars
/// should express lists with `*` arms rather than right recursion, which
/// costs one level per element.
pub struct Matcher<'g> {
    grammar: &'g RuleGraph,
    max_depth: usize,
}

impl<'g> Matcher<'g> {
    pub fn new(grammar: &'g RuleGraph) -> Self {
        Matcher {
            grammar,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Matches `id` at the cursor. `Ok(None)` means no match and an
    /// untouched cursor.
    pub fn match_rule<I: Iterator<Item = Token>>(
        &self,
        id: RuleId,
        cursor: &mut TokenCursor<I>,
    ) -> Result<Option<Match>, ParseError> {
        self.match_at(id, cursor, 0)
    }

    fn match_at<I: Iterator<Item = Token>>(
        &self,
        id: RuleId,
        cursor: &mut TokenCursor<I>,
        depth: usize,
    ) -> Result<Option<Match>, ParseError> {
        if depth >= self.max_depth {
            return Err(ParseError::TooDeep {
                limit: self.max_depth,
            });
        }
        let rule = self.grammar.rule(id);

        let branches = match &rule.kind {
            RuleKind::Terminal(detector) => {
                let Some(token) = cursor.next() else {
                    return Ok(None);
                };
                if detector.accepts(&token) {
                    trace!(depth, rule = %rule.name, %token, "detector matched");
                    return Ok(Some(Match {
                        rule: rule.name.clone(),
                        branch: None,
                        fields: vec![(detector.field.clone(), Node::Token(token))],
                    }));
                }
                cursor.push_front(token);
                return Ok(None);
            }
            RuleKind::Composite(branches) => branches,
        };

        for branch in branches {
            trace!(depth, rule = %rule.name, branch = %branch.name, "trying branch");
            let mut fields = Vec::with_capacity(branch.arms.len());
            let mut failed = false;

            for arm in &branch.arms {
                if !self.match_arm(arm, cursor, depth + 1, &mut fields)? {
                    failed = true;
                    break;
                }
            }

            if !failed {
                trace!(depth, rule = %rule.name, branch = %branch.name, "branch matched");
                return Ok(Some(Match {
                    rule: rule.name.clone(),
                    branch: Some(branch.name.clone()),
                    fields,
                }));
            }
            unwind_fields(fields, cursor);
        }

        Ok(None)
    }

    /// Matches one arm, appending whatever it records to `fields`. Returns
    /// false only when a required arm fails.
    fn match_arm<I: Iterator<Item = Token>>(
        &self,
        arm: &Arm,
        cursor: &mut TokenCursor<I>,
        depth: usize,
        fields: &mut Vec<(String, Node)>,
    ) -> Result<bool, ParseError> {
        match arm.repeat {
            Repeat::Once => match self.match_at(arm.rule, cursor, depth)? {
                Some(m) => fields.push((arm.field.clone(), Node::Match(m))),
                None => return Ok(false),
            },
            Repeat::Optional => {
                if let Some(m) = self.match_at(arm.rule, cursor, depth)? {
                    fields.push((arm.field.clone(), Node::Match(m)));
                }
            }
            Repeat::Many => {
                while let Some(m) = self.match_at(arm.rule, cursor, depth)? {
                    if m.is_empty() {
                        break;
                    }
                    fields.push((arm.field.clone(), Node::Match(m)));
                }
            }
        }
        Ok(true)
    }
}

/// Matches the whole token sequence against `start`.
///
/// # Examples
///
/// ```
/// use kol_lang::{GrammarBuilder, Token, parse};
///
/// let grammar = GrammarBuilder::new()
///     .rules("greeting === hello ==> word bang")
///     .unwrap()
///     .terminal("word", "text", Token::is_text)
///     .terminal("bang", "glyph", |t: &Token| t.is_glyph("!"))
///     .build()
///     .unwrap();
///
/// let tokens = vec![Token::text("hi"), Token::glyph("!")];
/// let cst = parse(tokens, &grammar, "greeting").unwrap();
/// assert_eq!(cst.tag(), "greeting:hello");
/// ```
pub fn parse<T>(tokens: T, grammar: &RuleGraph, start: &str) -> Result<Match, ParseError>
where
    T: IntoIterator<Item = Token>,
{
    let id = grammar
        .id(start)
        .ok_or_else(|| ParseError::UnknownRule(start.to_string()))?;

    let mut cursor = TokenCursor::new(tokens);
    let matched = Matcher::new(grammar)
        .match_rule(id, &mut cursor)?
        .ok_or_else(|| ParseError::NoMatch {
            rule: start.to_string(),
        })?;

    if let Some(next) = cursor.next() {
        return Err(ParseError::TrailingTokens {
            rule: start.to_string(),
            next,
        });
    }

    debug!(rule = start, tag = %matched.tag(), "parsed");
    Ok(matched)
}
