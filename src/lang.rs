//! The standard kol language: grammar text, operator table, terminal
//! detectors and the glyph table, bundled so a program can be run with one
//! call.

use tracing::debug;

use crate::{
    ast::{Associativity, Category, Instruction, OpId, OperatorTable, Token},
    builtins,
    desugar::Sugar,
    error::Error,
    evaluator::Evaluator,
    grammar::{GrammarBuilder, RuleGraph},
    lexer::Lexer,
    parser::{self, Match},
    resolver,
    value::Value,
};

/// Grammar of the standard language in the rule meta-format.
///
/// `expr'` is a single operand; `expr` is a flat chain of operands joined by
/// infix operators, re-associated later by the resolver. No two branches of
/// a rule start with the same sub-rule, so nothing is parsed twice.
pub const STANDARD_GRAMMAR: &str = r"
# statements
stmts === seq ==> stmt:::expr rest:::next-stmt*
next-stmt === more ==> endstmt stmt:::expr ||| last ==> endstmt

# expressions
expr === chain ==> head:::expr' link*
link === infix ==> binop rhs:::expr'
expr' === unop ==> unop operand:::expr' ||| apply ==> callee:::primary args:::group*
primary === function ==> params body:::block ||| cond ||| group ||| ident

# enclosers
group === enclosed ==> opener:::lparen-open expr? closer:::lparen-close
params === enclosed ==> opener:::fnargdef-open expr? closer:::fnargdef-close
block === enclosed ==> opener:::fnbody-open stmts? closer:::fnbody-close

# conditional chains
cond === chain ==> open:::cond-open scrutinee:::expr? arm arm*
arm === arm ==> sep:::arm-sep guard:::arm-guard arrow body:::block
arm-guard === catch-all ==> ellipsis ||| left ==> binop rhs:::expr ||| test ==> expr op:::binop?
";

/// Rule the standard grammar starts from.
pub const START_RULE: &str = "stmts";

/// Single-glyph terminals that are not operators: `(rule, symbol)`.
pub const PUNCTUATION: &[(&str, &str)] = &[
    ("endstmt", ";"),
    ("cond-open", "?"),
    ("arm-sep", "|"),
    ("arrow", "=>"),
    ("ellipsis", "..."),
];

/// The operator table of the standard language.
pub fn standard_operators() -> OperatorTable {
    use Associativity::{Left, NonAssoc, Right};

    let mut table = OperatorTable::new();
    let mul = table.infix("mul", "*", Left);
    let div = table.infix("div", "/", Left);
    let plus = table.infix("plus", "+", Left);
    let minus = table.infix("minus", "-", Left);
    let neg = table.prefix("neg", "-");
    let ass = table.infix("ass", "=", Right);
    let comparisons: Vec<OpId> = [
        ("eq", "=="),
        ("ne", "!="),
        ("gt", ">"),
        ("gte", ">="),
        ("lt", "<"),
        ("lte", "<="),
    ]
    .into_iter()
    .map(|(name, symbol)| table.infix(name, symbol, NonAssoc))
    .collect();
    let comma = table.infix("comma", ",", Right);

    table.encloser("lparen", "(", "rparen", ")");
    table.encloser("fnbody", "{", "fnbodyc", "}");
    table.encloser("fnargdef", "[", "fnargdefc", "]");

    table.make_equal(&[mul, div]);
    table.make_equal(&[plus, minus]);
    table.make_equal(&comparisons);

    let arithmetic = [mul, div, neg, plus, minus];
    table.make_greater(&[mul, div, neg], &[plus, minus]);
    table.make_greater(&arithmetic, &comparisons);

    let mut above_assign = arithmetic.to_vec();
    above_assign.extend(&comparisons);
    table.make_greater(&above_assign, &[ass]);

    above_assign.push(ass);
    table.make_greater(&above_assign, &[comma]);

    table
}

/// A complete language definition: grammar, operators and glyph table.
///
/// # Examples
///
/// ```
/// use kol_lang::{Language, Value};
///
/// let kol = Language::standard().unwrap();
/// let result = kol.run("sq = [x]{ x * x }; sq(3) + 1").unwrap();
///
/// assert_eq!(result, Value::Integer(10));
/// ```
#[derive(Debug)]
pub struct Language {
    grammar: RuleGraph,
    operators: OperatorTable,
    glyphs: Vec<String>,
    start: String,
    sugar: Sugar,
}

impl Language {
    pub fn standard() -> Result<Self, Error> {
        Self::builder().build()
    }

    pub fn builder() -> LanguageBuilder {
        LanguageBuilder::default()
    }

    pub fn grammar(&self) -> &RuleGraph {
        &self.grammar
    }

    pub fn operators(&self) -> &OperatorTable {
        &self.operators
    }

    pub fn glyphs(&self) -> &[String] {
        &self.glyphs
    }

    pub fn tokenize<'a>(&'a self, source: &'a str) -> Lexer<'a> {
        Lexer::new(source, self.glyphs.iter().cloned())
    }

    pub fn parse(&self, source: &str) -> Result<Match, Error> {
        Ok(parser::parse(self.tokenize(source), &self.grammar, &self.start)?)
    }

    /// Parses, resolves and desugars `source`. A source without tokens
    /// compiles to an empty program.
    pub fn compile(&self, source: &str) -> Result<Vec<Instruction>, Error> {
        let mut tokens = self.tokenize(source).peekable();
        if tokens.peek().is_none() {
            return Ok(Vec::new());
        }
        let cst = parser::parse(tokens, &self.grammar, &self.start)?;
        Ok(resolver::resolve_with(&cst, &self.operators, &self.sugar)?)
    }

    /// A fresh evaluator with the standard library installed.
    pub fn evaluator(&self) -> Evaluator {
        let mut evaluator = Evaluator::new();
        builtins::install(&mut evaluator);
        evaluator
    }

    pub fn run(&self, source: &str) -> Result<Value, Error> {
        self.run_in(&mut self.evaluator(), source)
    }

    /// Runs `source` against an existing evaluator, keeping its bindings.
    pub fn run_in(&self, evaluator: &mut Evaluator, source: &str) -> Result<Value, Error> {
        let program = self.compile(source)?;
        let value = evaluator.eval(&program)?;
        debug!(value = %value, "evaluated");
        Ok(value)
    }
}

/// Assembles a [`Language`] from optional replacements of the standard
/// parts.
pub struct LanguageBuilder {
    grammar: String,
    operators: Option<OperatorTable>,
    start: String,
    sugar: Sugar,
}

impl Default for LanguageBuilder {
    fn default() -> Self {
        LanguageBuilder {
            grammar: STANDARD_GRAMMAR.to_string(),
            operators: None,
            start: START_RULE.to_string(),
            sugar: Sugar::default(),
        }
    }
}

impl LanguageBuilder {
    pub fn grammar(mut self, text: impl Into<String>) -> Self {
        self.grammar = text.into();
        self
    }

    pub fn operators(mut self, operators: OperatorTable) -> Self {
        self.operators = Some(operators);
        self
    }

    pub fn start(mut self, rule: impl Into<String>) -> Self {
        self.start = rule.into();
        self
    }

    pub fn sugar(mut self, sugar: Sugar) -> Self {
        self.sugar = sugar;
        self
    }

    pub fn build(self) -> Result<Language, Error> {
        let operators = self.operators.unwrap_or_else(standard_operators);
        let grammar = GrammarBuilder::new().rules(&self.grammar)?;
        let grammar = terminals(grammar, &operators).build()?;

        let mut glyphs: Vec<String> = operators
            .iter()
            .map(|(_, op)| op.symbol.clone())
            .collect();
        glyphs.extend(PUNCTUATION.iter().map(|(_, symbol)| symbol.to_string()));
        glyphs.sort();
        glyphs.dedup();

        debug!(
            rules = grammar.len(),
            operators = operators.len(),
            glyphs = glyphs.len(),
            "language built"
        );
        Ok(Language {
            grammar,
            operators,
            glyphs,
            start: self.start,
            sugar: self.sugar,
        })
    }
}

/// Registers the terminal rules derived from the operator table.
fn terminals(builder: GrammarBuilder, operators: &OperatorTable) -> GrammarBuilder {
    let mut builder = builder
        .terminal("ident", "ident", Token::is_text)
        .terminal("unop", "op", glyph_in(operators.symbols(Category::Prefix)))
        .terminal("binop", "op", glyph_in(operators.symbols(Category::Infix)));

    for &(rule, symbol) in PUNCTUATION {
        builder = builder.terminal(rule, "op", glyph_in(vec![symbol.to_string()]));
    }

    for (open, close) in operators.encloser_pairs() {
        let (open, close) = (&operators[open], &operators[close]);
        let (opens, closes) = (vec![open.symbol.clone()], vec![close.symbol.clone()]);
        builder = builder
            .terminal(format!("{}-open", open.name), "op", glyph_in(opens))
            .terminal(format!("{}-close", open.name), "op", glyph_in(closes));
    }

    builder
}

fn glyph_in(symbols: Vec<String>) -> impl Fn(&Token) -> bool + 'static {
    move |token: &Token| matches!(token, Token::Glyph(g) if symbols.contains(g))
}
