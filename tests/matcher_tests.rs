// tests/matcher_tests.rs

use kol_lang::{
    parse, GrammarBuilder, Match, Matcher, Node, ParseError, RuleGraph, Token, TokenCursor,
};
use proptest::prelude::*;

fn grammar(text: &str) -> RuleGraph {
    GrammarBuilder::new()
        .rules(text)
        .unwrap()
        .terminal("word", "text", Token::is_text)
        .terminal("bang", "glyph", |t: &Token| t.is_glyph("!"))
        .terminal("dot", "glyph", |t: &Token| t.is_glyph("."))
        .build()
        .unwrap()
}

fn w(s: &str) -> Token {
    Token::text(s)
}

fn bang() -> Token {
    Token::glyph("!")
}

fn dot() -> Token {
    Token::glyph(".")
}

fn match_prefix(
    grammar: &RuleGraph,
    rule: &str,
    tokens: Vec<Token>,
) -> (Option<Match>, Vec<Token>) {
    let mut cursor = TokenCursor::new(tokens);
    let matched = Matcher::new(grammar)
        .match_rule(grammar.id(rule).unwrap(), &mut cursor)
        .unwrap();
    (matched, cursor.collect())
}

const LIST: &str = "list === more ==> item:::word sep:::bang rest:::list ||| one ==> item:::word";

// ============================================================================
// Terminals
// ============================================================================

#[test]
fn test_terminal_consumes_one_token() {
    let g = grammar("s === one ==> word");
    let (m, rest) = match_prefix(&g, "word", vec![w("a"), w("b")]);
    let m = m.unwrap();
    assert_eq!(m.rule(), "word");
    assert_eq!(m.branch(), None);
    assert_eq!(m.field("text"), Some(&Node::Token(w("a"))));
    assert_eq!(rest, vec![w("b")]);
}

#[test]
fn test_rejected_token_is_pushed_back() {
    let g = grammar("s === one ==> word");
    let (m, rest) = match_prefix(&g, "word", vec![bang(), w("a")]);
    assert!(m.is_none());
    assert_eq!(rest, vec![bang(), w("a")]);
}

#[test]
fn test_terminal_at_end_of_input() {
    let g = grammar("s === one ==> word");
    let (m, rest) = match_prefix(&g, "word", vec![]);
    assert!(m.is_none());
    assert!(rest.is_empty());
}

// ============================================================================
// Composites and backtracking
// ============================================================================

#[test]
fn test_fields_are_recorded_under_arm_names() {
    let g = grammar("s === pair ==> first:::word bang second:::word");
    let (m, _) = match_prefix(&g, "s", vec![w("a"), bang(), w("b")]);
    let m = m.unwrap();

    assert_eq!(m.tag(), "s:pair");
    assert_eq!(m.token("first"), Some(&w("a")));
    assert_eq!(m.token("bang"), Some(&bang()));
    assert_eq!(m.token("second"), Some(&w("b")));
    assert_eq!(m.child("first").map(Match::rule), Some("word"));
}

#[test]
fn test_first_matching_branch_wins() {
    let g = grammar("s === short ==> word ||| long ==> word bang");
    let (m, rest) = match_prefix(&g, "s", vec![w("a"), bang()]);
    assert_eq!(m.unwrap().branch(), Some("short"));
    assert_eq!(rest, vec![bang()]);
}

#[test]
fn test_failed_branch_is_unwound_before_next() {
    let g = grammar("s === long ==> word bang word ||| short ==> word bang");
    let (m, rest) = match_prefix(&g, "s", vec![w("a"), bang(), bang()]);
    let m = m.unwrap();
    assert_eq!(m.branch(), Some("short"));
    assert_eq!(m.tokens(), vec![&w("a"), &bang()]);
    assert_eq!(rest, vec![bang()]);
}

#[test]
fn test_failure_leaves_cursor_untouched() {
    let g = grammar("s === x ==> word word bang ||| y ==> word dot");
    let input = vec![w("a"), w("b"), w("c")];
    let (m, rest) = match_prefix(&g, "s", input.clone());
    assert!(m.is_none());
    assert_eq!(rest, input);
}

#[test]
fn test_nested_failure_unwinds_all_levels() {
    let g = grammar(&format!("{}\ns === listdot ==> list dot ||| plain ==> word", LIST));
    let (m, rest) = match_prefix(&g, "s", vec![w("a"), bang(), w("b"), bang()]);
    let m = m.unwrap();
    assert_eq!(m.branch(), Some("plain"));
    assert_eq!(rest, vec![bang(), w("b"), bang()]);
}

#[test]
fn test_empty_branch_matches_nothing() {
    let g = grammar("opt === some ==> word ||| none ==>");
    let (m, rest) = match_prefix(&g, "opt", vec![bang()]);
    let m = m.unwrap();
    assert_eq!(m.branch(), Some("none"));
    assert!(m.fields().is_empty());
    assert_eq!(rest, vec![bang()]);
}

#[test]
fn test_recursive_rule() {
    let g = grammar(LIST);
    let (m, rest) = match_prefix(&g, "list", vec![w("a"), bang(), w("b"), bang(), w("c")]);
    let m = m.unwrap();
    assert_eq!(m.tag(), "list:more");
    assert_eq!(m.child("rest").unwrap().tag(), "list:more");
    assert_eq!(m.child("rest").unwrap().child("rest").unwrap().tag(), "list:one");
    assert!(rest.is_empty());
}

// ============================================================================
// Repetition
// ============================================================================

const REPEATED: &str = "list === seq ==> item:::word rest:::tail*
tail === more ==> bang item:::word";

#[test]
fn test_repeated_arm_records_each_match() {
    let g = grammar(REPEATED);
    let (m, rest) = match_prefix(&g, "list", vec![w("a"), bang(), w("b"), bang(), w("c")]);
    let m = m.unwrap();
    let items: Vec<&Token> = m.children("rest").filter_map(|t| t.token("item")).collect();
    assert_eq!(items, vec![&w("b"), &w("c")]);
    assert!(rest.is_empty());
}

#[test]
fn test_repetition_stops_and_unwinds_partial_attempt() {
    let g = grammar(REPEATED);
    let (m, rest) = match_prefix(&g, "list", vec![w("a"), bang(), w("b"), bang(), bang()]);
    assert_eq!(m.unwrap().children("rest").count(), 1);
    assert_eq!(rest, vec![bang(), bang()]);
}

#[test]
fn test_repetition_may_match_nothing() {
    let g = grammar(REPEATED);
    let (m, rest) = match_prefix(&g, "list", vec![w("a"), w("b")]);
    assert_eq!(m.unwrap().fields().len(), 1);
    assert_eq!(rest, vec![w("b")]);
}

#[test]
fn test_repetition_of_empty_match_terminates() {
    let g = grammar("s === seq ==> word opt*\nopt === some ==> bang ||| none ==>");
    let (m, rest) = match_prefix(&g, "s", vec![w("a"), bang(), bang(), dot()]);
    assert_eq!(m.unwrap().children("opt").count(), 2);
    assert_eq!(rest, vec![dot()]);
}

#[test]
fn test_optional_arm() {
    let g = grammar("s === seq ==> word bang? dot");
    let (with, _) = match_prefix(&g, "s", vec![w("a"), bang(), dot()]);
    assert!(with.unwrap().field("bang").is_some());
    let (without, rest) = match_prefix(&g, "s", vec![w("a"), dot()]);
    assert!(without.unwrap().field("bang").is_none());
    assert!(rest.is_empty());
}

#[test]
fn test_long_repetition_does_not_nest() {
    let g = grammar(REPEATED);
    let mut input = vec![w("a")];
    for _ in 0..5000 {
        input.extend([bang(), w("b")]);
    }
    let cst = parse(input, &g, "list").unwrap();
    assert_eq!(cst.children("rest").count(), 5000);
}

// ============================================================================
// Depth limit
// ============================================================================

#[test]
fn test_nesting_past_limit_is_an_error() {
    let g = grammar(LIST);
    let mut input = vec![w("a")];
    for _ in 0..20 {
        input.extend([bang(), w("a")]);
    }
    let mut cursor = TokenCursor::new(input.clone());
    let result = Matcher::new(&g)
        .with_max_depth(8)
        .match_rule(g.id("list").unwrap(), &mut cursor);
    assert_eq!(result, Err(ParseError::TooDeep { limit: 8 }));

    let mut cursor = TokenCursor::new(input);
    let result = Matcher::new(&g)
        .with_max_depth(64)
        .match_rule(g.id("list").unwrap(), &mut cursor);
    assert!(result.unwrap().is_some());
}

#[test]
fn test_parse_reports_deep_recursion() {
    let g = grammar(LIST);
    let mut input = vec![w("a")];
    for _ in 0..10_000 {
        input.extend([bang(), w("a")]);
    }
    assert!(matches!(parse(input, &g, "list"), Err(ParseError::TooDeep { .. })));
}

// ============================================================================
// Unwinding
// ============================================================================

#[test]
fn test_unwind_order_is_reverse_of_fields() {
    let g = grammar("s === pair ==> first:::word bang second:::word");
    let (m, _) = match_prefix(&g, "s", vec![w("a"), bang(), w("b")]);
    let order: Vec<&str> = m.as_ref().unwrap().unwind_order().collect();
    assert_eq!(order, vec!["second", "bang", "first"]);
}

#[test]
fn test_unwind_restores_consumed_tokens() {
    let g = grammar(LIST);
    let input = vec![w("a"), bang(), w("b"), w("tail")];
    let mut cursor = TokenCursor::new(input.clone());
    let m = Matcher::new(&g)
        .match_rule(g.id("list").unwrap(), &mut cursor)
        .unwrap()
        .unwrap();
    assert_eq!(cursor.peek(), Some(&w("tail")));

    m.unwind(&mut cursor);
    let replayed: Vec<Token> = cursor.collect();
    assert_eq!(replayed, input);
}

// ============================================================================
// Whole-input parse
// ============================================================================

#[test]
fn test_parse_requires_full_consumption() {
    let g = grammar(LIST);
    let err = parse(vec![w("a"), bang(), w("b"), bang()], &g, "list").unwrap_err();
    assert_eq!(
        err,
        ParseError::TrailingTokens {
            rule: "list".to_string(),
            next: bang(),
        }
    );
}

#[test]
fn test_parse_unknown_start_rule() {
    let g = grammar(LIST);
    let err = parse(vec![w("a")], &g, "nope").unwrap_err();
    assert_eq!(err, ParseError::UnknownRule("nope".to_string()));
}

#[test]
fn test_parse_no_match() {
    let g = grammar(LIST);
    let err = parse(vec![bang()], &g, "list").unwrap_err();
    assert_eq!(err, ParseError::NoMatch { rule: "list".to_string() });
}

// ============================================================================
// Properties
// ============================================================================

fn token_strategy() -> impl Strategy<Value = Token> {
    prop_oneof![
        "[a-c]".prop_map(Token::text),
        Just(Token::glyph("!")),
        Just(Token::glyph(".")),
    ]
}

proptest! {
    #[test]
    fn prop_match_conserves_tokens(input in prop::collection::vec(token_strategy(), 0..10)) {
        let g = grammar(&format!("{}\ns === listdot ==> list dot ||| bare ==> list", LIST));
        let (m, rest) = match_prefix(&g, "s", input.clone());

        let mut seen: Vec<Token> = match &m {
            Some(m) => m.tokens().into_iter().cloned().collect(),
            None => Vec::new(),
        };
        seen.extend(rest);
        prop_assert_eq!(seen, input);
    }

    #[test]
    fn prop_reparse_is_idempotent(input in prop::collection::vec(token_strategy(), 0..10)) {
        let g = grammar(&format!("{}\ns === listdot ==> list dot ||| bare ==> list", LIST));
        if let Ok(first) = parse(input, &g, "s") {
            let again = parse(first.tokens().into_iter().cloned().collect::<Vec<_>>(), &g, "s");
            prop_assert_eq!(again, Ok(first));
        }
    }
}
