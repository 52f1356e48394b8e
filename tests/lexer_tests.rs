// tests/lexer_tests.rs

use kol_lang::{Language, Lexer, Token};

const GLYPHS: &[&str] = &["=", "==", "=>", "+", "-", ";", "(", ")", "..."];

fn lex(input: &str) -> Vec<Token> {
    Lexer::new(input, GLYPHS.iter().copied()).collect()
}

fn g(s: &str) -> Token {
    Token::glyph(s)
}

fn t(s: &str) -> Token {
    Token::text(s)
}

// ============================================================================
// Glyphs
// ============================================================================

#[test]
fn test_single_glyphs() {
    for glyph in ["+", "-", ";", "(", ")"] {
        assert_eq!(lex(glyph), vec![g(glyph)], "glyph {}", glyph);
    }
}

#[test]
fn test_longest_glyph_wins() {
    assert_eq!(lex("=="), vec![g("==")]);
    assert_eq!(lex("=>"), vec![g("=>")]);
    assert_eq!(lex("==="), vec![g("=="), g("=")]);
    assert_eq!(lex("..."), vec![g("...")]);
}

#[test]
fn test_adjacent_glyphs_without_spaces() {
    assert_eq!(lex("(-)"), vec![g("("), g("-"), g(")")]);
}

// ============================================================================
// Text runs
// ============================================================================

#[test]
fn test_text_between_glyphs() {
    assert_eq!(lex("x = 1;"), vec![t("x"), g("="), t("1"), g(";")]);
}

#[test]
fn test_text_whitespace_is_collapsed() {
    assert_eq!(lex("  a   b\n c + d"), vec![t("a b c"), g("+"), t("d")]);
}

#[test]
fn test_decimal_point_is_text() {
    assert_eq!(lex("1.5 + 2"), vec![t("1.5"), g("+"), t("2")]);
}

#[test]
fn test_whitespace_only_input() {
    assert!(lex("").is_empty());
    assert!(lex("   \n\t ").is_empty());
}

// ============================================================================
// Comments
// ============================================================================

#[test]
fn test_comment_runs_to_end_of_line() {
    assert_eq!(lex("x // the answer = 42\n+ y"), vec![t("x"), g("+"), t("y")]);
}

#[test]
fn test_comment_at_end_of_input() {
    assert_eq!(lex("x; // done"), vec![t("x"), g(";")]);
}

#[test]
fn test_comment_only_input() {
    assert!(lex("// nothing here").is_empty());
}

// ============================================================================
// Laziness and the standard glyph table
// ============================================================================

#[test]
fn test_tokens_are_produced_on_demand() {
    let mut lexer = Lexer::new("a + b + c", GLYPHS.iter().copied());
    assert_eq!(lexer.next(), Some(t("a")));
    assert_eq!(lexer.next(), Some(g("+")));
    let rest: Vec<Token> = lexer.collect();
    assert_eq!(rest, vec![t("b"), g("+"), t("c")]);
}

#[test]
fn test_standard_language_tokens() {
    let kol = Language::standard().unwrap();
    let tokens: Vec<Token> = kol.tokenize("f = [a, b]{ a >= b };").collect();
    assert_eq!(
        tokens,
        vec![
            t("f"),
            g("="),
            g("["),
            t("a"),
            g(","),
            t("b"),
            g("]"),
            g("{"),
            t("a"),
            g(">="),
            t("b"),
            g("}"),
            g(";"),
        ]
    );
}

#[test]
fn test_standard_language_conditional_tokens() {
    let kol = Language::standard().unwrap();
    let tokens: Vec<Token> = kol.tokenize("? n | ... => { 0 }").collect();
    assert_eq!(
        tokens,
        vec![g("?"), t("n"), g("|"), g("..."), g("=>"), g("{"), t("0"), g("}")]
    );
}
