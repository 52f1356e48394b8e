//! Glyph-table tokenizer.
//!
//! Splits source text into [`Token::Glyph`] for every occurrence of a symbol
//! from the glyph table and [`Token::Text`] for the runs in between. Tokens
//! are produced lazily, one per `next()` call.

use crate::ast::Token;

const COMMENT: &str = "//";

/// Lazy tokenizer over a borrowed source string.
///
/// Glyphs are matched longest first, so `==` wins over `=`. A run of
/// non-glyph text becomes a single text token with its inner whitespace
/// collapsed; `//` comments run to the end of the line and are dropped.
///
/// # Examples
///
/// ```
/// use kol_lang::{Lexer, Token};
///
/// let glyphs = ["=", "==", ";"];
/// let tokens: Vec<Token> = Lexer::new("x == 1;", glyphs).collect();
///
/// assert_eq!(
///     tokens,
///     vec![Token::text("x"), Token::glyph("=="), Token::text("1"), Token::glyph(";")]
/// );
/// ```
pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
    glyphs: Vec<String>,
    pending: Option<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new<G>(input: &'a str, glyphs: G) -> Self
    where
        G: IntoIterator,
        G::Item: Into<String>,
    {
        let mut glyphs: Vec<String> = glyphs
            .into_iter()
            .map(Into::into)
            .filter(|g: &String| !g.is_empty())
            .collect();
        glyphs.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        glyphs.dedup();

        Lexer {
            input,
            position: 0,
            glyphs,
            pending: None,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.position..]
    }

    fn glyph_len(&self, rest: &str) -> Option<usize> {
        self.glyphs
            .iter()
            .find(|g| rest.starts_with(g.as_str()))
            .map(String::len)
    }

    fn skip_comment(&mut self) {
        let rest = self.rest();
        self.position += rest.find('\n').map_or(rest.len(), |i| i + 1);
    }
}

fn text_token(raw: &str) -> Token {
    Token::Text(raw.split_whitespace().collect::<Vec<_>>().join(" "))
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if let Some(token) = self.pending.take() {
            return Some(token);
        }

        let mut text = String::new();
        loop {
            let rest = self.rest();
            let Some(ch) = rest.chars().next() else {
                break;
            };

            if rest.starts_with(COMMENT) {
                self.skip_comment();
                text.push(' ');
                continue;
            }

            if let Some(len) = self.glyph_len(rest) {
                let glyph = Token::Glyph(rest[..len].to_string());
                self.position += len;
                if text.trim().is_empty() {
                    return Some(glyph);
                }
                self.pending = Some(glyph);
                return Some(text_token(&text));
            }

            text.push(ch);
            self.position += ch.len_utf8();
        }

        if text.trim().is_empty() {
            None
        } else {
            Some(text_token(&text))
        }
    }
}
