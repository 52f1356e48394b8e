use std::fmt;

/// A lexical token as produced by the external tokenizer.
///
/// The parsing core never inspects raw characters; it only distinguishes
/// between symbols drawn from the glyph table and everything else.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    /// A symbol from the fixed glyph vocabulary
    ///
    /// # Examples
    /// ```text
    /// +
    /// ==
    /// (
    /// ;
    /// ```
    Glyph(String),

    /// Arbitrary identifier or literal text, whitespace-trimmed
    ///
    /// # Examples
    /// ```text
    /// x
    /// 42
    /// 3.5
    /// ```
    Text(String),
}

impl Token {
    pub fn glyph(text: impl Into<String>) -> Self {
        Token::Glyph(text.into())
    }

    /// Builds a text token, trimming surrounding whitespace.
    pub fn text(text: impl AsRef<str>) -> Self {
        Token::Text(text.as_ref().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Token::Glyph(s) | Token::Text(s) => s,
        }
    }

    pub fn is_glyph(&self, symbol: &str) -> bool {
        matches!(self, Token::Glyph(s) if s == symbol)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Token::Text(_))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Glyph(s) => write!(f, "{}", s),
            Token::Text(s) => write!(f, "\"{}\"", s),
        }
    }
}
