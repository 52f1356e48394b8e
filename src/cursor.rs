//! Pushback-capable reader over a lazy token stream.

use std::collections::VecDeque;
use std::iter::Fuse;

use crate::ast::Token;

/// A single-pass token reader that can replay tokens pushed back onto it.
///
/// Tokens come from a front buffer first and from the underlying producer
/// only once the buffer is empty. The producer is fused: once it reports
/// exhaustion it is never polled again, but tokens pushed back afterwards
/// are still replayed.
///
/// # Examples
///
/// ```
/// use kol_lang::{Token, TokenCursor};
///
/// let mut cursor = TokenCursor::new(vec![Token::text("a"), Token::glyph("+")]);
/// let a = cursor.next().unwrap();
/// let plus = cursor.next().unwrap();
///
/// // Most recently read first: replay restores the original order.
/// cursor.push_front(plus);
/// cursor.push_front(a);
/// assert_eq!(cursor.next(), Some(Token::text("a")));
/// ```
pub struct TokenCursor<I: Iterator<Item = Token>> {
    buffer: VecDeque<Token>,
    source: Fuse<I>,
}

impl<I: Iterator<Item = Token>> TokenCursor<I> {
    pub fn new(source: impl IntoIterator<Item = Token, IntoIter = I>) -> Self {
        TokenCursor {
            buffer: VecDeque::new(),
            source: source.into_iter().fuse(),
        }
    }

    /// Returns the next token without consuming it.
    pub fn peek(&mut self) -> Option<&Token> {
        if self.buffer.is_empty() {
            let token = self.next()?;
            self.buffer.push_front(token);
        }
        self.buffer.front()
    }

    /// Replays a single token before anything else.
    pub fn push_front(&mut self, token: Token) {
        self.buffer.push_front(token);
    }

    /// Prepends `tokens` so that they are replayed in the given order.
    pub fn push_back<T>(&mut self, tokens: T)
    where
        T: IntoIterator<Item = Token>,
        T::IntoIter: DoubleEndedIterator,
    {
        for token in tokens.into_iter().rev() {
            self.buffer.push_front(token);
        }
    }

    /// True when no token is buffered and the producer has run dry.
    pub fn is_exhausted(&mut self) -> bool {
        self.peek().is_none()
    }

    /// Number of tokens waiting in the pushback buffer.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

impl<I: Iterator<Item = Token>> Iterator for TokenCursor<I> {
    type Item = Token;

    /// Consumes one token, or returns `None` when both the pushback buffer
    /// and the producer are empty.
    fn next(&mut self) -> Option<Token> {
        self.buffer.pop_front().or_else(|| self.source.next())
    }
}
