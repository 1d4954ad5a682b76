//! Tokenizer for saved-view queries.
//!
//! Splits on whitespace, except inside a parenthesized group or a quoted
//! span. Delimiters stay in the token text; the filter and option parsers
//! strip them.

use crate::token::Token;

#[derive(Debug, Clone)]
pub struct Tokenizer<'a> {
    input: &'a str,
    /// Current position in the input (byte index)
    position: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Tokenizer { input, position: 0 }
    }

    /// Returns the character at the current position without advancing
    fn peek(&self) -> Option<char> {
        self.input[self.position..].chars().next()
    }

    /// Advances one character and returns it
    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if let Some(c) = c {
            self.position += c.len_utf8();
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// Reads up to the next top-level separator.
    ///
    /// Depth can go negative on a stray `)`; only a positive depth protects
    /// whitespace. Unbalanced groups swallow the rest of the input.
    fn read_token(&mut self, start: usize) -> Token<'a> {
        let mut depth: i32 = 0;
        let mut in_quotes = false;

        while let Some(c) = self.peek() {
            match c {
                '(' => depth += 1,
                ')' => depth -= 1,
                '"' => in_quotes = !in_quotes,
                c if c.is_whitespace() && depth <= 0 && !in_quotes => break,
                _ => {}
            }
            self.bump();
        }

        Token::new(&self.input[start..self.position], start)
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_whitespace();
        let start = self.position;
        self.peek()?;
        Some(self.read_token(start))
    }
}

/// Convenience wrapper returning just the token texts.
pub fn tokenize(input: &str) -> Vec<&str> {
    Tokenizer::new(input).map(|t| t.text).collect()
}
