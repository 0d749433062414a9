//! Tokenizer for subtitle text with inline `@xy` escapes

use crate::error::{Error, Result};

/// One lexical unit of subtitle text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// A plain character.
    Char(char),
    /// `@xy`: an inline control code built from the two alphanumeric characters.
    Escape(char, char),
}

/// Iterator over the [`Token`]s of a string.
///
/// With escapes disabled every character, `@` included, is a [`Token::Char`].
pub struct Lexer<'a> {
    text: &'a str,
    chars: Vec<char>,
    pos: usize,
    escapes: bool,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(text: &'a str, escapes: bool) -> Self {
        Self {
            text,
            chars: text.chars().collect(),
            pos: 0,
            escapes,
        }
    }

    fn next_token(&mut self) -> Result<Option<Token>> {
        let Some(&ch) = self.chars.get(self.pos) else {
            return Ok(None);
        };
        if self.escapes && ch == '@' {
            let start = self.pos;
            return match (self.chars.get(start + 1), self.chars.get(start + 2)) {
                (Some(&x), Some(&y)) if x.is_alphanumeric() && y.is_alphanumeric() => {
                    self.pos += 3;
                    Ok(Some(Token::Escape(x, y)))
                }
                _ => {
                    // stop after the first error
                    self.pos = self.chars.len();
                    Err(Error::InvalidEscape {
                        position: start,
                        text: self.text.to_string(),
                    })
                }
            };
        }
        self.pos += 1;
        Ok(Some(Token::Char(ch)))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}
