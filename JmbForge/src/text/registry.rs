//! Character to control code bijection
//!
//! Built by scanning the full text that will be written into a container.
//! Every registrable character receives the next counter value, in order of
//! first occurrence; that order is also the order of glyphs in the atlas.

use std::collections::{BTreeMap, HashMap};

use super::lexer::{Lexer, Token};
use crate::error::{Error, Result};
use crate::formats::jmb::{DEATH_FLAG, IDEOGRAPHIC_SPACE_CODE, KILL_FLAG, S16Be, SPACE_CODE};

/// Character carrying the "kill" category flag
pub const KILL_CHAR: char = '殺';
/// Character carrying the "death" category flag
pub const DEATH_CHAR: char = '死';

/// Sentence punctuation that collapses onto the space code
const COLLAPSED_PUNCTUATION: [char; 2] = ['、', '。'];

/// Counter values must stay below the lowest flag bit.
const COUNTER_LIMIT: u16 = DEATH_FLAG.bits();

/// Bijection between characters and control codes.
///
/// Both directions are maintained together. The only many-to-one entries are
/// the punctuation marks that share the space code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharRegistry {
    code_to_char: BTreeMap<i16, char>,
    char_to_code: HashMap<char, i16>,
    unique: String,
    counter: u16,
}

impl Default for CharRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CharRegistry {
    /// An empty registry holding only the two space sentinels.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            code_to_char: BTreeMap::new(),
            char_to_code: HashMap::new(),
            unique: String::new(),
            counter: 0,
        };
        registry.insert(' ', SPACE_CODE);
        registry.insert('　', IDEOGRAPHIC_SPACE_CODE);
        registry
    }

    /// Build a registry from `text`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidEscape`] for a malformed `@xy` escape, or
    /// [`Error::RegistryFull`] if the unflagged code space runs out.
    pub fn register(text: &str) -> Result<Self> {
        let mut registry = Self::new();
        registry.extend(text)?;
        Ok(registry)
    }

    /// Scan more text, registering characters not seen yet.
    ///
    /// # Errors
    /// See [`CharRegistry::register`].
    pub fn extend(&mut self, text: &str) -> Result<()> {
        for token in Lexer::new(text, true) {
            let Token::Char(ch) = token? else {
                continue;
            };
            if COLLAPSED_PUNCTUATION.contains(&ch) {
                self.alias(ch, SPACE_CODE);
                continue;
            }
            if ch == ' ' || ch == '　' || self.char_to_code.contains_key(&ch) {
                continue;
            }
            self.assign(ch)?;
        }
        tracing::debug!("registry: {} unique characters", self.unique.chars().count());
        Ok(())
    }

    fn assign(&mut self, ch: char) -> Result<()> {
        if self.counter >= COUNTER_LIMIT {
            return Err(Error::RegistryFull(self.unique.chars().count()));
        }
        let base = S16Be::from_bits(self.counter);
        let code = match ch {
            KILL_CHAR => base | KILL_FLAG,
            DEATH_CHAR => base | DEATH_FLAG,
            _ => base,
        };
        self.insert(ch, code.to_int());
        self.unique.push(ch);
        self.counter += 1;
        Ok(())
    }

    fn insert(&mut self, ch: char, code: i16) {
        self.code_to_char.insert(code, ch);
        self.char_to_code.insert(ch, code);
    }

    /// Lookup-only mapping; the code keeps its original character.
    fn alias(&mut self, ch: char, code: i16) {
        self.char_to_code.insert(ch, code);
    }

    /// Code assigned to `ch`.
    #[must_use]
    pub fn code(&self, ch: char) -> Option<i16> {
        self.char_to_code.get(&ch).copied()
    }

    /// Character assigned to `code`.
    #[must_use]
    pub fn char_for(&self, code: i16) -> Option<char> {
        self.code_to_char.get(&code).copied()
    }

    /// Registered characters in first-occurrence order.
    #[must_use]
    pub fn unique_chars(&self) -> &str {
        &self.unique
    }

    /// Number of registered characters (equals the glyph count).
    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.counter)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.unique.is_empty()
    }

    /// All `(code, char)` pairs in code order, sentinels included.
    pub fn iter(&self) -> impl Iterator<Item = (i16, char)> + '_ {
        self.code_to_char.iter().map(|(&code, &ch)| (code, ch))
    }
}
