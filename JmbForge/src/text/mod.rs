//! Subtitle text handling
//!
//! - [`CharRegistry`] assigns control codes to the characters of a text
//! - [`encode_line`] and [`JmbFile::update_sentence_codes`] write text into
//!   code arrays; [`decode_codes`] reads it back
//! - [`translation`] loads, normalises and compares translation files
//!
//! [`JmbFile::update_sentence_codes`]: crate::formats::jmb::JmbFile::update_sentence_codes

mod encoder;
mod lexer;
mod registry;
pub mod translation;

pub use encoder::{EncodeMode, decode_array, decode_codes, encode_line};
pub use lexer::{Lexer, Token};
pub use registry::{CharRegistry, DEATH_CHAR, KILL_CHAR};
pub use translation::{
    JmbUsage, LineDiff, Translation, correct_translation, diff_translations, flatten,
    load_translation, parse_translation, save_translation,
};
