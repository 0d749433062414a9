//! Sentence encoding and decoding
//!
//! Text becomes fixed-capacity code arrays: one code per character (or per
//! `@xy` escape on line-structured containers), the terminator, then pad.

use super::lexer::{Lexer, Token};
use super::registry::CharRegistry;
use super::translation::Translation;
use crate::error::{Error, Result};
use crate::formats::jmb::{
    CodeArray, JmbFile, JmbKind, PAD, S16Be, SentenceRecord, TERMINATOR, extract_valid,
};

/// What [`JmbFile::update_sentence_codes`] does with the encoded arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodeMode {
    /// Overwrite the stored arrays.
    #[default]
    Commit,
    /// Compare against the stored arrays without modifying them.
    ValidateOnly,
}

/// Where an encoded array goes, for error reporting.
#[derive(Debug, Clone, Copy)]
struct Slot {
    sentence: usize,
    line: Option<usize>,
}

/// Encode one line (JA) or sentence (US) into a full array of `capacity` slots.
///
/// `escapes` enables `@xy` decoding; otherwise `@` is looked up like any
/// other character.
///
/// # Errors
/// Returns [`Error::UnknownCharacter`] for unregistered characters,
/// [`Error::InvalidEscape`]/[`Error::InvalidHex`] for bad escapes, and
/// [`Error::CapacityExceeded`] unless a slot remains for the terminator.
pub fn encode_line(
    text: &str,
    registry: &CharRegistry,
    capacity: usize,
    escapes: bool,
) -> Result<Vec<i16>> {
    encode_at(text, registry, capacity, escapes, Slot { sentence: 0, line: None })
}

fn encode_at(
    text: &str,
    registry: &CharRegistry,
    capacity: usize,
    escapes: bool,
    at: Slot,
) -> Result<Vec<i16>> {
    let mut codes = Vec::with_capacity(capacity);
    for token in Lexer::new(text, escapes) {
        let code = match token? {
            Token::Escape(x, y) => S16Be::from_hex(&format!("ff{x}{y}"))?.to_int(),
            Token::Char(ch) => registry.code(ch).ok_or(Error::UnknownCharacter {
                ch,
                sentence: at.sentence,
                line: at.line,
            })?,
        };
        codes.push(code);
    }

    if codes.len() >= capacity {
        return Err(Error::CapacityExceeded {
            sentence: at.sentence,
            line: at.line,
            len: codes.len(),
            capacity,
        });
    }
    codes.push(TERMINATOR);
    codes.resize(capacity, PAD);
    Ok(codes)
}

impl JmbFile {
    /// Encode `translation` into the sentence records.
    ///
    /// Line-structured containers need exactly as many lines per sentence
    /// as the record has valid lines; flat containers join a sentence's
    /// lines into one string. Nothing is written unless every array encodes.
    ///
    /// # Errors
    /// Returns a structural error if the shape of `translation` does not match
    /// the container, an encoding error for bad text, or in
    /// [`EncodeMode::ValidateOnly`] a validation error for the first array
    /// that differs.
    pub fn update_sentence_codes(
        &mut self,
        translation: &Translation,
        registry: &CharRegistry,
        mode: EncodeMode,
    ) -> Result<()> {
        if translation.len() != self.sentences.len() {
            return Err(Error::SentenceCountChanged {
                expected: self.sentences.len(),
                actual: translation.len(),
            });
        }

        let kind = self.kind();
        let escapes = kind.supports_escapes();
        let mut encoded = Vec::new();
        for (sentence, (record, lines)) in self.sentences.iter().zip(translation).enumerate() {
            match record {
                SentenceRecord::Flat(codes) => {
                    let text = lines.concat();
                    let at = Slot { sentence, line: None };
                    let array = encode_at(&text, registry, kind.code_capacity(), escapes, at)?;
                    check_capacity(codes, &array, at)?;
                    encoded.push((at, text, array));
                }
                SentenceRecord::Lines(records) => {
                    let expected = record.valid_line_count();
                    if lines.len() != expected {
                        return Err(Error::LineCountMismatch {
                            sentence,
                            expected,
                            actual: lines.len(),
                        });
                    }
                    for (line, text) in lines.iter().enumerate() {
                        let at = Slot { sentence, line: Some(line) };
                        let array = encode_at(text, registry, kind.code_capacity(), escapes, at)?;
                        check_capacity(&records[line].codes, &array, at)?;
                        encoded.push((at, text.clone(), array));
                    }
                }
            }
        }

        match mode {
            EncodeMode::ValidateOnly => {
                for (at, text, array) in &encoded {
                    validate_against(self.code_array(*at), text, array, *at)?;
                }
                tracing::info!("{} code arrays match the stored text", encoded.len());
            }
            EncodeMode::Commit => {
                let count = encoded.len();
                for (at, _, array) in encoded {
                    self.code_array_mut(at).overwrite(array);
                }
                tracing::info!("Encoded {count} code arrays ({})", kind.as_str());
            }
        }
        Ok(())
    }

    /// Decode every sentence back to text (valid lines only).
    ///
    /// # Errors
    /// Returns an error if an array is malformed or holds an unregistered code.
    pub fn decode_text(&self, registry: &CharRegistry) -> Result<Translation> {
        self.sentences
            .iter()
            .map(|record| {
                record
                    .code_arrays()
                    .into_iter()
                    .take(record.valid_line_count())
                    .map(|codes| decode_codes(codes.valid_codes()?, registry))
                    .collect()
            })
            .collect()
    }

    fn code_array(&self, at: Slot) -> &CodeArray {
        match &self.sentences[at.sentence] {
            SentenceRecord::Lines(lines) => &lines[at.line.unwrap_or(0)].codes,
            SentenceRecord::Flat(codes) => codes,
        }
    }

    fn code_array_mut(&mut self, at: Slot) -> &mut CodeArray {
        match &mut self.sentences[at.sentence] {
            SentenceRecord::Lines(lines) => &mut lines[at.line.unwrap_or(0)].codes,
            SentenceRecord::Flat(codes) => codes,
        }
    }
}

fn check_capacity(existing: &CodeArray, encoded: &[i16], at: Slot) -> Result<()> {
    if existing.capacity() != encoded.len() {
        return Err(Error::CodeArrayLength {
            sentence: at.sentence,
            line: at.line,
            expected: existing.capacity(),
            actual: encoded.len(),
        });
    }
    Ok(())
}

fn validate_against(existing: &CodeArray, text: &str, encoded: &[i16], at: Slot) -> Result<()> {
    let stored = existing.valid_codes()?.len();
    let expected = text.chars().count();
    if stored != expected {
        return Err(Error::ValidLengthMismatch {
            sentence: at.sentence,
            line: at.line,
            expected,
            stored,
        });
    }
    if let Some((slot, (&stored, &encoded))) = existing
        .as_slice()
        .iter()
        .zip(encoded)
        .enumerate()
        .find(|(_, (a, b))| a != b)
    {
        return Err(Error::CodeMismatch {
            sentence: at.sentence,
            line: at.line,
            slot,
            stored,
            encoded,
        });
    }
    Ok(())
}

/// Turn valid codes (no terminator) back into text.
///
/// Codes with a `0xFF` high byte that are not registered become `@xy`
/// escapes.
///
/// # Errors
/// Returns [`Error::UnknownCode`] for codes with no character.
pub fn decode_codes(codes: &[i16], registry: &CharRegistry) -> Result<String> {
    let mut text = String::with_capacity(codes.len());
    for &code in codes {
        if let Some(ch) = registry.char_for(code) {
            text.push(ch);
            continue;
        }
        let value = S16Be::new(code);
        if value.high_byte() == 0xFF && code != PAD && code != TERMINATOR {
            text.push_str(&format!("@{:02x}", value.bits() & 0xFF));
        } else {
            return Err(Error::UnknownCode(code));
        }
    }
    Ok(text)
}

/// Decode a raw array, checking it is well formed first.
///
/// # Errors
/// See [`extract_valid`] and [`decode_codes`].
pub fn decode_array(codes: &[i16], registry: &CharRegistry) -> Result<String> {
    decode_codes(extract_valid(codes)?, registry)
}

impl JmbKind {
    /// Whether inline `@xy` escapes are decoded when encoding this layout.
    #[must_use]
    pub const fn supports_escapes(self) -> bool {
        matches!(self, Self::Ja)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::jmb::{GlyphRect, JaHeader, Texture, UsHeader, VariantHeader};

    fn registry() -> CharRegistry {
        CharRegistry::register("AB").unwrap()
    }

    #[test]
    fn test_encode_line() {
        let codes = encode_line("AB", &registry(), 32, true).unwrap();
        let mut expected = vec![0, 1, -2];
        expected.extend([-1; 29]);
        assert_eq!(codes, expected);
    }

    #[test]
    fn test_encode_escape() {
        let codes = encode_line("A@0a", &registry(), 32, true).unwrap();
        assert_eq!(&codes[..3], &[0, S16Be::from_bits(0xFF0A).to_int(), -2]);
        assert!(matches!(
            encode_line("A@zz", &registry(), 32, true),
            Err(Error::InvalidHex(_))
        ));
    }

    #[test]
    fn test_encode_unknown_character() {
        assert!(matches!(
            encode_line("AC", &registry(), 32, true),
            Err(Error::UnknownCharacter { ch: 'C', .. })
        ));
        assert!(matches!(
            encode_line("@0a", &registry(), 32, false),
            Err(Error::UnknownCharacter { ch: '@', .. })
        ));
    }

    #[test]
    fn test_capacity_boundary() {
        let registry = registry();
        assert!(encode_line(&"A".repeat(127), &registry, 128, false).is_ok());
        assert!(matches!(
            encode_line(&"A".repeat(128), &registry, 128, false),
            Err(Error::CapacityExceeded { len: 128, capacity: 128, .. })
        ));
        assert!(encode_line(&"B".repeat(31), &registry, 32, true).is_ok());
        assert!(encode_line(&"B".repeat(32), &registry, 32, true).is_err());
    }

    #[test]
    fn test_decode_codes() {
        let registry = CharRegistry::register("殺A").unwrap();
        let codes = [registry.code('殺').unwrap(), -3, 1, -4, S16Be::from_bits(0xFF12).to_int()];
        assert_eq!(decode_codes(&codes, &registry).unwrap(), "殺 A　@12");
        assert!(matches!(decode_codes(&[9], &registry), Err(Error::UnknownCode(9))));
        assert_eq!(decode_array(&[1, -2, -1], &registry).unwrap(), "A");
    }

    fn ja_file(visible: usize) -> JmbFile {
        JmbFile::assemble(
            VariantHeader::Ja(JaHeader::default()),
            vec![SentenceRecord::empty_lines(visible)],
            vec![GlyphRect::default()],
            Texture::new(b"DDS ".to_vec(), 4, 4).unwrap(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_commit_then_validate() {
        let translation = vec![vec!["AB".to_string(), "BA".to_string()]];
        let registry = registry();
        let mut jmb = ja_file(2);
        jmb.update_sentence_codes(&translation, &registry, EncodeMode::Commit)
            .unwrap();
        assert_eq!(jmb.decode_text(&registry).unwrap(), translation);
        jmb.update_sentence_codes(&translation, &registry, EncodeMode::ValidateOnly)
            .unwrap();

        let other = vec![vec!["AB".to_string(), "BB".to_string()]];
        assert!(matches!(
            jmb.update_sentence_codes(&other, &registry, EncodeMode::ValidateOnly),
            Err(Error::CodeMismatch { sentence: 0, line: Some(1), slot: 1, stored: 0, encoded: 1 })
        ));
    }

    #[test]
    fn test_line_count_must_match() {
        let mut jmb = ja_file(2);
        let translation = vec![vec!["A".to_string()]];
        assert!(matches!(
            jmb.update_sentence_codes(&translation, &registry(), EncodeMode::Commit),
            Err(Error::LineCountMismatch { sentence: 0, expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_failed_commit_leaves_records_untouched() {
        let mut jmb = JmbFile::assemble(
            VariantHeader::Us(UsHeader::default()),
            vec![SentenceRecord::empty_flat(); 2],
            vec![],
            Texture::new(b"DDS ".to_vec(), 4, 4).unwrap(),
            None,
        )
        .unwrap();
        let before = jmb.sentences.clone();
        let translation = vec![vec!["A".to_string()], vec!["?".to_string()]];
        assert!(jmb
            .update_sentence_codes(&translation, &registry(), EncodeMode::Commit)
            .is_err());
        assert_eq!(jmb.sentences, before);
    }
}
