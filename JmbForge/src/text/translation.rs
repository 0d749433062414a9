//! Translation input: loading, normalisation and comparison

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Sentences, each an ordered list of line strings.
pub type Translation = Vec<Vec<String>>;

/// One sentence as stored in a translation file.
///
/// Line-structured containers use a list of lines; flat containers may
/// store a bare string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SentenceEntry {
    Lines(Vec<String>),
    Flat(String),
}

/// Load a translation JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read or is not a JSON array of
/// sentences.
pub fn load_translation<P: AsRef<Path>>(path: P) -> Result<Translation> {
    let content = fs::read_to_string(path)?;
    parse_translation(&content)
}

/// Parse translation JSON text.
///
/// # Errors
/// Returns an error if `json` is not an array of sentences.
pub fn parse_translation(json: &str) -> Result<Translation> {
    let entries: Vec<SentenceEntry> = serde_json::from_str(json)?;
    Ok(entries
        .into_iter()
        .map(|entry| match entry {
            SentenceEntry::Lines(lines) => lines,
            SentenceEntry::Flat(text) => vec![text],
        })
        .collect())
}

/// Write a translation as pretty-printed JSON.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn save_translation<P: AsRef<Path>>(path: P, translation: &Translation) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(translation)?)?;
    Ok(())
}

/// Concatenate every line in order.
#[must_use]
pub fn flatten(translation: &Translation) -> String {
    translation.iter().flatten().map(String::as_str).collect()
}

/// What a container's text is used for; selects the font profile and the
/// punctuation normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum JmbUsage {
    #[default]
    Default,
    /// Speaker name plates
    Name,
    /// Hato (pigeon) messages
    Hato,
    Tutorial,
    Voice,
}

impl JmbUsage {
    /// Infer from a file stem: `nm`/`NM` marks name plates, `hato` pigeon messages.
    #[must_use]
    pub fn from_file_stem(stem: &str) -> Self {
        if stem.contains("nm") || stem.contains("NM") {
            Self::Name
        } else if stem.contains("hato") {
            Self::Hato
        } else {
            Self::Default
        }
    }

    /// Infer from a path's file stem.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        path.as_ref()
            .file_stem()
            .map_or(Self::Default, |s| Self::from_file_stem(&s.to_string_lossy()))
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Name => "name",
            Self::Hato => "hato",
            Self::Tutorial => "tutorial",
            Self::Voice => "voice",
        }
    }

    /// Character substitutions applied before registration.
    fn correct(self, ch: char) -> char {
        match (self, ch) {
            (_, '杀') => '殺',
            (_, '?') => '？',
            (_, '!') => '！',
            (Self::Hato, '，') => ',',
            (Self::Hato, '。') => '.',
            _ => ch,
        }
    }
}

impl fmt::Display for JmbUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JmbUsage {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "name" | "nm" => Ok(Self::Name),
            "hato" => Ok(Self::Hato),
            "tutorial" => Ok(Self::Tutorial),
            "voice" => Ok(Self::Voice),
            _ => Err(format!(
                "Invalid usage '{s}'. Valid values: default, name, hato, tutorial, voice"
            )),
        }
    }
}

/// Normalise characters the game font does not carry.
///
/// `杀` becomes `殺` and ASCII `?`/`!` their full-width forms; hato messages
/// also use ASCII `,` and `.` instead of `，` and `。`.
#[must_use]
pub fn correct_translation(translation: &Translation, usage: JmbUsage) -> Translation {
    translation
        .iter()
        .map(|sentence| {
            sentence
                .iter()
                .map(|line| line.chars().map(|ch| usage.correct(ch)).collect())
                .collect()
        })
        .collect()
}

/// A line whose text differs between two translations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineDiff {
    pub sentence: usize,
    pub line: usize,
    /// `None` when the line is absent (or no original was given)
    pub original: Option<String>,
    pub modified: Option<String>,
}

impl fmt::Display for LineDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{},{}] {} -> {}",
            self.sentence,
            self.line,
            self.original.as_deref().unwrap_or("(none)"),
            self.modified.as_deref().unwrap_or("(none)")
        )
    }
}

/// List every `(sentence, line)` whose text differs.
///
/// Without an original every modified line is reported.
#[must_use]
pub fn diff_translations(original: Option<&Translation>, modified: &Translation) -> Vec<LineDiff> {
    let empty = Translation::new();
    let original_given = original.is_some();
    let original = original.unwrap_or(&empty);

    let mut diffs = Vec::new();
    for sentence in 0..original.len().max(modified.len()) {
        let orig = original.get(sentence).map_or(&[][..], Vec::as_slice);
        let modi = modified.get(sentence).map_or(&[][..], Vec::as_slice);
        for line in 0..orig.len().max(modi.len()) {
            let a = orig.get(line);
            let b = modi.get(line);
            if a != b || !original_given {
                diffs.push(LineDiff {
                    sentence,
                    line,
                    original: a.cloned(),
                    modified: b.cloned(),
                });
            }
        }
    }
    diffs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tr(sentences: &[&[&str]]) -> Translation {
        sentences
            .iter()
            .map(|s| s.iter().map(ToString::to_string).collect())
            .collect()
    }

    #[test]
    fn test_parse_mixed_shapes() {
        let parsed = parse_translation(r#"[["あい", "う"], "flat"]"#).unwrap();
        assert_eq!(parsed, tr(&[&["あい", "う"], &["flat"]]));
        assert!(parse_translation(r#"{"a": 1}"#).is_err());
    }

    #[test]
    fn test_flatten() {
        assert_eq!(flatten(&tr(&[&["AB", "C"], &["D"]])), "ABCD");
    }

    #[test]
    fn test_usage_from_stem() {
        assert_eq!(JmbUsage::from_file_stem("00010101nmJ"), JmbUsage::Name);
        assert_eq!(JmbUsage::from_file_stem("Stage771_M02NMJ"), JmbUsage::Name);
        assert_eq!(JmbUsage::from_file_stem("hato007201J"), JmbUsage::Hato);
        assert_eq!(JmbUsage::from_file_stem("00010101J"), JmbUsage::Default);
        assert_eq!(JmbUsage::from_path("fonts/hato007301J.jmb"), JmbUsage::Hato);
    }

    #[test]
    fn test_correction() {
        let input = tr(&[&["杀?!，。"]]);
        assert_eq!(correct_translation(&input, JmbUsage::Default), tr(&[&["殺？！，。"]]));
        assert_eq!(correct_translation(&input, JmbUsage::Hato), tr(&[&["殺？！,."]]));
    }

    #[test]
    fn test_diff() {
        let a = tr(&[&["a", "b"], &["c"]]);
        let b = tr(&[&["a", "B"], &["c", "d"]]);
        let diffs = diff_translations(Some(&a), &b);
        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[0].to_string(), "[0,1] b -> B");
        assert_eq!(diffs[1].original, None);

        assert!(diff_translations(Some(&a), &a).is_empty());
        assert_eq!(diff_translations(None, &b).len(), 4);
    }
}
