use jmbforge::formats::jmb::{
    CodeArray, JaHeader, PAD, TERMINATOR, Texture, UsHeader, VariantHeader, extract_valid,
};
use jmbforge::prelude::*;
use jmbforge::text::{DEATH_CHAR, KILL_CHAR};
use pretty_assertions::assert_eq;

fn us_file(sentences: usize) -> JmbFile {
    JmbFile::assemble(
        VariantHeader::Us(UsHeader::default()),
        vec![SentenceRecord::empty_flat(); sentences],
        Vec::new(),
        Texture::new(b"DDS ".to_vec(), 4, 4).unwrap(),
        None,
    )
    .unwrap()
}

fn ja_file(lines: &[usize]) -> JmbFile {
    JmbFile::assemble(
        VariantHeader::Ja(JaHeader::default()),
        lines.iter().map(|&n| SentenceRecord::empty_lines(n)).collect(),
        Vec::new(),
        Texture::new(b"DDS ".to_vec(), 4, 4).unwrap(),
        None,
    )
    .unwrap()
}

fn tr(sentences: &[&[&str]]) -> Translation {
    sentences
        .iter()
        .map(|s| s.iter().map(ToString::to_string).collect())
        .collect()
}

#[test]
fn test_register_then_encode_line() {
    let registry = CharRegistry::register("AB、").unwrap();
    assert_eq!(registry.unique_chars(), "AB");
    assert_eq!(registry.code('、'), Some(-3));
    assert_eq!(registry.code('A'), Some(0));
    assert_eq!(registry.code('B'), Some(1));

    let codes = encode_line("AB", &registry, 32, true).unwrap();
    let mut expected = vec![0, 1, TERMINATOR];
    expected.resize(32, PAD);
    assert_eq!(codes, expected);
    assert_eq!(extract_valid(&codes).unwrap(), &[0, 1]);
}

#[test]
fn test_flagged_characters() {
    let text: String = [KILL_CHAR, DEATH_CHAR].iter().collect();
    let registry = CharRegistry::register(&text).unwrap();
    assert_eq!(registry.unique_chars(), text);
    assert_eq!(registry.code(KILL_CHAR), Some(S16Be::from_bits(0x8000).to_int()));
    assert_eq!(registry.code(DEATH_CHAR), Some(S16Be::from_bits(0x7001).to_int()));
    assert_eq!(registry.char_for(0x7001), Some(DEATH_CHAR));
}

#[test]
fn test_us_capacity_boundary() {
    let fits = "a".repeat(127);
    let registry = CharRegistry::register(&fits).unwrap();

    let mut jmb = us_file(1);
    jmb.update_sentence_codes(&tr(&[&[&fits]]), &registry, EncodeMode::Commit)
        .unwrap();
    let SentenceRecord::Flat(codes) = &jmb.sentences[0] else {
        panic!("US sentences are flat");
    };
    assert_eq!(codes.valid_len(), Some(127));
    assert_eq!(codes.as_slice()[127], TERMINATOR);

    let too_long = "a".repeat(128);
    let err = jmb
        .update_sentence_codes(&tr(&[&[&too_long]]), &registry, EncodeMode::Commit)
        .unwrap_err();
    assert!(matches!(err, Error::CapacityExceeded { len: 128, capacity: 128, .. }));
    assert_eq!(err.kind(), ErrorKind::CapacityExceeded);
}

#[test]
fn test_ja_lines_escapes_and_decode() {
    let text = tr(&[&["殺す。", "@0a B"], &["死"]]);
    let registry = CharRegistry::register(&flatten(&text)).unwrap();
    assert_eq!(registry.unique_chars(), "殺すB死");

    let mut jmb = ja_file(&[2, 1]);
    jmb.update_sentence_codes(&text, &registry, EncodeMode::Commit)
        .unwrap();
    let SentenceRecord::Lines(lines) = &jmb.sentences[0] else {
        panic!("JA sentences have lines");
    };
    assert_eq!(
        lines[1].codes.valid_codes().unwrap(),
        &[S16Be::from_hex("ff0a").unwrap().to_int(), -3, 2]
    );
    assert_eq!(lines[2].codes, CodeArray::from_raw(vec![PAD; 32]));

    // punctuation collapses onto the space code
    let decoded = jmb.decode_text(&registry).unwrap();
    assert_eq!(decoded, tr(&[&["殺す ", "@0a B"], &["死"]]));

    // an escape occupies one slot but three characters of text
    let err = jmb
        .update_sentence_codes(&text, &registry, EncodeMode::ValidateOnly)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::ValidLengthMismatch { sentence: 0, line: Some(1), expected: 5, stored: 3 }
    ));
}

#[test]
fn test_validate_only_reports_and_leaves_codes() {
    let registry = CharRegistry::register("ABC").unwrap();
    let mut jmb = ja_file(&[1]);
    jmb.update_sentence_codes(&tr(&[&["AB"]]), &registry, EncodeMode::Commit)
        .unwrap();
    let before = jmb.clone();

    let err = jmb
        .update_sentence_codes(&tr(&[&["AC"]]), &registry, EncodeMode::ValidateOnly)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::CodeMismatch { sentence: 0, line: Some(0), slot: 1, stored: 1, encoded: 2 }
    ));
    assert_eq!(jmb, before);

    let err = jmb
        .update_sentence_codes(&tr(&[&["ABC"]]), &registry, EncodeMode::ValidateOnly)
        .unwrap_err();
    assert!(matches!(err, Error::ValidLengthMismatch { expected: 3, stored: 2, .. }));
}

#[test]
fn test_shape_errors() {
    let registry = CharRegistry::register("A").unwrap();
    let mut jmb = ja_file(&[2]);

    let err = jmb
        .update_sentence_codes(&tr(&[&["A"]]), &registry, EncodeMode::Commit)
        .unwrap_err();
    assert!(matches!(err, Error::LineCountMismatch { sentence: 0, expected: 2, actual: 1 }));

    let err = jmb
        .update_sentence_codes(&tr(&[&["A", "A"], &["A"]]), &registry, EncodeMode::Commit)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StructuralMismatch);

    let err = jmb
        .update_sentence_codes(&tr(&[&["A", "Z"]]), &registry, EncodeMode::Commit)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::UnknownCharacter { ch: 'Z', sentence: 0, line: Some(1) }
    ));
}

#[test]
fn test_us_has_no_escape_channel() {
    let registry = CharRegistry::register("ab").unwrap();
    let mut jmb = us_file(1);
    let err = jmb
        .update_sentence_codes(&tr(&[&["a@0b"]]), &registry, EncodeMode::Commit)
        .unwrap_err();
    assert!(matches!(err, Error::UnknownCharacter { ch: '@', .. }));
}
