use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use jmbforge::formats::jmb::{
    JaHeader, TERMINATOR, Texture, UsHeader, VariantHeader, align_up,
};
use jmbforge::prelude::*;
use pretty_assertions::assert_eq;
use tempfile::tempdir;

/// A one-sentence, one-glyph US container laid out by hand.
fn handmade_us() -> Vec<u8> {
    let mut data = Vec::new();
    for field in [1u32, 32, 1, 288, 320] {
        data.write_u32::<LittleEndian>(field).unwrap();
    }
    data.extend([0u8; 12]);

    let mut codes = vec![-1i16; 128];
    codes[0] = 0;
    codes[1] = TERMINATOR;
    for code in codes {
        data.write_i16::<LittleEndian>(code).unwrap();
    }

    for field in [1u16, 2, 3, 4] {
        data.write_u16::<LittleEndian>(field).unwrap();
    }
    data.resize(320, 0);

    data.write_u16::<LittleEndian>(1).unwrap();
    data.write_u16::<LittleEndian>(2).unwrap();
    data.write_u32::<LittleEndian>(8).unwrap();
    data.extend([0xAA; 8]);
    data.extend(b"DDS \x01\x02\x03\x04");
    data
}

/// A one-sentence big-endian JA container whose motion section starts one
/// alignment block past the aligned texture end.
fn handmade_ja() -> Vec<u8> {
    let mut data = Vec::new();
    for field in [1u32, 192, 1, 6336, 6368, 6432] {
        data.write_u32::<BigEndian>(field).unwrap();
    }
    data.extend([0x11; 8]);
    let mut name = [0u8; 32];
    name[..7].copy_from_slice(b"Iwazaru");
    data.extend(name);
    data.write_u32::<BigEndian>(5).unwrap();
    data.resize(192, 0);

    for line in 0..16 {
        let mut codes = vec![-1i16; 32];
        let mut ruby = vec![-1i16; 160];
        if line == 0 {
            codes[0] = 0;
            codes[1] = TERMINATOR;
            ruby[0] = 7;
        }
        for code in codes.into_iter().chain(ruby) {
            data.write_i16::<BigEndian>(code).unwrap();
        }
    }

    for field in [1u16, 2, 3, 4] {
        data.write_u16::<BigEndian>(field).unwrap();
    }
    data.resize(6368, 0);

    data.write_u16::<BigEndian>(1).unwrap();
    data.write_u16::<BigEndian>(2).unwrap();
    data.write_u32::<BigEndian>(8).unwrap();
    data.extend([0u8; 8]);
    data.extend(b"DDS \x01\x02\x03\x04");
    // texture ends at 6392, aligned end is 6400
    data.resize(6432, 0);
    data.extend([9u8; 5]);
    data
}

fn ja_file(motions: Option<Vec<Vec<u8>>>, endian: Endian) -> JmbFile {
    let sentences = motions.as_ref().map_or(2, Vec::len);
    JmbFile::assemble(
        VariantHeader::Ja(JaHeader {
            endian,
            ..JaHeader::default()
        }),
        (0..sentences).map(|i| SentenceRecord::empty_lines(i + 1)).collect(),
        vec![GlyphRect::new(0, 0, 12, 24), GlyphRect::new(12, 0, 10, 24)],
        Texture::new(b"DDS and some payload".to_vec(), 32, 24).unwrap(),
        motions,
    )
    .unwrap()
}

#[test]
fn test_handmade_us_parses_and_reproduces() {
    let data = handmade_us();
    let jmb = parse_jmb_bytes(&data, JmbKind::Us, Endian::Little).unwrap();

    assert_eq!(jmb.meta.glyph_offset, 288);
    assert_eq!(jmb.meta.texture_offset, 320);
    assert_eq!(jmb.glyphs, vec![GlyphRect::new(1, 2, 3, 4)]);
    assert_eq!(jmb.texture.pixel_size(), (4, 8));
    assert_eq!(jmb.texture.header.reserved, [0xAA; 8]);
    let SentenceRecord::Flat(codes) = &jmb.sentences[0] else {
        panic!("US sentences are flat");
    };
    assert_eq!(codes.valid_codes().unwrap(), &[0]);

    assert_eq!(jmb.to_bytes().unwrap(), data);
}

#[test]
fn test_handmade_ja_keeps_gap_before_motions() {
    let data = handmade_ja();
    let mut jmb = parse_jmb_bytes(&data, JmbKind::Ja, Endian::Big).unwrap();

    assert_eq!(jmb.meta.endian(), Endian::Big);
    assert_eq!(jmb.meta.motion_offset(), Some(6432));
    assert_eq!(jmb.motions, Some(vec![vec![9u8; 5]]));
    assert_eq!(jmb.texture.payload, b"DDS \x01\x02\x03\x04");
    let VariantHeader::Ja(ja) = &jmb.meta.variant else {
        panic!("JA header expected");
    };
    assert_eq!(&ja.name[..8], b"Iwazaru\0");
    assert_eq!(ja.reserved, [0x11; 8]);
    let SentenceRecord::Lines(lines) = &jmb.sentences[0] else {
        panic!("JA sentences have lines");
    };
    assert_eq!(lines[0].codes.valid_codes().unwrap(), &[0]);
    assert_eq!(lines[0].ruby[0], 7);

    // the stored layout, gap included, is written back verbatim
    assert_eq!(jmb.to_bytes().unwrap(), data);

    // recomputing closes the gap but keeps the motions
    let rewritten = jmb.serialize(true).unwrap();
    assert_eq!(jmb.meta.motion_offset(), Some(6400));
    assert_eq!(rewritten.len(), 6405);
    assert_eq!(&rewritten[24..6392], &data[24..6392]);
    let reread = parse_jmb_bytes(&rewritten, JmbKind::Ja, Endian::Big).unwrap();
    assert_eq!(reread.motions, Some(vec![vec![9u8; 5]]));
}

#[test]
fn test_file_round_trip_oracle() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("00010101.jmb");
    std::fs::write(&path, handmade_us()).unwrap();

    let jmb = read_jmb(&path, JmbKind::infer(&path), Endian::Little).unwrap();
    assert_eq!(jmb.kind(), JmbKind::Us);
    assert!(jmb.byte_identical_to(&path).unwrap());
    jmb.verify_round_trip(&path).unwrap();

    let mut altered = handmade_us();
    altered[300] = 1;
    std::fs::write(&path, altered).unwrap();
    assert!(!jmb.byte_identical_to(&path).unwrap());
    let err = jmb.verify_round_trip(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
}

#[test]
fn test_ja_without_motions_ends_at_texture() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out/00010101J.jmb");
    let mut jmb = ja_file(None, Endian::Little);
    jmb.write_to_file(&path, true).unwrap();

    let len = std::fs::metadata(&path).unwrap().len();
    let texture_end = jmb.meta.texture_offset + jmb.texture.section_size();
    assert_eq!(len, u64::from(align_up(texture_end)));

    let reread = read_jmb(&path, JmbKind::Ja, Endian::Little).unwrap();
    assert_eq!(reread.motions, None);
    assert_eq!(reread, jmb);
    assert!(reread.byte_identical_to(&path).unwrap());
}

#[test]
fn test_ja_big_endian_motions_survive_texture_swap() {
    let motions = vec![vec![1u8; 20], vec![2u8; 33], vec![3u8; 5]];
    let mut jmb = ja_file(Some(motions.clone()), Endian::Big);
    let before = jmb.meta.motion_offset().unwrap();

    jmb.texture = Texture::new(vec![0x44; 300], 64, 32).unwrap();
    jmb.recompute_layout().unwrap();
    let after = jmb.meta.motion_offset().unwrap();
    assert!(after > before);
    assert_eq!(after % 32, 0);

    let bytes = jmb.to_bytes().unwrap();
    let parsed = parse_jmb_bytes(&bytes, JmbKind::Ja, Endian::Big).unwrap();
    assert_eq!(parsed.motions, Some(motions));
    assert_eq!(parsed.meta.motion_sizes(), Some(&[20u32, 33, 5][..]));

    // wrong byte order shows up as a foreign sentence offset
    let err = parse_jmb_bytes(&bytes, JmbKind::Ja, Endian::Little).unwrap_err();
    assert!(matches!(err, Error::UnexpectedSentenceOffset { expected: 192, .. }));
}

#[test]
fn test_glyph_growth_shifts_later_sections() {
    let mut jmb = parse_jmb_bytes(&handmade_us(), JmbKind::Us, Endian::Little).unwrap();
    jmb.glyphs.extend([GlyphRect::new(4, 0, 4, 8); 4]);
    jmb.recompute_layout().unwrap();

    assert_eq!(jmb.meta.glyph_num, 5);
    assert_eq!(jmb.meta.glyph_offset, 288);
    assert_eq!(jmb.meta.texture_offset, align_up(288 + 40));

    let snapshot = jmb.meta.clone();
    jmb.recompute_layout().unwrap();
    assert_eq!(jmb.meta, snapshot);

    let bytes = jmb.to_bytes().unwrap();
    assert!(bytes[328..352].iter().all(|&b| b == 0));
    assert_eq!(&bytes[352 + 16..352 + 20], b"DDS ");
}

#[test]
fn test_us_header_defaults() {
    let jmb = JmbFile::assemble(
        VariantHeader::Us(UsHeader::default()),
        vec![SentenceRecord::empty_flat()],
        Vec::new(),
        Texture::new(b"DDS ".to_vec(), 4, 4).unwrap(),
        None,
    )
    .unwrap();
    assert_eq!(jmb.meta.glyph_num, 0);
    assert_eq!(jmb.meta.texture_offset, 288);
}
