//! `.jmb` file reading and parsing

use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use super::io::{Endian, align_up};
use super::types::{
    CodeArray, GlyphRect, JaHeader, JmbFile, LineRecord, Metadata, SentenceRecord, Texture,
    TextureHeader, UsHeader, VariantHeader,
};
use super::{
    GLYPH_RECT_SIZE, JA_LINE_CHAR_MAX, JA_LINE_MAX, JmbKind, MOTION_TABLE_CAPACITY, NAME_LENGTH,
    RUBY_DATA_MAX, RUBY_MAX, TEXTURE_HEADER_SIZE, US_SENTENCE_CHAR_MAX,
};
use crate::error::{Error, Result};

/// Read a .jmb file from disk
///
/// `big_endian` only applies to the JA layout; US files are always little-endian.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read or is truncated.
/// Returns [`Error::UnexpectedSentenceOffset`] if the header does not match the layout.
/// Returns [`Error::SectionOutOfBounds`] if a section runs past the end of the file.
///
/// [`Error::Io`]: crate::Error::Io
/// [`Error::UnexpectedSentenceOffset`]: crate::Error::UnexpectedSentenceOffset
/// [`Error::SectionOutOfBounds`]: crate::Error::SectionOutOfBounds
pub fn read_jmb<P: AsRef<Path>>(path: P, kind: JmbKind, endian: Endian) -> Result<JmbFile> {
    let mut file = File::open(path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    parse_jmb_bytes(&buffer, kind, endian)
}

/// Parse .jmb data from bytes
///
/// # Errors
///
/// See [`read_jmb`].
pub fn parse_jmb_bytes(data: &[u8], kind: JmbKind, endian: Endian) -> Result<JmbFile> {
    let endian = match kind {
        JmbKind::Ja => endian,
        JmbKind::Us => Endian::Little,
    };
    let mut cursor = Cursor::new(data);

    let meta = read_metadata(&mut cursor, kind, endian)?;
    tracing::debug!(
        "{} header: {} sentences @ {}, {} glyphs @ {}, texture @ {}",
        kind.as_str(),
        meta.sentence_num,
        meta.sentence_offset,
        meta.glyph_num,
        meta.glyph_offset,
        meta.texture_offset
    );

    let record_size = kind.sentence_record_size();
    check_extent(data, "sentence", meta.sentence_offset, meta.sentence_num, record_size)?;
    cursor.seek(SeekFrom::Start(u64::from(meta.sentence_offset)))?;
    let mut sentences = Vec::with_capacity(meta.sentence_num as usize);
    for _ in 0..meta.sentence_num {
        sentences.push(read_sentence(&mut cursor, kind, endian)?);
    }

    check_extent(data, "glyph", meta.glyph_offset, meta.glyph_num, GLYPH_RECT_SIZE)?;
    cursor.seek(SeekFrom::Start(u64::from(meta.glyph_offset)))?;
    let mut glyphs = Vec::with_capacity(meta.glyph_num as usize);
    for _ in 0..meta.glyph_num {
        glyphs.push(GlyphRect {
            u: endian.read_u16(&mut cursor)?,
            v: endian.read_u16(&mut cursor)?,
            w: endian.read_u16(&mut cursor)?,
            h: endian.read_u16(&mut cursor)?,
        });
    }

    check_extent(data, "texture", meta.texture_offset, 1, TEXTURE_HEADER_SIZE)?;
    cursor.seek(SeekFrom::Start(u64::from(meta.texture_offset)))?;
    let texture = read_texture(&mut cursor, endian)?;

    let motions = match &meta.variant {
        VariantHeader::Ja(ja) => {
            // Rewritten files place motions right at the aligned texture end,
            // so trailing bytes count as motion data too.
            let texture_end = meta.texture_offset + texture.section_size();
            let trailing = data.len() > ja.motion_offset as usize;
            if align_up(texture_end) == ja.motion_offset && !trailing {
                None
            } else {
                let sizes = meta.motion_sizes().unwrap_or_default();
                let total: u64 = sizes.iter().map(|&size| u64::from(size)).sum();
                check_extent_u64(data, "motion", u64::from(ja.motion_offset), total)?;
                cursor.seek(SeekFrom::Start(u64::from(ja.motion_offset)))?;
                let mut blobs = Vec::with_capacity(sizes.len());
                for &size in sizes {
                    let mut blob = vec![0u8; size as usize];
                    cursor.read_exact(&mut blob)?;
                    blobs.push(blob);
                }
                Some(blobs)
            }
        }
        VariantHeader::Us(_) => None,
    };

    Ok(JmbFile {
        meta,
        sentences,
        glyphs,
        texture,
        motions,
    })
}

/// Fail unless `count` records of `record_size` bytes at `offset` lie within `data`.
fn check_extent(
    data: &[u8],
    section: &'static str,
    offset: u32,
    count: u32,
    record_size: u32,
) -> Result<()> {
    check_extent_u64(data, section, u64::from(offset), u64::from(count) * u64::from(record_size))
}

fn check_extent_u64(data: &[u8], section: &'static str, offset: u64, len: u64) -> Result<()> {
    let end = offset + len;
    let file_len = data.len() as u64;
    if end > file_len {
        return Err(Error::SectionOutOfBounds {
            section,
            end,
            file_len,
        });
    }
    Ok(())
}

fn read_metadata<R: Read>(r: &mut R, kind: JmbKind, endian: Endian) -> Result<Metadata> {
    let sentence_num = endian.read_u32(r)?;
    let sentence_offset = endian.read_u32(r)?;
    let glyph_num = endian.read_u32(r)?;
    let glyph_offset = endian.read_u32(r)?;
    let texture_offset = endian.read_u32(r)?;

    let variant = match kind {
        JmbKind::Ja => {
            let motion_offset = endian.read_u32(r)?;
            let mut reserved = [0u8; 8];
            r.read_exact(&mut reserved)?;
            let mut name = [0u8; NAME_LENGTH];
            r.read_exact(&mut name)?;
            let mut motion_sizes = [0u32; MOTION_TABLE_CAPACITY];
            for slot in &mut motion_sizes {
                *slot = endian.read_u32(r)?;
            }
            VariantHeader::Ja(JaHeader {
                motion_offset,
                endian,
                reserved,
                name,
                motion_sizes,
            })
        }
        JmbKind::Us => {
            let mut reserved = [0u8; 12];
            r.read_exact(&mut reserved)?;
            VariantHeader::Us(UsHeader { reserved })
        }
    };

    if sentence_offset != kind.header_size() {
        return Err(Error::UnexpectedSentenceOffset {
            expected: kind.header_size(),
            found: sentence_offset,
        });
    }
    if kind == JmbKind::Ja && sentence_num as usize > MOTION_TABLE_CAPACITY {
        return Err(Error::TooManySentences {
            count: sentence_num,
            capacity: MOTION_TABLE_CAPACITY,
        });
    }

    Ok(Metadata {
        sentence_num,
        sentence_offset,
        glyph_num,
        glyph_offset,
        texture_offset,
        variant,
    })
}

fn read_sentence<R: Read>(r: &mut R, kind: JmbKind, endian: Endian) -> Result<SentenceRecord> {
    match kind {
        JmbKind::Us => {
            let codes = endian.read_i16_array(r, US_SENTENCE_CHAR_MAX)?;
            Ok(SentenceRecord::Flat(CodeArray::from_raw(codes)))
        }
        JmbKind::Ja => {
            let mut lines = Vec::with_capacity(JA_LINE_MAX);
            for _ in 0..JA_LINE_MAX {
                let codes = endian.read_i16_array(r, JA_LINE_CHAR_MAX)?;
                let ruby = endian.read_i16_array(r, RUBY_MAX * RUBY_DATA_MAX)?;
                lines.push(LineRecord {
                    codes: CodeArray::from_raw(codes),
                    ruby,
                });
            }
            Ok(SentenceRecord::Lines(lines))
        }
    }
}

fn read_texture(cursor: &mut Cursor<&[u8]>, endian: Endian) -> Result<Texture> {
    let width_blocks = endian.read_u16(cursor)?;
    let height_blocks = endian.read_u16(cursor)?;
    let payload_len = endian.read_u32(cursor)?;
    let mut reserved = [0u8; 8];
    cursor.read_exact(&mut reserved)?;

    let data = *cursor.get_ref();
    check_extent_u64(data, "texture payload", cursor.position(), u64::from(payload_len))?;

    let mut payload = vec![0u8; payload_len as usize];
    cursor.read_exact(&mut payload)?;

    Ok(Texture {
        header: TextureHeader {
            width_blocks,
            height_blocks,
            payload_len,
            reserved,
        },
        payload,
    })
}
