//! Layout recomputation and `.jmb` serialization

use std::fs;
use std::io::{Cursor, Seek, Write};
use std::path::Path;

use super::io::{Endian, align_up};
use super::types::{JmbFile, Metadata, SentenceRecord, Texture, TextureHeader, VariantHeader};
use super::GLYPH_RECT_SIZE;
use crate::error::{Error, Result};

impl JmbFile {
    /// Derive every offset and count from the current content.
    ///
    /// Repeated calls reach a fixed point. Fields that change are logged
    /// at info level; unchanged fields at debug level.
    ///
    /// # Errors
    /// Returns a structural error if the sentence count changed since load,
    /// or the sections are inconsistent with the header variant.
    pub fn recompute_layout(&mut self) -> Result<()> {
        self.ready_to_write()?;

        let kind = self.kind();
        if self.meta.sentence_offset != kind.header_size() {
            return Err(Error::UnexpectedSentenceOffset {
                expected: kind.header_size(),
                found: self.meta.sentence_offset,
            });
        }
        if self.sentences.len() != self.meta.sentence_num as usize {
            return Err(Error::SentenceCountChanged {
                expected: self.meta.sentence_num as usize,
                actual: self.sentences.len(),
            });
        }

        let glyph_offset =
            self.meta.sentence_offset + self.meta.sentence_num * kind.sentence_record_size();
        update_field("glyph_offset", &mut self.meta.glyph_offset, glyph_offset);
        update_field("glyph_num", &mut self.meta.glyph_num, self.glyphs.len() as u32);

        let texture_offset = align_up(glyph_offset + self.meta.glyph_num * GLYPH_RECT_SIZE);
        update_field("texture_offset", &mut self.meta.texture_offset, texture_offset);

        let (width, height) = self.texture.pixel_size();
        let payload_len =
            TextureHeader::for_payload(self.texture.payload.len(), width, height)?.payload_len;
        update_field("texture_payload_len", &mut self.texture.header.payload_len, payload_len);

        let texture_end = texture_offset + self.texture.section_size();
        if let VariantHeader::Ja(ja) = &mut self.meta.variant {
            update_field("motion_offset", &mut ja.motion_offset, align_up(texture_end));
        }
        Ok(())
    }

    /// Serialize into a buffer.
    ///
    /// With `validate`, the layout is recomputed first; without it the
    /// stored metadata is written as-is.
    ///
    /// # Errors
    /// Returns an error if layout recomputation fails or a section ends
    /// away from its recorded offset.
    pub fn serialize(&mut self, validate: bool) -> Result<Vec<u8>> {
        if validate {
            self.recompute_layout()?;
        }
        self.to_bytes()
    }

    /// Serialize the stored layout without recomputing it.
    ///
    /// # Errors
    /// See [`JmbFile::serialize`].
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        self.write(&mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Write the container, checking the position after every section.
    ///
    /// # Errors
    /// Returns [`Error::WritePositionMismatch`] if the stored offsets do not
    /// describe the content, or an IO error from the writer.
    pub fn write<W: Write + Seek>(&self, w: &mut W) -> Result<()> {
        self.ready_to_write()?;
        let endian = self.meta.endian();

        write_metadata(w, &self.meta, endian)?;
        check_position(w, "header", self.meta.sentence_offset)?;

        for sentence in &self.sentences {
            write_sentence(w, sentence, endian)?;
        }
        check_position(w, "sentences", self.meta.glyph_offset)?;

        for rect in &self.glyphs {
            endian.write_u16(w, rect.u)?;
            endian.write_u16(w, rect.v)?;
            endian.write_u16(w, rect.w)?;
            endian.write_u16(w, rect.h)?;
        }
        pad_to(w, "glyphs", self.meta.texture_offset)?;

        write_texture(w, &self.texture, endian)?;

        if let VariantHeader::Ja(ja) = &self.meta.variant {
            pad_to(w, "texture", ja.motion_offset)?;
            if let Some(blobs) = &self.motions {
                for blob in blobs {
                    w.write_all(blob)?;
                }
            }
        }
        Ok(())
    }

    /// Serialize to `path`, creating parent directories.
    ///
    /// # Errors
    /// See [`JmbFile::serialize`].
    pub fn write_to_file<P: AsRef<Path>>(&mut self, path: P, validate: bool) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.serialize(validate)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, &bytes)?;
        tracing::info!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    /// Whether serializing the stored layout reproduces `path` byte for byte.
    ///
    /// # Errors
    /// Returns an error if `path` cannot be read or serialization fails.
    pub fn byte_identical_to<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        let original = fs::read(path)?;
        Ok(self.to_bytes()? == original)
    }

    /// Like [`JmbFile::byte_identical_to`], but report where the bytes diverge.
    ///
    /// # Errors
    /// Returns [`Error::RoundTripMismatch`] naming the first differing offset.
    pub fn verify_round_trip<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let original = fs::read(path)?;
        let rebuilt = self.to_bytes()?;
        if let Some(detail) = first_difference(&original, &rebuilt) {
            return Err(Error::RoundTripMismatch {
                path: path.to_path_buf(),
                detail,
            });
        }
        Ok(())
    }
}

fn update_field(name: &str, field: &mut u32, value: u32) {
    if *field == value {
        tracing::debug!("{name}: {value} [same]");
    } else {
        tracing::info!("{name}: {} -> {value}", *field);
        *field = value;
    }
}

fn first_difference(original: &[u8], rebuilt: &[u8]) -> Option<String> {
    if let Some(offset) = original.iter().zip(rebuilt).position(|(a, b)| a != b) {
        return Some(format!(
            "byte {offset:#x}: original {:#04x}, rebuilt {:#04x}",
            original[offset], rebuilt[offset]
        ));
    }
    (original.len() != rebuilt.len()).then(|| {
        format!("original is {} bytes, rebuilt is {} bytes", original.len(), rebuilt.len())
    })
}

fn check_position<W: Seek>(w: &mut W, section: &'static str, expected: u32) -> Result<()> {
    let actual = w.stream_position()?;
    if actual != u64::from(expected) {
        return Err(Error::WritePositionMismatch {
            section,
            expected: u64::from(expected),
            actual,
        });
    }
    Ok(())
}

/// Zero-fill up to `offset`; fails if the writer is already past it.
fn pad_to<W: Write + Seek>(w: &mut W, section: &'static str, offset: u32) -> Result<()> {
    let pos = w.stream_position()?;
    let target = u64::from(offset);
    if pos > target {
        return Err(Error::WritePositionMismatch {
            section,
            expected: target,
            actual: pos,
        });
    }
    w.write_all(&vec![0u8; (target - pos) as usize])?;
    Ok(())
}

fn write_metadata<W: Write>(w: &mut W, meta: &Metadata, endian: Endian) -> Result<()> {
    endian.write_u32(w, meta.sentence_num)?;
    endian.write_u32(w, meta.sentence_offset)?;
    endian.write_u32(w, meta.glyph_num)?;
    endian.write_u32(w, meta.glyph_offset)?;
    endian.write_u32(w, meta.texture_offset)?;
    match &meta.variant {
        VariantHeader::Ja(ja) => {
            endian.write_u32(w, ja.motion_offset)?;
            w.write_all(&ja.reserved)?;
            w.write_all(&ja.name)?;
            for &size in &ja.motion_sizes {
                endian.write_u32(w, size)?;
            }
        }
        VariantHeader::Us(us) => w.write_all(&us.reserved)?,
    }
    Ok(())
}

fn write_sentence<W: Write>(w: &mut W, sentence: &SentenceRecord, endian: Endian) -> Result<()> {
    match sentence {
        SentenceRecord::Flat(codes) => endian.write_i16_array(w, codes.as_slice()),
        SentenceRecord::Lines(lines) => {
            for line in lines {
                endian.write_i16_array(w, line.codes.as_slice())?;
                endian.write_i16_array(w, &line.ruby)?;
            }
            Ok(())
        }
    }
}

fn write_texture<W: Write>(w: &mut W, texture: &Texture, endian: Endian) -> Result<()> {
    endian.write_u16(w, texture.header.width_blocks)?;
    endian.write_u16(w, texture.header.height_blocks)?;
    endian.write_u32(w, texture.header.payload_len)?;
    w.write_all(&texture.header.reserved)?;
    w.write_all(&texture.payload)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::jmb::{GlyphRect, JaHeader, JmbKind, UsHeader, parse_jmb_bytes};

    fn us_file(glyphs: usize) -> JmbFile {
        JmbFile::assemble(
            VariantHeader::Us(UsHeader::default()),
            vec![SentenceRecord::empty_flat(); 2],
            vec![GlyphRect::new(0, 0, 8, 16); glyphs],
            Texture::new(b"DDS payload".to_vec(), 8, 16).unwrap(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_us_layout() {
        let file = us_file(3);
        assert_eq!(file.meta.glyph_offset, 32 + 2 * 256);
        assert_eq!(file.meta.glyph_num, 3);
        assert_eq!(file.meta.texture_offset, align_up(544 + 24));
        assert_eq!(file.to_bytes().unwrap().len(), 576 + 16 + 11);
    }

    #[test]
    fn test_recompute_is_fixed_point() {
        let mut file = us_file(5);
        file.glyphs.push(GlyphRect::new(1, 2, 3, 4));
        file.recompute_layout().unwrap();
        let first = file.meta.clone();
        file.recompute_layout().unwrap();
        assert_eq!(first, file.meta);
    }

    #[test]
    fn test_sentence_count_is_immutable() {
        let mut file = us_file(1);
        file.sentences.push(SentenceRecord::empty_flat());
        let err = file.recompute_layout().unwrap_err();
        assert!(matches!(err, Error::SentenceCountChanged { expected: 2, actual: 3 }));
    }

    #[test]
    fn test_stale_offsets_are_rejected_without_validation() {
        let mut file = us_file(1);
        file.glyphs.extend([GlyphRect::default(); 8]);
        assert!(matches!(
            file.to_bytes(),
            Err(Error::WritePositionMismatch { section: "glyphs", .. })
        ));
        assert!(file.serialize(true).is_ok());
    }

    #[test]
    fn test_ja_motion_round_trip() {
        let file = JmbFile::assemble(
            VariantHeader::Ja(JaHeader {
                endian: Endian::Big,
                ..JaHeader::default()
            }),
            vec![SentenceRecord::empty_lines(2)],
            vec![GlyphRect::new(0, 0, 4, 4)],
            Texture::new(b"DDS ....".to_vec(), 4, 4).unwrap(),
            Some(vec![vec![7u8; 40]]),
        )
        .unwrap();
        let bytes = file.to_bytes().unwrap();
        let motion_offset = file.meta.motion_offset().unwrap();
        assert_eq!(motion_offset % 32, 0);
        assert_eq!(bytes.len(), motion_offset as usize + 40);

        let parsed = parse_jmb_bytes(&bytes, JmbKind::Ja, Endian::Big).unwrap();
        assert_eq!(parsed, file);
    }

    #[test]
    fn test_first_difference() {
        assert_eq!(first_difference(b"abc", b"abc"), None);
        assert!(first_difference(b"abc", b"abd").unwrap().starts_with("byte 0x2"));
        assert!(first_difference(b"abc", b"ab").unwrap().contains("3 bytes"));
    }
}
