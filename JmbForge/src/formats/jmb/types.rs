//! In-memory model of a JMB container

use super::io::Endian;
use super::{
    JA_LINE_CHAR_MAX, JA_LINE_MAX, JmbKind, MOTION_TABLE_CAPACITY, NAME_LENGTH, PAD,
    RUBY_DATA_MAX, RUBY_MAX, TERMINATOR, TEXTURE_HEADER_SIZE, US_SENTENCE_CHAR_MAX,
};
use crate::error::{Error, Result};

// ============================================================================
// Code arrays
// ============================================================================

/// Return the codes before the terminator.
///
/// # Errors
/// Returns [`Error::MissingTerminator`] if there is no terminator, or
/// [`Error::CodeAfterTerminator`] if anything but pad follows it.
pub fn extract_valid(codes: &[i16]) -> Result<&[i16]> {
    let end = codes
        .iter()
        .position(|&c| c == TERMINATOR)
        .ok_or(Error::MissingTerminator)?;
    if let Some((offset, &code)) = codes[end + 1..].iter().enumerate().find(|(_, c)| **c != PAD) {
        return Err(Error::CodeAfterTerminator {
            slot: end + 1 + offset,
            code,
        });
    }
    Ok(&codes[..end])
}

/// Fixed-capacity sequence of control codes.
///
/// Encoded arrays hold exactly one terminator followed only by pad codes.
/// Arrays read from disk are kept verbatim, so unused slots may be all pad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeArray {
    codes: Vec<i16>,
}

impl CodeArray {
    /// An empty, well-formed array: terminator then pad.
    #[must_use]
    pub fn empty(capacity: usize) -> Self {
        let mut codes = vec![PAD; capacity];
        if let Some(first) = codes.first_mut() {
            *first = TERMINATOR;
        }
        Self { codes }
    }

    /// Wrap raw codes as read from a file.
    #[must_use]
    pub fn from_raw(codes: Vec<i16>) -> Self {
        Self { codes }
    }

    /// Number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.codes.len()
    }

    /// All slots, including terminator and pad.
    #[must_use]
    pub fn as_slice(&self) -> &[i16] {
        &self.codes
    }

    /// Slot index of the terminator, which is also the valid length.
    #[must_use]
    pub fn valid_len(&self) -> Option<usize> {
        self.codes.iter().position(|&c| c == TERMINATOR)
    }

    /// Whether the array holds a terminator.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid_len().is_some()
    }

    /// Codes before the terminator; see [`extract_valid`].
    pub fn valid_codes(&self) -> Result<&[i16]> {
        extract_valid(&self.codes)
    }

    /// Replace every slot. The caller guarantees `codes.len() == capacity()`.
    pub(crate) fn overwrite(&mut self, codes: Vec<i16>) {
        debug_assert_eq!(codes.len(), self.codes.len());
        self.codes = codes;
    }
}

// ============================================================================
// Sentences
// ============================================================================

/// One JA subtitle line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    /// Character codes (32 slots)
    pub codes: CodeArray,
    /// Ruby annotation block (10 x 16 codes), carried verbatim
    pub ruby: Vec<i16>,
}

impl LineRecord {
    /// An empty line with a cleared ruby block.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            codes: CodeArray::empty(JA_LINE_CHAR_MAX),
            ruby: vec![PAD; RUBY_MAX * RUBY_DATA_MAX],
        }
    }

    /// A line that is not shown: every slot is pad.
    #[must_use]
    pub fn unused() -> Self {
        Self {
            codes: CodeArray::from_raw(vec![PAD; JA_LINE_CHAR_MAX]),
            ruby: vec![PAD; RUBY_MAX * RUBY_DATA_MAX],
        }
    }
}

/// One sentence record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentenceRecord {
    /// US: a single 128-slot array
    Flat(CodeArray),
    /// JA: 16 lines
    Lines(Vec<LineRecord>),
}

impl SentenceRecord {
    /// Empty US sentence.
    #[must_use]
    pub fn empty_flat() -> Self {
        Self::Flat(CodeArray::empty(US_SENTENCE_CHAR_MAX))
    }

    /// JA sentence whose first `visible` lines are empty-but-valid.
    #[must_use]
    pub fn empty_lines(visible: usize) -> Self {
        let lines = (0..JA_LINE_MAX)
            .map(|i| if i < visible { LineRecord::empty() } else { LineRecord::unused() })
            .collect();
        Self::Lines(lines)
    }

    /// Layout this record belongs to.
    #[must_use]
    pub fn kind(&self) -> JmbKind {
        match self {
            Self::Flat(_) => JmbKind::Us,
            Self::Lines(_) => JmbKind::Ja,
        }
    }

    /// Number of leading lines that hold a terminator (1 for US).
    #[must_use]
    pub fn valid_line_count(&self) -> usize {
        match self {
            Self::Flat(codes) => usize::from(codes.is_valid()),
            Self::Lines(lines) => lines.iter().take_while(|l| l.codes.is_valid()).count(),
        }
    }

    /// Code arrays in display order.
    #[must_use]
    pub fn code_arrays(&self) -> Vec<&CodeArray> {
        match self {
            Self::Flat(codes) => vec![codes],
            Self::Lines(lines) => lines.iter().map(|l| &l.codes).collect(),
        }
    }
}

// ============================================================================
// Glyphs and texture
// ============================================================================

/// Placement of one glyph in the atlas, in logical (unscaled) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct GlyphRect {
    pub u: u16,
    pub v: u16,
    pub w: u16,
    pub h: u16,
}

impl GlyphRect {
    #[must_use]
    pub const fn new(u: u16, v: u16, w: u16, h: u16) -> Self {
        Self { u, v, w, h }
    }

    /// Right edge (`u + w`).
    #[must_use]
    pub fn right(&self) -> u32 {
        u32::from(self.u) + u32::from(self.w)
    }

    /// Bottom edge (`v + h`).
    #[must_use]
    pub fn bottom(&self) -> u32 {
        u32::from(self.v) + u32::from(self.h)
    }
}

/// Texture section header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureHeader {
    /// Width in 4-pixel blocks
    pub width_blocks: u16,
    /// Height in 4-pixel blocks
    pub height_blocks: u16,
    /// Payload length in bytes
    pub payload_len: u32,
    /// Unknown trailing bytes
    pub reserved: [u8; 8],
}

/// Compressed atlas texture.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Texture {
    pub header: TextureHeader,
    /// DDS file bytes
    pub payload: Vec<u8>,
}

impl TextureHeader {
    /// Header for a payload of `payload_len` bytes showing a `width`x`height` image.
    ///
    /// # Errors
    /// Returns [`Error::TextureTooLarge`] if the block counts overflow 16 bits
    /// or the length overflows 32 bits.
    pub fn for_payload(payload_len: usize, width: u32, height: u32) -> Result<Self> {
        let too_large = || Error::TextureTooLarge {
            width,
            height,
            payload_len,
        };
        Ok(Self {
            width_blocks: u16::try_from(width / 4).map_err(|_| too_large())?,
            height_blocks: u16::try_from(height / 4).map_err(|_| too_large())?,
            payload_len: u32::try_from(payload_len).map_err(|_| too_large())?,
            reserved: [0; 8],
        })
    }
}

impl Texture {
    /// Build from a DDS payload and its pixel size.
    ///
    /// # Errors
    /// Returns [`Error::TextureTooLarge`] if the size does not fit the header.
    pub fn new(payload: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        Ok(Self {
            header: TextureHeader::for_payload(payload.len(), width, height)?,
            payload,
        })
    }

    /// Header plus payload.
    #[must_use]
    pub fn section_size(&self) -> u32 {
        TEXTURE_HEADER_SIZE + self.payload.len() as u32
    }

    /// Pixel dimensions recorded in the header.
    #[must_use]
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            u32::from(self.header.width_blocks) * 4,
            u32::from(self.header.height_blocks) * 4,
        )
    }
}

// ============================================================================
// Metadata
// ============================================================================

/// JA-only header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JaHeader {
    /// Start of the motion section (end of the texture when there is none)
    pub motion_offset: u32,
    /// Byte order the file was read with
    pub endian: Endian,
    /// Unknown bytes after the offsets
    pub reserved: [u8; 8],
    /// Null-padded name field
    pub name: [u8; NAME_LENGTH],
    /// Motion blob sizes, one per sentence; the remainder is carried verbatim
    pub motion_sizes: [u32; MOTION_TABLE_CAPACITY],
}

impl Default for JaHeader {
    fn default() -> Self {
        Self {
            motion_offset: 0,
            endian: Endian::Little,
            reserved: [0; 8],
            name: [0; NAME_LENGTH],
            motion_sizes: [0; MOTION_TABLE_CAPACITY],
        }
    }
}

/// US-only header fields.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UsHeader {
    /// Unknown trailing bytes
    pub reserved: [u8; 12],
}

/// Header fields that exist in only one layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantHeader {
    Ja(JaHeader),
    Us(UsHeader),
}

/// Section offsets and counts.
///
/// Offsets and counts are derived from content by
/// [`JmbFile::recompute_layout`]; only `sentence_offset` is fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub sentence_num: u32,
    pub sentence_offset: u32,
    pub glyph_num: u32,
    pub glyph_offset: u32,
    pub texture_offset: u32,
    pub variant: VariantHeader,
}

impl Metadata {
    /// Layout variant.
    #[must_use]
    pub fn kind(&self) -> JmbKind {
        match self.variant {
            VariantHeader::Ja(_) => JmbKind::Ja,
            VariantHeader::Us(_) => JmbKind::Us,
        }
    }

    /// Byte order of the file (always little for US).
    #[must_use]
    pub fn endian(&self) -> Endian {
        match &self.variant {
            VariantHeader::Ja(ja) => ja.endian,
            VariantHeader::Us(_) => Endian::Little,
        }
    }

    /// JA motion offset.
    #[must_use]
    pub fn motion_offset(&self) -> Option<u32> {
        match &self.variant {
            VariantHeader::Ja(ja) => Some(ja.motion_offset),
            VariantHeader::Us(_) => None,
        }
    }

    /// JA motion sizes for the sentences in use.
    #[must_use]
    pub fn motion_sizes(&self) -> Option<&[u32]> {
        match &self.variant {
            VariantHeader::Ja(ja) => {
                let count = (self.sentence_num as usize).min(MOTION_TABLE_CAPACITY);
                Some(&ja.motion_sizes[..count])
            }
            VariantHeader::Us(_) => None,
        }
    }

    /// Name field up to its first NUL (JA only).
    #[must_use]
    pub fn name(&self) -> Option<String> {
        match &self.variant {
            VariantHeader::Ja(ja) => {
                let end = ja.name.iter().position(|&b| b == 0).unwrap_or(NAME_LENGTH);
                Some(String::from_utf8_lossy(&ja.name[..end]).into_owned())
            }
            VariantHeader::Us(_) => None,
        }
    }
}

// ============================================================================
// Container
// ============================================================================

/// A parsed or assembled JMB container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JmbFile {
    pub meta: Metadata,
    pub sentences: Vec<SentenceRecord>,
    pub glyphs: Vec<GlyphRect>,
    pub texture: Texture,
    /// JA motion blobs; `None` when the file ends with the texture
    pub motions: Option<Vec<Vec<u8>>>,
}

impl JmbFile {
    /// Assemble a container in memory and derive its layout.
    ///
    /// # Errors
    /// Returns an error if the sentence records do not match the header
    /// variant or the motion blobs disagree with the sentence count.
    pub fn assemble(
        variant: VariantHeader,
        sentences: Vec<SentenceRecord>,
        glyphs: Vec<GlyphRect>,
        texture: Texture,
        motions: Option<Vec<Vec<u8>>>,
    ) -> Result<Self> {
        let kind = match variant {
            VariantHeader::Ja(_) => JmbKind::Ja,
            VariantHeader::Us(_) => JmbKind::Us,
        };
        let mut variant = variant;
        if let (VariantHeader::Ja(ja), Some(blobs)) = (&mut variant, &motions) {
            if blobs.len() > MOTION_TABLE_CAPACITY {
                return Err(Error::TooManySentences {
                    count: blobs.len() as u32,
                    capacity: MOTION_TABLE_CAPACITY,
                });
            }
            for (slot, blob) in ja.motion_sizes.iter_mut().zip(blobs) {
                *slot = blob.len() as u32;
            }
        }
        let mut file = Self {
            meta: Metadata {
                sentence_num: sentences.len() as u32,
                sentence_offset: kind.header_size(),
                glyph_num: glyphs.len() as u32,
                glyph_offset: 0,
                texture_offset: 0,
                variant,
            },
            sentences,
            glyphs,
            texture,
            motions,
        };
        file.recompute_layout()?;
        Ok(file)
    }

    /// Layout variant.
    #[must_use]
    pub fn kind(&self) -> JmbKind {
        self.meta.kind()
    }

    /// Check that every section is present and consistent with the header variant.
    ///
    /// # Errors
    /// Returns a structural error describing the first inconsistency.
    pub fn ready_to_write(&self) -> Result<()> {
        let kind = self.kind();
        if let Some(sentence) = self.sentences.iter().position(|s| s.kind() != kind) {
            return Err(Error::SentenceLayoutMismatch { sentence });
        }
        // the motion table has one slot per sentence even when no blobs follow
        if kind == JmbKind::Ja && self.sentences.len() > MOTION_TABLE_CAPACITY {
            return Err(Error::TooManySentences {
                count: u32::try_from(self.sentences.len()).unwrap_or(u32::MAX),
                capacity: MOTION_TABLE_CAPACITY,
            });
        }
        match (kind, &self.motions) {
            (JmbKind::Us, Some(_)) => {
                return Err(Error::MotionMismatch("US containers have no motion section".into()));
            }
            (JmbKind::Ja, Some(blobs)) => {
                if blobs.len() != self.sentences.len() {
                    return Err(Error::MotionMismatch(format!(
                        "{} blobs for {} sentences",
                        blobs.len(),
                        self.sentences.len()
                    )));
                }
                let sizes = self.meta.motion_sizes().unwrap_or_default();
                if let Some(i) = blobs.iter().zip(sizes).position(|(b, &s)| b.len() != s as usize) {
                    return Err(Error::MotionMismatch(format!(
                        "blob {i} is {} bytes, table says {}",
                        blobs[i].len(),
                        sizes[i]
                    )));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_valid() {
        assert_eq!(extract_valid(&[3, 4, -2, -1, -1]).unwrap(), &[3, 4]);
        assert_eq!(extract_valid(&[-2]).unwrap(), &[] as &[i16]);
        assert!(matches!(extract_valid(&[1, 2, -1]), Err(Error::MissingTerminator)));
        assert!(matches!(
            extract_valid(&[1, -2, -1, 7]),
            Err(Error::CodeAfterTerminator { slot: 3, code: 7 })
        ));
    }

    #[test]
    fn test_valid_line_count() {
        let sentence = SentenceRecord::empty_lines(3);
        assert_eq!(sentence.valid_line_count(), 3);
        assert_eq!(SentenceRecord::empty_flat().valid_line_count(), 1);
    }

    #[test]
    fn test_texture_header_must_fit() {
        let header = TextureHeader::for_payload(64, 512, 256).unwrap();
        assert_eq!((header.width_blocks, header.height_blocks, header.payload_len), (128, 64, 64));

        let err = Texture::new(b"DDS ".to_vec(), 262_144, 4).unwrap_err();
        assert!(matches!(
            err,
            Error::TextureTooLarge { width: 262_144, height: 4, payload_len: 4 }
        ));
    }

    fn ja_records(count: usize) -> Vec<SentenceRecord> {
        vec![SentenceRecord::empty_lines(1); count]
    }

    #[test]
    fn test_ja_sentence_cap_without_motions() {
        let texture = Texture::new(b"DDS ".to_vec(), 4, 4).unwrap();
        let fits = JmbFile::assemble(
            VariantHeader::Ja(JaHeader::default()),
            ja_records(MOTION_TABLE_CAPACITY),
            Vec::new(),
            texture.clone(),
            None,
        )
        .unwrap();
        fits.ready_to_write().unwrap();

        let err = JmbFile::assemble(
            VariantHeader::Ja(JaHeader::default()),
            ja_records(MOTION_TABLE_CAPACITY + 1),
            Vec::new(),
            texture,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::TooManySentences { count: 33, capacity: 32 }));

        let mut grown = fits;
        grown.sentences.push(SentenceRecord::empty_lines(1));
        grown.meta.sentence_num += 1;
        assert!(matches!(grown.serialize(true), Err(Error::TooManySentences { .. })));
        assert!(matches!(grown.to_bytes(), Err(Error::TooManySentences { .. })));
    }

    #[test]
    fn test_code_array_empty() {
        let arr = CodeArray::empty(4);
        assert_eq!(arr.as_slice(), &[-2, -1, -1, -1]);
        assert_eq!(arr.valid_len(), Some(0));
        assert!(!CodeArray::from_raw(vec![-1; 4]).is_valid());
    }
}
