//! `.jmb` subtitle container format
//!
//! A JMB file bundles subtitle sentences (as arrays of control codes), the
//! glyph rectangles of a font atlas, and the atlas itself as a DDS texture.
//! Two layouts exist:
//!
//! - **JA** - sentences made of up to 16 lines with ruby annotation space,
//!   optional per-sentence motion blobs after the texture, selectable byte order.
//! - **US** - flat 128-code sentences, always little-endian.
//!
//! Section order: header, sentences, glyph rectangles, (32-byte aligned)
//! texture, (32-byte aligned, JA only) motion blobs.

mod io;
mod numeric;
mod reader;
mod texture;
mod types;
mod writer;

use std::path::Path;
use std::str::FromStr;

pub use io::{Endian, align_up};
pub use numeric::S16Be;
pub use reader::{parse_jmb_bytes, read_jmb};
pub use types::{
    CodeArray, GlyphRect, JaHeader, JmbFile, LineRecord, Metadata, SentenceRecord, Texture,
    TextureHeader, UsHeader, VariantHeader, extract_valid,
};

/// Section alignment in bytes
pub const ALIGNMENT: u32 = 32;

/// Code slots per JA line
pub const JA_LINE_CHAR_MAX: usize = 32;
/// Ruby annotations per JA line
pub const RUBY_MAX: usize = 10;
/// Codes per ruby annotation
pub const RUBY_DATA_MAX: usize = 16;
/// Lines per JA sentence
pub const JA_LINE_MAX: usize = 16;
/// Code slots per US sentence
pub const US_SENTENCE_CHAR_MAX: usize = 128;

/// Length of the name field in the JA header
pub const NAME_LENGTH: usize = 32;
/// Entries in the JA motion size table
pub const MOTION_TABLE_CAPACITY: usize = 32;

/// Logical atlas width in pixels
pub const TEXTURE_WIDTH: u32 = 512;

/// US header size (5 x u32 + 12 reserved bytes)
pub const US_HEADER_SIZE: u32 = 32;
/// JA header size (6 x u32 + 8 reserved + name + motion table)
pub const JA_HEADER_SIZE: u32 = 24 + 8 + NAME_LENGTH as u32 + 4 * MOTION_TABLE_CAPACITY as u32;
/// US sentence record size
pub const US_SENTENCE_SIZE: u32 = 2 * US_SENTENCE_CHAR_MAX as u32;
/// JA line record size (codes + ruby block)
pub const JA_LINE_SIZE: u32 = 2 * (JA_LINE_CHAR_MAX + RUBY_MAX * RUBY_DATA_MAX) as u32;
/// JA sentence record size
pub const JA_SENTENCE_SIZE: u32 = JA_LINE_SIZE * JA_LINE_MAX as u32;
/// Glyph rectangle record size (4 x u16)
pub const GLYPH_RECT_SIZE: u32 = 8;
/// Texture header size
pub const TEXTURE_HEADER_SIZE: u32 = 16;

/// Marker every texture payload starts with
pub const DDS_MAGIC: [u8; 4] = *b"DDS ";

/// Pad code filling slots after the terminator
pub const PAD: i16 = -1;
/// Terminator code
pub const TERMINATOR: i16 = -2;
/// ASCII space; sentence punctuation collapses onto it
pub const SPACE_CODE: i16 = -3;
/// Ideographic space
pub const IDEOGRAPHIC_SPACE_CODE: i16 = -4;

/// Category flag for the "kill" character
pub const KILL_FLAG: S16Be = S16Be::from_bits(0x8000);
/// Category flag for the "death" character
pub const DEATH_FLAG: S16Be = S16Be::from_bits(0x7000);

/// Container layout variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum JmbKind {
    /// Line-structured layout with motion section
    Ja,
    /// Flat layout
    Us,
}

impl JmbKind {
    /// Fixed header size, which is also the sentence offset.
    #[must_use]
    pub const fn header_size(self) -> u32 {
        match self {
            Self::Ja => JA_HEADER_SIZE,
            Self::Us => US_HEADER_SIZE,
        }
    }

    /// Size of one sentence record.
    #[must_use]
    pub const fn sentence_record_size(self) -> u32 {
        match self {
            Self::Ja => JA_SENTENCE_SIZE,
            Self::Us => US_SENTENCE_SIZE,
        }
    }

    /// Code slots available to one encoded unit (line for JA, sentence for US).
    #[must_use]
    pub const fn code_capacity(self) -> usize {
        match self {
            Self::Ja => JA_LINE_CHAR_MAX,
            Self::Us => US_SENTENCE_CHAR_MAX,
        }
    }

    /// Guess the variant from a file path.
    ///
    /// JA files carry a `J` in their stem; files under a `Movie` directory
    /// are JA unless the stem has an `E`.
    pub fn infer<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let under_movie = path.components().any(|c| c.as_os_str() == "Movie");
        if stem.contains('J') || (under_movie && !stem.contains('E')) {
            Self::Ja
        } else {
            Self::Us
        }
    }

    /// Short display name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ja => "JA",
            Self::Us => "US",
        }
    }
}

impl FromStr for JmbKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ja" | "jp" | "j" => Ok(Self::Ja),
            "us" | "en" | "e" => Ok(Self::Us),
            _ => Err(format!("Invalid kind '{s}'. Valid values: ja, us")),
        }
    }
}
