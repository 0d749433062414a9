#![allow(non_snake_case)]
//! # JmbForge
//!
//! A pure-Rust library for editing killer7 `.jmb` subtitle containers.
//!
//! ## What it does
//!
//! - **Containers** - Read, rebuild and byte-exactly rewrite both the JA
//!   (line-structured, optional motion blobs) and US (flat) layouts
//! - **Text** - Assign control codes to characters and encode/decode sentences
//! - **Atlas** - Render a character set with a TrueType font and pack it into
//!   a glyph atlas plus rectangle table
//! - **Textures** - Replace, dump and slice the embedded DDS atlas
//!
//! ## Quick Start
//!
//! ### Checking a round trip
//!
//! ```no_run
//! use jmbforge::formats::jmb::{Endian, JmbKind, read_jmb};
//!
//! let path = "CharaGeki/00010101/00010101J.jmb";
//! let jmb = read_jmb(path, JmbKind::infer(path), Endian::Little)?;
//! assert!(jmb.byte_identical_to(path)?);
//! # Ok::<(), jmbforge::Error>(())
//! ```
//!
//! ### Rewriting a subtitle file
//!
//! ```no_run
//! use jmbforge::prelude::*;
//!
//! let mut ctx = JmbContext::open("00010101J.jmb", None, Endian::Little)?;
//! ctx.load_raw_text("00010101J.json")?;
//!
//! let translation = load_translation("00010101J.en.json")?;
//! let profiles = FontProfiles::load("fonts.toml")?;
//! let config = profiles.get(ctx.usage).cloned().ok_or(Error::InvalidFormat("no profile".into()))?;
//! let font = FontRasterizer::open(&config.font_path)?;
//!
//! ctx.apply_translation(&translation, &font, &DdsCodec::default(), &config)?;
//! ctx.save("out/00010101J.jmb")?;
//! # Ok::<(), jmbforge::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `jmbforge` command-line binary

pub mod atlas;
pub mod context;
pub mod error;
pub mod formats;
pub mod text;
pub mod texture;

// Re-exports for convenience
pub use error::{Error, ErrorKind, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::formats::jmb::{
        Endian, GlyphRect, JmbFile, JmbKind, S16Be, SentenceRecord, parse_jmb_bytes, read_jmb,
    };

    pub use crate::text::{
        CharRegistry, EncodeMode, JmbUsage, Translation, correct_translation, decode_codes,
        diff_translations, encode_line, flatten, load_translation,
    };

    pub use crate::atlas::{
        Atlas, AtlasConfig, FontProfiles, FontRasterizer, GlyphBitmap, GlyphRasterizer, pack_atlas,
    };

    pub use crate::texture::{DdsCodec, DdsFormat, TextureCodec, dump_texture, extract_glyphs};

    pub use crate::context::{JmbContext, TranslateResult};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
