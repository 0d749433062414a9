use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

use crate::context::JmbContext;
use crate::formats::jmb::{Endian, JmbKind};
use crate::text::JmbUsage;
use crate::texture::DdsFormat;

pub mod inspect;
pub mod texture;
pub mod translate;
pub mod validate;

/// Layout selection shared by every command
#[derive(Args, Debug, Clone, Copy)]
pub struct LayoutArgs {
    /// Container layout (inferred from the path when omitted)
    #[arg(long, value_enum)]
    pub kind: Option<JmbKind>,

    /// Read JA containers as big-endian
    #[arg(long)]
    pub big_endian: bool,
}

impl LayoutArgs {
    /// Byte order implied by the flags
    pub fn endian(&self) -> Endian {
        Endian::from_flag(self.big_endian)
    }

    /// Load `path` into a fresh context
    pub fn open(&self, path: &Path) -> anyhow::Result<JmbContext> {
        Ok(JmbContext::open(path, self.kind, self.endian())?)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show header fields and section sizes
    Info {
        /// JMB file
        file: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// List the glyph rectangle table
    Glyphs {
        /// JMB file
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Decode every sentence using the raw text's character registry
    Text {
        /// JMB file
        file: PathBuf,

        /// Raw text JSON the container was built from
        #[arg(long)]
        raw_text: PathBuf,

        /// Write the decoded text as JSON instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Check that files re-serialize byte-for-byte
    Validate {
        /// JMB files or directories to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Check stored codes against the raw text without modifying anything
    CheckText {
        /// JMB file
        file: PathBuf,

        /// Raw text JSON
        raw_text: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Write the embedded texture to a DDS file
    DumpTexture {
        /// JMB file
        file: PathBuf,

        /// Output DDS file
        output: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Replace the embedded texture with a DDS file
    ImportTexture {
        /// JMB file
        file: PathBuf,

        /// Replacement DDS file
        texture: PathBuf,

        /// Output JMB file
        output: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Crop every glyph out of the atlas into PNG files
    ExtractGlyphs {
        /// JMB file
        file: PathBuf,

        /// Output directory
        output: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Rebuild a container for a translation: new atlas, new codes
    Translate {
        /// JMB file
        file: PathBuf,

        /// Translation JSON (one array of lines per sentence)
        translation: PathBuf,

        /// Output JMB file
        output: PathBuf,

        #[command(flatten)]
        atlas: AtlasArgs,

        /// Usage (inferred from the file name when omitted)
        #[arg(long, value_enum)]
        usage: Option<JmbUsage>,

        /// Raw text JSON of the input, used to report changed lines
        #[arg(long)]
        raw_text: Option<PathBuf>,

        #[command(flatten)]
        layout: LayoutArgs,
    },
}

/// Atlas settings: a profile file and/or individual overrides
#[derive(Args, Debug, Clone)]
pub struct AtlasArgs {
    /// Font profile TOML
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Font file
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Glyph height in logical pixels
    #[arg(long)]
    pub glyph_height: Option<u32>,

    /// Render size in physical pixels
    #[arg(long)]
    pub font_size: Option<f32>,

    /// Physical pixels per logical pixel
    #[arg(long)]
    pub scale: Option<u32>,

    /// Logical row width
    #[arg(long)]
    pub max_width: Option<u32>,

    /// Block compression of the generated texture
    #[arg(long, value_enum, default_value = "bc3")]
    pub format: DdsFormat,
}

impl Commands {
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Info { file, layout } => inspect::info(file, layout),
            Commands::Glyphs { file, json, layout } => inspect::glyphs(file, *json, layout),
            Commands::Text {
                file,
                raw_text,
                output,
                layout,
            } => inspect::text(file, raw_text, output.as_deref(), layout),
            Commands::Validate {
                paths,
                quiet,
                layout,
            } => validate::round_trip(paths, !quiet, layout),
            Commands::CheckText {
                file,
                raw_text,
                layout,
            } => validate::check_text(file, raw_text, layout),
            Commands::DumpTexture {
                file,
                output,
                layout,
            } => texture::dump(file, output, layout),
            Commands::ImportTexture {
                file,
                texture,
                output,
                layout,
            } => texture::import(file, texture, output, layout),
            Commands::ExtractGlyphs {
                file,
                output,
                layout,
            } => texture::extract_glyphs(file, output, layout),
            Commands::Translate {
                file,
                translation,
                output,
                atlas,
                usage,
                raw_text,
                layout,
            } => translate::execute(
                file,
                translation,
                output,
                atlas,
                *usage,
                raw_text.as_deref(),
                layout,
            ),
        }
    }
}
