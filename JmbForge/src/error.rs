//! Error types for `JmbForge`

use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of [`Error`] variants.
///
/// Callers that only need to decide between "bad input" and "engine bug"
/// can match on this instead of on individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input: escapes, texture markers, dimensions, truncated files.
    Format,
    /// Internal layout or structure disagreement.
    StructuralMismatch,
    /// Text references a character absent from the registry.
    UnknownCharacter,
    /// Encoded content leaves no room for the terminator.
    CapacityExceeded,
    /// Round-trip or validate-only comparison failed.
    ValidationFailure,
    /// Rendered glyph height disagrees with the configured height.
    GlyphMetricsMismatch,
    /// Underlying file system error.
    Io,
}

/// The error type for `JmbForge` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory traversal error.
    #[error("directory walk error: {0}")]
    WalkDirError(String),

    // ==================== Format Errors ====================
    /// An `@xy` escape is truncated or uses non-alphanumeric characters.
    #[error("malformed escape at character {position} in {text:?}")]
    InvalidEscape {
        /// Character index of the `@`.
        position: usize,
        /// The text being scanned.
        text: String,
    },

    /// A hex literal could not be parsed as a 16-bit code.
    #[error("invalid hex code: {0:?}")]
    InvalidHex(String),

    /// The texture payload does not start with the DDS marker.
    #[error("invalid texture magic: expected \"DDS \", found {0:?}")]
    InvalidTextureMagic([u8; 4]),

    /// Texture width/height are not multiples of the 4-pixel block size.
    #[error("texture dimensions {width}x{height} must be multiples of 4")]
    TextureDimensionsNotAligned {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },

    /// The texture does not fit the header's 16-bit block counts or 32-bit length.
    #[error("texture {width}x{height} with a {payload_len} byte payload does not fit the texture header")]
    TextureTooLarge {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
        /// Payload length in bytes.
        payload_len: usize,
    },

    /// A section described by the header runs past the end of the data.
    #[error("{section} section ends at byte {end}, file is {file_len} bytes")]
    SectionOutOfBounds {
        /// Section name.
        section: &'static str,
        /// End offset implied by the header.
        end: u64,
        /// Length of the data being parsed.
        file_len: u64,
    },

    /// The stored sentence offset disagrees with the fixed header size.
    #[error("unexpected sentence offset {found} (header is {expected} bytes)")]
    UnexpectedSentenceOffset {
        /// Header size for the container variant.
        expected: u32,
        /// Value read from the file.
        found: u32,
    },

    /// The JA motion size table cannot hold this many sentences.
    #[error("{count} sentences exceed the motion table capacity of {capacity}")]
    TooManySentences {
        /// Sentence count read from the header.
        count: u32,
        /// Motion table capacity.
        capacity: usize,
    },

    /// A code array has no terminator.
    #[error("code array has no terminator")]
    MissingTerminator,

    /// A non-pad code follows the terminator.
    #[error("code {code} found at slot {slot} after the terminator")]
    CodeAfterTerminator {
        /// Slot index of the offending code.
        slot: usize,
        /// The offending code.
        code: i16,
    },

    /// A glyph bitmap is wider than a whole atlas row.
    #[error("glyph {ch:?} is {width}px wide, atlas rows are {max_width}px")]
    GlyphTooWide {
        /// The character.
        ch: char,
        /// Physical glyph width.
        width: u32,
        /// Physical row width.
        max_width: u32,
    },

    /// Texture codec failure (DDS parse/encode/decode).
    #[error("texture codec error: {0}")]
    TextureCodec(String),

    /// Font loading or rasterization failure.
    #[error("font error: {0}")]
    Font(String),

    /// Image encoding or decoding failure.
    #[error("image error: {0}")]
    Image(String),

    /// JSON parsing or serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML profile parsing error.
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Invalid format error (use specific variants when possible).
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    // ==================== Structural Errors ====================
    /// The number of sentences differs from the container's fixed count.
    #[error("sentence count changed: container has {expected}, got {actual}")]
    SentenceCountChanged {
        /// Count recorded in the metadata.
        expected: usize,
        /// Count supplied.
        actual: usize,
    },

    /// A JA sentence received a different number of lines than it holds.
    #[error("sentence {sentence}: expected {expected} lines, got {actual}")]
    LineCountMismatch {
        /// Sentence index.
        sentence: usize,
        /// Valid lines in the container.
        expected: usize,
        /// Lines supplied.
        actual: usize,
    },

    /// An encoded array does not match the record's fixed capacity.
    #[error("sentence {sentence}{}: code array is {actual} slots, record holds {expected}", fmt_line(.line))]
    CodeArrayLength {
        /// Sentence index.
        sentence: usize,
        /// Line index (JA only).
        line: Option<usize>,
        /// Record capacity.
        expected: usize,
        /// Encoded length.
        actual: usize,
    },

    /// The sentence record variant does not match the container variant.
    #[error("sentence {sentence} does not match the container layout")]
    SentenceLayoutMismatch {
        /// Sentence index.
        sentence: usize,
    },

    /// Writer position disagrees with the layout after a section.
    #[error("write position after {section} is {actual}, layout expects {expected}")]
    WritePositionMismatch {
        /// Section that was just written.
        section: &'static str,
        /// Offset from the metadata.
        expected: u64,
        /// Actual writer position.
        actual: u64,
    },

    /// Motion blobs are absent or disagree with the size table.
    #[error("motion section inconsistent: {0}")]
    MotionMismatch(String),

    // ==================== Encoding Errors ====================
    /// A character is not present in the registry.
    #[error("sentence {sentence}{}: character {ch:?} is not registered", fmt_line(.line))]
    UnknownCharacter {
        /// The character.
        ch: char,
        /// Sentence index.
        sentence: usize,
        /// Line index (JA only).
        line: Option<usize>,
    },

    /// Encoded content leaves no slot for the terminator.
    #[error("sentence {sentence}{}: {len} codes do not fit capacity {capacity}", fmt_line(.line))]
    CapacityExceeded {
        /// Sentence index.
        sentence: usize,
        /// Line index (JA only).
        line: Option<usize>,
        /// Encoded code count (without terminator).
        len: usize,
        /// Array capacity.
        capacity: usize,
    },

    /// A code has no registered character.
    #[error("code {0} is not registered")]
    UnknownCode(i16),

    /// The registry ran out of unflagged code space.
    #[error("registry holds {0} characters, no unflagged codes left")]
    RegistryFull(usize),

    // ==================== Validation Errors ====================
    /// Re-serialized bytes differ from the original file.
    #[error("round trip differs from {path}: {detail}")]
    RoundTripMismatch {
        /// Original file.
        path: PathBuf,
        /// First difference description.
        detail: String,
    },

    /// Stored valid length differs from the source text.
    #[error("sentence {sentence}{}: stored length {stored}, text has {expected} characters", fmt_line(.line))]
    ValidLengthMismatch {
        /// Sentence index.
        sentence: usize,
        /// Line index (JA only).
        line: Option<usize>,
        /// Character count of the source text.
        expected: usize,
        /// Valid length stored in the container.
        stored: usize,
    },

    /// A stored code differs from the freshly encoded one.
    #[error("sentence {sentence}{} slot {slot}: stored {stored}, encoded {encoded}", fmt_line(.line))]
    CodeMismatch {
        /// Sentence index.
        sentence: usize,
        /// Line index (JA only).
        line: Option<usize>,
        /// Slot index.
        slot: usize,
        /// Code stored in the container.
        stored: i16,
        /// Code computed from the text.
        encoded: i16,
    },

    // ==================== Atlas Errors ====================
    /// Rendered glyph height does not descale to the configured height.
    #[error(
        "glyph {ch:?}: {physical_height}px / {scale_factor} = {}, expected {expected}",
            .physical_height / .scale_factor
    )]
    GlyphMetricsMismatch {
        /// The character.
        ch: char,
        /// Physical bitmap height.
        physical_height: u32,
        /// Scale factor.
        scale_factor: u32,
        /// Configured original height.
        expected: u32,
    },
}

#[allow(clippy::ref_option)]
fn fmt_line(line: &Option<usize>) -> String {
    line.map(|l| format!(" line {l}")).unwrap_or_default()
}

impl Error {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_) | Self::WalkDirError(_) => ErrorKind::Io,
            Self::InvalidEscape { .. }
            | Self::InvalidHex(_)
            | Self::InvalidTextureMagic(_)
            | Self::TextureDimensionsNotAligned { .. }
            | Self::TextureTooLarge { .. }
            | Self::SectionOutOfBounds { .. }
            | Self::UnexpectedSentenceOffset { .. }
            | Self::TooManySentences { .. }
            | Self::MissingTerminator
            | Self::CodeAfterTerminator { .. }
            | Self::GlyphTooWide { .. }
            | Self::TextureCodec(_)
            | Self::Font(_)
            | Self::Image(_)
            | Self::JsonError(_)
            | Self::TomlError(_)
            | Self::InvalidFormat(_) => ErrorKind::Format,
            Self::SentenceCountChanged { .. }
            | Self::LineCountMismatch { .. }
            | Self::CodeArrayLength { .. }
            | Self::SentenceLayoutMismatch { .. }
            | Self::WritePositionMismatch { .. }
            | Self::MotionMismatch(_) => ErrorKind::StructuralMismatch,
            Self::UnknownCharacter { .. } | Self::UnknownCode(_) => ErrorKind::UnknownCharacter,
            Self::RegistryFull(_) => ErrorKind::CapacityExceeded,
            Self::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::RoundTripMismatch { .. }
            | Self::ValidLengthMismatch { .. }
            | Self::CodeMismatch { .. } => ErrorKind::ValidationFailure,
            Self::GlyphMetricsMismatch { .. } => ErrorKind::GlyphMetricsMismatch,
        }
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::WalkDirError(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

/// A specialized Result type for `JmbForge` operations.
pub type Result<T> = std::result::Result<T, Error>;
