//! Per-file working context
//!
//! A [`JmbContext`] carries everything one editing session needs: the parsed
//! container, where it came from, its usage, and (once raw text is loaded)
//! the character registry the stored codes were built from. Operations take
//! the context by reference; nothing is shared between contexts.

use std::path::{Path, PathBuf};

use crate::atlas::{AtlasConfig, GlyphRasterizer, pack_atlas};
use crate::error::{Error, Result};
use crate::formats::jmb::{Endian, JmbFile, JmbKind, read_jmb};
use crate::text::{
    CharRegistry, EncodeMode, JmbUsage, LineDiff, Translation, correct_translation,
    diff_translations, flatten, load_translation,
};
use crate::texture::TextureCodec;

/// Summary of a translation rewrite
#[derive(Debug, Clone)]
pub struct TranslateResult {
    /// Lines that differ from the loaded raw text (all lines if none was loaded)
    pub changed_lines: Vec<LineDiff>,
    /// Number of glyphs in the new atlas
    pub glyph_count: usize,
    /// Pixel size of the new texture
    pub texture_size: (u32, u32),
}

/// A loaded container and its text state.
#[derive(Debug, Clone)]
pub struct JmbContext {
    pub path: PathBuf,
    pub file: JmbFile,
    pub usage: JmbUsage,
    /// Text the stored codes were encoded from, one entry per sentence
    pub raw_text: Option<Translation>,
    registry: Option<CharRegistry>,
}

impl JmbContext {
    /// Load `path`, inferring the layout from the path unless `kind` is given.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn open<P: AsRef<Path>>(path: P, kind: Option<JmbKind>, endian: Endian) -> Result<Self> {
        let path = path.as_ref();
        let kind = kind.unwrap_or_else(|| JmbKind::infer(path));
        let file = read_jmb(path, kind, endian)?;
        let usage = JmbUsage::from_path(path);
        tracing::info!(
            "Loaded {} ({} layout, {} usage, {} sentences, {} glyphs)",
            path.display(),
            kind.as_str(),
            usage,
            file.sentences.len(),
            file.glyphs.len()
        );
        Ok(Self::new(path, file, usage))
    }

    /// Wrap an already parsed container.
    #[must_use]
    pub fn new<P: Into<PathBuf>>(path: P, file: JmbFile, usage: JmbUsage) -> Self {
        Self {
            path: path.into(),
            file,
            usage,
            raw_text: None,
            registry: None,
        }
    }

    /// Load the raw text file the stored codes were built from.
    ///
    /// # Errors
    /// Returns an error if the file cannot be loaded or its text cannot be registered.
    pub fn load_raw_text<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let text = load_translation(path)?;
        self.set_raw_text(text)
    }

    /// Use `text` as the raw text and rebuild the registry from it.
    ///
    /// # Errors
    /// Returns an error if the text contains a malformed escape or too many characters.
    pub fn set_raw_text(&mut self, text: Translation) -> Result<()> {
        let registry = CharRegistry::register(&flatten(&text))?;
        tracing::debug!("Registered {} characters", registry.len());
        self.registry = Some(registry);
        self.raw_text = Some(text);
        Ok(())
    }

    /// Registry built from the raw text, if loaded.
    #[must_use]
    pub fn registry(&self) -> Option<&CharRegistry> {
        self.registry.as_ref()
    }

    fn require_registry(&self) -> Result<&CharRegistry> {
        self.registry
            .as_ref()
            .ok_or_else(|| Error::InvalidFormat("no raw text loaded".to_string()))
    }

    /// Decode every sentence with the registry.
    ///
    /// # Errors
    /// Returns an error if no raw text is loaded or a code is unregistered.
    pub fn decode_text(&self) -> Result<Translation> {
        self.file.decode_text(self.require_registry()?)
    }

    /// Check that the stored codes are exactly the encoding of the raw text.
    ///
    /// # Errors
    /// Returns an error if no raw text is loaded, or the first mismatch found.
    pub fn check_text(&mut self) -> Result<()> {
        let (Some(text), Some(registry)) = (&self.raw_text, &self.registry) else {
            return Err(Error::InvalidFormat("no raw text loaded".to_string()));
        };
        self.file.update_sentence_codes(text, registry, EncodeMode::ValidateOnly)
    }

    /// Compare an unmodified re-serialization against the source file.
    ///
    /// # Errors
    /// Returns [`Error::RoundTripMismatch`] on the first differing byte.
    pub fn verify_round_trip(&self) -> Result<()> {
        self.file.verify_round_trip(&self.path)
    }

    /// Rewrite the container for `translation`.
    ///
    /// The text is normalised for this context's usage, registered, rendered
    /// into a new atlas, and encoded into the sentence records. The container
    /// is only replaced once every step succeeds.
    ///
    /// # Errors
    /// Returns the first error from registration, packing, texture encoding,
    /// sentence encoding or layout recomputation.
    pub fn apply_translation<R, C>(
        &mut self,
        translation: &Translation,
        rasterizer: &R,
        codec: &C,
        config: &AtlasConfig,
    ) -> Result<TranslateResult>
    where
        R: GlyphRasterizer + ?Sized,
        C: TextureCodec + ?Sized,
    {
        let corrected = correct_translation(translation, self.usage);
        let changed_lines = diff_translations(self.raw_text.as_ref(), &corrected);
        for diff in &changed_lines {
            tracing::info!("{diff}");
        }

        let registry = CharRegistry::register(&flatten(&corrected))?;
        let atlas = pack_atlas(rasterizer, registry.unique_chars(), config)?;

        let mut file = self.file.clone();
        file.apply_atlas(&atlas, codec)?;
        file.update_sentence_codes(&corrected, &registry, EncodeMode::Commit)?;
        file.recompute_layout()?;

        let result = TranslateResult {
            changed_lines,
            glyph_count: file.glyphs.len(),
            texture_size: file.texture.pixel_size(),
        };
        self.file = file;
        self.registry = Some(registry);
        self.raw_text = Some(corrected);
        Ok(result)
    }

    /// Recompute the layout and write the container to `path`.
    ///
    /// # Errors
    /// Returns an error if the layout is inconsistent or the file cannot be written.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.file.write_to_file(path, true)?;
        tracing::info!("Wrote {}", path.display());
        Ok(())
    }
}
