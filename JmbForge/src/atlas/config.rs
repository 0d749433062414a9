//! Atlas generation settings and font profiles
//!
//! A font profile is a TOML file with one table per usage:
//!
//! ```toml
//! [default]
//! font_path = "fonts/NotoSansCJK.otf"
//! glyph_height = 24
//! font_size = 80.0
//! scale_factor = 4
//!
//! [name]
//! font_path = "fonts/NotoSansCJK.otf"
//! glyph_height = 20
//! font_size = 66.0
//! scale_factor = 4
//! ```
//!
//! Usages without a table fall back to `default`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::formats::jmb::TEXTURE_WIDTH;
use crate::text::JmbUsage;

fn default_max_width() -> u32 {
    TEXTURE_WIDTH
}

/// Parameters for packing one atlas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtlasConfig {
    /// TrueType/OpenType font file
    pub font_path: PathBuf,
    /// Glyph height in logical pixels, as stored in the glyph table
    pub glyph_height: u32,
    /// Render size in physical pixels
    pub font_size: f32,
    /// Physical pixels per logical pixel
    pub scale_factor: u32,
    /// Logical row width
    #[serde(default = "default_max_width")]
    pub max_width: u32,
}

impl AtlasConfig {
    /// Physical height of one atlas row.
    #[must_use]
    pub fn physical_height(&self) -> u32 {
        self.glyph_height * self.scale_factor
    }

    /// Physical row width.
    #[must_use]
    pub fn physical_max_width(&self) -> u32 {
        self.max_width * self.scale_factor
    }

    /// Reject settings the packer cannot work with.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.scale_factor == 0 {
            return Err(Error::InvalidFormat("scale_factor must be at least 1".into()));
        }
        if self.glyph_height == 0 {
            return Err(Error::InvalidFormat("glyph_height must be at least 1".into()));
        }
        if self.max_width == 0 {
            return Err(Error::InvalidFormat("max_width must be at least 1".into()));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(Error::InvalidFormat(format!(
                "font_size must be positive, got {}",
                self.font_size
            )));
        }
        Ok(())
    }
}

/// Atlas settings keyed by usage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontProfiles {
    profiles: HashMap<JmbUsage, AtlasConfig>,
}

impl FontProfiles {
    /// Load a profile file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse profile TOML.
    ///
    /// # Errors
    /// Returns [`Error::TomlError`] on malformed input, or
    /// [`Error::InvalidFormat`] for a table that names no known usage.
    pub fn parse(content: &str) -> Result<Self> {
        let tables: HashMap<String, AtlasConfig> = toml::from_str(content)?;
        let profiles = tables
            .into_iter()
            .map(|(key, config)| {
                let usage = key.parse::<JmbUsage>().map_err(Error::InvalidFormat)?;
                Ok((usage, config))
            })
            .collect::<Result<_>>()?;
        Ok(Self { profiles })
    }

    /// Settings for `usage`, falling back to `default`.
    #[must_use]
    pub fn get(&self, usage: JmbUsage) -> Option<&AtlasConfig> {
        self.profiles
            .get(&usage)
            .or_else(|| self.profiles.get(&JmbUsage::Default))
    }

    pub fn insert(&mut self, usage: JmbUsage, config: AtlasConfig) {
        self.profiles.insert(usage, config);
    }
}
