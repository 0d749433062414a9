//! Glyph rasterization boundary and a `fontdue` implementation

use std::fs;
use std::path::Path;

use image::{Rgba, RgbaImage};

use crate::error::{Error, Result};

/// A rendered character: an alpha coverage map sized to the glyph cell.
///
/// The cell is `advance` wide and `ascent - descent` tall with the baseline
/// `ascent` pixels from the top.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphBitmap {
    pub width: u32,
    pub height: u32,
    pub ascent: f32,
    pub descent: f32,
    /// Row-major coverage, `width * height` bytes
    pub coverage: Vec<u8>,
}

impl GlyphBitmap {
    /// An empty (fully transparent) cell.
    #[must_use]
    pub fn blank(width: u32, height: u32, ascent: f32, descent: f32) -> Self {
        Self {
            width,
            height,
            ascent,
            descent,
            coverage: vec![0; (width * height) as usize],
        }
    }

    /// White glyph on a transparent background.
    #[must_use]
    pub fn to_rgba(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let alpha = self.coverage[(y * self.width + x) as usize];
            Rgba([255, 255, 255, alpha])
        })
    }
}

/// Renders single characters.
pub trait GlyphRasterizer {
    /// Render `ch` at `pixel_size`.
    ///
    /// # Errors
    /// Returns [`Error::Font`] if the character cannot be rendered.
    fn render(&self, ch: char, pixel_size: f32) -> Result<GlyphBitmap>;
}

/// TrueType/OpenType rasterizer backed by `fontdue`.
pub struct FontRasterizer {
    font: fontdue::Font,
}

impl FontRasterizer {
    /// Parse font bytes.
    ///
    /// # Errors
    /// Returns [`Error::Font`] if the data is not a usable font.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let font = fontdue::Font::from_bytes(data, fontdue::FontSettings::default())
            .map_err(|e| Error::Font(e.to_string()))?;
        Ok(Self { font })
    }

    /// Load a font file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        tracing::debug!("Loaded font {} ({} bytes)", path.display(), data.len());
        Self::from_bytes(&data)
    }
}

impl GlyphRasterizer for FontRasterizer {
    fn render(&self, ch: char, pixel_size: f32) -> Result<GlyphBitmap> {
        let line = self
            .font
            .horizontal_line_metrics(pixel_size)
            .ok_or_else(|| Error::Font("font has no horizontal metrics".to_string()))?;
        let (metrics, pixels) = self.font.rasterize(ch, pixel_size);

        let width = metrics.advance_width.max(0.0) as u32;
        let height = (line.ascent - line.descent).max(0.0) as u32;
        let baseline = line.ascent as i32;
        let mut bitmap = GlyphBitmap::blank(width, height, line.ascent, line.descent);

        // fontdue rows run top to bottom; ymin is the offset of the bottom row from the baseline
        let top = baseline - (metrics.ymin + metrics.height as i32);
        for row in 0..metrics.height {
            let y = top + row as i32;
            if y < 0 || y >= height as i32 {
                continue;
            }
            for col in 0..metrics.width {
                let x = metrics.xmin + col as i32;
                if x < 0 || x >= width as i32 {
                    continue;
                }
                let dst = (y as u32 * width + x as u32) as usize;
                bitmap.coverage[dst] = bitmap.coverage[dst].max(pixels[row * metrics.width + col]);
            }
        }
        Ok(bitmap)
    }
}
