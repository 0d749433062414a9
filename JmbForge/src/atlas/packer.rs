//! Row-based glyph atlas packing
//!
//! Glyphs are rendered at `scale_factor` times their stored size and placed
//! left to right in rows of one glyph height. Every horizontal advance is
//! rounded up to a multiple of the scale factor so placements stay on the
//! logical pixel grid once the atlas is downscaled.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use super::config::AtlasConfig;
use super::rasterizer::GlyphRasterizer;
use crate::error::{Error, Result};
use crate::formats::jmb::{GlyphRect, JmbFile};
use crate::texture::TextureCodec;

/// Glyphs provisioned per row when sizing the initial canvas
const GLYPHS_PER_ROW_ESTIMATE: usize = 8;

/// A packed atlas at physical resolution.
#[derive(Debug, Clone)]
pub struct Atlas {
    /// Physical-resolution canvas, cropped to content
    pub canvas: RgbaImage,
    /// One rectangle per character, in logical pixels
    pub rects: Vec<GlyphRect>,
    pub scale_factor: u32,
}

impl Atlas {
    /// Downscale to logical resolution and pad each side to a multiple of 4.
    #[must_use]
    pub fn to_texture_image(&self) -> RgbaImage {
        let scale = self.scale_factor.max(1);
        let width = (self.canvas.width() / scale).max(1);
        let height = (self.canvas.height() / scale).max(1);
        let logical = if scale == 1 {
            self.canvas.clone()
        } else {
            imageops::resize(&self.canvas, width, height, FilterType::Triangle)
        };

        let mut padded = RgbaImage::new(width.next_multiple_of(4), height.next_multiple_of(4));
        imageops::replace(&mut padded, &logical, 0, 0);
        padded
    }

    /// Encode the logical atlas with `codec`.
    ///
    /// # Errors
    /// Returns the codec's error.
    pub fn encode<C: TextureCodec + ?Sized>(&self, codec: &C) -> Result<Vec<u8>> {
        codec.encode(&self.to_texture_image())
    }
}

/// Round `x` up to a multiple of `scale`.
fn snap(x: u32, scale: u32) -> u32 {
    x.next_multiple_of(scale)
}

/// Render and pack `chars` in order.
///
/// # Errors
/// Returns [`Error::GlyphMetricsMismatch`] as soon as a rendered glyph does
/// not descale to the configured height, [`Error::GlyphTooWide`] for a glyph
/// that cannot fit any row, [`Error::Font`] for a bitmap whose coverage does
/// not match its size, or the rasterizer's error.
pub fn pack_atlas<R: GlyphRasterizer + ?Sized>(
    rasterizer: &R,
    chars: &str,
    config: &AtlasConfig,
) -> Result<Atlas> {
    config.validate()?;
    let scale = config.scale_factor;
    let row_height = config.physical_height();
    let max_width = config.physical_max_width();

    let count = chars.chars().count();
    let rows = count.div_ceil(GLYPHS_PER_ROW_ESTIMATE) + 1;
    let mut canvas = RgbaImage::new(max_width, row_height * rows as u32);

    let (mut x, mut y) = (0u32, 0u32);
    let mut extent = 0u32;
    let mut rects = Vec::with_capacity(count);

    for ch in chars.chars() {
        let glyph = rasterizer.render(ch, config.font_size)?;
        if glyph.height / scale != config.glyph_height {
            return Err(Error::GlyphMetricsMismatch {
                ch,
                physical_height: glyph.height,
                scale_factor: scale,
                expected: config.glyph_height,
            });
        }
        let pixels = u64::from(glyph.width) * u64::from(glyph.height);
        if glyph.coverage.len() as u64 != pixels {
            return Err(Error::Font(format!(
                "glyph {ch:?} has {} coverage values for a {}x{} bitmap",
                glyph.coverage.len(),
                glyph.width,
                glyph.height
            )));
        }
        if glyph.width >= max_width {
            return Err(Error::GlyphTooWide {
                ch,
                width: glyph.width,
                max_width,
            });
        }

        if x + glyph.width >= max_width {
            x = 0;
            y += row_height;
        }
        if y + row_height > canvas.height() {
            canvas = grow(&canvas, y + row_height);
        }

        imageops::overlay(&mut canvas, &glyph.to_rgba(), i64::from(x), i64::from(y));
        rects.push(GlyphRect::new(
            (x / scale) as u16,
            (y / scale) as u16,
            (glyph.width / scale) as u16,
            (glyph.height / scale) as u16,
        ));

        x = snap(x + glyph.width, scale);
        extent = extent.max(x);
    }

    let width = snap(extent, scale).max(scale);
    let height = y + row_height;
    let canvas = imageops::crop_imm(&canvas, 0, 0, width, height).to_image();
    tracing::info!(
        "Packed {} glyphs into {}x{} ({}x{} logical)",
        rects.len(),
        width,
        height,
        width / scale,
        height / scale
    );

    Ok(Atlas {
        canvas,
        rects,
        scale_factor: scale,
    })
}

fn grow(canvas: &RgbaImage, height: u32) -> RgbaImage {
    let mut larger = RgbaImage::new(canvas.width(), height.max(canvas.height() * 2));
    imageops::replace(&mut larger, canvas, 0, 0);
    larger
}

impl JmbFile {
    /// Install a packed atlas: encode its texture, replace the texture
    /// payload and take over its glyph table.
    ///
    /// # Errors
    /// Returns an error if encoding or texture replacement fails.
    pub fn apply_atlas<C: TextureCodec + ?Sized>(&mut self, atlas: &Atlas, codec: &C) -> Result<()> {
        let payload = atlas.encode(codec)?;
        self.replace_texture(payload, codec)?;
        tracing::info!("glyph table: {} -> {} entries", self.glyphs.len(), atlas.rects.len());
        self.glyphs.clone_from(&atlas.rects);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::GlyphBitmap;
    use std::path::PathBuf;

    /// Every glyph is a solid box; 'W' is wide, 'x' is mis-sized.
    struct BoxRasterizer;

    impl GlyphRasterizer for BoxRasterizer {
        fn render(&self, ch: char, _pixel_size: f32) -> Result<GlyphBitmap> {
            let (w, h) = match ch {
                'W' => (30, 8),
                'x' => (6, 12),
                _ => (6, 8),
            };
            let mut bitmap = GlyphBitmap::blank(w, h, 6.0, -2.0);
            bitmap.coverage.fill(255);
            Ok(bitmap)
        }
    }

    fn config(max_width: u32) -> AtlasConfig {
        AtlasConfig {
            font_path: PathBuf::new(),
            glyph_height: 4,
            font_size: 8.0,
            scale_factor: 2,
            max_width,
        }
    }

    #[test]
    fn test_rows_and_snapping() {
        // 20 physical pixels per row; the fourth glyph would end at 24
        let atlas = pack_atlas(&BoxRasterizer, "abcd", &config(10)).unwrap();
        assert_eq!(
            atlas.rects,
            vec![
                GlyphRect::new(0, 0, 3, 4),
                GlyphRect::new(3, 0, 3, 4),
                GlyphRect::new(6, 0, 3, 4),
                GlyphRect::new(0, 4, 3, 4),
            ]
        );
        assert_eq!(atlas.canvas.dimensions(), (18, 16));
        for rect in &atlas.rects {
            assert!(rect.right() <= 10);
        }
    }

    #[test]
    fn test_short_coverage_is_rejected() {
        struct Truncated;
        impl GlyphRasterizer for Truncated {
            fn render(&self, _ch: char, _pixel_size: f32) -> Result<GlyphBitmap> {
                let mut bitmap = GlyphBitmap::blank(6, 8, 6.0, -2.0);
                bitmap.coverage.truncate(40);
                Ok(bitmap)
            }
        }
        let err = pack_atlas(&Truncated, "a", &config(64)).unwrap_err();
        assert!(matches!(&err, Error::Font(msg) if msg.contains("40 coverage values")));
        assert_eq!(err.kind(), crate::error::ErrorKind::Format);
    }

    #[test]
    fn test_odd_width_snaps_to_scale() {
        struct Odd;
        impl GlyphRasterizer for Odd {
            fn render(&self, _ch: char, _pixel_size: f32) -> Result<GlyphBitmap> {
                Ok(GlyphBitmap::blank(5, 8, 6.0, -2.0))
            }
        }
        let atlas = pack_atlas(&Odd, "ab", &config(64)).unwrap();
        assert_eq!(atlas.rects[1].u, 3);
        assert_eq!(atlas.rects[0].w, 2);
    }

    #[test]
    fn test_height_mismatch_names_character() {
        let err = pack_atlas(&BoxRasterizer, "abx", &config(64)).unwrap_err();
        assert!(matches!(
            err,
            Error::GlyphMetricsMismatch { ch: 'x', physical_height: 12, scale_factor: 2, expected: 4 }
        ));
    }

    #[test]
    fn test_glyph_wider_than_row() {
        let err = pack_atlas(&BoxRasterizer, "W", &config(10)).unwrap_err();
        assert!(matches!(err, Error::GlyphTooWide { ch: 'W', .. }));
    }

    #[test]
    fn test_canvas_grows_past_estimate() {
        let chars: String = std::iter::repeat_n('a', 40).collect();
        let atlas = pack_atlas(&BoxRasterizer, &chars, &config(4)).unwrap();
        assert_eq!(atlas.rects.len(), 40);
        assert_eq!(atlas.rects[39].v, 39 * 4);
        assert_eq!(atlas.canvas.height(), 40 * 8);
    }

    #[test]
    fn test_texture_image_is_block_aligned() {
        let atlas = pack_atlas(&BoxRasterizer, "abc", &config(64)).unwrap();
        let img = atlas.to_texture_image();
        assert_eq!(img.width() % 4, 0);
        assert_eq!(img.height() % 4, 0);
        assert_eq!(img.dimensions(), (12, 4));
    }
}
