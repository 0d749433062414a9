//! Texture codec boundary
//!
//! The container stores its glyph atlas as a complete DDS file. The engine
//! itself only needs the pixel dimensions of a payload and a way to encode
//! a packed atlas; [`TextureCodec`] is that seam and [`DdsCodec`] the
//! concrete implementation.
//!
//! SPDX-FileCopyrightText: 2025 `CyberDeco`
//!
//! SPDX-License-Identifier: MIT

#![allow(clippy::cast_possible_truncation)]

mod decode;
mod encode;

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use ddsfile::Dds;
use image::{ImageBuffer, RgbaImage};

use crate::error::{Error, Result};
use crate::formats::jmb::JmbFile;

pub use encode::DdsFormat;

/// Reads and produces compressed texture payloads.
pub trait TextureCodec {
    /// Pixel dimensions of an encoded payload.
    ///
    /// # Errors
    /// Returns an error if the payload cannot be parsed.
    fn dimensions(&self, blob: &[u8]) -> Result<(u32, u32)>;

    /// Encode an RGBA image.
    ///
    /// # Errors
    /// Returns an error if the image cannot be encoded.
    fn encode(&self, image: &RgbaImage) -> Result<Vec<u8>>;
}

/// DDS codec with a fixed block compression for encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct DdsCodec {
    pub format: DdsFormat,
}

impl DdsCodec {
    #[must_use]
    pub fn new(format: DdsFormat) -> Self {
        Self { format }
    }

    /// Decode a DDS payload to RGBA.
    ///
    /// # Errors
    /// Returns [`Error::TextureCodec`] if the payload is not a supported DDS.
    pub fn decode(&self, blob: &[u8]) -> Result<RgbaImage> {
        let dds = parse_dds(blob)?;
        let rgba = decode::decode_dds_to_rgba(&dds)?;
        ImageBuffer::from_raw(dds.get_width(), dds.get_height(), rgba)
            .ok_or_else(|| Error::TextureCodec("Decoded pixels do not fill the image".to_string()))
    }
}

impl TextureCodec for DdsCodec {
    fn dimensions(&self, blob: &[u8]) -> Result<(u32, u32)> {
        let dds = parse_dds(blob)?;
        Ok((dds.get_width(), dds.get_height()))
    }

    fn encode(&self, image: &RgbaImage) -> Result<Vec<u8>> {
        encode::encode_to_dds(image.as_raw(), image.width(), image.height(), self.format)
    }
}

fn parse_dds(blob: &[u8]) -> Result<Dds> {
    Dds::read(&mut Cursor::new(blob))
        .map_err(|e| Error::TextureCodec(format!("Failed to parse DDS: {e}")))
}

/// Write the raw texture payload of `jmb` to `path`.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn dump_texture<P: AsRef<Path>>(jmb: &JmbFile, path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, &jmb.texture.payload)?;
    tracing::info!("Dumped {} byte texture to {}", jmb.texture.payload.len(), path.display());
    Ok(())
}

/// Crop every glyph rectangle out of the atlas into `out_dir/NNNN.png`.
///
/// Rectangles are in atlas pixels; parts that fall outside the decoded
/// texture are skipped with a warning.
///
/// # Errors
/// Returns an error if the texture cannot be decoded or a PNG cannot be written.
pub fn extract_glyphs<P: AsRef<Path>>(
    jmb: &JmbFile,
    codec: &DdsCodec,
    out_dir: P,
) -> Result<Vec<PathBuf>> {
    let out_dir = out_dir.as_ref();
    fs::create_dir_all(out_dir)?;
    let atlas = codec.decode(&jmb.texture.payload)?;

    let mut written = Vec::with_capacity(jmb.glyphs.len());
    for (index, rect) in jmb.glyphs.iter().enumerate() {
        if rect.w == 0 || rect.h == 0 || rect.right() > atlas.width() || rect.bottom() > atlas.height() {
            tracing::warn!("glyph {index}: {rect:?} lies outside the {}x{} atlas", atlas.width(), atlas.height());
            continue;
        }
        let glyph = image::imageops::crop_imm(
            &atlas,
            u32::from(rect.u),
            u32::from(rect.v),
            u32::from(rect.w),
            u32::from(rect.h),
        )
        .to_image();
        let path = out_dir.join(format!("{index:04}.png"));
        glyph.save(&path)?;
        written.push(path);
    }
    tracing::info!("Extracted {} glyphs to {}", written.len(), out_dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_dds_round_trip_dimensions() {
        let img = RgbaImage::from_pixel(16, 8, Rgba([255, 255, 255, 128]));
        let codec = DdsCodec::default();
        let blob = codec.encode(&img).unwrap();
        assert_eq!(&blob[..4], b"DDS ");
        assert_eq!(codec.dimensions(&blob).unwrap(), (16, 8));

        let decoded = codec.decode(&blob).unwrap();
        assert_eq!(decoded.dimensions(), (16, 8));
        assert_eq!(decoded.get_pixel(3, 3).0[3], 128);
    }

    #[test]
    fn test_dimensions_rejects_garbage() {
        let err = DdsCodec::default().dimensions(b"not a dds").unwrap_err();
        assert!(matches!(err, Error::TextureCodec(_)));
    }
}
