//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! DDS encoding for glyph atlases - BC1/BC3 block compression

use crate::error::{Error, Result};
use ddsfile::{D3DFormat, Dds, NewD3dParams};

/// Block compression used for generated atlases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum DdsFormat {
    /// BC1/DXT1 - 1-bit alpha, half the size
    Bc1,
    /// BC3/DXT5 - interpolated alpha, keeps anti-aliased glyph edges
    #[default]
    Bc3,
}

impl DdsFormat {
    const fn block_size(self) -> usize {
        match self {
            Self::Bc1 => 8,
            Self::Bc3 => 16,
        }
    }

    const fn d3d_format(self) -> D3DFormat {
        match self {
            Self::Bc1 => D3DFormat::DXT1,
            Self::Bc3 => D3DFormat::DXT5,
        }
    }
}

/// Compress RGBA8 pixels into a complete DDS file.
///
/// # Errors
/// Returns [`Error::TextureCodec`] if the pixel buffer does not match the
/// dimensions or the DDS container cannot be built.
pub fn encode_to_dds(pixels: &[u8], width: u32, height: u32, format: DdsFormat) -> Result<Vec<u8>> {
    let (w, h) = (width as usize, height as usize);
    if w == 0 || h == 0 || pixels.len() != w * h * 4 {
        return Err(Error::TextureCodec(format!(
            "{} bytes do not describe a {width}x{height} RGBA image",
            pixels.len()
        )));
    }

    let compressed = compress(pixels, w, h, format);

    let mut dds = Dds::new_d3d(NewD3dParams {
        height,
        width,
        depth: None,
        format: format.d3d_format(),
        mipmap_levels: None,
        caps2: None,
    })
    .map_err(|e| Error::TextureCodec(format!("Failed to create DDS: {e}")))?;

    dds.get_mut_data(0)
        .map_err(|e| Error::TextureCodec(format!("No DDS data layer: {e}")))?
        .copy_from_slice(&compressed);

    let mut output = Vec::new();
    dds.write(&mut output)
        .map_err(|e| Error::TextureCodec(format!("Failed to write DDS: {e}")))?;
    Ok(output)
}

fn compress(pixels: &[u8], width: usize, height: usize, format: DdsFormat) -> Vec<u8> {
    let blocks_x = width.div_ceil(4);
    let blocks_y = height.div_ceil(4);
    let block_size = format.block_size();
    let mut output = Vec::with_capacity(blocks_x * blocks_y * block_size);

    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let block = extract_block(pixels, width, height, bx * 4, by * 4);
            match format {
                DdsFormat::Bc1 => output.extend_from_slice(&encode_color_block(&block)),
                DdsFormat::Bc3 => {
                    output.extend_from_slice(&encode_alpha_block(&block));
                    output.extend_from_slice(&encode_color_block(&block));
                }
            }
        }
    }

    output
}

// ============================================================================
// Color endpoints and indices
// ============================================================================

/// 8-byte color block: two RGB565 endpoints and 2-bit indices.
fn encode_color_block(block: &[[u8; 4]; 16]) -> [u8; 8] {
    let (bright, dark) = luminance_endpoints(block);
    let (c0, c1) = if bright >= dark { (bright, dark) } else { (dark, bright) };
    let palette = color_palette(c0, c1);

    let indices = block.iter().enumerate().fold(0u32, |acc, (i, pixel)| {
        acc | (u32::from(closest_color(pixel, &palette)) << (i * 2))
    });

    let mut output = [0u8; 8];
    output[0..2].copy_from_slice(&c0.to_le_bytes());
    output[2..4].copy_from_slice(&c1.to_le_bytes());
    output[4..8].copy_from_slice(&indices.to_le_bytes());
    output
}

fn luminance_endpoints(block: &[[u8; 4]; 16]) -> (u16, u16) {
    let lum = |p: &[u8; 4]| u32::from(p[0]) + u32::from(p[1]) + u32::from(p[2]);
    let brightest = block.iter().max_by_key(|p| lum(p)).unwrap_or(&block[0]);
    let darkest = block.iter().min_by_key(|p| lum(p)).unwrap_or(&block[0]);
    (
        rgb_to_565(brightest[0], brightest[1], brightest[2]),
        rgb_to_565(darkest[0], darkest[1], darkest[2]),
    )
}

/// Convert RGB888 to RGB565
pub(crate) fn rgb_to_565(r: u8, g: u8, b: u8) -> u16 {
    (u16::from(r >> 3) << 11) | (u16::from(g >> 2) << 5) | u16::from(b >> 3)
}

fn rgb_from_565(c: u16) -> [u8; 3] {
    let r = ((c >> 11) & 0x1F) as u8;
    let g = ((c >> 5) & 0x3F) as u8;
    let b = (c & 0x1F) as u8;
    [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)]
}

/// Four-color palette; `c0 > c1` selects the opaque mode.
fn color_palette(c0: u16, c1: u16) -> [[u8; 3]; 4] {
    let a = rgb_from_565(c0);
    let b = rgb_from_565(c1);
    let mix = |wa: u16, wb: u16, d: u16| {
        [0, 1, 2].map(|i| ((wa * u16::from(a[i]) + wb * u16::from(b[i])) / d) as u8)
    };
    if c0 > c1 {
        [a, b, mix(2, 1, 3), mix(1, 2, 3)]
    } else {
        [a, b, mix(1, 1, 2), [0, 0, 0]]
    }
}

fn closest_color(pixel: &[u8; 4], palette: &[[u8; 3]; 4]) -> u8 {
    let dist = |c: &[u8; 3]| {
        (0..3)
            .map(|i| {
                let d = i32::from(pixel[i]) - i32::from(c[i]);
                d * d
            })
            .sum::<i32>()
    };
    palette
        .iter()
        .enumerate()
        .min_by_key(|(_, c)| dist(c))
        .map_or(0, |(i, _)| i as u8)
}

// ============================================================================
// Alpha
// ============================================================================

/// 8-byte BC3 alpha block: two endpoints and 3-bit indices.
fn encode_alpha_block(block: &[[u8; 4]; 16]) -> [u8; 8] {
    let a0 = block.iter().map(|p| p[3]).max().unwrap_or(0);
    let a1 = block.iter().map(|p| p[3]).min().unwrap_or(0);

    let mut palette = [0u8; 8];
    palette[0] = a0;
    palette[1] = a1;
    if a0 > a1 {
        for k in 1..7u16 {
            palette[k as usize + 1] = (((7 - k) * u16::from(a0) + k * u16::from(a1)) / 7) as u8;
        }
    } else {
        // flat block, every index resolves to a0
        palette[2..].fill(a0);
    }

    let indices = block.iter().enumerate().fold(0u64, |acc, (i, pixel)| {
        let best = palette
            .iter()
            .enumerate()
            .min_by_key(|(_, a)| (i32::from(pixel[3]) - i32::from(**a)).abs())
            .map_or(0, |(j, _)| j as u64);
        acc | (best << (i * 3))
    });

    let mut output = [0u8; 8];
    output[0] = a0;
    output[1] = a1;
    output[2..8].copy_from_slice(&indices.to_le_bytes()[..6]);
    output
}

/// 4x4 RGBA block at `(x, y)`, clamping reads to the image edge.
fn extract_block(pixels: &[u8], width: usize, height: usize, x: usize, y: usize) -> [[u8; 4]; 16] {
    let mut block = [[0u8; 4]; 16];
    for (i, texel) in block.iter_mut().enumerate() {
        let sx = (x + i % 4).min(width - 1);
        let sy = (y + i / 4).min(height - 1);
        let src = (sy * width + sx) * 4;
        texel.copy_from_slice(&pixels[src..src + 4]);
    }
    block
}
