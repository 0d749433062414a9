//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT
//!
//! DDS decoding for atlas inspection, using `bcdec_rs` for block formats

use crate::error::{Error, Result};
use ddsfile::{D3DFormat, Dds, DxgiFormat};

/// Decode the top mip level of a DDS to tightly packed RGBA8.
///
/// # Errors
/// Returns [`Error::TextureCodec`] if the pixel format is not one atlas
/// textures use or the data layer is missing.
pub fn decode_dds_to_rgba(dds: &Dds) -> Result<Vec<u8>> {
    let width = dds.get_width() as usize;
    let height = dds.get_height() as usize;
    let data = dds
        .get_data(0)
        .map_err(|e| Error::TextureCodec(format!("No DDS data: {e}")))?;

    let layout = if let Some(dxgi) = dds.get_dxgi_format() {
        PixelLayout::from_dxgi(dxgi)
    } else if let Some(d3d) = dds.get_d3d_format() {
        PixelLayout::from_d3d(d3d)
    } else {
        None
    }
    .ok_or_else(|| Error::TextureCodec("Unsupported DDS pixel format".to_string()))?;

    match layout {
        PixelLayout::Rgba => Ok(data.to_vec()),
        PixelLayout::Bgra => {
            let mut rgba = data.to_vec();
            for chunk in rgba.chunks_exact_mut(4) {
                chunk.swap(0, 2);
            }
            Ok(rgba)
        }
        PixelLayout::Argb => Ok(data
            .chunks_exact(4)
            .flat_map(|c| [c[1], c[2], c[3], c[0]])
            .collect()),
        PixelLayout::Block(format) => Ok(decode_blocks(data, width, height, format)),
    }
}

#[derive(Clone, Copy)]
enum PixelLayout {
    Rgba,
    Bgra,
    Argb,
    Block(BlockFormat),
}

impl PixelLayout {
    fn from_dxgi(format: DxgiFormat) -> Option<Self> {
        Some(match format {
            DxgiFormat::R8G8B8A8_UNorm | DxgiFormat::R8G8B8A8_UNorm_sRGB => Self::Rgba,
            DxgiFormat::B8G8R8A8_UNorm | DxgiFormat::B8G8R8A8_UNorm_sRGB => Self::Bgra,
            DxgiFormat::BC1_UNorm | DxgiFormat::BC1_UNorm_sRGB => Self::Block(BlockFormat::Bc1),
            DxgiFormat::BC2_UNorm | DxgiFormat::BC2_UNorm_sRGB => Self::Block(BlockFormat::Bc2),
            DxgiFormat::BC3_UNorm | DxgiFormat::BC3_UNorm_sRGB => Self::Block(BlockFormat::Bc3),
            _ => return None,
        })
    }

    fn from_d3d(format: D3DFormat) -> Option<Self> {
        Some(match format {
            D3DFormat::A8R8G8B8 => Self::Argb,
            D3DFormat::A8B8G8R8 => Self::Rgba,
            D3DFormat::DXT1 => Self::Block(BlockFormat::Bc1),
            D3DFormat::DXT3 => Self::Block(BlockFormat::Bc2),
            D3DFormat::DXT5 => Self::Block(BlockFormat::Bc3),
            _ => return None,
        })
    }
}

#[derive(Clone, Copy)]
enum BlockFormat {
    Bc1, // DXT1, 8 bytes per block
    Bc2, // DXT3, explicit alpha
    Bc3, // DXT5, interpolated alpha
}

impl BlockFormat {
    const fn block_size(self) -> usize {
        match self {
            Self::Bc1 => 8,
            Self::Bc2 | Self::Bc3 => 16,
        }
    }
}

/// Decode block-compressed data. Blocks past the end of `data` stay transparent.
fn decode_blocks(data: &[u8], width: usize, height: usize, format: BlockFormat) -> Vec<u8> {
    let mut rgba = vec![0u8; width * height * 4];
    let blocks_x = width.div_ceil(4);
    let block_size = format.block_size();

    // 4x4 pixels, 16-byte pitch
    let mut block_rgba = [0u8; 64];

    for (index, block) in data.chunks_exact(block_size).enumerate() {
        let (bx, by) = (index % blocks_x, index / blocks_x);
        if by * 4 >= height {
            break;
        }
        match format {
            BlockFormat::Bc1 => bcdec_rs::bc1(block, &mut block_rgba, 16),
            BlockFormat::Bc2 => bcdec_rs::bc2(block, &mut block_rgba, 16),
            BlockFormat::Bc3 => bcdec_rs::bc3(block, &mut block_rgba, 16),
        }

        for py in 0..4 {
            let fy = by * 4 + py;
            if fy >= height {
                break;
            }
            let row_width = 4.min(width - bx * 4);
            let dst = (fy * width + bx * 4) * 4;
            let src = py * 16;
            rgba[dst..dst + row_width * 4].copy_from_slice(&block_rgba[src..src + row_width * 4]);
        }
    }

    rgba
}
