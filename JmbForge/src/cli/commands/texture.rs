//! CLI commands for the embedded texture

use std::path::Path;

use super::LayoutArgs;
use crate::texture::{DdsCodec, dump_texture, extract_glyphs as extract};

/// Write the embedded texture to a DDS file
pub fn dump(path: &Path, output: &Path, layout: &LayoutArgs) -> anyhow::Result<()> {
    let ctx = layout.open(path)?;
    dump_texture(&ctx.file, output)?;
    let (width, height) = ctx.file.texture.pixel_size();
    println!("Wrote {width}x{height} texture to {}", output.display());
    Ok(())
}

/// Replace the embedded texture with a DDS file
pub fn import(path: &Path, texture: &Path, output: &Path, layout: &LayoutArgs) -> anyhow::Result<()> {
    let mut ctx = layout.open(path)?;
    ctx.file.reimport_texture(texture, &DdsCodec::default())?;
    ctx.save(output)?;
    let (width, height) = ctx.file.texture.pixel_size();
    println!("Imported {width}x{height} texture into {}", output.display());
    Ok(())
}

/// Crop every glyph into a PNG
pub fn extract_glyphs(path: &Path, output: &Path, layout: &LayoutArgs) -> anyhow::Result<()> {
    let ctx = layout.open(path)?;
    let written = extract(&ctx.file, &DdsCodec::default(), output)?;
    println!("Extracted {} of {} glyphs to {}", written.len(), ctx.file.glyphs.len(), output.display());
    Ok(())
}
