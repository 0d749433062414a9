//! CLI command for the full translation rewrite

use std::path::Path;
use std::time::Instant;

use super::{AtlasArgs, LayoutArgs};
use crate::atlas::{AtlasConfig, FontProfiles, FontRasterizer};
use crate::cli::progress::{DISK, LOOKING_GLASS, PEN, PICTURE, print_done, print_step};
use crate::formats::jmb::TEXTURE_WIDTH;
use crate::text::{JmbUsage, load_translation};
use crate::texture::DdsCodec;

impl AtlasArgs {
    /// Start from the profile entry for `usage` (if any) and apply the
    /// individual flags on top.
    fn resolve(&self, usage: JmbUsage) -> anyhow::Result<AtlasConfig> {
        let profile = match &self.profile {
            Some(path) => FontProfiles::load(path)?.get(usage).cloned(),
            None => None,
        };

        let mut config = match profile {
            Some(config) => config,
            None => AtlasConfig {
                font_path: self
                    .font
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("no profile for '{usage}', --font is required"))?,
                glyph_height: self
                    .glyph_height
                    .ok_or_else(|| anyhow::anyhow!("--glyph-height is required without a profile"))?,
                font_size: self
                    .font_size
                    .ok_or_else(|| anyhow::anyhow!("--font-size is required without a profile"))?,
                scale_factor: 1,
                max_width: TEXTURE_WIDTH,
            },
        };

        if let Some(font) = &self.font {
            config.font_path.clone_from(font);
        }
        if let Some(height) = self.glyph_height {
            config.glyph_height = height;
        }
        if let Some(size) = self.font_size {
            config.font_size = size;
        }
        if let Some(scale) = self.scale {
            config.scale_factor = scale;
        }
        if let Some(width) = self.max_width {
            config.max_width = width;
        }
        config.validate()?;
        Ok(config)
    }
}

pub fn execute(
    path: &Path,
    translation: &Path,
    output: &Path,
    atlas: &AtlasArgs,
    usage: Option<JmbUsage>,
    raw_text: Option<&Path>,
    layout: &LayoutArgs,
) -> anyhow::Result<()> {
    let start = Instant::now();

    print_step(1, 4, &LOOKING_GLASS, &format!("Reading {}...", path.display()));
    let mut ctx = layout.open(path)?;
    if let Some(usage) = usage {
        ctx.usage = usage;
    }
    if let Some(raw_text) = raw_text {
        ctx.load_raw_text(raw_text)?;
    }
    let translation = load_translation(translation)?;

    let config = atlas.resolve(ctx.usage)?;
    print_step(
        2,
        4,
        &PICTURE,
        &format!("Loading font {}...", config.font_path.display()),
    );
    let font = FontRasterizer::open(&config.font_path)?;

    print_step(3, 4, &PEN, "Packing atlas and encoding sentences...");
    let result = ctx.apply_translation(&translation, &font, &DdsCodec::new(atlas.format), &config)?;
    if raw_text.is_some() {
        println!("  {} lines changed", result.changed_lines.len());
    }
    let (width, height) = result.texture_size;
    println!("  {} glyphs, {width}x{height} texture", result.glyph_count);

    print_step(4, 4, &DISK, &format!("Writing {}...", output.display()));
    ctx.save(output)?;

    print_done(start.elapsed());
    Ok(())
}
