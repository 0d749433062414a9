//! CLI commands for inspecting containers

use std::path::Path;

use super::LayoutArgs;
use crate::formats::jmb::{JmbKind, SentenceRecord};
use crate::text::save_translation;

/// Show header fields and section sizes
pub fn info(path: &Path, layout: &LayoutArgs) -> anyhow::Result<()> {
    let ctx = layout.open(path)?;
    let jmb = &ctx.file;
    let meta = &jmb.meta;

    println!("JMB Information: {}", path.display());
    println!();
    println!("Layout: {} ({:?})", jmb.kind().as_str(), meta.endian());
    println!("Usage: {}", ctx.usage);
    if let Some(name) = meta.name().filter(|n| !n.is_empty()) {
        println!("Name: {name}");
    }
    println!(
        "Sentences: {} @ {} ({} bytes each)",
        meta.sentence_num,
        meta.sentence_offset,
        jmb.kind().sentence_record_size()
    );
    println!("Glyphs: {} @ {}", meta.glyph_num, meta.glyph_offset);

    let (width, height) = jmb.texture.pixel_size();
    println!(
        "Texture: {width}x{height} @ {} ({} byte payload)",
        meta.texture_offset, jmb.texture.header.payload_len
    );

    if jmb.kind() == JmbKind::Ja {
        let motion_offset = meta.motion_offset().unwrap_or_default();
        match &jmb.motions {
            Some(blobs) => {
                let total: usize = blobs.iter().map(Vec::len).sum();
                println!("Motions: {} blobs @ {motion_offset} ({total} bytes)", blobs.len());
            }
            None => println!("Motions: none (section end {motion_offset})"),
        }
    }

    let lines: usize = jmb.sentences.iter().map(SentenceRecord::valid_line_count).sum();
    println!("Valid lines: {lines}");
    Ok(())
}

/// List the glyph rectangle table
pub fn glyphs(path: &Path, json: bool, layout: &LayoutArgs) -> anyhow::Result<()> {
    let ctx = layout.open(path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&ctx.file.glyphs)?);
        return Ok(());
    }

    println!("{:>5}  {:>4} {:>4} {:>4} {:>4}", "index", "u", "v", "w", "h");
    for (index, rect) in ctx.file.glyphs.iter().enumerate() {
        println!("{index:>5}  {:>4} {:>4} {:>4} {:>4}", rect.u, rect.v, rect.w, rect.h);
    }
    Ok(())
}

/// Decode every sentence using the raw text's registry
pub fn text(
    path: &Path,
    raw_text: &Path,
    output: Option<&Path>,
    layout: &LayoutArgs,
) -> anyhow::Result<()> {
    let mut ctx = layout.open(path)?;
    ctx.load_raw_text(raw_text)?;
    let decoded = ctx.decode_text()?;

    if let Some(output) = output {
        save_translation(output, &decoded)?;
        println!("Wrote {} sentences to {}", decoded.len(), output.display());
        return Ok(());
    }

    for (index, lines) in decoded.iter().enumerate() {
        for (line, text) in lines.iter().enumerate() {
            println!("[{index},{line}] {text}");
        }
    }
    Ok(())
}
