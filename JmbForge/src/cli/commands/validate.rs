//! CLI commands for round-trip and text validation

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::LayoutArgs;
use crate::cli::progress::simple_bar;

/// Expand directories into the `.jmb` files below them
fn collect_files(paths: &[PathBuf]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(crate::Error::from)?;
            let is_jmb = entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("jmb"));
            if entry.file_type().is_file() && is_jmb {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

/// Check that every file re-serializes byte-for-byte
pub fn round_trip(paths: &[PathBuf], progress: bool, layout: &LayoutArgs) -> anyhow::Result<()> {
    let files = collect_files(paths)?;
    if files.is_empty() {
        println!("No .jmb files found");
        return Ok(());
    }

    let pb = progress.then(|| simple_bar(files.len() as u64, "Validating"));
    let mut failures = Vec::new();
    for path in &files {
        if let Some(pb) = &pb {
            pb.set_message(
                path.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            );
        }
        let result = layout
            .open(path)
            .and_then(|ctx| ctx.verify_round_trip().map_err(anyhow::Error::from));
        if let Err(e) = result {
            failures.push((path.clone(), e));
        }
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }
    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    for (path, err) in &failures {
        println!("FAIL {}: {err}", path.display());
    }
    println!("{} of {} files round-trip", files.len() - failures.len(), files.len());

    if !failures.is_empty() {
        anyhow::bail!("{} files failed validation", failures.len());
    }
    Ok(())
}

/// Check stored codes against the raw text
pub fn check_text(path: &Path, raw_text: &Path, layout: &LayoutArgs) -> anyhow::Result<()> {
    let mut ctx = layout.open(path)?;
    ctx.load_raw_text(raw_text)?;
    ctx.check_text()?;
    println!(
        "{}: all {} sentences match {}",
        path.display(),
        ctx.file.sentences.len(),
        raw_text.display()
    );
    Ok(())
}
