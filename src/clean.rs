//! Removal of build artifacts and generated files.
//!
//! Patterns cover the compiler's byproducts, the generated fragments and
//! manifests, and the compiled document itself. Matching nothing is fine; a
//! freshly cloned tree cleans to zero removals.

use crate::config::BuildConfig;
use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

/// File name patterns of build byproducts. The compiled document's
/// configured name is added at run time.
const ARTIFACT_PATTERNS: [&str; 8] = [
    "*.aux",
    "*.log",
    "*.out",
    "*.toc",
    "*.fls",
    "*.fdb_latexmk",
    "_generated_*.tex",
    "chapter.tex",
];

/// Removes build artifacts under the project root.
///
/// Files matching the patterns are removed recursively under the content
/// root and from the top level of the project root; `_minted*` directories
/// (shell-escape byproducts) are removed wherever they appear. The assembly
/// file is never touched.
pub fn clean(root: &Path, config: &BuildConfig) -> Result<()> {
    log::info!("cleaning build artifacts");

    let patterns = artifact_patterns(&config.latex.output)?;
    let mut files = 0usize;
    let mut dirs = 0usize;

    remove_minted_dirs(root, &mut dirs)?;

    let content_root = root.join(&config.content_dir);
    if content_root.is_dir() {
        clean_dir(
            &content_root,
            &patterns,
            &config.latex.main_tex,
            true,
            &mut files,
        )?;
    }
    clean_dir(root, &patterns, &config.latex.main_tex, false, &mut files)?;

    if files == 0 && dirs == 0 {
        log::info!("no build artifacts found to clean");
    } else {
        log::info!("clean removed {} files and {} directories", files, dirs);
    }

    Ok(())
}

fn artifact_patterns(output: &str) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in ARTIFACT_PATTERNS {
        builder.add(Glob::new(pattern)?);
    }
    builder.add(Glob::new(output)?);
    Ok(builder.build()?)
}

/// Removes matching files in `dir`, descending when `recursive` is set.
/// Matching is on file names; `protect` names the assembly file.
fn clean_dir(
    dir: &Path,
    patterns: &GlobSet,
    protect: &str,
    recursive: bool,
    removed: &mut usize,
) -> Result<()> {
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?
    {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }

        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if recursive {
                clean_dir(&entry.path(), patterns, protect, true, removed)?;
            }
            continue;
        }
        if !file_type.is_file() || name == protect {
            continue;
        }

        if patterns.is_match(Path::new(&name)) {
            let path = entry.path();
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            log::info!("removed {}", path.display());
            *removed += 1;
        }
    }
    Ok(())
}

/// Removes `_minted*` directories anywhere under `dir`, skipping hidden
/// directories.
fn remove_minted_dirs(dir: &Path, removed: &mut usize) -> Result<()> {
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }

        let path = entry.path();
        if name.starts_with("_minted") {
            std::fs::remove_dir_all(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            log::info!("removed directory {}", path.display());
            *removed += 1;
        } else {
            remove_minted_dirs(&path, removed)?;
        }
    }
    Ok(())
}
