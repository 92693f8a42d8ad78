//! Orchestration of the document build.
//!
//! Phases run in a fixed order: toolchain lookup first, then scan, extract,
//! render, manifest rewrite, the two compiler passes, and finally the move of
//! the compiled document to the project root. All generation writes complete
//! before the compiler reads anything, so the phases never overlap on a file.

use crate::compiler;
use crate::config::BuildConfig;
use crate::fragment;
use crate::metadata;
use crate::scanner::{self, ChapterRegistry};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// What the generation phase produced.
#[derive(Debug, Default)]
pub struct GenerateStats {
    /// Chapters that contained at least one unit
    pub chapters: usize,
    pub fragments: usize,
    /// Units whose metadata block was missing or malformed
    pub warnings: usize,
}

/// Scans the content tree and writes every fragment and chapter manifest.
///
/// Split out from [`build_pdf`] so generation can run, and be tested, on a
/// machine with no TeX toolchain. Metadata problems are reported on the
/// diagnostic stream with the offending path and never fail the build.
pub fn generate(root: &Path, config: &BuildConfig) -> Result<GenerateStats> {
    let content_root = root.join(&config.content_dir);
    let registry = ChapterRegistry::from_config(config);
    let chapters = scanner::scan_content(&content_root, &registry)?;

    let mut stats = GenerateStats::default();
    for chapter in &chapters {
        if !chapter.units.is_empty() {
            log::info!("processing chapter: {}", chapter.id);
        }

        let mut fragments = Vec::with_capacity(chapter.units.len());
        for unit in &chapter.units {
            let started = std::time::Instant::now();
            let extraction = metadata::extract(&unit.raw_text);
            if let Some(warning) = &extraction.warning {
                log::warn!("{}: {}", unit.relative_path.display(), warning);
                stats.warnings += 1;
            }

            let fragment = fragment::render(unit, &extraction.metadata, &extraction.code);
            fragment::write_fragment(&content_root, &chapter.id, &fragment)?;
            log::debug!(
                "  {} -> {} ({} ms)",
                fragment.unit_path.display(),
                fragment.file_name,
                started.elapsed().as_millis()
            );
            fragments.push(fragment);
        }

        fragment::write_chapter_manifest(&content_root, &chapter.id, &fragments)?;
        if !fragments.is_empty() {
            stats.chapters += 1;
            stats.fragments += fragments.len();
        }
    }

    Ok(stats)
}

/// Runs the full pdf pipeline and returns the path of the installed document.
pub async fn build_pdf(root: &Path, config: &BuildConfig) -> Result<PathBuf> {
    // A machine without the compiler fails here, before anything is written.
    let compiler_path = compiler::locate(&config.latex)?;
    log::debug!("using {}", compiler_path.display());

    let stats = generate(root, config)?;
    if stats.fragments == 0 {
        log::warn!("no content units found under {}", config.content_dir);
    } else {
        log::info!(
            "generated {} fragment(s) across {} chapter(s)",
            stats.fragments,
            stats.chapters
        );
    }

    let content_root = root.join(&config.content_dir);
    compiler::compile(&compiler_path, &config.latex, &content_root).await?;

    let installed = compiler::install_artifact(&content_root, root, &config.latex.output)?;
    log::info!("PDF generated successfully: {}", installed.display());
    Ok(installed)
}
