//! Rendering of source units into LaTeX fragments and chapter manifests.
//!
//! Rendering is a pure function of the unit's file name, metadata, and code
//! body, so rebuilding an unchanged tree produces byte-identical files. The
//! `docstring` and `minted` environments are defined by the notebook's
//! stylesheet.

use crate::latex;
use crate::metadata::Metadata;
use crate::scanner::SourceUnit;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Generated fragments carry this prefix so the cleaner can glob them
/// without ever matching a hand-written file.
pub const GENERATED_PREFIX: &str = "_generated_";

/// Per-chapter inclusion manifest, rewritten wholesale on every build.
pub const MANIFEST_FILE: &str = "chapter.tex";

const MANIFEST_HEADER: &str =
    "% This file is automatically generated by cpbook-build.\n% Do not edit manually.\n\n";

/// One rendered unit of output markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Content-root-relative path of the unit this fragment derives from
    pub unit_path: PathBuf,
    /// File name inside the chapter directory, e.g. `_generated_dijkstra.tex`
    pub file_name: String,
    pub markup: String,
}

/// Renders a unit's metadata and code body into its fragment.
pub fn render(unit: &SourceUnit, metadata: &Metadata, code: &str) -> Fragment {
    let mut markup = String::new();

    markup.push_str(&format!(
        "\\subsection*{{{}}}\n\n",
        latex::escape_text(&section_title(unit.file_name()))
    ));

    if !metadata.is_empty() {
        markup.push_str("\\begin{docstring}\n");

        let fields = [
            ("Author", &metadata.author),
            ("Source", &metadata.origin),
            ("Time", &metadata.time_complexity),
            ("Space", &metadata.space_complexity),
            ("Status", &metadata.status),
        ];
        let lines: Vec<String> = fields
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(label, value)| format!("\\textbf{{{}:}} {}", label, latex::escape(value)))
            .collect();
        markup.push_str(&lines.join(" \\\\\n"));

        if !metadata.description.is_empty() {
            if !lines.is_empty() {
                markup.push_str("\n\n");
            }
            markup.push_str(&latex::escape(&metadata.description));
        }

        markup.push_str("\n\\end{docstring}\n\n");
    }

    markup.push_str("\\begin{minted}{python}\n");
    markup.push_str(code);
    markup.push_str("\n\\end{minted}\n");

    Fragment {
        unit_path: unit.relative_path.clone(),
        file_name: fragment_file_name(unit.file_name()),
        markup,
    }
}

/// Deterministic fragment name for a unit: `_generated_<stem>.tex`.
pub fn fragment_file_name(unit_file_name: &str) -> String {
    format!("{}{}.tex", GENERATED_PREFIX, stem(unit_file_name))
}

/// Section title derived from the file stem: underscores become spaces and
/// each word is capitalized, so `binary_search.py` titles as `Binary Search`.
fn section_title(unit_file_name: &str) -> String {
    stem(unit_file_name)
        .split('_')
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn stem(file_name: &str) -> &str {
    file_name.strip_suffix(".py").unwrap_or(file_name)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Writes a fragment into its chapter directory.
pub fn write_fragment(content_root: &Path, chapter_id: &str, fragment: &Fragment) -> Result<()> {
    let path = content_root.join(chapter_id).join(&fragment.file_name);
    std::fs::write(&path, &fragment.markup)
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// The full manifest text for a chapter's fragments, in build order.
pub fn manifest_contents(chapter_id: &str, fragments: &[Fragment]) -> String {
    let mut out = String::from(MANIFEST_HEADER);
    for fragment in fragments {
        // inclusion paths always use forward slashes
        out.push_str(&format!("\\input{{{}/{}}}\n", chapter_id, fragment.file_name));
    }
    out
}

/// Rewrites a chapter's manifest to list exactly the given fragments.
///
/// A chapter that currently has no units gets no manifest, and a stale one
/// left over from a removed unit is deleted.
pub fn write_chapter_manifest(
    content_root: &Path,
    chapter_id: &str,
    fragments: &[Fragment],
) -> Result<()> {
    let path = content_root.join(chapter_id).join(MANIFEST_FILE);

    if fragments.is_empty() {
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
            log::debug!("removed stale manifest {}", path.display());
        }
        return Ok(());
    }

    std::fs::write(&path, manifest_contents(chapter_id, fragments))
        .with_context(|| format!("Failed to write {}", path.display()))
}
