//! Discovery of source units and validation test scripts on disk.
//!
//! Scanning is deliberately synchronous and allocation-light: the trees are
//! small, and a plain sorted `Vec` keeps the chapter and unit order identical
//! from run to run, which the generated output depends on.

use crate::config::BuildConfig;
use crate::error::BuildError;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// One eligible content file, read at scan time.
#[derive(Debug)]
pub struct SourceUnit {
    /// Path relative to the content root, e.g. `graph/dijkstra.py`
    pub relative_path: PathBuf,
    pub chapter_id: String,
    pub raw_text: String,
}

impl SourceUnit {
    /// Bare file name inside the chapter directory, e.g. `dijkstra.py`.
    pub fn file_name(&self) -> &str {
        self.relative_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }
}

/// A chapter directory and its units in lexical order. A chapter with no
/// units is kept so stale generated files in it can be cleared.
#[derive(Debug)]
pub struct Chapter {
    pub id: String,
    pub units: Vec<SourceUnit>,
}

/// One validation script found under the test root.
#[derive(Debug, Clone)]
pub struct TestUnit {
    /// Path relative to the project root, used in all reporting
    pub relative_path: PathBuf,
    /// Path used to spawn the interpreter
    pub path: PathBuf,
}

/// Explicit chapter ordering for one build invocation.
///
/// Chapters registered in the configuration come first, in registration
/// order; unregistered chapter directories follow in lexical order.
pub struct ChapterRegistry {
    registered: Vec<String>,
}

impl ChapterRegistry {
    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            registered: config.chapters.clone(),
        }
    }

    /// Orders discovered chapter directories against the registration list.
    /// A registered chapter with no directory is skipped with a warning.
    fn order(&self, mut discovered: Vec<String>) -> Vec<String> {
        discovered.sort();
        let mut ordered = Vec::with_capacity(discovered.len());
        for id in &self.registered {
            if let Some(pos) = discovered.iter().position(|d| d == id) {
                ordered.push(discovered.remove(pos));
            } else {
                log::warn!("registered chapter '{}' has no directory, skipping", id);
            }
        }
        ordered.extend(discovered);
        ordered
    }
}

/// Walks the content root and returns its chapters in build order.
///
/// Eligible units are `*.py` files directly inside a chapter directory.
/// Files at the content root itself (the assembly file among them) and
/// anything nested deeper are not units. Hidden entries are skipped.
pub fn scan_content(content_root: &Path, registry: &ChapterRegistry) -> Result<Vec<Chapter>> {
    if !content_root.is_dir() {
        return Err(BuildError::Scan {
            path: content_root.to_path_buf(),
        }
        .into());
    }

    let mut discovered = Vec::new();
    for entry in std::fs::read_dir(content_root)
        .with_context(|| format!("Failed to read {}", content_root.display()))?
    {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        if entry.file_type()?.is_dir() {
            discovered.push(name);
        }
    }

    let mut chapters = Vec::new();
    for id in registry.order(discovered) {
        let chapter_dir = content_root.join(&id);
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&chapter_dir)
            .with_context(|| format!("Failed to read {}", chapter_dir.display()))?
        {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with('.') || !name.ends_with(".py") {
                continue;
            }
            if entry.file_type()?.is_file() {
                paths.push((name, entry.path()));
            }
        }
        paths.sort();

        let mut units = Vec::new();
        for (name, path) in paths {
            let raw_text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            units.push(SourceUnit {
                relative_path: Path::new(&id).join(&name),
                chapter_id: id.clone(),
                raw_text,
            });
        }
        chapters.push(Chapter { id, units });
    }

    Ok(chapters)
}

/// Walks the test root recursively for `*.py` scripts, excluding the shared
/// utilities subtree, and returns them sorted by path.
pub fn discover_tests(root: &Path, tests_dir: &str, utilities_dir: &str) -> Result<Vec<TestUnit>> {
    let tests_root = root.join(tests_dir);
    if !tests_root.is_dir() {
        return Err(BuildError::Scan { path: tests_root }.into());
    }

    let utilities = tests_root.join(utilities_dir);
    let mut units = Vec::new();
    walk_tests(&tests_root, &utilities, &mut units)?;

    for unit in units.iter_mut() {
        // report paths relative to the project root
        let rel = unit.path.strip_prefix(root).unwrap_or(&unit.path);
        unit.relative_path = rel.to_path_buf();
    }
    units.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    Ok(units)
}

fn walk_tests(dir: &Path, utilities: &Path, out: &mut Vec<TestUnit>) -> Result<()> {
    for entry in
        std::fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if name.starts_with('.') {
            continue;
        }
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if path == utilities {
                continue;
            }
            walk_tests(&path, utilities, out)?;
        } else if file_type.is_file() && name.ends_with(".py") {
            out.push(TestUnit {
                relative_path: PathBuf::new(),
                path,
            });
        }
    }
    Ok(())
}
