//! Common test utilities for integration tests
//!
//! Builds throwaway notebook projects in temporary directories so tests can
//! run in parallel without touching each other. Fake compilers and test
//! scripts are plain `sh`, so no TeX distribution or Python interpreter is
//! needed to run the suite.

use anyhow::Result;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated notebook project with automatic cleanup.
///
/// The layout matches the conventional repository: a `content/` root holding
/// the top-level assembly file and chapter directories, and a
/// `stress_tests/` root for validation scripts.
pub struct ProjectFixture {
    _dir: TempDir,
    root: PathBuf,
}

impl ProjectFixture {
    pub fn new() -> Result<Self> {
        let dir = TempDir::new()?;
        let root = dir.path().to_path_buf();

        fs::create_dir_all(root.join("content"))?;
        fs::create_dir_all(root.join("stress_tests"))?;
        fs::write(
            root.join("content").join("cpbook.tex"),
            "\\documentclass{article}\n\\begin{document}\n\\input{graph/chapter.tex}\n\\end{document}\n",
        )?;

        Ok(Self { _dir: dir, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn content_dir(&self) -> PathBuf {
        self.root.join("content")
    }

    /// Writes a content unit into a chapter directory, creating the chapter
    /// as needed.
    pub fn add_unit(&self, chapter: &str, file_name: &str, contents: &str) -> Result<PathBuf> {
        let dir = self.root.join("content").join(chapter);
        fs::create_dir_all(&dir)?;
        let path = dir.join(file_name);
        fs::write(&path, contents)?;
        Ok(path)
    }

    /// Writes a test script under the test root. Scripts run through the
    /// configured interpreter, so plain shell in a `.py` file works fine.
    pub fn add_test_script(&self, relative: &str, script: &str) -> Result<PathBuf> {
        let path = self.root.join("stress_tests").join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, script)?;
        Ok(path)
    }

    /// Writes `cpbook.toml` at the project root.
    pub fn write_config(&self, contents: &str) -> Result<()> {
        fs::write(self.root.join("cpbook.toml"), contents)?;
        Ok(())
    }

    /// Writes an executable shell script the config can name as the LaTeX
    /// compiler, returning its absolute path. The script runs with the
    /// content root as its working directory, exactly like the real thing.
    pub fn write_fake_compiler(&self, script: &str) -> Result<PathBuf> {
        let path = self.root.join("fake-pdflatex");
        fs::write(&path, format!("#!/bin/sh\n{}", script))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
        Ok(path)
    }
}

/// A unit source with a complete, well-formed metadata block.
pub fn annotated_unit(description: &str, code: &str) -> String {
    format!(
        "\"\"\"\nAuthor: PyCPBook Community\nSource: CLRS\nDescription: {}\nTime: $O(N)$\nSpace: $O(1)$\nStatus: Stress-tested\n\"\"\"\n\n{}\n",
        description, code
    )
}
