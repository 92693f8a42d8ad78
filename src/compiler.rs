//! Driving of the external LaTeX compiler.
//!
//! The document is compiled twice: the first pass resolves layout, the
//! second resolves cross references and the table of contents against the
//! first pass's output. The passes are strictly sequential.

use crate::config::LatexConfig;
use crate::error::BuildError;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// How much of the compiler's log is surfaced when a pass fails.
const LOG_TAIL_LINES: usize = 20;

/// Locates the configured compiler executable on PATH.
///
/// This runs before anything is scanned or generated, so a machine without a
/// TeX toolchain fails immediately instead of after a full generation pass.
pub fn locate(config: &LatexConfig) -> Result<PathBuf> {
    match which::which(&config.compiler) {
        Ok(path) => Ok(path),
        Err(_) => Err(BuildError::ToolchainMissing {
            tool: config.compiler.clone(),
        }
        .into()),
    }
}

/// Runs both compiler passes from within the content root.
///
/// A nonzero exit aborts immediately: the second pass is pointless without
/// the first pass's tables, so it is never attempted. The tail of the
/// compiler's log file is logged and carried in the error.
pub async fn compile(compiler: &Path, config: &LatexConfig, content_root: &Path) -> Result<()> {
    for pass in 1..=2u32 {
        log::info!("{} pass {}/2", config.compiler, pass);

        let output = Command::new(compiler)
            .args(&config.flags)
            .arg(&config.main_tex)
            .current_dir(content_root)
            .output()
            .await
            .with_context(|| format!("Failed to execute compiler '{}'", config.compiler))?;

        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            let log_tail = read_log_tail(content_root, &config.main_tex)
                .unwrap_or_else(|| tail_lines(&stdout, LOG_TAIL_LINES));
            log::error!("compilation failed, last {} log lines:", log_tail.len());
            for line in &log_tail {
                log::error!("  {}", line);
            }
            return Err(BuildError::Compile {
                compiler: config.compiler.clone(),
                pass,
                status: output.status.to_string(),
                log_tail,
            }
            .into());
        }

        // nonstopmode exits zero even after recoverable errors; point at the
        // log so a broken table of contents does not go unnoticed
        if stdout.to_lowercase().contains("error") {
            log::warn!(
                "pass {} transcript mentions errors, check {}.log",
                pass,
                main_stem(&config.main_tex)
            );
        }
    }

    Ok(())
}

/// Moves the compiled document from the content root to the project root.
pub fn install_artifact(content_root: &Path, root: &Path, output: &str) -> Result<PathBuf> {
    let produced = content_root.join(output);
    if !produced.is_file() {
        return Err(BuildError::ArtifactMissing { path: produced }.into());
    }

    let dest = root.join(output);
    std::fs::rename(&produced, &dest).with_context(|| {
        format!(
            "Failed to move {} to {}",
            produced.display(),
            dest.display()
        )
    })?;
    Ok(dest)
}

fn main_stem(main_tex: &str) -> &str {
    main_tex.strip_suffix(".tex").unwrap_or(main_tex)
}

/// Tail of `<assembly stem>.log` in the content root, if the file exists.
fn read_log_tail(content_root: &Path, main_tex: &str) -> Option<Vec<String>> {
    let log_path = content_root.join(format!("{}.log", main_stem(main_tex)));
    // TeX logs are not reliably UTF-8
    let bytes = std::fs::read(log_path).ok()?;
    Some(tail_lines(&String::from_utf8_lossy(&bytes), LOG_TAIL_LINES))
}

fn tail_lines(text: &str, n: usize) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].iter().map(|s| s.to_string()).collect()
}
