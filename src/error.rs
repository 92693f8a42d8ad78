use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that abort a build or test run.
///
/// These are the failures that must reach the user as a nonzero exit code.
/// They are created at the point of failure and propagated through `anyhow`,
/// so callers can still `downcast_ref::<BuildError>()` to branch on the kind.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("directory not found or not a directory: {path}")]
    Scan { path: PathBuf },

    #[error("'{tool}' not found on PATH. Install a TeX distribution (e.g. TeX Live) or set [latex].compiler in cpbook.toml")]
    ToolchainMissing { tool: String },

    #[error("{compiler} pass {pass} failed with {status}")]
    Compile {
        compiler: String,
        pass: u32,
        status: String,
        log_tail: Vec<String>,
    },

    #[error("compiler reported success but {path} was not produced")]
    ArtifactMissing { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Non-fatal problems found in a source unit's metadata block.
///
/// These are printed with the offending path and never change the exit code;
/// the unit is still rendered with whatever fields were recovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataWarning {
    /// The unit has no leading structured block at all.
    MissingBlock,
    /// A block exists but does not follow the label grammar.
    Malformed { reason: String },
}

impl std::fmt::Display for MetadataWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataWarning::MissingBlock => write!(f, "no metadata block found"),
            MetadataWarning::Malformed { reason } => {
                write!(f, "malformed metadata block: {}", reason)
            }
        }
    }
}
