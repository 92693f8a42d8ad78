//! cpbook-build library
//!
//! Build engine for the competitive programming notebook. The annotated
//! Python sources under the content tree are rendered into LaTeX fragments
//! and compiled into the final PDF; a separate orchestrator discovers and
//! runs the notebook's stress tests in parallel. The primary interface is
//! the cpbook-build binary, but every phase is exposed here so tests and
//! custom tooling can drive them directly.
//!
//! ## Public API
//!
//! - [`config::BuildConfig`] — project configuration from `cpbook.toml`
//! - [`pipeline::build_pdf`] / [`pipeline::generate`] — the document pipeline
//! - [`scanner::discover_tests`] + [`runner::run_tests`] — the test runner
//! - [`clean::clean`] — build artifact removal

pub mod clean;
pub mod compiler;
pub mod config;
pub mod error;
pub mod fragment;
pub mod latex;
pub mod metadata;
pub mod pipeline;
pub mod reporting;
pub mod runner;
pub mod scanner;

pub use config::BuildConfig;
pub use error::{BuildError, MetadataWarning};
