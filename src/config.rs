use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Name of the optional configuration file at the project root.
pub const CONFIG_FILE: &str = "cpbook.toml";

/// Configuration for the notebook build.
///
/// Deserialized from `cpbook.toml` at the project root. Every field has a
/// default, so an absent or empty file gives a working configuration for the
/// conventional repository layout.
///
/// # Example
///
/// ```toml
/// content_dir = "content"
/// tests_dir = "stress_tests"
/// chapters = ["fundamentals", "graph", "string"]
///
/// [latex]
/// compiler = "pdflatex"
/// flags = ["--shell-escape", "-interaction=nonstopmode"]
///
/// [tests]
/// interpreter = "python3"
/// timeout_secs = 120
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Directory holding chapter subdirectories, relative to the project root
    pub content_dir: String,

    /// Directory holding validation test scripts, relative to the project root
    pub tests_dir: String,

    /// Explicit chapter ordering. Listed chapters come first in this order;
    /// unlisted chapter directories follow in lexical order.
    pub chapters: Vec<String>,

    pub latex: LatexConfig,

    pub tests: TestsConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            content_dir: "content".to_string(),
            tests_dir: "stress_tests".to_string(),
            chapters: Vec::new(),
            latex: LatexConfig::default(),
            tests: TestsConfig::default(),
        }
    }
}

/// Configuration for the document compilation step.
///
/// The compiler field supports environment variable expansion using
/// `${VAR_NAME}` syntax.
///
/// # Security
///
/// Executable paths are validated to prevent command injection. Paths cannot
/// contain shell metacharacters or use parent directory traversal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LatexConfig {
    /// Compiler executable (supports ${VAR} environment variable expansion)
    pub compiler: String,

    /// Compiler flags
    pub flags: Vec<String>,

    /// Top-level assembly file inside the content directory
    pub main_tex: String,

    /// Name of the compiled document
    pub output: String,
}

impl Default for LatexConfig {
    fn default() -> Self {
        Self {
            compiler: "pdflatex".to_string(),
            // minted requires shell escape; nonstopmode keeps the compiler
            // from blocking on a prompt when a pass hits an error
            flags: vec![
                "--shell-escape".to_string(),
                "-interaction=nonstopmode".to_string(),
            ],
            main_tex: "cpbook.tex".to_string(),
            output: "cpbook.pdf".to_string(),
        }
    }
}

/// Configuration for the validation test runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TestsConfig {
    /// Interpreter executable (supports ${VAR} environment variable expansion)
    pub interpreter: String,

    /// Subdirectory of the test root holding shared helpers, never executed
    pub utilities_dir: String,

    /// Worker pool size; 0 means one worker per available core
    pub jobs: usize,

    /// Per-test wall clock limit in seconds
    pub timeout_secs: u64,
}

impl Default for TestsConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            utilities_dir: "utilities".to_string(),
            jobs: 0,
            timeout_secs: 120,
        }
    }
}

impl BuildConfig {
    /// Load configuration from `cpbook.toml` under the given project root,
    /// falling back to defaults when the file is absent, then expand
    /// environment variables and validate executable paths.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);

        let mut config: BuildConfig = if path.is_file() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        } else {
            Self::default()
        };

        // Expand environment variables in executable fields and validate
        config.latex.compiler = expand_env_vars(&config.latex.compiler);
        for flag in config.latex.flags.iter_mut() {
            *flag = expand_env_vars(flag);
        }
        config.tests.interpreter = expand_env_vars(&config.tests.interpreter);

        validate_executable("compiler", &config.latex.compiler)
            .context("Invalid [latex] configuration")?;
        validate_executable("interpreter", &config.tests.interpreter)
            .context("Invalid [tests] configuration")?;

        Ok(config)
    }

    /// Resolved number of test workers.
    pub fn jobs(&self) -> usize {
        if self.tests.jobs == 0 {
            num_cpus::get()
        } else {
            self.tests.jobs
        }
    }
}

/// Validate an executable path for security and correctness
fn validate_executable(what: &str, value: &str) -> Result<()> {
    // Ensure the path doesn't contain shell metacharacters
    let dangerous_chars = [';', '|', '&', '`', '\n', '\r'];
    for ch in dangerous_chars {
        if value.contains(ch) {
            anyhow::bail!(
                "{} path contains invalid character '{}': {}",
                what,
                ch.escape_default(),
                value
            );
        }
    }

    // Ensure the path doesn't use parent directory traversal
    let path = Path::new(value);
    for component in path.components() {
        if matches!(component, std::path::Component::ParentDir) {
            anyhow::bail!("{} path cannot contain '..': {}", what, value);
        }
    }

    if value.is_empty() {
        anyhow::bail!("{} path cannot be empty", what);
    }

    Ok(())
}

/// Expand environment variables in a string
/// Supports ${VAR_NAME} syntax
/// This function processes the string in a single pass to avoid re-processing expanded values
fn expand_env_vars(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            // Collect variable name
            let mut var_name = String::new();
            let mut found_close = false;

            for ch in chars.by_ref() {
                if ch == '}' {
                    found_close = true;
                    break;
                }
                var_name.push(ch);
            }

            if found_close {
                // Try to expand the variable
                match env::var(&var_name) {
                    Ok(value) => result.push_str(&value),
                    Err(_) => {
                        log::warn!(
                            "Environment variable '{}' not found, leaving unexpanded",
                            var_name
                        );
                        result.push_str("${");
                        result.push_str(&var_name);
                        result.push('}');
                    }
                }
            } else {
                // No closing brace found, treat as literal
                result.push_str("${");
                result.push_str(&var_name);
            }
        } else {
            result.push(ch);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_expand_env_vars_with_var() {
        env::set_var("TEST_VAR", "/usr/bin/test");
        let result = expand_env_vars("${TEST_VAR}/pdflatex");
        assert_eq!(result, "/usr/bin/test/pdflatex");
        env::remove_var("TEST_VAR");
    }

    #[test]
    #[serial]
    fn test_expand_env_vars_without_var() {
        env::remove_var("NONEXISTENT_VAR");
        let result = expand_env_vars("${NONEXISTENT_VAR}");
        assert_eq!(result, "${NONEXISTENT_VAR}");
    }

    #[test]
    fn test_expand_env_vars_no_expansion() {
        let result = expand_env_vars("/usr/bin/pdflatex");
        assert_eq!(result, "/usr/bin/pdflatex");
    }

    #[test]
    fn test_defaults() {
        let config = BuildConfig::default();
        assert_eq!(config.content_dir, "content");
        assert_eq!(config.tests_dir, "stress_tests");
        assert!(config.chapters.is_empty());
        assert_eq!(config.latex.compiler, "pdflatex");
        assert_eq!(config.latex.main_tex, "cpbook.tex");
        assert_eq!(config.latex.output, "cpbook.pdf");
        assert_eq!(config.tests.interpreter, "python3");
        assert_eq!(config.tests.timeout_secs, 120);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig::load(dir.path()).unwrap();
        assert_eq!(config.content_dir, "content");
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "chapters = [\"graph\", \"string\"]\n\n[tests]\ntimeout_secs = 5\n",
        )
        .unwrap();

        let config = BuildConfig::load(dir.path()).unwrap();
        assert_eq!(config.chapters, vec!["graph", "string"]);
        assert_eq!(config.tests.timeout_secs, 5);
        // Unspecified sections keep their defaults
        assert_eq!(config.latex.compiler, "pdflatex");
    }

    #[test]
    fn test_rejects_shell_metacharacters() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[tests]\ninterpreter = \"python3; rm -rf /\"\n",
        )
        .unwrap();

        let result = BuildConfig::load(dir.path());
        assert!(result.is_err(), "Metacharacters should be rejected");
    }

    #[test]
    fn test_rejects_parent_traversal() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[latex]\ncompiler = \"../evil/pdflatex\"\n",
        )
        .unwrap();

        let result = BuildConfig::load(dir.path());
        assert!(result.is_err(), "Traversal should be rejected");
    }
}
