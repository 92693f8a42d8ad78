//! Command-line entry point for the notebook build tool.

use anyhow::Result;
use clap::{Parser, Subcommand};
use cpbook_build::runner::RunOptions;
use cpbook_build::{clean, pipeline, reporting, runner, scanner, BuildConfig};
use std::path::PathBuf;
use std::process::exit;
use std::time::Duration;

/// Build and utility tool for the competitive programming notebook.
#[derive(Parser)]
#[command(
    name = "cpbook-build",
    version,
    about = "Generate the notebook PDF, run its stress tests, and clean build artifacts."
)]
struct Cli {
    /// Project root holding the content and test directories
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Raise log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse the content tree and generate the PDF notebook
    Pdf,

    /// Discover and run the stress tests
    Test {
        /// Stop at the first failing test instead of running everything
        #[arg(long, conflicts_with = "summary")]
        fail_fast: bool,

        /// Run every test and report the totals at the end (the default)
        #[arg(long)]
        summary: bool,

        /// Tests to run concurrently; 0 means one per available core
        #[arg(long)]
        jobs: Option<usize>,

        /// Per-test time limit in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Remove build artifacts and generated files
    Clean,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = BuildConfig::load(&cli.root)?;

    match cli.command {
        Command::Pdf => {
            pipeline::build_pdf(&cli.root, &config).await?;
            Ok(())
        }
        Command::Test {
            fail_fast,
            jobs,
            timeout,
            ..
        } => {
            if let Some(jobs) = jobs {
                config.tests.jobs = jobs;
            }
            if let Some(timeout) = timeout {
                config.tests.timeout_secs = timeout;
            }

            let units = scanner::discover_tests(
                &cli.root,
                &config.tests_dir,
                &config.tests.utilities_dir,
            )?;
            let options = RunOptions {
                interpreter: config.tests.interpreter.clone(),
                cwd: cli.root.clone(),
                jobs: config.jobs(),
                timeout: Duration::from_secs(config.tests.timeout_secs),
                fail_fast,
            };

            let results = runner::run_tests(units, &options).await?;
            let summary = reporting::report_results(&results, fail_fast);
            match summary.failed.first() {
                Some(first) if fail_fast => {
                    anyhow::bail!("test failed: {}", first.display())
                }
                Some(_) => anyhow::bail!(
                    "{} of {} test(s) failed",
                    summary.failed.len(),
                    summary.total
                ),
                None => Ok(()),
            }
        }
        Command::Clean => clean::clean(&cli.root, &config),
    }
}
