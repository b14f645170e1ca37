//! CLI for packagify.

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use packagify::prelude::*;
use packagify::sync::DEFAULT_REPO_URL;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "packagify")]
#[command(author, version, about = "Turn an upstream project into a namespaced package", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct CommonArgs {
    /// Path to the YAML rules file
    #[arg(short, long, default_value = "search-and-replace.yml")]
    config: PathBuf,

    /// Preview changes without writing anything
    #[arg(long)]
    dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of worker threads (defaults to available parallelism)
    #[arg(short, long)]
    jobs: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone an upstream tag, rewrite it and restructure it into a package
    Sync {
        /// Upstream tag or branch to sync
        tag: String,

        /// Upstream repository URL
        #[arg(long, default_value = DEFAULT_REPO_URL)]
        repo: String,

        /// Directory holding the package templates
        #[arg(long, default_value = "templates")]
        templates: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Apply the rules to the current working tree in place
    Refactor {
        #[command(flatten)]
        common: CommonArgs,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        let _ = Cli::command().print_help();
        return ExitCode::from(EXIT_FAILURE);
    };

    let verbose = match &command {
        Commands::Sync { common, .. } | Commands::Refactor { common } => common.verbose,
    };
    init_logging(verbose);

    let outcome = match command {
        Commands::Sync {
            tag,
            repo,
            templates,
            common,
        } => cmd_sync(tag, repo, templates, common),
        Commands::Refactor { common } => cmd_refactor(common),
    };

    if let Err(e) = &outcome {
        eprintln!("Error: {e:#}");
    }
    ExitCode::from(exit_status(&outcome))
}

const EXIT_CONFIG: u8 = 2;
const EXIT_FAILURE: u8 = 1;

/// Maps a command outcome to the process exit status.
fn exit_status(outcome: &Result<()>) -> u8 {
    match outcome {
        Ok(()) => 0,
        Err(e) => {
            let config_error = e
                .downcast_ref::<PackagifyError>()
                .is_some_and(PackagifyError::is_config_error);
            if config_error { EXIT_CONFIG } else { EXIT_FAILURE }
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_sync(tag: String, repo: String, templates: PathBuf, common: CommonArgs) -> Result<()> {
    let config = Config::load(&common.config)?;
    let workspace = std::env::current_dir().context("Failed to resolve current directory")?;

    let report = UpstreamSync::new(&tag, config)
        .repo_url(&repo)
        .workspace(&workspace)
        .templates(templates)
        .jobs(common.jobs)
        .dry_run(common.dry_run)
        .run()
        .with_context(|| format!("Sync of {tag} from {repo} failed"))?;

    print_summary(&report.report, report.dry_run);

    if report.dry_run {
        println!(
            "\nDry run complete. Would create {}",
            report.package_dir.display()
        );
    } else {
        println!("\nPackage created at {}", report.package_root.display());
        if !report.templates.is_empty() {
            println!("{} file(s) created from templates", report.templates.len());
        }
        if let Some(branch) = &report.branch {
            let pushed = if report.pushed { "pushed" } else { "not pushed" };
            println!("Committed to branch {branch} ({pushed})");
        }
        println!("Sync completed successfully!");
    }

    Ok(())
}

fn cmd_refactor(common: CommonArgs) -> Result<()> {
    let config = Config::load(&common.config)?;
    let root = std::env::current_dir().context("Failed to resolve current directory")?;

    let result = Refactor::in_repo(root, config)
        .jobs(common.jobs)
        .dry_run(common.dry_run)
        .apply()
        .context("Refactor failed")?;

    print_summary(&result.report, result.dry_run);

    for op in &result.renamed {
        println!("  {}", op.describe());
    }

    if result.dry_run {
        println!("\nDry run complete. No files were modified.");
    } else {
        println!("\nRefactor complete.");
    }

    Ok(())
}

fn print_summary(report: &ProcessReport, dry_run: bool) {
    let label = if dry_run { " (dry-run)" } else { "" };
    println!(
        "Finished replacements{label}: scanned {} files, {} file(s) changed",
        report.files_scanned, report.files_changed
    );

    if report.files_changed > 0 {
        println!("{}", report.summary);
        for path in &report.changed {
            println!("  {}", path.display());
        }
    }
    if report.failures > 0 {
        println!("{} unit(s) failed, see log for details", report.failures);
    }
}
