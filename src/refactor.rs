//! In-place rewriting of a working tree.

use crate::config::Config;
use crate::error::Result;
use crate::matcher::FileSelector;
use crate::processor::{FileProcessor, ProcessReport, WorkPlan};
use crate::rule::{Placeholders, expand_rules};
use crate::transform::{FileOperation, rename_template_dirs};
use std::path::PathBuf;
use tracing::warn;

/// The result of a refactor run.
#[derive(Debug, Clone)]
pub struct RefactorResult {
    pub report: ProcessReport,
    /// Template directory moves that were performed, or would be in dry-run.
    pub renamed: Vec<FileOperation>,
    pub dry_run: bool,
}

/// Applies the configured rules to a working tree, then renames app template directories.
///
/// # Example
///
/// ```rust,no_run
/// use packagify::prelude::*;
///
/// let config = Config::load("search-and-replace.yml")?;
/// let result = Refactor::in_repo(".", config).dry_run(true).apply()?;
/// println!("{} file(s) would change", result.report.files_changed);
/// # Ok::<(), packagify::error::PackagifyError>(())
/// ```
pub struct Refactor {
    root: PathBuf,
    config: Config,
    placeholders: Placeholders,
    jobs: Option<usize>,
    dry_run: bool,
}

impl Refactor {
    /// Creates a refactor rooted at the given path.
    pub fn in_repo(path: impl Into<PathBuf>, config: Config) -> Self {
        let placeholders = Placeholders::from_config(&config);
        Self {
            root: path.into(),
            config,
            placeholders,
            jobs: None,
            dry_run: false,
        }
    }

    /// Overrides the placeholder values, e.g. to add a version.
    pub fn placeholders(mut self, placeholders: Placeholders) -> Self {
        self.placeholders = placeholders;
        self
    }

    /// Sets the number of worker threads.
    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Enables dry-run mode (compute everything, write nothing).
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Applies the rules and returns the aggregated result.
    pub fn apply(self) -> Result<RefactorResult> {
        let text_extensions = self.config.text_extensions();
        let rules = expand_rules(&self.config.rules, &self.placeholders);

        let selector = FileSelector::new(&self.root, &self.config.scopes);
        let plan = WorkPlan::build(rules, &selector, &text_extensions);

        let report = FileProcessor::new()
            .jobs(self.jobs)
            .dry_run(self.dry_run)
            .process(&plan)?;

        warn!(
            "Finished replacements{}: scanned {} files, {} file(s) changed",
            if self.dry_run { " (dry-run)" } else { "" },
            report.files_scanned,
            report.files_changed
        );

        let renamed = if self.config.apps.is_empty() {
            Vec::new()
        } else {
            rename_template_dirs(
                &self.root,
                &self.config.apps,
                &self.config.package_name,
                self.dry_run,
            )
        };

        Ok(RefactorResult {
            report,
            renamed,
            dry_run: self.dry_run,
        })
    }
}
