//! Parallel application of rules to files.
//!
//! Every `(file, rule)` pair is an independent unit: read the whole file,
//! rewrite it, write it back. Units run on a bounded rayon pool in no
//! particular order. A unit holds its file's lock for the whole cycle, so two
//! rules hitting the same file apply one after the other in either order.

use crate::config::TextExtensions;
use crate::diff::{DiffSummary, unified_diff};
use crate::error::Result;
use crate::matcher::FileSelector;
use crate::rule::ConcreteRule;
use crate::transform::{FileChange, TextTransform};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, error, info};

/// Files to process, each with the indices of the rules targeting it.
#[derive(Debug, Default)]
pub struct WorkPlan {
    rules: Vec<ConcreteRule>,
    files: BTreeMap<PathBuf, Vec<usize>>,
}

impl WorkPlan {
    /// Resolves every rule to its files, keeping only text files.
    pub fn build(
        rules: Vec<ConcreteRule>,
        selector: &FileSelector<'_>,
        text_extensions: &TextExtensions,
    ) -> Self {
        let mut files: BTreeMap<PathBuf, Vec<usize>> = BTreeMap::new();

        for (idx, rule) in rules.iter().enumerate() {
            for path in selector.files_for_rule(rule) {
                if !text_extensions.is_text(&path) {
                    continue;
                }
                files.entry(path).or_default().push(idx);
            }
        }

        info!(files = files.len(), "found files to process");
        Self { rules, files }
    }

    /// Builds a plan from explicit file-to-rules assignments.
    pub fn from_assignments(
        rules: Vec<ConcreteRule>,
        assignments: impl IntoIterator<Item = (PathBuf, Vec<usize>)>,
    ) -> Self {
        let files = assignments
            .into_iter()
            .map(|(path, idxs)| {
                let idxs = idxs.into_iter().filter(|i| *i < rules.len()).collect::<Vec<_>>();
                (path, idxs)
            })
            .collect();
        Self { rules, files }
    }

    pub fn rules(&self) -> &[ConcreteRule] {
        &self.rules
    }

    /// Number of distinct files in the plan.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Number of `(file, rule)` units.
    pub fn unit_count(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }
}

/// Aggregated outcome of a processing run.
#[derive(Debug, Default, Clone)]
pub struct ProcessReport {
    pub files_scanned: usize,
    pub files_changed: usize,
    pub replacements: usize,
    /// Units that failed to read, write, or panicked.
    pub failures: usize,
    /// Files that were, or in dry-run would be, changed. Sorted.
    pub changed: Vec<PathBuf>,
    pub summary: DiffSummary,
}

#[derive(Debug, Default)]
struct Tally {
    changed: BTreeSet<PathBuf>,
    replacements: usize,
    failures: usize,
    summary: DiffSummary,
}

impl Tally {
    fn record(mut self, outcome: UnitOutcome) -> Self {
        match outcome {
            UnitOutcome::Unchanged => {}
            UnitOutcome::Changed {
                path,
                replacements,
                summary,
            } => {
                self.changed.insert(path);
                self.replacements += replacements;
                self.summary.merge(&summary);
            }
            UnitOutcome::Failed => self.failures += 1,
        }
        self
    }

    fn merge(mut self, other: Tally) -> Self {
        self.changed.extend(other.changed);
        self.replacements += other.replacements;
        self.failures += other.failures;
        self.summary.merge(&other.summary);
        self
    }
}

enum UnitOutcome {
    Unchanged,
    Changed {
        path: PathBuf,
        replacements: usize,
        summary: DiffSummary,
    },
    Failed,
}

/// Applies a [`WorkPlan`] on a bounded worker pool.
#[derive(Debug, Clone)]
pub struct FileProcessor {
    jobs: usize,
    dry_run: bool,
}

impl Default for FileProcessor {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            dry_run: false,
        }
    }
}

/// Worker count matching the available hardware parallelism.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl FileProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the worker count; `None` or 0 keeps the default.
    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        if let Some(jobs) = jobs.filter(|j| *j > 0) {
            self.jobs = jobs;
        }
        self
    }

    /// Computes every change but writes nothing.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Runs every unit of the plan and aggregates the results.
    ///
    /// Only a failure to start the worker pool is an error. Invalid rules,
    /// unreadable or unwritable files, and panicking units are logged and
    /// counted without stopping the run.
    pub fn process(&self, plan: &WorkPlan) -> Result<ProcessReport> {
        let transforms: Vec<Option<TextTransform>> = plan
            .rules
            .iter()
            .map(|rule| match TextTransform::from_rule(rule) {
                Ok(t) => Some(t),
                Err(e) => {
                    error!(search = %rule.search, error = %e, "invalid regex pattern in rule");
                    None
                }
            })
            .collect();

        let units: Vec<(&Path, usize)> = plan
            .files
            .iter()
            .flat_map(|(path, idxs)| idxs.iter().map(move |i| (path.as_path(), *i)))
            .collect();

        let locks: BTreeMap<&Path, Mutex<()>> = plan
            .files
            .keys()
            .map(|path| (path.as_path(), Mutex::new(())))
            .collect();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .thread_name(|i| format!("packagify-worker-{i}"))
            .build()?;

        debug!(jobs = self.jobs, units = units.len(), "processing");

        let tally = pool.install(|| {
            units
                .par_iter()
                .fold(Tally::default, |tally, (path, idx)| {
                    let Some(transform) = &transforms[*idx] else {
                        return tally;
                    };
                    let rule = &plan.rules[*idx];
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        let _guard = locks
                            .get(path)
                            .map(|lock| lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner()));
                        self.apply_unit(path, rule, transform)
                    }))
                    .unwrap_or_else(|_| {
                        error!(path = %path.display(), "worker failed");
                        UnitOutcome::Failed
                    });
                    tally.record(outcome)
                })
                .reduce(Tally::default, Tally::merge)
        });

        let files_changed = tally.changed.len();
        let mut summary = tally.summary;
        summary.files_changed = files_changed;

        Ok(ProcessReport {
            files_scanned: plan.file_count(),
            files_changed,
            replacements: tally.replacements,
            failures: tally.failures,
            changed: tally.changed.into_iter().collect(),
            summary,
        })
    }

    fn apply_unit(&self, path: &Path, rule: &ConcreteRule, transform: &TextTransform) -> UnitOutcome {
        let original = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to read");
                return UnitOutcome::Failed;
            }
        };

        let (transformed, replacements) = transform.rewrite(&original);
        if replacements == 0 {
            return UnitOutcome::Unchanged;
        }

        info!(
            path = %path.display(),
            count = replacements,
            "{} replacement(s) for {:?} -> {:?}",
            replacements,
            rule.search,
            rule.replace
        );

        let change = FileChange {
            path: path.to_path_buf(),
            original,
            transformed,
            replacements,
        };
        let summary = DiffSummary::from_diff(&change.original, &change.transformed);

        if self.dry_run {
            debug!(
                "DRY-RUN: not writing changes\n{}",
                unified_diff(&change.original, &change.transformed, path)
            );
        } else if let Err(e) = change.apply() {
            error!(path = %path.display(), error = %e, "failed to write");
            return UnitOutcome::Failed;
        }

        UnitOutcome::Changed {
            path: change.path,
            replacements,
            summary,
        }
    }
}
