//! Synchronisation of an upstream release into a nested package.
//!
//! A sync moves through a fixed sequence of states:
//!
//! ```text
//! Init -> Cloned -> Rewritten -> Restructured -> Committed -> Cleaned -> Done
//!                       |
//!                       +-- dry-run stops here
//! ```
//!
//! Any fatal error moves the run to `Failed`. Clone failures and I/O errors
//! while restructuring are fatal. Commit and push problems are reported as
//! warnings and the run carries on to cleanup.

use crate::config::Config;
use crate::error::Result;
use crate::git::{BranchOps, CloneOps, CommitOps, GitAuth, GitCli, GitOps, PushOps};
use crate::processor::ProcessReport;
use crate::refactor::Refactor;
use crate::rule::Placeholders;
use crate::template::TemplateMaterializer;
use crate::transform::FileOperation;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Upstream repository used when none is given.
pub const DEFAULT_REPO_URL: &str = "git@github.com:numerique-gouv/sites-faciles.git";

/// Remote that receives the sync branch.
pub const FORK_REMOTE: &str = "fork";

/// Entries removed from the nested package once the sync is committed.
pub const CLEANUP_ENTRIES: [&str; 5] = [".git", ".github", "pyproject.toml", "setup.py", "setup.cfg"];

/// Where a sync run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Init,
    Cloned,
    Rewritten,
    Restructured,
    Committed,
    Cleaned,
    Done,
    Failed,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncState::Init => "init",
            SyncState::Cloned => "cloned",
            SyncState::Rewritten => "rewritten",
            SyncState::Restructured => "restructured",
            SyncState::Committed => "committed",
            SyncState::Cleaned => "cleaned",
            SyncState::Done => "done",
            SyncState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What a sync run did.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub tag: String,
    pub state: SyncState,
    pub dry_run: bool,
    pub report: ProcessReport,
    pub package_root: PathBuf,
    pub package_dir: PathBuf,
    /// Files produced from templates.
    pub templates: Vec<PathBuf>,
    /// Branch holding the sync commit, if one was made.
    pub branch: Option<String>,
    pub pushed: bool,
}

/// Orchestrates clone, rewrite, restructure, commit and cleanup for one tag.
///
/// # Example
///
/// ```rust,no_run
/// use packagify::prelude::*;
///
/// let config = Config::load("search-and-replace.yml")?;
/// let report = UpstreamSync::new("v2.1.0", config).workspace(".").dry_run(true).run()?;
/// println!("{} file(s) would change", report.report.files_changed);
/// # Ok::<(), packagify::error::PackagifyError>(())
/// ```
pub struct UpstreamSync<C = GitCli> {
    tag: String,
    config: Config,
    repo_url: String,
    workspace: PathBuf,
    templates: Option<PathBuf>,
    jobs: Option<usize>,
    dry_run: bool,
    cloner: C,
}

impl UpstreamSync<GitCli> {
    /// Creates a sync of `tag` using the `git` binary for cloning.
    pub fn new(tag: impl Into<String>, config: Config) -> Self {
        Self {
            tag: tag.into(),
            config,
            repo_url: DEFAULT_REPO_URL.to_string(),
            workspace: PathBuf::from("."),
            templates: None,
            jobs: None,
            dry_run: false,
            cloner: GitCli::default(),
        }
    }
}

impl<C: CloneOps> UpstreamSync<C> {
    /// Replaces the clone implementation.
    pub fn cloner<D: CloneOps>(self, cloner: D) -> UpstreamSync<D> {
        UpstreamSync {
            tag: self.tag,
            config: self.config,
            repo_url: self.repo_url,
            workspace: self.workspace,
            templates: self.templates,
            jobs: self.jobs,
            dry_run: self.dry_run,
            cloner,
        }
    }

    /// Sets the upstream repository URL.
    pub fn repo_url(mut self, url: impl Into<String>) -> Self {
        self.repo_url = url.into();
        self
    }

    /// Sets the directory in which the temporary clone and the package are created.
    pub fn workspace(mut self, path: impl Into<PathBuf>) -> Self {
        self.workspace = path.into();
        self
    }

    /// Sets the templates directory. Defaults to `templates/` in the workspace.
    pub fn templates(mut self, path: impl Into<PathBuf>) -> Self {
        self.templates = Some(path.into());
        self
    }

    /// Sets the number of worker threads.
    pub fn jobs(mut self, jobs: Option<usize>) -> Self {
        self.jobs = jobs;
        self
    }

    /// Enables dry-run mode.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Name of the branch that receives the sync commit.
    pub fn branch_name(&self) -> String {
        format!("upstream-{}", self.tag)
    }

    /// Message of the sync commit.
    pub fn commit_message(&self) -> String {
        format!(
            "chore: sync {} with upstream {}",
            self.config.package_name, self.tag
        )
    }

    fn temp_dir(&self) -> PathBuf {
        self.workspace
            .join(format!("{}_temp", self.config.package_name))
    }

    fn package_root(&self) -> PathBuf {
        self.workspace.join(&self.config.package_name)
    }

    /// Runs the sync to completion.
    pub fn run(self) -> Result<SyncReport> {
        let mut state = SyncState::Init;
        info!(tag = %self.tag, repo = %self.repo_url, state = %state, "starting sync");

        match self.execute(&mut state) {
            Ok(report) => Ok(report),
            Err(e) => {
                error!(from = %state, error = %e, "sync failed");
                advance(&mut state, SyncState::Failed);
                Err(e)
            }
        }
    }

    fn execute(&self, state: &mut SyncState) -> Result<SyncReport> {
        let temp_dir = self.temp_dir();
        let package_root = self.package_root();
        let package_dir = package_root.join(&self.config.package_name);

        if temp_dir.exists() {
            info!(path = %temp_dir.display(), "removing stale temporary clone");
            fs::remove_dir_all(&temp_dir)?;
        }

        if let Err(e) = self
            .cloner
            .shallow_clone(&self.repo_url, &self.tag, &temp_dir)
        {
            remove_quietly(&temp_dir);
            return Err(e);
        }
        advance(state, SyncState::Cloned);

        let placeholders = Placeholders::from_config(&self.config).with_tag(&self.tag);
        let rewritten = Refactor::in_repo(&temp_dir, self.config.clone())
            .placeholders(placeholders.clone())
            .jobs(self.jobs)
            .dry_run(self.dry_run)
            .apply();
        let rewritten = match rewritten {
            Ok(rewritten) => rewritten,
            Err(e) => {
                remove_quietly(&temp_dir);
                return Err(e);
            }
        };
        advance(state, SyncState::Rewritten);

        let mut report = SyncReport {
            tag: self.tag.clone(),
            state: *state,
            dry_run: self.dry_run,
            report: rewritten.report,
            package_root: package_root.clone(),
            package_dir: package_dir.clone(),
            templates: Vec::new(),
            branch: None,
            pushed: false,
        };

        if self.dry_run {
            warn!(
                path = %package_dir.display(),
                "[DRY-RUN] would create nested structure"
            );
            remove_quietly(&temp_dir);
            return Ok(report);
        }

        if package_root.exists() {
            info!(path = %package_root.display(), "replacing existing package directory");
            fs::remove_dir_all(&package_root)?;
        }
        FileOperation::CreateDir {
            path: package_root.clone(),
        }
        .execute()?;
        FileOperation::Move {
            from: temp_dir,
            to: package_dir.clone(),
        }
        .execute()?;

        let templates_dir = self
            .templates
            .clone()
            .unwrap_or_else(|| self.workspace.join("templates"));
        report.templates = TemplateMaterializer::new(templates_dir, &placeholders)
            .materialize(&package_root, &package_dir);
        advance(state, SyncState::Restructured);

        if package_dir.join(".git").exists() {
            let branch = self.branch_name();
            match self.commit(&package_dir, &branch) {
                Ok(()) => {
                    report.branch = Some(branch.clone());
                    advance(state, SyncState::Committed);
                    report.pushed = self.push(&package_dir, &branch);
                }
                Err(e) => warn!(error = %e, "could not commit sync"),
            }
        } else {
            warn!(path = %package_dir.display(), "no git repository in package, skipping commit");
        }

        cleanup(&package_dir);
        advance(state, SyncState::Cleaned);

        advance(state, SyncState::Done);
        warn!(tag = %self.tag, "Sync completed successfully!");
        report.state = *state;
        Ok(report)
    }

    fn commit(&self, package_dir: &Path, branch: &str) -> Result<()> {
        let git = GitOps::open(package_dir)?;
        git.create_and_checkout(branch)?;
        git.stage_all()?;
        let oid = git.commit(&self.commit_message())?;
        info!(branch = %branch, commit = %oid, "committed sync");
        Ok(())
    }

    /// Pushes the branch to the origin of the repository enclosing the workspace.
    fn push(&self, package_dir: &Path, branch: &str) -> bool {
        let origin = match GitOps::discover(&self.workspace).and_then(|git| git.remote_url("origin")) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "no origin remote for workspace, skipping push");
                return false;
            }
        };

        let pushed = GitOps::open(package_dir).and_then(|git| {
            let git = git.with_auth(GitAuth::for_url(&origin));
            git.add_remote(FORK_REMOTE, &origin)?;
            git.force_push(FORK_REMOTE, branch)
        });

        match pushed {
            Ok(()) => {
                info!(remote = %origin, branch = %branch, "pushed sync branch");
                true
            }
            Err(e) => {
                warn!(remote = %origin, error = %e, "could not push sync branch");
                false
            }
        }
    }
}

fn advance(state: &mut SyncState, next: SyncState) {
    info!(from = %state, to = %next, "sync state");
    *state = next;
}

fn remove_quietly(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_dir_all(path) {
            warn!(path = %path.display(), error = %e, "could not remove temporary clone");
        }
    }
}

fn cleanup(package_dir: &Path) {
    for name in CLEANUP_ENTRIES {
        let path = package_dir.join(name);
        if !path.exists() {
            continue;
        }
        let op = FileOperation::Delete { path };
        match op.execute() {
            Ok(()) => info!("{}", op.describe()),
            Err(e) => warn!(error = %e, "failed to {}", op.describe()),
        }
    }
}
