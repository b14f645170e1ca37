//! # packagify
//!
//! Rule-driven text rewriting for turning an upstream Django project into an
//! installable, namespaced package.
//!
//! The crate provides:
//! - Loading a YAML rule file with placeholders, named scopes and per-app expansion
//! - Selecting version-control-tracked files per rule
//! - Applying literal, regex and filtered rewrites concurrently, with a dry-run mode
//! - Restructuring a fresh upstream clone into a nested package and scaffolding it from templates
//! - Committing the result to a sync branch and force-pushing it to a fork
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use packagify::prelude::*;
//!
//! // Rewrite the current working tree in place, without touching disk
//! let config = Config::load("search-and-replace.yml")?;
//! let result = Refactor::in_repo(".", config)
//!     .dry_run(true)
//!     .apply()?;
//!
//! println!(
//!     "scanned {} files, {} file(s) would change",
//!     result.report.files_scanned, result.report.files_changed
//! );
//! # Ok::<(), packagify::error::PackagifyError>(())
//! ```
//!
//! ## Syncing an upstream release
//!
//! ```rust,no_run
//! use packagify::prelude::*;
//!
//! let config = Config::load("search-and-replace.yml")?;
//! let report = UpstreamSync::new("v2.1.0", config)
//!     .workspace(".")
//!     .templates("templates")
//!     .run()?;
//!
//! println!("package written to {}", report.package_root.display());
//! # Ok::<(), packagify::error::PackagifyError>(())
//! ```
//!
//! ## Rules
//!
//! A rule either names a `scope` from the `scopes` table or gives a
//! `path_glob` directly. `{app}` in a rule forks it once per configured app;
//! the other placeholders (`{package_name}`, `{package_name_upper}`, `{PackageName}`,
//! `{package_verbose_name}`, `{package_name_kebab}`, `{apps_list}`, `{version}`)
//! are substituted once.
//!
//! ```yaml
//! package_name: my_site
//! apps: [blog, events]
//! scopes:
//!   python: "*.py"
//! rules:
//!   - search: "from {app}."
//!     replace: "from {package_name}.{app}."
//!     literal: true
//!     scope: python
//! ```

pub mod config;
pub mod diff;
pub mod error;
pub mod git;
pub mod matcher;
pub mod processor;
pub mod refactor;
pub mod rule;
pub mod sync;
pub mod template;
pub mod transform;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{Config, TextExtensions};
    pub use crate::diff::{DiffSummary, unified_diff};
    pub use crate::error::{PackagifyError, Result};
    pub use crate::git::{
        BranchOps, CloneOps, CommitOps, GitAuth, GitCli, GitOps, PushOps,
    };
    pub use crate::matcher::{FileSelector, TrackedFiles};
    pub use crate::processor::{FileProcessor, ProcessReport, WorkPlan};
    pub use crate::refactor::{Refactor, RefactorResult};
    pub use crate::rule::{ConcreteRule, Placeholders, RawRule, RuleTarget, expand_rules};
    pub use crate::sync::{SyncReport, SyncState, UpstreamSync};
    pub use crate::template::TemplateMaterializer;
    pub use crate::transform::{FileChange, FileOperation, TextTransform, apply_rule};
}

pub use prelude::*;
