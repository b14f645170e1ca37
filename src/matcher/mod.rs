//! Resolution of rules to the tracked files they target.

pub mod git;

pub use git::TrackedFiles;

use crate::rule::{ConcreteRule, RuleTarget};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::warn;

/// Maps each rule to tracked files, through its pathspec or its named scope.
pub struct FileSelector<'a> {
    root: PathBuf,
    tracked: TrackedFiles,
    scopes: &'a BTreeMap<String, String>,
}

impl<'a> FileSelector<'a> {
    /// Creates a selector for the repository working tree at `root`.
    pub fn new(root: impl Into<PathBuf>, scopes: &'a BTreeMap<String, String>) -> Self {
        let root = root.into();
        let tracked = TrackedFiles::open(&root);
        Self {
            root,
            tracked,
            scopes,
        }
    }

    /// Returns the files a rule applies to, joined onto the root.
    ///
    /// A rule without a target, or naming an unknown scope, yields nothing
    /// and logs a warning.
    pub fn files_for_rule(&self, rule: &ConcreteRule) -> Vec<PathBuf> {
        let pattern = match rule.target() {
            Some(RuleTarget::PathGlob(glob)) => glob,
            Some(RuleTarget::Scope(name)) => match self.scopes.get(name) {
                Some(glob) if !glob.is_empty() => glob.as_str(),
                _ => {
                    warn!(scope = %name, rule = %rule, "unknown scope in rule; skipping");
                    return Vec::new();
                }
            },
            None => {
                warn!(rule = %rule, "rule missing both 'path_glob' and 'scope'; skipping");
                return Vec::new();
            }
        };

        self.tracked
            .ls_files(pattern)
            .into_iter()
            .map(|rel| self.root.join(rel))
            .collect()
    }
}
