//! Version-control operations.
//!
//! Local repository work (tracked files, branches, commits, remotes, pushes)
//! goes through `git2`. Shallow clones at a tag are delegated to the `git`
//! binary via [`GitCli`], behind the [`CloneOps`] seam.

mod auth;
mod branch;
pub mod cli;
mod commit;
mod push;

pub use auth::GitAuth;
pub use branch::BranchOps;
pub use cli::{CloneOps, CommandOutput, GitCli};
pub use commit::CommitOps;
pub use push::PushOps;

use crate::error::Result;
use git2::Repository;
use std::path::Path;

/// Git operations wrapper with write capabilities.
///
/// # Example
///
/// ```rust,no_run
/// use packagify::git::{GitOps, GitAuth, BranchOps, CommitOps, PushOps};
///
/// let git = GitOps::open("./sites_faciles_temp")?
///     .with_auth(GitAuth::ssh_default()?);
///
/// git.create_and_checkout("upstream-v2.1.0")?;
/// git.stage_all()?;
/// git.commit("chore: sync sites_faciles with upstream v2.1.0")?;
/// git.force_push("fork", "upstream-v2.1.0")?;
/// # Ok::<(), packagify::error::PackagifyError>(())
/// ```
pub struct GitOps {
    repo: Repository,
    auth: GitAuth,
}

impl GitOps {
    /// Open an existing repository.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let repo = Repository::open(path.as_ref())?;
        Ok(Self {
            repo,
            auth: GitAuth::None,
        })
    }

    /// Discover and open a repository from a path within it.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self> {
        let repo = Repository::discover(path.as_ref())?;
        Ok(Self {
            repo,
            auth: GitAuth::None,
        })
    }

    /// Set authentication method for remote operations.
    pub fn with_auth(mut self, auth: GitAuth) -> Self {
        self.auth = auth;
        self
    }
}
