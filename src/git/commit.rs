//! Git commit operations.

use crate::error::Result;
use crate::git::GitOps;
use git2::{IndexAddOption, Signature};

/// Commit operations for GitOps.
pub trait CommitOps {
    /// Stage all changes (new, modified, deleted files).
    fn stage_all(&self) -> Result<()>;

    /// Create a commit with the staged changes on top of HEAD.
    fn commit(&self, message: &str) -> Result<git2::Oid>;

    /// Check if there are staged changes.
    fn has_staged_changes(&self) -> Result<bool>;
}

impl CommitOps for GitOps {
    fn stage_all(&self) -> Result<()> {
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        // Picks up deletions
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<git2::Oid> {
        let signature = self.get_signature()?;

        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;

        Ok(oid)
    }

    fn has_staged_changes(&self) -> Result<bool> {
        let head = self.repo.head()?.peel_to_tree()?;
        let diff = self.repo.diff_tree_to_index(Some(&head), None, None)?;
        Ok(diff.deltas().count() > 0)
    }
}

impl GitOps {
    fn get_signature(&self) -> Result<Signature<'_>> {
        self.repo.signature().or_else(|_| {
            // Fallback signature for automation
            Signature::now("packagify", "packagify@automated.local").map_err(|e| e.into())
        })
    }
}
