//! Git branch operations.

use crate::error::{PackagifyError, Result};
use crate::git::GitOps;
use git2::build::CheckoutBuilder;

/// Branch operations for GitOps.
pub trait BranchOps {
    /// Create a new branch at HEAD. Works from a detached HEAD.
    fn create_branch(&self, name: &str) -> Result<()>;

    /// Checkout an existing branch.
    fn checkout_branch(&self, name: &str) -> Result<()>;

    /// Create and checkout a new branch (or checkout if it exists).
    fn create_and_checkout(&self, name: &str) -> Result<()>;

    /// Check if a branch exists locally.
    fn branch_exists(&self, name: &str) -> bool;

    /// Get the current branch name.
    fn current_branch(&self) -> Result<String>;
}

impl BranchOps for GitOps {
    fn create_branch(&self, name: &str) -> Result<()> {
        let head = self.repo.head()?;
        let commit = head.peel_to_commit()?;
        self.repo.branch(name, &commit, false)?;
        Ok(())
    }

    fn checkout_branch(&self, name: &str) -> Result<()> {
        let refname = format!("refs/heads/{}", name);

        let reference =
            self.repo
                .find_reference(&refname)
                .map_err(|_| PackagifyError::BranchError {
                    message: format!("Branch '{}' not found", name),
                })?;

        let obj = reference.peel(git2::ObjectType::Commit)?;
        // Keeps uncommitted edits and deletions in the working tree.
        let mut checkout = CheckoutBuilder::new();
        checkout.safe();
        self.repo.checkout_tree(&obj, Some(&mut checkout))?;
        self.repo.set_head(&refname)?;

        Ok(())
    }

    fn create_and_checkout(&self, name: &str) -> Result<()> {
        if !self.branch_exists(name) {
            self.create_branch(name)?;
        }
        self.checkout_branch(name)
    }

    fn branch_exists(&self, name: &str) -> bool {
        self.repo.find_branch(name, git2::BranchType::Local).is_ok()
    }

    fn current_branch(&self) -> Result<String> {
        let head = self.repo.head()?;

        if head.is_branch() {
            head.shorthand()
                .map(String::from)
                .ok_or_else(|| PackagifyError::BranchError {
                    message: "HEAD has no shorthand name".into(),
                })
        } else {
            Err(PackagifyError::BranchError {
                message: "HEAD is not pointing to a branch (detached HEAD state)".into(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::test_support::init_repo;
    use tempfile::TempDir;

    #[test]
    fn test_create_and_checkout() {
        let dir = TempDir::new().unwrap();
        init_repo(dir.path(), &[("a.txt", "a")]);
        let git = GitOps::open(dir.path()).unwrap();

        assert!(!git.branch_exists("upstream-v1.0.0"));
        git.create_and_checkout("upstream-v1.0.0").unwrap();

        assert!(git.branch_exists("upstream-v1.0.0"));
        assert_eq!(git.current_branch().unwrap(), "upstream-v1.0.0");
    }

    #[test]
    fn test_create_from_detached_head() {
        let dir = TempDir::new().unwrap();
        let repo = init_repo(dir.path(), &[("a.txt", "a")]);
        let head = repo.head().unwrap().target().unwrap();
        repo.set_head_detached(head).unwrap();

        let git = GitOps::open(dir.path()).unwrap();
        assert!(git.current_branch().is_err());

        git.create_and_checkout("sync").unwrap();
        assert_eq!(git.current_branch().unwrap(), "sync");
    }

    #[test]
    fn test_checkout_keeps_working_tree_edits() {
        let dir = TempDir::new().unwrap();
        init_repo(dir.path(), &[("a.txt", "a"), ("b.txt", "b")]);
        std::fs::write(dir.path().join("a.txt"), "rewritten").unwrap();
        std::fs::remove_file(dir.path().join("b.txt")).unwrap();

        let git = GitOps::open(dir.path()).unwrap();
        git.create_and_checkout("upstream-v2.0.0").unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.txt")).unwrap(),
            "rewritten"
        );
        assert!(!dir.path().join("b.txt").exists());
    }

    #[test]
    fn test_checkout_missing_branch() {
        let dir = TempDir::new().unwrap();
        init_repo(dir.path(), &[("a.txt", "a")]);
        let git = GitOps::open(dir.path()).unwrap();

        assert!(matches!(
            git.checkout_branch("nope"),
            Err(PackagifyError::BranchError { .. })
        ));
    }
}
