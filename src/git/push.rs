//! Git remotes and pushes with authentication.

use crate::error::{PackagifyError, Result};
use crate::git::{GitAuth, GitOps};
use git2::{Cred, PushOptions, RemoteCallbacks};

/// Remote operations for GitOps.
pub trait PushOps {
    /// Force-push a local branch to the same name on a remote.
    fn force_push(&self, remote_name: &str, branch: &str) -> Result<()>;

    /// Get the URL for a remote.
    fn remote_url(&self, remote_name: &str) -> Result<String>;

    /// Check if a remote exists.
    fn remote_exists(&self, remote_name: &str) -> bool;

    /// Add a remote, or repoint it if the name is already taken.
    fn add_remote(&self, remote_name: &str, url: &str) -> Result<()>;
}

impl PushOps for GitOps {
    fn force_push(&self, remote_name: &str, branch: &str) -> Result<()> {
        let mut remote = self.repo.find_remote(remote_name).map_err(|_| {
            PackagifyError::PushError {
                message: format!("Remote '{}' not found", remote_name),
            }
        })?;

        let refspec = format!("+refs/heads/{}:refs/heads/{}", branch, branch);

        let mut callbacks = RemoteCallbacks::new();
        self.setup_auth_callbacks(&mut callbacks);

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        remote
            .push(&[&refspec], Some(&mut push_options))
            .map_err(|e| PackagifyError::PushError {
                message: format!("Push failed: {}", e),
            })?;

        Ok(())
    }

    fn remote_url(&self, remote_name: &str) -> Result<String> {
        let remote = self.repo.find_remote(remote_name)?;
        remote.url().map(String::from).ok_or_else(|| {
            PackagifyError::InvalidConfig(format!("Remote '{}' has no URL", remote_name))
        })
    }

    fn remote_exists(&self, remote_name: &str) -> bool {
        self.repo.find_remote(remote_name).is_ok()
    }

    fn add_remote(&self, remote_name: &str, url: &str) -> Result<()> {
        if self.remote_exists(remote_name) {
            self.repo.remote_set_url(remote_name, url)?;
        } else {
            self.repo.remote(remote_name, url)?;
        }
        Ok(())
    }
}

impl GitOps {
    fn setup_auth_callbacks(&self, callbacks: &mut RemoteCallbacks<'_>) {
        let auth = self.auth.clone();

        callbacks.credentials(move |url, username_from_url, allowed_types| match &auth {
            GitAuth::SshKey {
                private_key_path,
                passphrase,
            } => {
                let username = username_from_url.unwrap_or("git");
                Cred::ssh_key(username, None, private_key_path, passphrase.as_deref())
            }
            GitAuth::Token(token) => Cred::userpass_plaintext(token, ""),
            GitAuth::CredentialHelper => {
                if allowed_types.contains(git2::CredentialType::USER_PASS_PLAINTEXT) {
                    Cred::credential_helper(&git2::Config::open_default()?, url, username_from_url)
                } else if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                    Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
                } else {
                    Cred::default()
                }
            }
            GitAuth::None => {
                if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                    Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
                } else {
                    Cred::default()
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::test_support::init_repo;
    use crate::git::{BranchOps, CommitOps};
    use git2::Repository;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_add_remote_and_url() {
        let dir = TempDir::new().unwrap();
        init_repo(dir.path(), &[("a.txt", "a")]);
        let git = GitOps::open(dir.path()).unwrap();

        assert!(!git.remote_exists("fork"));
        git.add_remote("fork", "git@example.com:org/one.git").unwrap();
        assert_eq!(git.remote_url("fork").unwrap(), "git@example.com:org/one.git");

        git.add_remote("fork", "git@example.com:org/two.git").unwrap();
        assert_eq!(git.remote_url("fork").unwrap(), "git@example.com:org/two.git");
    }

    #[test]
    fn test_force_push_to_local_bare_remote() {
        let dir = TempDir::new().unwrap();
        let work = dir.path().join("work");
        let bare = dir.path().join("remote.git");
        fs::create_dir_all(&work).unwrap();
        init_repo(&work, &[("a.txt", "a")]);
        Repository::init_bare(&bare).unwrap();

        let git = GitOps::open(&work).unwrap();
        git.create_and_checkout("upstream-v1").unwrap();
        fs::write(work.join("a.txt"), "b").unwrap();
        git.stage_all().unwrap();
        let oid = git.commit("change").unwrap();

        git.add_remote("fork", bare.to_str().unwrap()).unwrap();
        git.force_push("fork", "upstream-v1").unwrap();

        let remote_repo = Repository::open_bare(&bare).unwrap();
        let pushed = remote_repo
            .find_reference("refs/heads/upstream-v1")
            .unwrap()
            .target()
            .unwrap();
        assert_eq!(pushed, oid);
    }

    #[test]
    fn test_push_unknown_remote() {
        let dir = TempDir::new().unwrap();
        init_repo(dir.path(), &[("a.txt", "a")]);
        let git = GitOps::open(dir.path()).unwrap();

        assert!(matches!(
            git.force_push("missing", "main"),
            Err(PackagifyError::PushError { .. })
        ));
    }
}
