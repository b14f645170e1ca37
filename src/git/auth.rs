//! Git authentication configuration.

use crate::error::{PackagifyError, Result};
use std::path::PathBuf;

/// Authentication method for git remote operations.
#[derive(Debug, Clone, Default)]
pub enum GitAuth {
    /// SSH key authentication.
    SshKey {
        private_key_path: PathBuf,
        passphrase: Option<String>,
    },
    /// Token-based authentication (for HTTPS).
    Token(String),
    /// Use system credential helper.
    CredentialHelper,
    /// SSH agent, or no credentials at all.
    #[default]
    None,
}

impl GitAuth {
    /// Create SSH key auth from the default location (~/.ssh/id_ed25519 or ~/.ssh/id_rsa).
    pub fn ssh_default() -> Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| PackagifyError::GitAuth {
            message: "Could not determine home directory".into(),
        })?;

        for key in ["id_ed25519", "id_rsa"] {
            let path = home.join(".ssh").join(key);
            if path.exists() {
                return Ok(Self::ssh_key(path));
            }
        }

        Err(PackagifyError::GitAuth {
            message: "No SSH key found at ~/.ssh/id_ed25519 or ~/.ssh/id_rsa".into(),
        })
    }

    /// Create SSH key auth with a specific key path.
    pub fn ssh_key(path: impl Into<PathBuf>) -> Self {
        Self::SshKey {
            private_key_path: path.into(),
            passphrase: None,
        }
    }

    /// Create token auth from an environment variable.
    pub fn from_env(var_name: &str) -> Result<Self> {
        let token = std::env::var(var_name).map_err(|_| PackagifyError::GitAuth {
            message: format!("Environment variable {} not set", var_name),
        })?;
        Ok(Self::Token(token))
    }

    /// Picks credentials suited to a remote URL.
    ///
    /// HTTPS remotes use `GITHUB_TOKEN` when set and the credential helper
    /// otherwise. Other remotes use the SSH agent, falling back to a default key.
    pub fn for_url(url: &str) -> Self {
        if url.starts_with("https://") || url.starts_with("http://") {
            Self::from_env("GITHUB_TOKEN").unwrap_or(Self::CredentialHelper)
        } else if std::env::var_os("SSH_AUTH_SOCK").is_some() {
            Self::None
        } else {
            Self::ssh_default().unwrap_or_default()
        }
    }
}
