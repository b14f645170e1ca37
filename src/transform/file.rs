//! Directory moves, removals and app template renaming.

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// A filesystem operation performed while restructuring a package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOperation {
    Move { from: PathBuf, to: PathBuf },
    Delete { path: PathBuf },
    CreateDir { path: PathBuf },
}

impl FileOperation {
    /// Executes the operation.
    pub fn execute(&self) -> Result<()> {
        match self {
            FileOperation::Move { from, to } => {
                if let Some(parent) = to.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::rename(from, to)?;
            }
            FileOperation::Delete { path } => {
                if path.is_dir() {
                    fs::remove_dir_all(path)?;
                } else {
                    fs::remove_file(path)?;
                }
            }
            FileOperation::CreateDir { path } => {
                fs::create_dir_all(path)?;
            }
        }
        Ok(())
    }

    /// Returns a description of the operation.
    pub fn describe(&self) -> String {
        match self {
            FileOperation::Move { from, to } => {
                format!("Move {} -> {}", from.display(), to.display())
            }
            FileOperation::Delete { path } => format!("Delete {}", path.display()),
            FileOperation::CreateDir { path } => format!("Create directory {}", path.display()),
        }
    }
}

/// Moves `{app}/templates/{app}` to `{app}/templates/{package_name}_{app}` under `root`.
///
/// An existing destination is never overwritten. In dry-run mode the moves are
/// only logged. Returns the moves that were performed, or would have been.
pub fn rename_template_dirs(
    root: &Path,
    apps: &[String],
    package_name: &str,
    dry_run: bool,
) -> Vec<FileOperation> {
    let mut moved = Vec::new();

    for app in apps {
        let templates = root.join(app).join("templates");
        let src = templates.join(app);
        let dst = templates.join(format!("{package_name}_{app}"));

        if !src.exists() {
            debug!(app = %app, path = %src.display(), "no template dir to move");
            continue;
        }

        if dst.exists() {
            warn!(path = %dst.display(), "destination already exists, skipping");
            continue;
        }

        let op = FileOperation::Move { from: src, to: dst };
        if dry_run {
            info!("[DRY-RUN] would {}", op.describe());
        } else {
            info!("{}", op.describe());
            if let Err(e) = op.execute() {
                error!(error = %e, "failed to {}", op.describe());
                continue;
            }
        }
        moved.push(op);
    }

    moved
}
