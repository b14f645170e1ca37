//! Text rewriting and directory restructuring.

pub mod file;
pub mod text;

pub use file::{FileOperation, rename_template_dirs};
pub use text::{TextTransform, apply_rule};

use crate::error::Result;
use std::path::PathBuf;

/// The outcome of applying one rule to one file.
#[derive(Debug, Clone)]
pub struct FileChange {
    pub path: PathBuf,
    pub original: String,
    pub transformed: String,
    pub replacements: usize,
}

impl FileChange {
    /// Returns true if the rule replaced anything.
    pub fn is_modified(&self) -> bool {
        self.replacements > 0
    }

    /// Writes the transformed content to disk.
    pub fn apply(&self) -> Result<()> {
        if self.is_modified() {
            std::fs::write(&self.path, &self.transformed)?;
        }
        Ok(())
    }
}
