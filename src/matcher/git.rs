//! Tracked-file listing with `git ls-files <pathspec>` semantics.

use crate::error::Result;
use git2::{Pathspec, PathspecFlags, Repository};
use std::path::{Path, PathBuf};
use tracing::error;

/// Lists files tracked in the index of the repository containing `root`.
///
/// Paths are returned relative to `root`, and only files below `root` are
/// listed, like `git ls-files` run from inside that directory.
pub struct TrackedFiles {
    repo: Option<Repository>,
    prefix: PathBuf,
}

impl TrackedFiles {
    /// Opens the repository around `root`.
    ///
    /// Failing to find one is logged; every later query then returns nothing.
    pub fn open(root: &Path) -> Self {
        match Self::try_open(root) {
            Ok(tracked) => tracked,
            Err(e) => {
                error!(path = %root.display(), error = %e, "cannot list tracked files");
                Self {
                    repo: None,
                    prefix: PathBuf::new(),
                }
            }
        }
    }

    fn try_open(root: &Path) -> Result<Self> {
        let repo = Repository::discover(root)?;
        let prefix = match repo.workdir() {
            Some(workdir) => {
                let workdir = workdir.canonicalize()?;
                let root = root.canonicalize()?;
                root.strip_prefix(&workdir)
                    .map(Path::to_path_buf)
                    .unwrap_or_default()
            }
            None => PathBuf::new(),
        };
        Ok(Self {
            repo: Some(repo),
            prefix,
        })
    }

    /// Returns tracked files matching `pattern`, or every tracked file when it is empty.
    ///
    /// Errors are logged and yield an empty list.
    pub fn ls_files(&self, pattern: &str) -> Vec<PathBuf> {
        let Some(repo) = &self.repo else {
            return Vec::new();
        };
        match self.try_ls_files(repo, pattern) {
            Ok(files) => files,
            Err(e) => {
                error!(pattern = %pattern, error = %e, "ls-files failed");
                Vec::new()
            }
        }
    }

    fn try_ls_files(&self, repo: &Repository, pattern: &str) -> Result<Vec<PathBuf>> {
        let prefix = self.prefix.to_string_lossy().replace('\\', "/");
        let spec = match (prefix.is_empty(), pattern.is_empty()) {
            (true, _) => pattern.to_string(),
            (false, true) => prefix.clone(),
            (false, false) => format!("{prefix}/{pattern}"),
        };

        let index = repo.index()?;
        let paths: Vec<PathBuf> = if spec.is_empty() {
            index
                .iter()
                .map(|entry| PathBuf::from(String::from_utf8_lossy(&entry.path).into_owned()))
                .collect()
        } else {
            let pathspec = Pathspec::new(std::iter::once(spec.as_str()))?;
            let matches = pathspec.match_index(&index, PathspecFlags::DEFAULT)?;
            matches
                .entries()
                .map(|entry| PathBuf::from(String::from_utf8_lossy(entry).into_owned()))
                .collect()
        };

        Ok(paths
            .into_iter()
            .filter_map(|path| {
                path.strip_prefix(&self.prefix)
                    .ok()
                    .map(Path::to_path_buf)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::test_support::init_repo;
    use std::fs;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        init_repo(
            dir.path(),
            &[
                ("manage.py", "import blog"),
                ("blog/models.py", "class Post: pass"),
                ("blog/templates/blog/index.html", "<h1/>"),
                ("events/views.py", "def view(): pass"),
            ],
        );
        dir
    }

    #[test]
    fn test_ls_files_by_extension() {
        let dir = fixture();
        let tracked = TrackedFiles::open(dir.path());

        let mut files = tracked.ls_files("*.py");
        files.sort();

        assert_eq!(
            files,
            vec![
                PathBuf::from("blog/models.py"),
                PathBuf::from("events/views.py"),
                PathBuf::from("manage.py"),
            ]
        );
    }

    #[test]
    fn test_ls_files_directory_prefix() {
        let dir = fixture();
        let tracked = TrackedFiles::open(dir.path());

        let mut files = tracked.ls_files("blog");
        files.sort();

        assert_eq!(
            files,
            vec![
                PathBuf::from("blog/models.py"),
                PathBuf::from("blog/templates/blog/index.html"),
            ]
        );
    }

    #[test]
    fn test_untracked_files_are_not_listed() {
        let dir = fixture();
        fs::write(dir.path().join("untracked.py"), "x").unwrap();
        let tracked = TrackedFiles::open(dir.path());

        assert!(!tracked.ls_files("*.py").contains(&PathBuf::from("untracked.py")));
    }

    #[test]
    fn test_ls_files_from_subdirectory() {
        let dir = fixture();
        let tracked = TrackedFiles::open(&dir.path().join("blog"));

        let mut files = tracked.ls_files("*.py");
        files.sort();

        assert_eq!(files, vec![PathBuf::from("models.py")]);
    }

    #[test]
    fn test_empty_pattern_lists_everything() {
        let dir = fixture();
        let tracked = TrackedFiles::open(dir.path());
        assert_eq!(tracked.ls_files("").len(), 4);
    }

    #[test]
    fn test_empty_pattern_from_subdirectory() {
        let dir = fixture();
        let tracked = TrackedFiles::open(&dir.path().join("blog"));

        let mut files = tracked.ls_files("");
        files.sort();

        assert_eq!(
            files,
            vec![
                PathBuf::from("models.py"),
                PathBuf::from("templates/blog/index.html"),
            ]
        );
    }

    #[test]
    fn test_not_a_repository_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.py"), "x").unwrap();

        let tracked = TrackedFiles::open(dir.path());
        assert!(tracked.ls_files("*.py").is_empty());
    }
}
