//! Expansion of a template tree into a package skeleton.
//!
//! Any file whose name contains [`TEMPLATE_MARKER`] is a template. Its output
//! name drops the marker (`apps.template.py` -> `apps.py`) and its content has
//! every package-level placeholder substituted. Top-level templates producing
//! one of [`ROOT_FILES`] land in the package root; everything else lands in
//! the nested package directory, keeping its relative subdirectory.

use crate::rule::Placeholders;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

/// Filename infix that marks a template.
pub const TEMPLATE_MARKER: &str = ".template";

/// Output names that belong at the package root when their template is top-level.
pub const ROOT_FILES: [&str; 4] = ["pyproject.toml", "README.md", "MANIFEST.in", "LICENSE"];

/// Writes the templates under a source directory into a package layout.
pub struct TemplateMaterializer<'a> {
    source: PathBuf,
    placeholders: &'a Placeholders,
}

impl<'a> TemplateMaterializer<'a> {
    pub fn new(source: impl Into<PathBuf>, placeholders: &'a Placeholders) -> Self {
        Self {
            source: source.into(),
            placeholders,
        }
    }

    /// Output filename for a template filename, or `None` for a non-template.
    pub fn output_name(file_name: &str) -> Option<String> {
        file_name
            .contains(TEMPLATE_MARKER)
            .then(|| file_name.replacen(TEMPLATE_MARKER, "", 1))
    }

    /// Where a template at `rel` (relative to the source) is written.
    pub fn destination(
        rel: &Path,
        output_name: &str,
        package_root: &Path,
        package_dir: &Path,
    ) -> PathBuf {
        let subdir = rel.parent().unwrap_or(Path::new(""));
        if subdir.as_os_str().is_empty() && ROOT_FILES.contains(&output_name) {
            package_root.join(output_name)
        } else {
            package_dir.join(subdir).join(output_name)
        }
    }

    /// Expands every template and returns the files written.
    ///
    /// A missing source directory is only a warning. Failures on individual
    /// templates are logged and skipped.
    pub fn materialize(&self, package_root: &Path, package_dir: &Path) -> Vec<PathBuf> {
        if !self.source.is_dir() {
            warn!(path = %self.source.display(), "templates directory not found");
            return Vec::new();
        }

        let mut written = Vec::new();

        for entry in WalkDir::new(&self.source).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "cannot read template entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy();
            let Some(output_name) = Self::output_name(&file_name) else {
                debug!(path = %path.display(), "not a template, skipping");
                continue;
            };

            let rel = path.strip_prefix(&self.source).unwrap_or(path);
            let dest = Self::destination(rel, &output_name, package_root, package_dir);

            match self.render(path, &dest) {
                Ok(()) => {
                    info!(from = %rel.display(), to = %dest.display(), "created from template");
                    written.push(dest);
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "failed to expand template");
                }
            }
        }

        written
    }

    fn render(&self, template: &Path, dest: &Path) -> std::io::Result<()> {
        let content = fs::read_to_string(template)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest, self.placeholders.apply(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn placeholders() -> Placeholders {
        Placeholders::new("my_site", vec!["blog".into()]).with_tag("v1.2.3")
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_output_name() {
        assert_eq!(
            TemplateMaterializer::output_name("apps.template.py").as_deref(),
            Some("apps.py")
        );
        assert_eq!(
            TemplateMaterializer::output_name("pyproject.toml.template").as_deref(),
            Some("pyproject.toml")
        );
        assert_eq!(TemplateMaterializer::output_name("models.py"), None);
    }

    #[test]
    fn test_destination_rules() {
        let root = Path::new("pkg");
        let nested = Path::new("pkg/pkg");

        assert_eq!(
            TemplateMaterializer::destination(Path::new("README.md.template"), "README.md", root, nested),
            PathBuf::from("pkg/README.md")
        );
        assert_eq!(
            TemplateMaterializer::destination(Path::new("apps.template.py"), "apps.py", root, nested),
            PathBuf::from("pkg/pkg/apps.py")
        );
        // Root names only count at the top level.
        assert_eq!(
            TemplateMaterializer::destination(
                Path::new("docs/README.md.template"),
                "README.md",
                root,
                nested
            ),
            PathBuf::from("pkg/pkg/docs/README.md")
        );
    }

    #[test]
    fn test_materialize_tree() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write(src.path(), "apps.template.py", "class {PackageName}AppConfig:\n    name = \"{package_name}\"\n");
        write(src.path(), "pyproject.toml.template", "name = \"{package_name_kebab}\"\nversion = \"{version}\"\n");
        write(src.path(), "content_manager/apps.template.py", "label = \"{package_name}_content_manager\"\n");
        write(src.path(), "management/commands/migrate_from_sites_faciles.py", "untouched");

        let root = out.path().join("my_site");
        let nested = root.join("my_site");
        let p = placeholders();
        let written = TemplateMaterializer::new(src.path(), &p).materialize(&root, &nested);

        assert_eq!(written.len(), 3);
        assert_eq!(
            fs::read_to_string(nested.join("apps.py")).unwrap(),
            "class MySiteAppConfig:\n    name = \"my_site\"\n"
        );
        assert_eq!(
            fs::read_to_string(root.join("pyproject.toml")).unwrap(),
            "name = \"my-site\"\nversion = \"1.2.3\"\n"
        );
        assert_eq!(
            fs::read_to_string(nested.join("content_manager/apps.py")).unwrap(),
            "label = \"my_site_content_manager\"\n"
        );
        assert!(!nested.join("management").exists());
    }

    #[test]
    fn test_materialize_is_idempotent() {
        let src = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        write(src.path(), "utils/models.template.py", "{package_verbose_name}");

        let p = placeholders();
        let m = TemplateMaterializer::new(src.path(), &p);
        m.materialize(out.path(), out.path());
        let written = m.materialize(out.path(), out.path());

        assert_eq!(written, vec![out.path().join("utils/models.py")]);
        assert_eq!(fs::read_to_string(&written[0]).unwrap(), "My Site");
    }

    #[test]
    fn test_missing_templates_dir() {
        let out = TempDir::new().unwrap();
        let p = placeholders();
        let written = TemplateMaterializer::new(out.path().join("nope"), &p)
            .materialize(out.path(), out.path());
        assert!(written.is_empty());
    }
}
