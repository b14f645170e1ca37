//! Integration tests for the packagify crate.

use git2::{IndexAddOption, Repository, Signature};
use packagify::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const BASE_RULES: &str = r#"
package_name: my_site
apps: [blog, events]
scopes:
  python: "*.py"
  html: "*.html"
rules:
  - search: "from {app}."
    replace: "from {package_name}.{app}."
    literal: true
    scope: python
  - search: '"{app}/'
    replace: '"{package_name}_{app}/'
    literal: true
    scope: html
  - search: "Sites faciles"
    replace: "{package_verbose_name}"
    literal: true
    path_glob: "README.md"
  - search: "href=\"/old/\""
    replace: "href=\"/new/\""
    filter: "<nav>.*?</nav>"
    scope: html
  - replace: "orphan"
    scope: python
  - search: "anything"
    replace: "nothing"
    scope: nonexistent
"#;

const VERSION_RULE: &str = r#"
  - search: 'VERSION = "[^"]*"'
    replace: 'VERSION = "{version}"'
    path_glob: "config/*.py"
"#;

fn sync_rules() -> Config {
    Config::from_yaml(&format!("{BASE_RULES}{VERSION_RULE}")).unwrap()
}

fn upstream_files() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "blog/models.py",
            "from blog.utils import slugify\nfrom events.models import Event\n",
        ),
        ("events/models.py", "from events.utils import when\n"),
        (
            "blog/templates/blog/index.html",
            "{% extends \"blog/base.html\" %}\n<nav><a href=\"/old/\">x</a></nav>\n<a href=\"/old/\">y</a>\n",
        ),
        ("events/templates/events/list.html", "<ul></ul>\n"),
        ("config/settings.py", "VERSION = \"0.0.0\"\n"),
        ("README.md", "# Sites faciles\n"),
        ("logo.png", "from blog.binary"),
        ("setup.py", "setup()\n"),
        ("pyproject.toml", "[project]\nname = \"sites-faciles\"\n"),
        (".github/workflows/ci.yml", "on: push\n"),
    ]
}

/// Writes `files` under `root` and commits them in a fresh repository.
fn commit_tree(root: &Path, files: &[(&str, &str)]) -> Repository {
    for (rel, content) in files {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    let repo = Repository::init(root).unwrap();
    {
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("Upstream", "upstream@example.com").unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
            .unwrap();
    }
    repo
}

fn write_templates(root: &Path) {
    let templates = root.join("templates");
    fs::create_dir_all(templates.join("blog")).unwrap();
    fs::write(
        templates.join("pyproject.toml.template"),
        "[project]\nname = \"{package_name_kebab}\"\nversion = \"{version}\"\n",
    )
    .unwrap();
    fs::write(
        templates.join("apps.template.py"),
        "class {PackageName}Config:\n    name = \"{package_name}\"\n    apps = {apps_list}\n",
    )
    .unwrap();
    fs::write(
        templates.join("blog/apps.template.py"),
        "label = \"{package_name}_blog\"\n",
    )
    .unwrap();
    fs::write(templates.join("notes.txt"), "not a template").unwrap();
}

/// Clones by committing the upstream fixture into the target directory.
struct FixtureUpstream;

impl CloneOps for FixtureUpstream {
    fn shallow_clone(&self, _url: &str, _reference: &str, target: &Path) -> Result<()> {
        commit_tree(target, &upstream_files());
        Ok(())
    }
}

#[test]
fn test_refactor_in_place() {
    let dir = TempDir::new().unwrap();
    commit_tree(dir.path(), &upstream_files());
    let config = Config::from_yaml(BASE_RULES).unwrap();

    let result = Refactor::in_repo(dir.path(), config)
        .jobs(Some(4))
        .apply()
        .unwrap();

    // Five text files matched a targeted rule; logo.png is never touched.
    assert_eq!(result.report.files_scanned, 7);
    assert_eq!(result.report.files_changed, 4);
    assert_eq!(result.report.failures, 0);

    assert_eq!(
        fs::read_to_string(dir.path().join("blog/models.py")).unwrap(),
        "from my_site.blog.utils import slugify\nfrom my_site.events.models import Event\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("README.md")).unwrap(),
        "# My Site\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("logo.png")).unwrap(),
        "from blog.binary"
    );

    let index = dir.path().join("blog/templates/my_site_blog/index.html");
    assert_eq!(
        fs::read_to_string(index).unwrap(),
        "{% extends \"my_site_blog/base.html\" %}\n<nav><a href=\"/new/\">x</a></nav>\n<a href=\"/old/\">y</a>\n"
    );
    assert!(dir.path().join("events/templates/my_site_events/list.html").exists());
    assert_eq!(result.renamed.len(), 2);
}

#[test]
fn test_refactor_leaves_version_token_alone() {
    let dir = TempDir::new().unwrap();
    commit_tree(dir.path(), &upstream_files());

    Refactor::in_repo(dir.path(), sync_rules()).apply().unwrap();

    assert_eq!(
        fs::read_to_string(dir.path().join("config/settings.py")).unwrap(),
        "VERSION = \"{version}\"\n"
    );
}

#[test]
fn test_sync_builds_package() {
    let ws = TempDir::new().unwrap();
    write_templates(ws.path());

    let report = UpstreamSync::new("v1.2.3", sync_rules())
        .cloner(FixtureUpstream)
        .workspace(ws.path())
        .templates(ws.path().join("templates"))
        .jobs(Some(2))
        .run()
        .unwrap();

    assert_eq!(report.state, SyncState::Done);
    assert!(!report.dry_run);
    assert_eq!(report.report.files_changed, 5);
    assert_eq!(report.templates.len(), 3);
    assert_eq!(report.branch.as_deref(), Some("upstream-v1.2.3"));

    let root = ws.path().join("my_site");
    let nested = root.join("my_site");
    assert_eq!(report.package_root, root);
    assert_eq!(report.package_dir, nested);

    assert_eq!(
        fs::read_to_string(nested.join("config/settings.py")).unwrap(),
        "VERSION = \"1.2.3\"\n"
    );
    assert_eq!(
        fs::read_to_string(nested.join("events/models.py")).unwrap(),
        "from my_site.events.utils import when\n"
    );
    assert!(nested.join("blog/templates/my_site_blog/index.html").exists());

    // Templates: root allow-list at the package root, the rest nested.
    assert_eq!(
        fs::read_to_string(root.join("pyproject.toml")).unwrap(),
        "[project]\nname = \"my-site\"\nversion = \"1.2.3\"\n"
    );
    assert_eq!(
        fs::read_to_string(nested.join("apps.py")).unwrap(),
        "class MySiteConfig:\n    name = \"my_site\"\n    apps = [\"blog\", \"events\"]\n"
    );
    assert_eq!(
        fs::read_to_string(nested.join("blog/apps.py")).unwrap(),
        "label = \"my_site_blog\"\n"
    );
    assert!(!nested.join("notes.txt").exists());

    // Upstream metadata does not leak into the package.
    for leaked in [".git", ".github", "setup.py", "pyproject.toml"] {
        assert!(!nested.join(leaked).exists(), "{leaked} left in package");
    }
    assert!(!ws.path().join("my_site_temp").exists());
}

#[test]
fn test_sync_replaces_stale_state() {
    let ws = TempDir::new().unwrap();
    fs::create_dir_all(ws.path().join("my_site_temp/leftover")).unwrap();
    fs::create_dir_all(ws.path().join("my_site/old")).unwrap();

    let report = UpstreamSync::new("v1.2.3", sync_rules())
        .cloner(FixtureUpstream)
        .workspace(ws.path())
        .run()
        .unwrap();

    assert_eq!(report.state, SyncState::Done);
    assert!(!ws.path().join("my_site/old").exists());
    assert!(!ws.path().join("my_site/my_site/leftover").exists());
    // No templates directory in the workspace: nothing scaffolded, still done.
    assert!(report.templates.is_empty());
}

#[test]
fn test_sync_dry_run_matches_real_counts() {
    let dry_ws = TempDir::new().unwrap();
    let real_ws = TempDir::new().unwrap();
    write_templates(dry_ws.path());
    write_templates(real_ws.path());

    let dry = UpstreamSync::new("v1.2.3", sync_rules())
        .cloner(FixtureUpstream)
        .workspace(dry_ws.path())
        .dry_run(true)
        .run()
        .unwrap();

    let real = UpstreamSync::new("v1.2.3", sync_rules())
        .cloner(FixtureUpstream)
        .workspace(real_ws.path())
        .run()
        .unwrap();

    assert!(dry.dry_run);
    assert_eq!(dry.state, SyncState::Rewritten);
    assert_eq!(dry.report.files_scanned, real.report.files_scanned);
    assert_eq!(dry.report.files_changed, real.report.files_changed);
    assert_eq!(dry.report.changed.len(), real.report.changed.len());

    assert!(!dry_ws.path().join("my_site").exists());
    assert!(dry.templates.is_empty());
    assert!(dry.branch.is_none());
    let entries: Vec<_> = fs::read_dir(dry_ws.path())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(entries, vec![std::ffi::OsString::from("templates")]);
}

#[test]
fn test_missing_config_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let err = Config::load(dir.path().join("search-and-replace.yml")).unwrap_err();
    assert!(err.is_config_error());
    assert!(matches!(err, PackagifyError::ConfigNotFound { .. }));
}
