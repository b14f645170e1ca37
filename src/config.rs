//! YAML configuration for sync and refactor runs.

use crate::error::{PackagifyError, Result};
use crate::rule::RawRule;
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, info};

/// Package name used when the configuration does not set one.
pub const DEFAULT_PACKAGE_NAME: &str = "sites_faciles";

/// Extensions treated as text when `text_extensions` is absent or empty.
pub const DEFAULT_TEXT_EXTENSIONS: [&str; 18] = [
    ".py", ".html", ".htm", ".txt", ".md", ".csv", ".json", ".yaml", ".yml", ".po", ".ini",
    ".cfg", ".rst", ".xml", ".js", ".ts", ".css", ".scss",
];

/// Top-level configuration file.
///
/// # Example YAML
///
/// ```yaml
/// package_name: sites_faciles
/// apps:
///   - blog
///   - events
/// scopes:
///   python: "*.py"
///   templates: "*.html"
/// rules:
///   - search: "from {app}."
///     replace: "from {package_name}.{app}."
///     literal: true
///     scope: python
///   - search: "{% extends \"([a-z_]+)/"
///     replace: "{% extends \"{package_name}_$1/"
///     path_glob: "*/templates/*.html"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// App names, in the order `{app}` rules are expanded.
    #[serde(deserialize_with = "null_as_default")]
    pub apps: Vec<String>,

    /// Name of the generated package.
    pub package_name: String,

    /// Named aliases for file-matching patterns.
    #[serde(deserialize_with = "null_as_default")]
    pub scopes: BTreeMap<String, String>,

    /// Raw rule templates, before placeholder expansion.
    #[serde(deserialize_with = "null_as_default")]
    pub rules: Vec<RawRule>,

    /// Overrides the default text extension allow-list.
    #[serde(deserialize_with = "null_as_default")]
    pub text_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            apps: Vec::new(),
            package_name: DEFAULT_PACKAGE_NAME.to_string(),
            scopes: BTreeMap::new(),
            rules: Vec::new(),
            text_extensions: Vec::new(),
        }
    }
}

/// Deserializes an explicit `null` as the type's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Config {
    /// Loads the configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading rules");

        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                PackagifyError::ConfigNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                PackagifyError::ConfigRead {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        Self::from_yaml(&content).map_err(|source| PackagifyError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parses a configuration from YAML text. An empty document is an empty configuration.
    pub fn from_yaml(content: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Returns the effective text extension allow-list.
    pub fn text_extensions(&self) -> TextExtensions {
        let exts = if self.text_extensions.is_empty() {
            TextExtensions::new(DEFAULT_TEXT_EXTENSIONS)
        } else {
            TextExtensions::new(&self.text_extensions)
        };
        debug!(extensions = ?exts.0, "text extensions");
        exts
    }
}

/// Allow-list of file extensions, stored with a leading dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextExtensions(BTreeSet<String>);

impl TextExtensions {
    /// Builds an allow-list; entries without a leading dot get one.
    pub fn new(exts: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        Self(
            exts.into_iter()
                .map(|e| {
                    let e = e.as_ref();
                    if e.starts_with('.') {
                        e.to_string()
                    } else {
                        format!(".{e}")
                    }
                })
                .collect(),
        )
    }

    /// Returns true if the path's final extension is in the allow-list.
    pub fn is_text(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.0.contains(&format!(".{e}")))
    }
}

impl Default for TextExtensions {
    fn default() -> Self {
        Self::new(DEFAULT_TEXT_EXTENSIONS)
    }
}
