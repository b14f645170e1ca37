//! Placeholder tokens resolved once per run.

use crate::config::Config;

pub const APP: &str = "{app}";
pub const PACKAGE_NAME: &str = "{package_name}";
pub const PACKAGE_NAME_UPPER: &str = "{package_name_upper}";
pub const PACKAGE_NAME_PASCAL: &str = "{PackageName}";
pub const PACKAGE_VERBOSE_NAME: &str = "{package_verbose_name}";
pub const PACKAGE_NAME_KEBAB: &str = "{package_name_kebab}";
pub const VERSION: &str = "{version}";
pub const APPS_LIST: &str = "{apps_list}";

/// Concrete values for every placeholder token.
///
/// `{app}` is not part of [`Placeholders::apply`]: it forks a rule into one
/// copy per app and is handled by the expander.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholders {
    package_name: String,
    apps: Vec<String>,
    version: Option<String>,
}

impl Placeholders {
    /// Creates placeholders for a package without a known version.
    pub fn new(package_name: impl Into<String>, apps: Vec<String>) -> Self {
        Self {
            package_name: package_name.into(),
            apps,
            version: None,
        }
    }

    /// Creates placeholders from a loaded configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.package_name.clone(), config.apps.clone())
    }

    /// Sets the version from a tag, dropping leading `v`s.
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.version = Some(tag.trim_start_matches('v').to_string());
        self
    }

    pub fn package_name(&self) -> &str {
        &self.package_name
    }

    pub fn apps(&self) -> &[String] {
        &self.apps
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// `my_site` -> `MY_SITE`
    pub fn upper(&self) -> String {
        self.package_name.to_uppercase()
    }

    /// `my_site` -> `MySite`
    pub fn pascal(&self) -> String {
        self.package_name.split('_').map(capitalize).collect()
    }

    /// `my_site` -> `My Site`
    pub fn verbose_name(&self) -> String {
        title_case(&self.package_name.replace('_', " "))
    }

    /// `my_site` -> `my-site`
    pub fn kebab(&self) -> String {
        self.package_name.replace('_', "-")
    }

    /// `["blog", "events"]`
    pub fn apps_list(&self) -> String {
        let items: Vec<String> = self
            .apps
            .iter()
            .map(|app| serde_json::Value::String(app.clone()).to_string())
            .collect();
        format!("[{}]", items.join(", "))
    }

    /// Substitutes every package-level token in `text`.
    ///
    /// The longer `{package_name_*}` tokens go first. `{version}` is left as is
    /// when no tag is known.
    pub fn apply(&self, text: &str) -> String {
        let mut out = text
            .replace(PACKAGE_NAME_UPPER, &self.upper())
            .replace(PACKAGE_NAME_KEBAB, &self.kebab())
            .replace(PACKAGE_VERBOSE_NAME, &self.verbose_name())
            .replace(PACKAGE_NAME_PASCAL, &self.pascal())
            .replace(PACKAGE_NAME, &self.package_name)
            .replace(APPS_LIST, &self.apps_list());
        if let Some(version) = &self.version {
            out = out.replace(VERSION, version);
        }
        out
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

// Uppercases the first letter after any non-letter, lowercases the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
