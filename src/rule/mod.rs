//! Search/replace rules and their scope qualifiers.
//!
//! Rules are read from the configuration as [`RawRule`] templates that may
//! contain placeholder tokens. The expander in [`expand`] turns them into
//! [`ConcreteRule`]s, which the selector and the text engine consume.

pub mod expand;
pub mod placeholder;

pub use expand::expand_rules;
pub use placeholder::Placeholders;

use serde::Deserialize;
use std::fmt;

/// A rule as written in the configuration file.
///
/// `search` and `replace` stay optional so that an incomplete rule can be
/// reported and skipped instead of failing the whole configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RawRule {
    pub search: Option<String>,
    pub replace: Option<String>,
    #[serde(deserialize_with = "crate::config::null_as_default")]
    pub literal: bool,
    pub filter: Option<String>,
    pub scope: Option<String>,
    pub path_glob: Option<String>,
}

impl fmt::Display for RawRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{search: {:?}, replace: {:?}, scope: {:?}, path_glob: {:?}}}",
            self.search, self.replace, self.scope, self.path_glob
        )
    }
}

/// A rule with every placeholder resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConcreteRule {
    /// Substring (literal mode) or regular expression.
    pub search: String,
    /// Replacement text, or a regex substitution template (`$1`, `${name}`).
    pub replace: String,
    /// Selects substring replacement instead of regex substitution.
    pub literal: bool,
    /// Confines regex substitution to the regions this pattern matches.
    pub filter: Option<String>,
    /// Name of an entry in the scope table.
    pub scope: Option<String>,
    /// Pathspec that takes precedence over `scope`.
    pub path_glob: Option<String>,
}

/// Where a rule looks for files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleTarget<'a> {
    PathGlob(&'a str),
    Scope(&'a str),
}

impl ConcreteRule {
    /// Creates a regex rule targeting the given pathspec.
    pub fn regex(search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            replace: replace.into(),
            literal: false,
            filter: None,
            scope: None,
            path_glob: None,
        }
    }

    /// Creates a literal rule.
    pub fn literal(search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            literal: true,
            ..Self::regex(search, replace)
        }
    }

    /// Sets the filter pattern.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Sets the named scope.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Sets the direct pathspec.
    pub fn with_path_glob(mut self, glob: impl Into<String>) -> Self {
        self.path_glob = Some(glob.into());
        self
    }

    /// Returns the rule's file target; `path_glob` wins over `scope`.
    pub fn target(&self) -> Option<RuleTarget<'_>> {
        match (self.path_glob.as_deref(), self.scope.as_deref()) {
            (Some(glob), _) if !glob.is_empty() => Some(RuleTarget::PathGlob(glob)),
            (_, Some(scope)) if !scope.is_empty() => Some(RuleTarget::Scope(scope)),
            _ => None,
        }
    }
}

impl fmt::Display for ConcreteRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} -> {:?}", self.search, self.replace)?;
        if self.literal {
            write!(f, " (literal)")?;
        }
        Ok(())
    }
}
