//! Text rewriting with literal or regex rules.

use crate::error::Result;
use crate::rule::ConcreteRule;
use regex::{Captures, Regex, RegexBuilder};
use tracing::error;

/// A compiled rule, ready to be applied to any number of texts.
#[derive(Debug, Clone)]
pub struct TextTransform {
    kind: TextTransformKind,
}

#[derive(Debug, Clone)]
enum TextTransformKind {
    Literal {
        needle: String,
        replacement: String,
    },
    Regex {
        pattern: Regex,
        replacement: String,
    },
    Filtered {
        filter: Regex,
        pattern: Regex,
        replacement: String,
    },
}

impl TextTransform {
    /// Creates a literal substring replacement.
    pub fn literal(needle: &str, replacement: &str) -> Self {
        Self {
            kind: TextTransformKind::Literal {
                needle: needle.to_string(),
                replacement: replacement.to_string(),
            },
        }
    }

    /// Creates a global regex substitution.
    pub fn regex(pattern: &str, replacement: &str) -> Result<Self> {
        Ok(Self {
            kind: TextTransformKind::Regex {
                pattern: Regex::new(pattern)?,
                replacement: replacement.to_string(),
            },
        })
    }

    /// Creates a regex substitution confined to the regions matched by `filter`.
    ///
    /// The filter's `.` also matches newlines, so a region may span lines.
    pub fn filtered(filter: &str, pattern: &str, replacement: &str) -> Result<Self> {
        Ok(Self {
            kind: TextTransformKind::Filtered {
                filter: RegexBuilder::new(filter).dot_matches_new_line(true).build()?,
                pattern: Regex::new(pattern)?,
                replacement: replacement.to_string(),
            },
        })
    }

    /// Compiles a concrete rule. Fails only on an invalid regex.
    pub fn from_rule(rule: &ConcreteRule) -> Result<Self> {
        if rule.literal {
            return Ok(Self::literal(&rule.search, &rule.replace));
        }
        match rule.filter.as_deref() {
            Some(filter) if !filter.is_empty() => {
                Self::filtered(filter, &rule.search, &rule.replace)
            }
            _ => Self::regex(&rule.search, &rule.replace),
        }
    }

    /// Rewrites `source`, returning the new text and the number of replacements.
    ///
    /// With a filter, each matched region is rewritten in isolation and the
    /// first occurrence of that region's original text is then replaced. A
    /// region whose text also appears earlier in the file therefore edits
    /// that earlier copy.
    pub fn rewrite(&self, source: &str) -> (String, usize) {
        match &self.kind {
            TextTransformKind::Literal {
                needle,
                replacement,
            } => {
                let count = source.matches(needle.as_str()).count();
                if count == 0 {
                    return (source.to_string(), 0);
                }
                (source.replace(needle.as_str(), replacement), count)
            }
            TextTransformKind::Regex {
                pattern,
                replacement,
            } => substitute(pattern, replacement, source),
            TextTransformKind::Filtered {
                filter,
                pattern,
                replacement,
            } => {
                let regions: Vec<&str> = filter.find_iter(source).map(|m| m.as_str()).collect();
                let mut text = source.to_string();
                let mut total = 0;
                for region in regions {
                    let (rewritten, count) = substitute(pattern, replacement, region);
                    text = text.replacen(region, &rewritten, 1);
                    total += count;
                }
                (text, total)
            }
        }
    }

    /// Returns a description of the transformation.
    pub fn describe(&self) -> String {
        match &self.kind {
            TextTransformKind::Literal {
                needle,
                replacement,
            } => format!("Replace literal '{}' with '{}'", needle, replacement),
            TextTransformKind::Regex {
                pattern,
                replacement,
            } => format!("Replace pattern '{}' with '{}'", pattern.as_str(), replacement),
            TextTransformKind::Filtered {
                filter,
                pattern,
                replacement,
            } => format!(
                "Replace pattern '{}' with '{}' inside '{}'",
                pattern.as_str(),
                replacement,
                filter.as_str()
            ),
        }
    }
}

fn substitute(pattern: &Regex, replacement: &str, text: &str) -> (String, usize) {
    let mut count = 0;
    let out = pattern.replace_all(text, |caps: &Captures<'_>| {
        count += 1;
        let mut dst = String::new();
        caps.expand(replacement, &mut dst);
        dst
    });
    (out.into_owned(), count)
}

/// Applies one rule to one text.
///
/// An invalid pattern is logged and leaves the text unchanged with a count of 0.
pub fn apply_rule(text: &str, rule: &ConcreteRule) -> (String, usize) {
    match TextTransform::from_rule(rule) {
        Ok(transform) => transform.rewrite(text),
        Err(e) => {
            error!(search = %rule.search, error = %e, "invalid regex pattern in rule");
            (text.to_string(), 0)
        }
    }
}
