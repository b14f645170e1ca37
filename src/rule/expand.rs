//! Expansion of rule templates into concrete rules.

use super::placeholder::APP;
use super::{ConcreteRule, Placeholders, RawRule};
use tracing::{info, warn};

/// Expands raw rules into a flat, ordered list of concrete rules.
///
/// Rules without `search` (or with an empty one) or without `replace` are
/// skipped with a warning. Package-level tokens are substituted first; a rule
/// still mentioning `{app}` afterwards is forked once per app, in app order,
/// and the copies stay contiguous in the output.
pub fn expand_rules(raw_rules: &[RawRule], placeholders: &Placeholders) -> Vec<ConcreteRule> {
    let mut expanded = Vec::new();

    for raw in raw_rules {
        let (search, replace) = match (raw.search.as_deref(), raw.replace.as_deref()) {
            (Some(search), Some(replace)) if !search.is_empty() => (search, replace),
            _ => {
                warn!(rule = %raw, "skipping invalid rule (missing search/replace)");
                continue;
            }
        };

        let search = placeholders.apply(search);
        let replace = placeholders.apply(replace);
        let concrete = |search: String, replace: String| ConcreteRule {
            search,
            replace,
            literal: raw.literal,
            filter: raw.filter.clone(),
            scope: raw.scope.clone(),
            path_glob: raw.path_glob.clone(),
        };

        let mentions_app = search.contains(APP) || replace.contains(APP);
        if mentions_app && !placeholders.apps().is_empty() {
            for app in placeholders.apps() {
                expanded.push(concrete(search.replace(APP, app), replace.replace(APP, app)));
            }
        } else {
            expanded.push(concrete(search, replace));
        }
    }

    info!(
        raw = raw_rules.len(),
        concrete = expanded.len(),
        "expanded rules into concrete rules"
    );
    expanded
}
