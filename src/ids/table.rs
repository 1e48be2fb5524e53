use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::{Captures, Match, Regex};

/// `id="..."` / `id='...'` in attribute position.
///
/// Shared with the declaration rewrite pass so the table and the rewriter can never disagree on
/// what counts as a declaration.
pub(crate) const DECLARATION_PATTERN: &str =
    r#"(?:^|\s)id\s*=\s*(?:"(?P<dq>[^"]+)"|'(?P<sq>[^']+)')"#;

static DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DECLARATION_PATTERN).expect("declaration pattern compiles"));

/// Value of a `dq`/`sq` quoted capture pair, whichever side matched.
pub(crate) fn quoted_value<'t>(caps: &Captures<'t>) -> Option<Match<'t>> {
    caps.name("dq").or_else(|| caps.name("sq"))
}

/// Collect every identifier declared in `text`.
///
/// This is a lexical scan: embedded script/style blocks do not need to be well formed, and the
/// cost is linear in the input size.
pub fn declared_ids(text: &str) -> BTreeSet<&str> {
    DECLARATION
        .captures_iter(text)
        .filter_map(|caps| quoted_value(&caps).map(|m| m.as_str()))
        .collect()
}

/// Immutable mapping from original identifiers to their namespaced form.
///
/// Identifiers that already carry the prefix are left out, which is what makes re-running the
/// rewrite with the same prefix a no-op.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdTable {
    prefix: String,
    ids_found: usize,
    renames: BTreeMap<String, String>,
}

impl IdTable {
    /// Scan `text` and schedule every declared identifier for `prefix`.
    pub fn build(text: &str, prefix: &str) -> Self {
        Self::from_declared(&declared_ids(text), prefix)
    }

    /// Build a table from an already collected declaration set.
    pub fn from_declared(declared: &BTreeSet<&str>, prefix: &str) -> Self {
        let renames = declared
            .iter()
            .filter(|id| !id.starts_with(prefix))
            .map(|id| ((*id).to_owned(), format!("{prefix}{id}")))
            .collect();
        Self {
            prefix: prefix.to_owned(),
            ids_found: declared.len(),
            renames,
        }
    }

    /// Prefix this table renames into.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of distinct identifiers declared in the source, scheduled or not.
    pub fn ids_found(&self) -> usize {
        self.ids_found
    }

    /// Number of identifiers scheduled for renaming.
    pub fn len(&self) -> usize {
        self.renames.len()
    }

    /// True when nothing needs renaming.
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }

    /// Namespaced form of `id`, if it is scheduled.
    pub fn get(&self, id: &str) -> Option<&str> {
        self.renames.get(id).map(String::as_str)
    }

    /// True when `id` is scheduled for renaming.
    pub fn contains(&self, id: &str) -> bool {
        self.renames.contains_key(id)
    }

    /// Scheduled `(original, renamed)` pairs in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.renames.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ids/table.rs"]
mod tests;
