use std::borrow::Cow;
use std::collections::BTreeMap;

use regex::{Captures, Match};

use crate::ids::table::IdTable;
use crate::rewrite::surface::{Surface, SurfacePattern, target};

/// Output of [`rewrite_references`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rewritten<'a> {
    /// Rewritten document. Borrowed when nothing had to change.
    pub text: Cow<'a, str>,
    /// Total number of identifier occurrences renamed, declarations included.
    pub references_updated: usize,
    /// Renames per surface; surfaces with no renames are absent.
    pub per_surface: BTreeMap<Surface, usize>,
}

/// Apply `table` to every reference surface of `text`, in [`Surface::ALL`] order.
///
/// Only the identifier span of each matched surface is replaced; quoting, spacing, event names
/// and list separators are preserved byte for byte. Identifiers absent from the table are never
/// touched.
pub fn rewrite_references<'a>(text: &'a str, table: &IdTable) -> Rewritten<'a> {
    let mut current = Cow::Borrowed(text);
    let mut per_surface = BTreeMap::new();
    if table.is_empty() {
        return Rewritten {
            text: current,
            references_updated: 0,
            per_surface,
        };
    }

    for surface in Surface::ALL {
        let mut count = 0usize;
        for pattern in surface.patterns() {
            let replaced = match rewrite_surface(pattern, &current, table, &mut count) {
                Cow::Owned(s) => Some(s),
                Cow::Borrowed(_) => None,
            };
            if let Some(s) = replaced {
                current = Cow::Owned(s);
            }
        }
        if count > 0 {
            per_surface.insert(surface, count);
        }
    }

    let references_updated = per_surface.values().sum();
    tracing::debug!(references_updated, prefix = table.prefix(), "rewrote references");
    Rewritten {
        text: current,
        references_updated,
        per_surface,
    }
}

fn rewrite_surface<'t>(
    pattern: &SurfacePattern,
    text: &'t str,
    table: &IdTable,
    count: &mut usize,
) -> Cow<'t, str> {
    pattern.outer.replace_all(text, |caps: &Captures<'_>| {
        let whole = caps.get_match();
        let Some(value) = target(caps) else {
            return whole.as_str().to_owned();
        };
        match &pattern.inner {
            None => match table.get(value.as_str()) {
                Some(renamed) => {
                    *count += 1;
                    splice(whole, value, renamed)
                }
                None => whole.as_str().to_owned(),
            },
            Some(inner) => {
                let rewritten = inner.replace_all(value.as_str(), |inner_caps: &Captures<'_>| {
                    let item = inner_caps.get_match();
                    let hit = inner_caps
                        .name("id")
                        .and_then(|id| table.get(id.as_str()).map(|renamed| (id, renamed)));
                    match hit {
                        Some((id, renamed)) => {
                            *count += 1;
                            splice(item, id, renamed)
                        }
                        None => item.as_str().to_owned(),
                    }
                });
                match rewritten {
                    Cow::Borrowed(_) => whole.as_str().to_owned(),
                    Cow::Owned(list) => splice(whole, value, &list),
                }
            }
        }
    })
}

/// Rebuild `whole` with the `part` span replaced. Both matches come from the same haystack.
fn splice(whole: Match<'_>, part: Match<'_>, replacement: &str) -> String {
    let s = whole.as_str();
    let start = part.start() - whole.start();
    let end = part.end() - whole.start();
    let mut out = String::with_capacity(s.len() + replacement.len());
    out.push_str(&s[..start]);
    out.push_str(replacement);
    out.push_str(&s[end..]);
    out
}

#[cfg(test)]
#[path = "../../tests/unit/rewrite/pass.rs"]
mod tests;
