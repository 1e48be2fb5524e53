use std::collections::BTreeSet;

use crate::ids::table::{IdTable, declared_ids};
use crate::rewrite::surface::{Surface, references};

/// Number of scheduled identifiers probed by [`VerifyMode::Sampled`].
pub const VERIFY_SAMPLE_LIMIT: usize = 100;

/// How thoroughly rewritten output is re-checked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyMode {
    /// Skip verification.
    Off,
    /// Exhaustive declaration check plus a bounded probe of the three most common reference
    /// forms (`href="#X"`, `href='#X'`, `url(#X)`). A safety net, not a proof.
    #[default]
    Sampled,
    /// Declaration check plus every identifier of every reference surface.
    Exhaustive,
}

/// Result of re-checking one rewritten document.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct VerificationReport {
    /// Distinct identifiers declared by the source document.
    pub ids_found: usize,
    /// Identifier occurrences the rewriter renamed.
    pub references_updated: usize,
    /// Problems found, in detection order.
    pub errors: Vec<String>,
}

impl VerificationReport {
    /// True when no problem was found.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Confirm that no identifier scheduled in `table` survives in `rewritten`.
pub fn verify_rewrite(
    table: &IdTable,
    rewritten: &str,
    references_updated: usize,
    mode: VerifyMode,
) -> VerificationReport {
    let mut report = VerificationReport {
        ids_found: table.ids_found(),
        references_updated,
        errors: Vec::new(),
    };
    if mode == VerifyMode::Off || table.is_empty() {
        return report;
    }

    for id in declared_ids(rewritten) {
        if table.contains(id) {
            report
                .errors
                .push(format!("Unprefixed ID declaration remains: {id}"));
        }
    }

    match mode {
        VerifyMode::Off => {}
        VerifyMode::Sampled => sampled_references(table, rewritten, &mut report.errors),
        VerifyMode::Exhaustive => exhaustive_references(table, rewritten, &mut report.errors),
    }

    if !report.errors.is_empty() {
        tracing::warn!(
            prefix = table.prefix(),
            errors = report.errors.len(),
            "rewrite verification failed"
        );
    }
    report
}

fn sampled_references(table: &IdTable, rewritten: &str, errors: &mut Vec<String>) {
    for (original, _) in table.iter().take(VERIFY_SAMPLE_LIMIT) {
        let probes = [
            format!("href=\"#{original}\""),
            format!("href='#{original}'"),
            format!("url(#{original})"),
        ];
        if probes.iter().any(|p| rewritten.contains(p.as_str())) {
            errors.push(format!("Unprefixed reference remains for ID: {original}"));
        }
    }
}

fn exhaustive_references(table: &IdTable, rewritten: &str, errors: &mut Vec<String>) {
    let mut seen = BTreeSet::new();
    for surface in Surface::ALL {
        if surface == Surface::Declaration {
            continue;
        }
        for id in references(surface, rewritten) {
            if table.contains(id) && seen.insert((id, surface)) {
                errors.push(format!(
                    "Unprefixed reference remains for ID: {id} ({surface})"
                ));
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/verify/verifier.rs"]
mod tests;
