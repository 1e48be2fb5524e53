use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use rayon::prelude::*;

use crate::{
    foundation::error::{SvgnsError, SvgnsResult},
    ids::prefix::{PrefixAllocator, PrefixPolicy, check_prefix},
    ids::table::{IdTable, declared_ids},
    rewrite::pass::rewrite_references,
    rewrite::surface::Surface,
    verify::verifier::{VerificationReport, VerifyMode, verify_rewrite},
};

/// Options for [`isolate`].
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct IsolateOptions {
    /// How the namespace prefix is chosen.
    pub prefix: PrefixPolicy,
    /// How thoroughly the output is re-checked.
    pub verify: VerifyMode,
}

impl IsolateOptions {
    /// Options using a caller-supplied prefix and default verification.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: PrefixPolicy::Explicit(prefix.into()),
            ..Self::default()
        }
    }
}

/// Counters describing one isolation.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct IsolateStats {
    /// Distinct identifiers declared by the source.
    pub ids_found: usize,
    /// Identifier occurrences renamed, declarations included.
    pub references_updated: usize,
    /// Renames per reference surface.
    pub per_surface: BTreeMap<Surface, usize>,
}

/// A document whose identifiers now live in their own namespace.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Isolated<'a> {
    /// Rewritten document; borrowed from the input when nothing needed renaming.
    pub content: Cow<'a, str>,
    /// Prefix that was applied.
    pub prefix: String,
    /// Rewrite counters.
    pub stats: IsolateStats,
    /// Verification problems. Non-empty output is still returned so the caller can decide.
    pub errors: Vec<String>,
}

impl Isolated<'_> {
    /// True when the output is the untouched input.
    pub fn is_unchanged(&self) -> bool {
        matches!(self.content, Cow::Borrowed(_))
    }

    /// Detach from the input buffer.
    pub fn into_owned(self) -> Isolated<'static> {
        Isolated {
            content: Cow::Owned(self.content.into_owned()),
            prefix: self.prefix,
            stats: self.stats,
            errors: self.errors,
        }
    }

    /// Verification view of this result.
    pub fn report(&self) -> VerificationReport {
        VerificationReport {
            ids_found: self.stats.ids_found,
            references_updated: self.stats.references_updated,
            errors: self.errors.clone(),
        }
    }
}

/// Prefix every identifier of `text` and every reference to it.
///
/// Fails only when the prefix cannot be applied (empty, unsupported characters, or ambiguous for
/// this document). Incomplete rewrites are reported through [`Isolated::errors`].
#[tracing::instrument(skip(text, options), fields(bytes = text.len()))]
pub fn isolate<'a>(text: &'a str, options: &IsolateOptions) -> SvgnsResult<Isolated<'a>> {
    let declared = declared_ids(text);
    let prefix = options.prefix.resolve(text, &declared)?;
    let plan = Planned {
        text,
        declared,
        prefix,
    };
    Ok(plan.run(options.verify))
}

/// Prefix assignment for [`isolate_batch`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPrefixes {
    /// `a_`, `b_`, ... by input position.
    #[default]
    Sequence,
    /// Content-derived; two documents landing on the same prefix fail the batch.
    ContentHash {
        /// Starting token length.
        len: usize,
    },
}

/// One named input of [`isolate_batch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchDocument<'a> {
    /// Caller-facing document name; must be unique within the batch.
    pub name: &'a str,
    /// Document text.
    pub text: &'a str,
}

/// Isolated batch output, in input order.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct IsolatedBatch<'a> {
    /// Per-document results, in input order.
    pub documents: Vec<Isolated<'a>>,
    /// Document name to prefix.
    pub prefixes: BTreeMap<String, String>,
}

/// Isolate several documents so they can share one namespace.
///
/// Prefixes are assigned up front, in input order, through one [`PrefixAllocator`]; rewriting and
/// verification then run in parallel.
#[tracing::instrument(skip(docs), fields(documents = docs.len()))]
pub fn isolate_batch<'a>(
    docs: &[BatchDocument<'a>],
    prefixes: BatchPrefixes,
    verify: VerifyMode,
) -> SvgnsResult<IsolatedBatch<'a>> {
    let mut allocator = PrefixAllocator::new();
    let mut plans = Vec::with_capacity(docs.len());
    for doc in docs {
        let plan = match prefixes {
            BatchPrefixes::Sequence => {
                let prefix = allocator.next_sequence(doc.name)?;
                Planned::new(doc.text, prefix)?
            }
            BatchPrefixes::ContentHash { len } => {
                let declared = declared_ids(doc.text);
                let prefix = PrefixPolicy::ContentHash { len }.resolve(doc.text, &declared)?;
                allocator.reserve(prefix.clone(), doc.name)?;
                Planned {
                    text: doc.text,
                    declared,
                    prefix,
                }
            }
        };
        plans.push(plan);
    }
    Ok(IsolatedBatch {
        documents: run_planned(&plans, verify),
        prefixes: allocator.into_assignments(),
    })
}

/// A document with its prefix already settled.
pub(crate) struct Planned<'a> {
    pub(crate) text: &'a str,
    declared: BTreeSet<&'a str>,
    pub(crate) prefix: String,
}

impl<'a> Planned<'a> {
    pub(crate) fn new(text: &'a str, prefix: String) -> SvgnsResult<Self> {
        let declared = declared_ids(text);
        check_prefix(&prefix, &declared)?;
        Ok(Self {
            text,
            declared,
            prefix,
        })
    }

    pub(crate) fn run(&self, verify: VerifyMode) -> Isolated<'a> {
        let table = IdTable::from_declared(&self.declared, &self.prefix);
        let rewritten = rewrite_references(self.text, &table);
        let report = verify_rewrite(
            &table,
            &rewritten.text,
            rewritten.references_updated,
            verify,
        );
        Isolated {
            content: rewritten.text,
            prefix: self.prefix.clone(),
            stats: IsolateStats {
                ids_found: report.ids_found,
                references_updated: report.references_updated,
                per_surface: rewritten.per_surface,
            },
            errors: report.errors,
        }
    }

    /// Renamed form of `id` under this plan, or `id` itself when it is not declared.
    pub(crate) fn renamed(&self, id: &str) -> String {
        if self.declared.contains(id) && !id.starts_with(self.prefix.as_str()) {
            format!("{}{id}", self.prefix)
        } else {
            id.to_owned()
        }
    }
}

/// Rewrite and verify already planned documents in parallel, preserving order.
pub(crate) fn run_planned<'a>(plans: &[Planned<'a>], verify: VerifyMode) -> Vec<Isolated<'a>> {
    plans.par_iter().map(|plan| plan.run(verify)).collect()
}

/// Result of [`isolate_file`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct IsolatedFile {
    /// File that was read.
    pub input_path: PathBuf,
    /// File that was written.
    pub output_path: PathBuf,
    /// Prefix that was applied.
    pub prefix: String,
    /// Rewrite counters.
    pub stats: IsolateStats,
    /// Verification problems.
    pub errors: Vec<String>,
}

/// Read `input`, isolate it, and write the result to `output` (default: overwrite `input`).
pub fn isolate_file(
    input: impl AsRef<Path>,
    output: Option<&Path>,
    options: &IsolateOptions,
) -> SvgnsResult<IsolatedFile> {
    let input = input.as_ref();
    let text = fs::read_to_string(input)
        .with_context(|| format!("read svg '{}'", input.display()))?;
    let out = isolate(&text, options)?;
    let output_path = output.unwrap_or(input);
    fs::write(output_path, out.content.as_bytes())
        .with_context(|| format!("write svg '{}'", output_path.display()))?;
    if !out.errors.is_empty() {
        tracing::warn!(
            path = %input.display(),
            errors = out.errors.len(),
            "isolated file failed verification"
        );
    }
    Ok(IsolatedFile {
        input_path: input.to_path_buf(),
        output_path: output_path.to_path_buf(),
        prefix: out.prefix,
        stats: out.stats,
        errors: out.errors,
    })
}

/// Turn a batch member's verification errors into a hard failure.
pub(crate) fn require_clean(name: &str, isolated: &Isolated<'_>) -> SvgnsResult<()> {
    if isolated.errors.is_empty() {
        return Ok(());
    }
    Err(SvgnsError::verification(format!(
        "prefixing failed for '{name}': {}",
        isolated.errors.join("; ")
    )))
}

#[cfg(test)]
#[path = "../../tests/unit/isolate/pipeline.rs"]
mod tests;
