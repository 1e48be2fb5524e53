use std::collections::{BTreeMap, BTreeSet};

use xxhash_rust::xxh3::xxh3_64_with_seed;

use crate::foundation::error::{SvgnsError, SvgnsResult};

/// Separator appended to every generated prefix.
pub const PREFIX_SEPARATOR: char = '_';

/// Token length used by [`PrefixPolicy::default`] (36^2 = 1296 distinct prefixes).
pub const DEFAULT_CONTENT_PREFIX_LEN: usize = 2;

/// Longest content-derived token; 36^12 still fits in the 64-bit digest.
pub const MAX_CONTENT_PREFIX_LEN: usize = 12;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const EXCLUDED_HOLDER: &str = "(excluded)";
const CONTENT_SEED: u64 = 0x5f3a_91c4_d2e8_07b6;

/// Content-derived prefix: `len` base-36 digits of the document digest plus `_`.
///
/// Identical input always yields the same prefix. Distinct inputs may still collide; callers that
/// put many documents in one batch should reserve prefixes through a [`PrefixAllocator`].
pub fn content_prefix(text: &str, len: usize) -> String {
    let mut n = xxh3_64_with_seed(text.as_bytes(), CONTENT_SEED);
    let mut out = String::with_capacity(len + 1);
    for _ in 0..len {
        out.push(char::from(BASE36[(n % 36) as usize]));
        n /= 36;
    }
    out.push(PREFIX_SEPARATOR);
    out
}

/// Sequence-derived prefix, spreadsheet-column style: `0 -> a_`, `25 -> z_`, `26 -> aa_`.
pub fn sequence_prefix(index: usize) -> String {
    let mut n = index;
    let mut rev = Vec::<u8>::new();
    loop {
        rev.push(b'a' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    let mut out = rev.into_iter().rev().map(char::from).collect::<String>();
    out.push(PREFIX_SEPARATOR);
    out
}

/// Reject prefixes that cannot be applied unambiguously to a document declaring `declared`.
///
/// A prefix is ambiguous when renaming some identifier `X` would produce `prefix + X` while that
/// name is already declared by the same document.
pub fn check_prefix(prefix: &str, declared: &BTreeSet<&str>) -> SvgnsResult<()> {
    if prefix.is_empty() {
        return Err(SvgnsError::validation("namespace prefix must not be empty"));
    }
    if let Some(bad) = prefix
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(SvgnsError::validation(format!(
            "namespace prefix '{prefix}' contains unsupported character '{bad}'"
        )));
    }
    for id in declared.iter().filter(|id| !id.starts_with(prefix)) {
        let renamed = format!("{prefix}{id}");
        if declared.contains(renamed.as_str()) {
            return Err(SvgnsError::validation(format!(
                "namespace prefix '{prefix}' is ambiguous: renaming '{id}' collides with declared '{renamed}'"
            )));
        }
    }
    Ok(())
}

/// How a document's namespace prefix is chosen.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefixPolicy {
    /// Derived from the document bytes; grows past `len` until unambiguous.
    ContentHash {
        /// Starting token length (1..=12).
        len: usize,
    },
    /// Derived from the document's position in a composition.
    Sequence {
        /// Zero-based composition index.
        index: usize,
    },
    /// Caller-supplied prefix, used verbatim.
    Explicit(String),
}

impl Default for PrefixPolicy {
    fn default() -> Self {
        Self::ContentHash {
            len: DEFAULT_CONTENT_PREFIX_LEN,
        }
    }
}

impl PrefixPolicy {
    /// Resolve the policy into a concrete prefix for a document.
    pub fn resolve(&self, text: &str, declared: &BTreeSet<&str>) -> SvgnsResult<String> {
        match self {
            Self::ContentHash { len } => {
                if *len == 0 || *len > MAX_CONTENT_PREFIX_LEN {
                    return Err(SvgnsError::validation(format!(
                        "content prefix length must be in 1..={MAX_CONTENT_PREFIX_LEN}, got {len}"
                    )));
                }
                for l in *len..=MAX_CONTENT_PREFIX_LEN {
                    let prefix = content_prefix(text, l);
                    if check_prefix(&prefix, declared).is_ok() {
                        return Ok(prefix);
                    }
                    tracing::debug!(prefix = %prefix, "content prefix ambiguous, growing token");
                }
                Err(SvgnsError::validation(format!(
                    "no unambiguous content prefix up to {MAX_CONTENT_PREFIX_LEN} characters"
                )))
            }
            Self::Sequence { index } => {
                let prefix = sequence_prefix(*index);
                check_prefix(&prefix, declared)?;
                Ok(prefix)
            }
            Self::Explicit(prefix) => {
                check_prefix(prefix, declared)?;
                Ok(prefix.clone())
            }
        }
    }
}

/// Batch-scoped prefix bookkeeping.
///
/// All prefixes of a batch are assigned through one allocator before any document is rewritten.
/// Prefixes are kept prefix-free: no assigned prefix may start with another one, otherwise
/// `a_` + `b_x` and `a_b_` + `x` would produce the same name.
#[derive(Clone, Debug, Default)]
pub struct PrefixAllocator {
    by_prefix: BTreeMap<String, String>,
    by_owner: BTreeMap<String, String>,
    next_index: usize,
}

impl PrefixAllocator {
    /// Empty allocator; sequence numbering starts at `a_`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `prefix` for `owner`.
    pub fn reserve(
        &mut self,
        prefix: impl Into<String>,
        owner: impl Into<String>,
    ) -> SvgnsResult<()> {
        let prefix = prefix.into();
        let owner = owner.into();
        if let Some(existing) = self.by_owner.get(&owner) {
            return Err(SvgnsError::validation(format!(
                "'{owner}' already holds prefix '{existing}'"
            )));
        }
        if let Some((taken, holder)) = self.overlapping(&prefix) {
            return Err(SvgnsError::collision(format!(
                "prefix '{prefix}' for '{owner}' overlaps '{taken}' held by '{holder}'"
            )));
        }
        self.by_prefix.insert(prefix.clone(), owner.clone());
        self.by_owner.insert(owner, prefix);
        Ok(())
    }

    /// Keep `prefix` out of the batch without handing it to a named owner.
    ///
    /// Used for documents that sit beside the batch, such as a composition background.
    pub fn exclude(&mut self, prefix: impl Into<String>) -> SvgnsResult<()> {
        let prefix = prefix.into();
        if let Some((taken, holder)) = self.overlapping(&prefix) {
            return Err(SvgnsError::collision(format!(
                "excluded prefix '{prefix}' overlaps '{taken}' held by '{holder}'"
            )));
        }
        self.by_prefix.insert(prefix, EXCLUDED_HOLDER.to_owned());
        Ok(())
    }

    /// Assign the next free sequence prefix to `owner`, skipping reserved ones.
    pub fn next_sequence(&mut self, owner: impl Into<String>) -> SvgnsResult<String> {
        let owner = owner.into();
        loop {
            let prefix = sequence_prefix(self.next_index);
            self.next_index += 1;
            if self.overlapping(&prefix).is_none() {
                self.reserve(prefix.clone(), owner)?;
                return Ok(prefix);
            }
        }
    }

    /// Prefix held by `owner`, if any.
    pub fn prefix_of(&self, owner: &str) -> Option<&str> {
        self.by_owner.get(owner).map(String::as_str)
    }

    /// Owner to prefix map of everything assigned so far.
    pub fn into_assignments(self) -> BTreeMap<String, String> {
        self.by_owner
    }

    fn overlapping(&self, prefix: &str) -> Option<(&str, &str)> {
        self.by_prefix
            .iter()
            .find(|(taken, _)| taken.starts_with(prefix) || prefix.starts_with(taken.as_str()))
            .map(|(taken, holder)| (taken.as_str(), holder.as_str()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/ids/prefix.rs"]
mod tests;
