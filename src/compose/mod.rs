//! Multi-document composition.
//!
//! Every placed document is isolated into its own prefix namespace before its body is spliced into
//! the combined output, so identifiers from different sources can never resolve to each other.

pub(crate) mod document;
pub(crate) mod free;
pub(crate) mod grid;
pub(crate) mod layout;
