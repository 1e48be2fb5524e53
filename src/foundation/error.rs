/// Convenience result type used across svgns.
pub type SvgnsResult<T> = Result<T, SvgnsError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Rewrite-completeness problems are not errors: they are reported as strings in
/// [`crate::Isolated::errors`] so callers keep the rewritten text.
#[derive(thiserror::Error, Debug)]
pub enum SvgnsError {
    /// Invalid caller-provided input or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Two documents in one batch were assigned the same namespace prefix.
    #[error("prefix collision: {0}")]
    Collision(String),

    /// A batch refused to continue because a document failed verification.
    #[error("verification error: {0}")]
    Verification(String),

    /// Errors while assembling a combined document.
    #[error("composition error: {0}")]
    Composition(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SvgnsError {
    /// Build a [`SvgnsError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`SvgnsError::Collision`] value.
    pub fn collision(msg: impl Into<String>) -> Self {
        Self::Collision(msg.into())
    }

    /// Build a [`SvgnsError::Verification`] value.
    pub fn verification(msg: impl Into<String>) -> Self {
        Self::Verification(msg.into())
    }

    /// Build a [`SvgnsError::Composition`] value.
    pub fn composition(msg: impl Into<String>) -> Self {
        Self::Composition(msg.into())
    }

    /// Build a [`SvgnsError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
