//! Reference surfaces and the ordered rewrite pass over them.

pub(crate) mod pass;
pub(crate) mod surface;
