pub(crate) mod verifier;
