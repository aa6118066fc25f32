use thiserror::Error;

/// Returned by checked value access when the key is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("key not found")]
pub struct KeyError;
