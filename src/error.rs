//! Recoverable errors.

use thiserror::Error;

/// Errors callers can trigger through ordinary use of the container.
///
/// Contract violations are not represented here; they panic (see
/// `info_assert!`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InfoError {
    /// Checked access to a key that is not present.
    #[error("the specified key does not exist: {key:?}")]
    KeyNotFound { key: String },
}

impl InfoError {
    pub(crate) fn key_not_found(key: &str) -> Self {
        InfoError::KeyNotFound {
            key: key.to_owned(),
        }
    }
}
