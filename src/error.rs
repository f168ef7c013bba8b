//! Error types returned by tree operations.

use thiserror::Error;

/// Reason an insert was rejected.
///
/// Both variants hand the rejected payload back, so the caller keeps
/// ownership of it and decides how to dispose of it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InsertError<T> {
    /// No memory could be allocated for a new node. The tree is unchanged.
    #[error("allocation failure: cannot create a tree node")]
    Overflow(T),

    /// An equal payload is already stored. The stored payload has been
    /// passed to the duplicate hook, the new one was not absorbed.
    #[error("duplicate key")]
    Duplicate(T),
}

impl<T> InsertError<T> {
    /// Returns the payload that was not inserted.
    pub fn into_inner(self) -> T {
        match self {
            InsertError::Overflow(payload) | InsertError::Duplicate(payload) => payload,
        }
    }

    /// Returns true if the insert failed because the key already exists.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, InsertError::Duplicate(_))
    }
}
