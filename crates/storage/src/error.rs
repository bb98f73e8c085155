//! Store error types.

use subnetter_primitives::RecordKind;

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a hierarchy store.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store changed underneath an optimistic write transaction.
    ///
    /// Nothing from the transaction was persisted; the caller may re-run it
    /// against refreshed state.
    #[error("write conflict: store changed since the transaction began")]
    WriteConflict,

    /// Insert of a record whose id is already present.
    #[error("{kind} {id} already exists")]
    Duplicate { kind: RecordKind, id: String },

    /// Update of a record that does not exist.
    #[error("{kind} {id} does not exist")]
    Missing { kind: RecordKind, id: String },

    /// Failed to decode a stored record.
    #[error("failed to decode {0} record")]
    Decode(RecordKind),

    /// Other backend failure.
    #[error("{0}")]
    Backend(String),
}

impl StoreError {
    pub fn duplicate(kind: RecordKind, id: impl ToString) -> Self {
        Self::Duplicate {
            kind,
            id: id.to_string(),
        }
    }

    pub fn missing(kind: RecordKind, id: impl ToString) -> Self {
        Self::Missing {
            kind,
            id: id.to_string(),
        }
    }
}
