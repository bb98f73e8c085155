//! Allocation error types.

use std::net::IpAddr;

use subnetter_primitives::{AddrParseError, BlockId, Cidr, RecordKind, VrfId};
use subnetter_storage::StoreError;

/// Result alias for engine operations.
pub type IpamResult<T> = Result<T, IpamError>;

/// Errors returned by engine operations.
///
/// Every variant is terminal for the operation that raised it and leaves no
/// partial writes behind.
#[derive(Debug, thiserror::Error)]
pub enum IpamError {
    /// Malformed CIDR or address text.
    #[error(transparent)]
    InvalidAddress(#[from] AddrParseError),

    /// Input rejected before any write: bad mask, address outside its block,
    /// out-of-range count or field length.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The request contradicts current store state.
    #[error("conflict: {0}")]
    Conflict(#[from] Conflict),

    /// A referenced record does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: RecordKind, id: String },

    /// Backend failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Why a request conflicts with existing state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Conflict {
    /// The candidate range intersects a block already claiming space.
    #[error("{candidate} overlaps existing block {existing} ({existing_id})")]
    Overlap {
        candidate: Cidr,
        existing: Cidr,
        existing_id: BlockId,
    },

    /// The address is already registered somewhere in the VRF.
    #[error("address {address} already exists in vrf {vrf_id}")]
    DuplicateAddress { address: IpAddr, vrf_id: VrfId },

    /// Carving found no free candidate of the requested size.
    #[error("no free /{prefix_len} sub-blocks in {parent}")]
    NoFreeBlocks { parent: Cidr, prefix_len: u8 },

    /// Every usable host address in the block is taken.
    #[error("no free addresses in {block}")]
    AddressesExhausted { block: Cidr },

    /// Deletion refused because other records still reference this one.
    #[error("{kind} {id} still has {dependents}")]
    HasDependents {
        kind: RecordKind,
        id: String,
        dependents: &'static str,
    },

    /// Lost a race against a concurrent writer twice in a row.
    #[error("concurrent modification during {operation}")]
    ConcurrentModification { operation: &'static str },
}

/// Coarse error classification for transports.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr, strum::IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    #[strum(serialize = "validation_error")]
    Validation,
    Conflict,
    NotFound,
    Internal,
}

impl IpamError {
    pub fn not_found(kind: RecordKind, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidAddress(_) | Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Store(_) => ErrorKind::Internal,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// True for an optimistic-commit race reported by the store.
    pub(crate) fn is_write_conflict(&self) -> bool {
        matches!(self, Self::Store(StoreError::WriteConflict))
    }
}
