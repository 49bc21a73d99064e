//! Errors of the relationship graph

use std::fmt::{Display, Formatter};

/// The reason a request was rejected before touching any relationship
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ValidationReason {
    /// The targeted account does not exist
    TargetNotFound,
    /// A friend request was addressed to the caller itself
    CannotFriendSelf,
    /// The caller tried to block itself
    CannotBlockSelf,
    /// There is already an edge between both accounts, in any direction and state
    RelationshipExists,
    /// The caller has already blocked the target
    AlreadyBlocked,
    /// Page or limit are out of range
    InvalidPagination,
}

impl Display for ValidationReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationReason::TargetNotFound => write!(f, "target not found"),
            ValidationReason::CannotFriendSelf => write!(f, "cannot friend self"),
            ValidationReason::CannotBlockSelf => write!(f, "cannot block self"),
            ValidationReason::RelationshipExists => write!(f, "relationship already exists"),
            ValidationReason::AlreadyBlocked => write!(f, "already blocked"),
            ValidationReason::InvalidPagination => write!(f, "invalid pagination"),
        }
    }
}

/// Errors of a [RelationshipStore](crate::graph::RelationshipStore)
#[derive(Debug)]
pub enum StoreError {
    /// The unique constraint on the account pair rejected a new edge
    PairOccupied,
    /// Any other error reported by the database
    Database(rorm::Error),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::PairOccupied => write!(f, "an edge for this pair already exists"),
            StoreError::Database(err) => write!(f, "{err}"),
        }
    }
}

impl From<rorm::Error> for StoreError {
    fn from(value: rorm::Error) -> Self {
        Self::Database(value)
    }
}

/// The errors an operation of the [RelationshipGraph](crate::graph::RelationshipGraph) can fail with.
///
/// None of them are retried.
#[derive(Debug)]
pub enum GraphError {
    /// The input violated a precondition
    Validation(ValidationReason),
    /// The relationship does not exist or is not visible to the caller
    NotFound,
    /// The store failed
    Store(StoreError),
}

impl Display for GraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::Validation(reason) => write!(f, "{reason}"),
            GraphError::NotFound => write!(f, "relationship not found"),
            GraphError::Store(err) => write!(f, "store error: {err}"),
        }
    }
}

impl From<StoreError> for GraphError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::PairOccupied => Self::Validation(ValidationReason::RelationshipExists),
            err => Self::Store(err),
        }
    }
}

impl From<ValidationReason> for GraphError {
    fn from(value: ValidationReason) -> Self {
        Self::Validation(value)
    }
}
