//! The persistence boundary of the relationship graph

use uuid::Uuid;

use crate::graph::{Page, PageRequest, RelationshipEdge, RelationshipView, StoreError};
use crate::models::RelationshipStatus;

/// The listings a caller can request
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ListScope {
    /// Pending requests the caller has received
    Incoming,
    /// Pending requests the caller has sent
    Sent,
    /// Accepted friendships, regardless of who sent the request
    Friends,
}

impl ListScope {
    /// The status every edge in this listing has
    pub fn status(self) -> RelationshipStatus {
        match self {
            ListScope::Incoming | ListScope::Sent => RelationshipStatus::FriendRequest,
            ListScope::Friends => RelationshipStatus::Friend,
        }
    }
}

/// Transactional access to accounts and relationship edges.
///
/// Implementations must enforce uniqueness of the unordered account pair
/// themselves and report a violation as [StoreError::PairOccupied].
#[allow(async_fn_in_trait)]
pub trait RelationshipStore {
    /// Check whether an account exists
    async fn account_exists(&self, uuid: Uuid) -> Result<bool, StoreError>;

    /// Retrieve all edges between `a` and `b`, in both directions
    async fn find_pair(&self, a: Uuid, b: Uuid) -> Result<Vec<RelationshipEdge>, StoreError>;

    /// Retrieve a pending request addressed to `receiver`
    async fn find_request(
        &self,
        receiver: Uuid,
        edge: Uuid,
    ) -> Result<Option<RelationshipView>, StoreError>;

    /// Insert a new edge
    async fn insert_edge(&self, edge: &RelationshipEdge) -> Result<(), StoreError>;

    /// Change the status of a pending request addressed to `receiver`.
    ///
    /// Returns `false` if no such request exists anymore.
    async fn transition_request(
        &self,
        receiver: Uuid,
        edge: Uuid,
        to: RelationshipStatus,
    ) -> Result<bool, StoreError>;

    /// Delete a pending request addressed to `receiver`.
    ///
    /// Returns `false` if no such request exists anymore.
    async fn delete_request(&self, receiver: Uuid, edge: Uuid) -> Result<bool, StoreError>;

    /// Delete every edge between the parties of `edge` and insert `edge`.
    ///
    /// Both steps are applied in a single transaction.
    async fn replace_pair(&self, edge: &RelationshipEdge) -> Result<(), StoreError>;

    /// Retrieve a page of a caller's listing, newest first
    async fn list(
        &self,
        caller: Uuid,
        scope: ListScope,
        page: &PageRequest,
    ) -> Result<Page<RelationshipView>, StoreError>;
}
