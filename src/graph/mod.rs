//! The relationship graph tracks friend requests, friendships and blocks between accounts.
//!
//! Every unordered pair of accounts has at most one edge. The direction of an
//! edge records who initiated it, but is irrelevant for uniqueness.
//!
//! ```text
//!                  accept
//! FRIEND_REQUEST ---------> FRIEND
//!      |                       |
//!      | reject: deleted       | block
//!      | block                 v
//!      +------------------> BLOCKED (terminal)
//! ```

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use uuid::Uuid;

pub use crate::graph::db::DbStore;
pub use crate::graph::error::*;
pub use crate::graph::pagination::*;
pub use crate::graph::store::*;
use crate::models::RelationshipStatus;

mod db;
mod error;
#[cfg(test)]
mod memory;
mod pagination;
mod store;
#[cfg(test)]
mod tests;

/// The canonical key of an unordered pair of accounts.
///
/// `PairKey::new(a, b) == PairKey::new(b, a)` holds for all accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PairKey(String);

impl PairKey {
    /// Build the key of the pair `{a, b}`
    pub fn new(a: Uuid, b: Uuid) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{low}:{high}"))
    }

    /// The string stored in the database
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PairKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A relationship edge as it is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipEdge {
    /// Primary key
    pub uuid: Uuid,
    /// The initiating account
    pub sender: Uuid,
    /// The account the edge is directed at
    pub receiver: Uuid,
    /// The current state
    pub status: RelationshipStatus,
    /// Point in time of the creation
    pub created_at: DateTime<Utc>,
    /// Point in time of the last status change
    pub updated_at: DateTime<Utc>,
}

impl RelationshipEdge {
    /// Create a new edge from `sender` to `receiver`
    pub fn new(sender: Uuid, receiver: Uuid, status: RelationshipStatus) -> Self {
        let now = Utc::now();
        Self {
            uuid: Uuid::new_v4(),
            sender,
            receiver,
            status,
            created_at: now,
            updated_at: now,
        }
    }

    /// The canonical key of the pair this edge connects
    pub fn pair_key(&self) -> PairKey {
        PairKey::new(self.sender, self.receiver)
    }
}

/// The public data of an account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    /// The uuid of the account
    pub uuid: Uuid,
    /// The username of the account
    pub username: String,
    /// The display name of the account
    pub display_name: String,
}

/// A relationship edge joined with both of its parties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipView {
    /// Primary key of the edge
    pub uuid: Uuid,
    /// The current state
    pub status: RelationshipStatus,
    /// The initiating account
    pub sender: AccountSummary,
    /// The account the edge is directed at
    pub receiver: AccountSummary,
    /// Point in time of the creation
    pub created_at: DateTime<Utc>,
    /// Point in time of the last status change
    pub updated_at: DateTime<Utc>,
}

impl RelationshipView {
    /// The party of this edge that isn't `caller`
    pub fn other_party(&self, caller: Uuid) -> &AccountSummary {
        if self.sender.uuid == caller {
            &self.receiver
        } else {
            &self.sender
        }
    }
}

/// How often `block_user` tries to replace a pair that is written concurrently
const BLOCK_ATTEMPTS: u32 = 2;

/// The relationship graph engine.
///
/// It holds no state besides its store, every call reads what it needs.
pub struct RelationshipGraph<S> {
    store: S,
    limits: PageLimits,
}

impl<S: RelationshipStore> RelationshipGraph<S> {
    /// Create a new graph on top of a store
    pub fn new(store: S, limits: PageLimits) -> Self {
        Self { store, limits }
    }

    /// The page size bounds listings are validated against
    pub fn limits(&self) -> &PageLimits {
        &self.limits
    }

    /// Send a friend request from `caller` to `target`.
    ///
    /// Fails if there is any edge between both accounts, no matter who
    /// initiated it or in which state it is.
    pub async fn send_friend_request(&self, caller: Uuid, target: Uuid) -> Result<(), GraphError> {
        if caller == target {
            return Err(ValidationReason::CannotFriendSelf.into());
        }

        if !self.store.account_exists(target).await? {
            return Err(ValidationReason::TargetNotFound.into());
        }

        if !self.store.find_pair(caller, target).await?.is_empty() {
            return Err(ValidationReason::RelationshipExists.into());
        }

        let edge = RelationshipEdge::new(caller, target, RelationshipStatus::FriendRequest);
        match self.store.insert_edge(&edge).await {
            Ok(()) => {}
            Err(StoreError::PairOccupied) => {
                warn!("Concurrent relationship for {} detected", edge.pair_key());
                return Err(ValidationReason::RelationshipExists.into());
            }
            Err(err) => return Err(err.into()),
        }

        debug!("Friend request {} created: {caller} -> {target}", edge.uuid);

        Ok(())
    }

    /// List the pending requests `caller` has received
    pub async fn list_incoming_requests(
        &self,
        caller: Uuid,
        page: &PageRequest,
    ) -> Result<Page<RelationshipView>, GraphError> {
        Ok(self.store.list(caller, ListScope::Incoming, page).await?)
    }

    /// List the pending requests `caller` has sent
    pub async fn list_sent_requests(
        &self,
        caller: Uuid,
        page: &PageRequest,
    ) -> Result<Page<RelationshipView>, GraphError> {
        Ok(self.store.list(caller, ListScope::Sent, page).await?)
    }

    /// List the accepted friendships of `caller`.
    ///
    /// Friendships are included regardless of who sent the original request.
    pub async fn list_friends(
        &self,
        caller: Uuid,
        page: &PageRequest,
    ) -> Result<Page<RelationshipView>, GraphError> {
        Ok(self.store.list(caller, ListScope::Friends, page).await?)
    }

    /// Retrieve a pending request addressed to `caller`.
    ///
    /// Requests sent by the caller and edges of other accounts are reported as
    /// [GraphError::NotFound], exactly like edges that don't exist.
    pub async fn get_request(
        &self,
        caller: Uuid,
        edge: Uuid,
    ) -> Result<RelationshipView, GraphError> {
        self.store
            .find_request(caller, edge)
            .await?
            .ok_or(GraphError::NotFound)
    }

    /// Accept a pending request addressed to `caller`
    pub async fn accept_friend_request(&self, caller: Uuid, edge: Uuid) -> Result<(), GraphError> {
        if !self
            .store
            .transition_request(caller, edge, RelationshipStatus::Friend)
            .await?
        {
            return Err(GraphError::NotFound);
        }

        debug!("Friend request {edge} accepted by {caller}");

        Ok(())
    }

    /// Reject a pending request addressed to `caller`.
    ///
    /// The request is deleted, so a new one may be sent afterwards.
    pub async fn reject_friend_request(&self, caller: Uuid, edge: Uuid) -> Result<(), GraphError> {
        if !self.store.delete_request(caller, edge).await? {
            return Err(GraphError::NotFound);
        }

        debug!("Friend request {edge} rejected by {caller}");

        Ok(())
    }

    /// Block `target` on behalf of `caller`.
    ///
    /// Every edge between both accounts is replaced by a single blocked edge
    /// sent by `caller`, including a block `target` has issued against `caller`.
    /// If a concurrent writer occupies the pair in the meantime, the
    /// replacement is attempted once more.
    pub async fn block_user(&self, caller: Uuid, target: Uuid) -> Result<(), GraphError> {
        if caller == target {
            return Err(ValidationReason::CannotBlockSelf.into());
        }

        if !self.store.account_exists(target).await? {
            return Err(ValidationReason::TargetNotFound.into());
        }

        let existing = self.store.find_pair(caller, target).await?;
        if existing.iter().any(|e| is_block_by(e, caller)) {
            return Err(ValidationReason::AlreadyBlocked.into());
        }

        let edge = RelationshipEdge::new(caller, target, RelationshipStatus::Blocked);
        let mut attempt = 1;
        loop {
            match self.store.replace_pair(&edge).await {
                Ok(()) => break,
                Err(StoreError::PairOccupied) => {
                    warn!("Concurrent relationship for {} detected", edge.pair_key());

                    let current = self.store.find_pair(caller, target).await?;
                    if current.iter().any(|e| is_block_by(e, caller)) {
                        return Err(ValidationReason::AlreadyBlocked.into());
                    }
                    if attempt == BLOCK_ATTEMPTS {
                        return Err(ValidationReason::RelationshipExists.into());
                    }
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }

        debug!(
            "{caller} blocked {target}, replaced {} edge(s)",
            existing.len()
        );

        Ok(())
    }
}

fn is_block_by(edge: &RelationshipEdge, sender: Uuid) -> bool {
    edge.status == RelationshipStatus::Blocked && edge.sender == sender
}
