use rorm::fields::types::ForeignModel;
use rorm::{DbEnum, Model, Patch};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Account;

/// The state of a relationship between two accounts
#[derive(DbEnum, ToSchema, Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    /// The sender asked the receiver to become friends
    FriendRequest,
    /// The request was accepted, the direction has no meaning anymore
    Friend,
    /// The sender blocked the receiver
    Blocked,
}

/// A directed edge between two accounts.
///
/// There is at most one edge for every unordered pair of accounts,
/// which is enforced by the unique `pair_key`.
#[derive(Model)]
pub struct Relationship {
    /// The primary key of a relationship
    #[rorm(primary_key)]
    pub uuid: Uuid,

    /// The current state
    pub status: RelationshipStatus,

    /// The account that initiated the relationship
    #[rorm(on_update = "Cascade", on_delete = "Cascade")]
    pub sender: ForeignModel<Account>,

    /// The account the relationship is directed at
    #[rorm(on_update = "Cascade", on_delete = "Cascade")]
    pub receiver: ForeignModel<Account>,

    /// Both account uuids in ascending order, separated by a colon.
    ///
    /// See [PairKey](crate::graph::PairKey).
    #[rorm(max_length = 73, unique)]
    pub pair_key: String,

    /// The point in time the relationship was created
    #[rorm(auto_create_time)]
    pub created_at: chrono::NaiveDateTime,

    /// The point in time the status was changed the last time
    #[rorm(auto_create_time, auto_update_time)]
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Patch)]
#[rorm(model = "Relationship")]
pub(crate) struct RelationshipInsert {
    pub(crate) uuid: Uuid,
    pub(crate) status: RelationshipStatus,
    pub(crate) sender: ForeignModel<Account>,
    pub(crate) receiver: ForeignModel<Account>,
    pub(crate) pair_key: String,
}
