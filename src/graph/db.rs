//! The [RelationshipStore] backed by the database

use chrono::{NaiveDateTime, Utc};
use rorm::fields::types::ForeignModelByField;
use rorm::{and, insert, or, query, update, Database, FieldAccess, Model};
use uuid::Uuid;

use crate::graph::{
    AccountSummary, ListScope, Page, PageRequest, PairKey, RelationshipEdge, RelationshipStore,
    RelationshipView, StoreError,
};
use crate::models::{Account, Relationship, RelationshipInsert, RelationshipStatus};

type ViewRow = (
    Uuid,
    RelationshipStatus,
    Uuid,
    String,
    String,
    Uuid,
    String,
    String,
    NaiveDateTime,
    NaiveDateTime,
);

/// Selects a relationship joined with both of its accounts as [ViewRow]
macro_rules! query_views {
    ($db:expr) => {
        query!(
            $db,
            (
                Relationship::F.uuid,
                Relationship::F.status,
                Relationship::F.sender.uuid,
                Relationship::F.sender.username,
                Relationship::F.sender.display_name,
                Relationship::F.receiver.uuid,
                Relationship::F.receiver.username,
                Relationship::F.receiver.display_name,
                Relationship::F.created_at,
                Relationship::F.updated_at,
            )
        )
    };
}

/// Matches edges of `$status` where the caller is the sender or the receiver.
///
/// Passing [Uuid::nil] for one side disables it, as no account has the nil uuid.
macro_rules! scope_condition {
    ($status:expr, $as_sender:expr, $as_receiver:expr) => {
        and!(
            Relationship::F.status.equals($status),
            or!(
                Relationship::F.sender.equals($as_sender),
                Relationship::F.receiver.equals($as_receiver)
            )
        )
    };
}

/// Matches a pending request addressed to `$receiver`
macro_rules! request_condition {
    ($receiver:expr, $edge:expr) => {
        and!(
            Relationship::F.uuid.equals($edge),
            Relationship::F.receiver.equals($receiver),
            Relationship::F.status.equals(RelationshipStatus::FriendRequest)
        )
    };
}

/// Relationship storage in the database
#[derive(Clone)]
pub struct DbStore {
    db: Database,
}

impl DbStore {
    /// Create a new store using the database connection pool
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

/// Tell a violation of the pair constraint apart from other failures.
///
/// `pair_key` is the only unique column a new edge can collide on,
/// as its primary key is a fresh v4 uuid.
fn classify_insert_error(err: rorm::Error) -> StoreError {
    let unique_violation = matches!(
        &err,
        rorm::Error::SqlxError(sqlx_err) if sqlx_err
            .as_database_error()
            .is_some_and(|db_err| db_err.is_unique_violation())
    );

    if unique_violation {
        StoreError::PairOccupied
    } else {
        StoreError::Database(err)
    }
}

fn insert_patch(edge: &RelationshipEdge) -> RelationshipInsert {
    RelationshipInsert {
        uuid: edge.uuid,
        status: edge.status,
        sender: ForeignModelByField::Key(edge.sender),
        receiver: ForeignModelByField::Key(edge.receiver),
        pair_key: edge.pair_key().as_str().to_string(),
    }
}

fn edge_from_model(relationship: Relationship) -> RelationshipEdge {
    RelationshipEdge {
        uuid: relationship.uuid,
        sender: *relationship.sender.key(),
        receiver: *relationship.receiver.key(),
        status: relationship.status,
        created_at: relationship.created_at.and_utc(),
        updated_at: relationship.updated_at.and_utc(),
    }
}

fn view_from_row(
    (
        uuid,
        status,
        sender_uuid,
        sender_username,
        sender_display_name,
        receiver_uuid,
        receiver_username,
        receiver_display_name,
        created_at,
        updated_at,
    ): ViewRow,
) -> RelationshipView {
    RelationshipView {
        uuid,
        status,
        sender: AccountSummary {
            uuid: sender_uuid,
            username: sender_username,
            display_name: sender_display_name,
        },
        receiver: AccountSummary {
            uuid: receiver_uuid,
            username: receiver_username,
            display_name: receiver_display_name,
        },
        created_at: created_at.and_utc(),
        updated_at: updated_at.and_utc(),
    }
}

impl RelationshipStore for DbStore {
    async fn account_exists(&self, uuid: Uuid) -> Result<bool, StoreError> {
        Ok(query!(&self.db, (Account::F.uuid,))
            .condition(Account::F.uuid.equals(uuid))
            .optional()
            .await?
            .is_some())
    }

    async fn find_pair(&self, a: Uuid, b: Uuid) -> Result<Vec<RelationshipEdge>, StoreError> {
        let key = PairKey::new(a, b);

        let edges = query!(&self.db, Relationship)
            .condition(Relationship::F.pair_key.equals(key.as_str()))
            .all()
            .await?;

        Ok(edges.into_iter().map(edge_from_model).collect())
    }

    async fn find_request(
        &self,
        receiver: Uuid,
        edge: Uuid,
    ) -> Result<Option<RelationshipView>, StoreError> {
        let row = query_views!(&self.db)
            .condition(request_condition!(receiver, edge))
            .optional()
            .await?;

        Ok(row.map(view_from_row))
    }

    async fn insert_edge(&self, edge: &RelationshipEdge) -> Result<(), StoreError> {
        if let Err(err) = insert!(&self.db, RelationshipInsert)
            .single(&insert_patch(edge))
            .await
        {
            return Err(classify_insert_error(err));
        }

        Ok(())
    }

    async fn transition_request(
        &self,
        receiver: Uuid,
        edge: Uuid,
        to: RelationshipStatus,
    ) -> Result<bool, StoreError> {
        let updated = update!(&self.db, Relationship)
            .condition(request_condition!(receiver, edge))
            .set(Relationship::F.status, to)
            .set(Relationship::F.updated_at, Utc::now().naive_utc())
            .exec()
            .await?;

        Ok(updated > 0)
    }

    async fn delete_request(&self, receiver: Uuid, edge: Uuid) -> Result<bool, StoreError> {
        let deleted = rorm::delete!(&self.db, Relationship)
            .condition(request_condition!(receiver, edge))
            .await?;

        Ok(deleted > 0)
    }

    async fn replace_pair(&self, edge: &RelationshipEdge) -> Result<(), StoreError> {
        let key = edge.pair_key();

        let mut tx = self.db.start_transaction().await?;

        rorm::delete!(&mut tx, Relationship)
            .condition(Relationship::F.pair_key.equals(key.as_str()))
            .await?;

        if let Err(err) = insert!(&mut tx, RelationshipInsert)
            .single(&insert_patch(edge))
            .await
        {
            // Rolls back the deletion
            drop(tx);
            return Err(classify_insert_error(err));
        }

        tx.commit().await?;

        Ok(())
    }

    async fn list(
        &self,
        caller: Uuid,
        scope: ListScope,
        page: &PageRequest,
    ) -> Result<Page<RelationshipView>, StoreError> {
        let status = scope.status();
        let (as_sender, as_receiver) = match scope {
            ListScope::Incoming => (Uuid::nil(), caller),
            ListScope::Sent => (caller, Uuid::nil()),
            ListScope::Friends => (caller, caller),
        };

        // The search spans both name columns of the other party and has to
        // ignore case, which the query builder can't express. Only the
        // caller's edges of this scope are loaded, so memory grows with the
        // number of requests or friends of a single account.
        if page.search.is_some() {
            let views = query_views!(&self.db)
                .condition(scope_condition!(status, as_sender, as_receiver))
                .order_desc(Relationship::F.created_at)
                .all()
                .await?
                .into_iter()
                .map(view_from_row)
                .filter(|view| page.matches(view, caller))
                .collect();

            return Ok(page.slice(views));
        }

        let (total,) = query!(&self.db, (Relationship::F.uuid.count(),))
            .condition(scope_condition!(status, as_sender, as_receiver))
            .one()
            .await?;

        let items = query_views!(&self.db)
            .condition(scope_condition!(status, as_sender, as_receiver))
            .order_desc(Relationship::F.created_at)
            .limit(page.limit)
            .offset(page.offset())
            .all()
            .await?
            .into_iter()
            .map(view_from_row)
            .collect();

        Ok(Page {
            items,
            total: total as u64,
            page: page.page,
            limit: page.limit,
        })
    }
}
