//! An in-memory [RelationshipStore] for tests

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::graph::{
    AccountSummary, ListScope, Page, PageRequest, PairKey, RelationshipEdge, RelationshipStore,
    RelationshipView, StoreError,
};
use crate::models::RelationshipStatus;

/// A failure injected into one of the next inserts
#[derive(Debug, Copy, Clone)]
enum InsertFault {
    /// A concurrent writer occupied the pair
    Occupied,
    /// The database failed for an unrelated reason
    Broken,
}

/// Keeps edges keyed by their [PairKey], which enforces the pair constraint
pub(crate) struct MemoryStore {
    accounts: HashMap<Uuid, AccountSummary>,
    edges: Mutex<HashMap<PairKey, RelationshipEdge>>,
    clock: AtomicI64,
    faults: Mutex<VecDeque<InsertFault>>,
}

impl MemoryStore {
    pub(crate) fn new() -> Self {
        Self {
            accounts: HashMap::new(),
            edges: Mutex::new(HashMap::new()),
            clock: AtomicI64::new(0),
            faults: Mutex::new(VecDeque::new()),
        }
    }

    /// Register an account and return its uuid
    pub(crate) fn add_account(&mut self, username: &str, display_name: &str) -> Uuid {
        let uuid = Uuid::new_v4();
        self.accounts.insert(
            uuid,
            AccountSummary {
                uuid,
                username: username.to_string(),
                display_name: display_name.to_string(),
            },
        );
        uuid
    }

    /// Let the next `count` inserts fail as if a concurrent writer occupied the pair
    pub(crate) fn occupy_next_inserts(&self, count: usize) {
        let mut faults = self.faults.lock().unwrap();
        faults.extend(std::iter::repeat(InsertFault::Occupied).take(count));
    }

    /// Let the next insert fail with a database error
    pub(crate) fn break_next_insert(&self) {
        self.faults.lock().unwrap().push_back(InsertFault::Broken);
    }

    /// All edges between `a` and `b`
    pub(crate) fn edges_between(&self, a: Uuid, b: Uuid) -> Vec<RelationshipEdge> {
        self.edges
            .lock()
            .unwrap()
            .get(&PairKey::new(a, b))
            .cloned()
            .into_iter()
            .collect()
    }

    pub(crate) fn edge_count(&self) -> usize {
        self.edges.lock().unwrap().len()
    }

    /// Strictly increasing timestamps, so ordering by creation is deterministic
    fn tick(&self) -> DateTime<Utc> {
        let step = self.clock.fetch_add(1, Ordering::SeqCst);
        DateTime::from_timestamp(step, 0).unwrap()
    }

    fn stamped(&self, edge: &RelationshipEdge) -> RelationshipEdge {
        let now = self.tick();
        RelationshipEdge {
            created_at: now,
            updated_at: now,
            ..edge.clone()
        }
    }

    fn view(&self, edge: &RelationshipEdge) -> RelationshipView {
        RelationshipView {
            uuid: edge.uuid,
            status: edge.status,
            sender: self.accounts[&edge.sender].clone(),
            receiver: self.accounts[&edge.receiver].clone(),
            created_at: edge.created_at,
            updated_at: edge.updated_at,
        }
    }

    fn take_failure(&self) -> Option<StoreError> {
        let fault = self.faults.lock().unwrap().pop_front()?;
        Some(match fault {
            InsertFault::Occupied => StoreError::PairOccupied,
            InsertFault::Broken => StoreError::Database(rorm::Error::DecodeError(
                "injected failure".to_string(),
            )),
        })
    }
}

fn is_request_for(edge: &RelationshipEdge, receiver: Uuid, uuid: Uuid) -> bool {
    edge.uuid == uuid
        && edge.receiver == receiver
        && edge.status == RelationshipStatus::FriendRequest
}

fn in_scope(scope: ListScope, caller: Uuid, edge: &RelationshipEdge) -> bool {
    edge.status == scope.status()
        && match scope {
            ListScope::Incoming => edge.receiver == caller,
            ListScope::Sent => edge.sender == caller,
            ListScope::Friends => edge.sender == caller || edge.receiver == caller,
        }
}

impl RelationshipStore for MemoryStore {
    async fn account_exists(&self, uuid: Uuid) -> Result<bool, StoreError> {
        Ok(self.accounts.contains_key(&uuid))
    }

    async fn find_pair(&self, a: Uuid, b: Uuid) -> Result<Vec<RelationshipEdge>, StoreError> {
        Ok(self.edges_between(a, b))
    }

    async fn find_request(
        &self,
        receiver: Uuid,
        edge: Uuid,
    ) -> Result<Option<RelationshipView>, StoreError> {
        let edges = self.edges.lock().unwrap();
        Ok(edges
            .values()
            .find(|e| is_request_for(e, receiver, edge))
            .map(|e| self.view(e)))
    }

    async fn insert_edge(&self, edge: &RelationshipEdge) -> Result<(), StoreError> {
        if let Some(err) = self.take_failure() {
            return Err(err);
        }

        let mut edges = self.edges.lock().unwrap();
        let key = edge.pair_key();
        if edges.contains_key(&key) {
            return Err(StoreError::PairOccupied);
        }
        edges.insert(key, self.stamped(edge));

        Ok(())
    }

    async fn transition_request(
        &self,
        receiver: Uuid,
        edge: Uuid,
        to: RelationshipStatus,
    ) -> Result<bool, StoreError> {
        let now = self.tick();
        let mut edges = self.edges.lock().unwrap();
        match edges.values_mut().find(|e| is_request_for(e, receiver, edge)) {
            Some(e) => {
                e.status = to;
                e.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_request(&self, receiver: Uuid, edge: Uuid) -> Result<bool, StoreError> {
        let mut edges = self.edges.lock().unwrap();
        let before = edges.len();
        edges.retain(|_, e| !is_request_for(e, receiver, edge));
        Ok(edges.len() < before)
    }

    async fn replace_pair(&self, edge: &RelationshipEdge) -> Result<(), StoreError> {
        // Nothing is touched when the insert is going to fail
        if let Some(err) = self.take_failure() {
            return Err(err);
        }

        let stamped = self.stamped(edge);
        self.edges.lock().unwrap().insert(edge.pair_key(), stamped);

        Ok(())
    }

    async fn list(
        &self,
        caller: Uuid,
        scope: ListScope,
        page: &PageRequest,
    ) -> Result<Page<RelationshipView>, StoreError> {
        let mut matching: Vec<RelationshipView> = self
            .edges
            .lock()
            .unwrap()
            .values()
            .filter(|e| in_scope(scope, caller, e))
            .map(|e| self.view(e))
            .filter(|view| page.matches(view, caller))
            .collect();

        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(page.slice(matching))
    }
}
