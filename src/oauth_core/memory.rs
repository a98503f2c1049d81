//! In-memory session registry: flow identifier (`state`) to [`Grant`].

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::Mutex;

use super::message::ResponseMessage;
use super::types::Grant;

/// Maps each flow identifier to exactly one grant.
///
/// Every operation on a single key runs under that key's shard lock, so a
/// lookup-then-update never loses a concurrent update for the same flow.
/// Distinct flows proceed in parallel. Clones share the same registry.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    grants: Arc<DashMap<String, Grant>>,
    flow_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the grant registered for `state`.
    pub fn get(&self, state: &str) -> Option<Grant> {
        self.grants.get(state).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, state: &str) -> bool {
        self.grants.contains_key(state)
    }

    /// Registers `grant` under `state`, returning the grant it replaced.
    pub fn insert(&self, state: impl Into<String>, grant: Grant) -> Option<Grant> {
        self.grants.insert(state.into(), grant)
    }

    /// Drops the grant for `state`; expiry based cleanup is left to callers.
    pub fn remove(&self, state: &str) -> Option<Grant> {
        self.flow_locks.remove(state);
        self.grants.remove(state).map(|(_, grant)| grant)
    }

    pub fn clear(&self) {
        self.grants.clear();
        self.flow_locks.clear();
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    /// Flow identifiers currently registered.
    pub fn states(&self) -> Vec<String> {
        self.grants.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Reads the grant for `state` while holding its lock.
    ///
    /// `f` must not call back into the registry.
    pub fn with_grant<R>(&self, state: &str, f: impl FnOnce(&Grant) -> R) -> Option<R> {
        self.grants.get(state).map(|entry| f(entry.value()))
    }

    /// Applies a grant-bearing response to the grant for `state`, creating the
    /// grant when none exists. Returns true when a grant was created.
    pub fn correlate(&self, state: &str, resp: &ResponseMessage, exp_in: i64, now: i64) -> bool {
        match self.grants.entry(state.to_string()) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().update(resp, now);
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(Grant::from_response(resp, exp_in, now));
                true
            }
        }
    }

    /// Async lock serializing multi-step sequences (check, refresh, use) for one flow.
    ///
    /// Only registered flows get a lock; `None` when no grant exists for `state`.
    pub fn flow_lock(&self, state: &str) -> Option<Arc<Mutex<()>>> {
        if !self.grants.contains_key(state) {
            return None;
        }
        let lock = self
            .flow_locks
            .entry(state.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        Some(lock)
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry").field("states", &self.states()).finish()
    }
}
