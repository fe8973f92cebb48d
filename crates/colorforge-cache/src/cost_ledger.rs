//! Per-key byte cost bookkeeping.
//!
//! The ledger is the authoritative record of what each cached entry was
//! charged. The map is only reachable through the operations below, and every
//! operation runs under one async mutex, so a reader never sees a half-applied
//! update. Callers that need several operations to land together (the cache
//! `set` path) hold a [`LedgerGuard`] for the duration.

use std::collections::HashMap;
use tokio::sync::{Mutex, MutexGuard};

/// Byte costs keyed by cache key.
#[derive(Debug, Default)]
pub struct CostLedger {
    costs: Mutex<HashMap<String, usize>>,
}

impl CostLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire exclusive access for a multi-step update.
    pub async fn lock(&self) -> LedgerGuard<'_> {
        LedgerGuard {
            costs: self.costs.lock().await,
        }
    }

    /// Record `cost` for `key`, replacing any previous value.
    pub async fn set_cost(&self, key: impl Into<String>, cost: usize) {
        self.lock().await.set_cost(key, cost);
    }

    /// Last recorded cost for `key`, or 0 if unknown.
    pub async fn cost(&self, key: &str) -> usize {
        self.lock().await.cost(key)
    }

    /// Forget `key`. No-op if absent.
    pub async fn remove_cost(&self, key: &str) {
        self.lock().await.remove_cost(key);
    }

    /// Forget everything.
    pub async fn remove_all_costs(&self) {
        self.lock().await.remove_all_costs();
    }

    /// Sum of all recorded costs.
    pub async fn total(&self) -> usize {
        self.lock().await.total()
    }

    /// Number of keys with a recorded cost.
    pub async fn len(&self) -> usize {
        self.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Exclusive view of the ledger.
///
/// Exposes the same operations as [`CostLedger`], applied synchronously while
/// the lock is held.
pub struct LedgerGuard<'a> {
    costs: MutexGuard<'a, HashMap<String, usize>>,
}

impl LedgerGuard<'_> {
    pub fn set_cost(&mut self, key: impl Into<String>, cost: usize) {
        self.costs.insert(key.into(), cost);
    }

    pub fn cost(&self, key: &str) -> usize {
        self.costs.get(key).copied().unwrap_or(0)
    }

    pub fn remove_cost(&mut self, key: &str) {
        self.costs.remove(key);
    }

    pub fn remove_all_costs(&mut self) {
        self.costs.clear();
    }

    pub fn total(&self) -> usize {
        self.costs.values().sum()
    }

    pub fn len(&self) -> usize {
        self.costs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.costs.is_empty()
    }
}
