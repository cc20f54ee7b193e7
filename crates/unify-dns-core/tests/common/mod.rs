//! Test doubles and common utilities for provider contract tests
//!
//! `MockRecordApi` simulates the controller: an in-memory record table with
//! per-operation call counters, an operation log (for asserting sequencing,
//! e.g. delete-before-create on replace) and scripted failure injection.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use unify_dns_core::error::{Error, Result};
use unify_dns_core::record::{DesiredRecord, ObservedRecord};
use unify_dns_core::retry::RetryPolicy;
use unify_dns_core::traits::RecordApi;

/// In-memory controller double
///
/// Cloning shares all state and counters, so tests can keep a handle while
/// the provider owns a boxed clone.
#[derive(Clone, Default)]
pub struct MockRecordApi {
    /// Current remote records, keyed by external id
    records: Arc<Mutex<HashMap<String, ObservedRecord>>>,
    /// Monotonic id source
    next_id: Arc<AtomicUsize>,
    /// Per-operation call counters
    find_calls: Arc<AtomicUsize>,
    create_calls: Arc<AtomicUsize>,
    update_calls: Arc<AtomicUsize>,
    delete_calls: Arc<AtomicUsize>,
    /// Ordered log of operations, e.g. "delete:rec-1"
    op_log: Arc<Mutex<Vec<String>>>,
    /// Scripted failures, consumed per operation kind before it executes
    queued_failures: Arc<Mutex<HashMap<&'static str, VecDeque<Error>>>>,
}

impl MockRecordApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record as pre-existing remote state, returning its id
    pub fn seed(&self, desired: &DesiredRecord) -> String {
        let id = self.mint_id();
        let observed = ObservedRecord {
            external_id: id.clone(),
            domain_name: desired.domain_name.clone(),
            target: desired.target.clone(),
            ttl: desired.ttl,
        };
        self.records.lock().unwrap().insert(id.clone(), observed);
        id
    }

    /// Queue a failure for the next call of the given operation
    /// ("find", "create", "update" or "delete")
    pub fn fail_next(&self, op: &'static str, error: Error) {
        self.queued_failures
            .lock()
            .unwrap()
            .entry(op)
            .or_default()
            .push_back(error);
    }

    pub fn find_calls(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    /// Number of records currently held by the fake controller
    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    /// Snapshot of the operation log
    pub fn op_log(&self) -> Vec<String> {
        self.op_log.lock().unwrap().clone()
    }

    pub fn get(&self, external_id: &str) -> Option<ObservedRecord> {
        self.records.lock().unwrap().get(external_id).cloned()
    }

    fn mint_id(&self) -> String {
        format!("rec-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn log(&self, entry: String) {
        self.op_log.lock().unwrap().push(entry);
    }

    fn take_failure(&self, op: &'static str) -> Option<Error> {
        self.queued_failures
            .lock()
            .unwrap()
            .get_mut(op)
            .and_then(|q| q.pop_front())
    }
}

#[async_trait::async_trait]
impl RecordApi for MockRecordApi {
    async fn find_by_name(&self, domain_name: &str) -> Result<Option<ObservedRecord>> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        self.log(format!("find:{domain_name}"));

        if let Some(e) = self.take_failure("find") {
            return Err(e);
        }

        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .find(|r| r.domain_name == domain_name)
            .cloned())
    }

    async fn create(&self, desired: &DesiredRecord) -> Result<ObservedRecord> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.log(format!("create:{}", desired.domain_name));

        if let Some(e) = self.take_failure("create") {
            return Err(e);
        }

        // Controller enforces name uniqueness
        let mut records = self.records.lock().unwrap();
        if records.values().any(|r| r.domain_name == desired.domain_name) {
            return Err(Error::conflict(format!(
                "name '{}' already in use",
                desired.domain_name
            )));
        }

        let id = self.mint_id();
        let observed = ObservedRecord {
            external_id: id.clone(),
            domain_name: desired.domain_name.clone(),
            target: desired.target.clone(),
            ttl: desired.ttl,
        };
        records.insert(id, observed.clone());
        Ok(observed)
    }

    async fn update(&self, external_id: &str, desired: &DesiredRecord) -> Result<ObservedRecord> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.log(format!("update:{external_id}"));

        if let Some(e) = self.take_failure("update") {
            return Err(e);
        }

        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(external_id)
            .ok_or_else(|| Error::not_found(format!("no record '{external_id}'")))?;

        record.domain_name = desired.domain_name.clone();
        record.target = desired.target.clone();
        record.ttl = desired.ttl;
        Ok(record.clone())
    }

    async fn delete(&self, external_id: &str) -> Result<bool> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.log(format!("delete:{external_id}"));

        if let Some(e) = self.take_failure("delete") {
            return Err(e);
        }

        Ok(self.records.lock().unwrap().remove(external_id).is_some())
    }
}

/// Retry policy with millisecond delays so tests run fast
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 5,
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(10),
    }
}
