// # Record API Trait
//
// Defines the interface to the remote controller's DNS record API.
//
// ## Implementations
//
// - UniFi Network controller: `unify-dns-client` crate
// - In-memory mock: `tests/common` (contract tests)
//
// ## Trust boundary
//
// Implementations turn typed intents into authenticated HTTP calls and typed
// outcomes. They classify every non-2xx response into the `Error` taxonomy
// before returning, and they NEVER retry internally: retry policy is owned
// by `RecordProvider` so that retry behavior stays observable and testable
// independently of transport.
//
// If implementations retried on their own:
// - the runtime could not bound the total retry budget
// - backoff would compound invisibly across layers
// - cancellation could not stop a hidden retry loop
//
// Correct approach: return the classified error, single-shot per call.

use crate::error::Result;
use crate::record::{DesiredRecord, ObservedRecord};
use async_trait::async_trait;

/// Interface to the controller's record API
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: the host engine reconciles
/// independent resources on a parallel worker pool sharing one client and
/// one connection pool.
///
/// # Statelessness
///
/// Implementations hold configuration and a connection pool, nothing else.
/// Observed state is re-fetched per call, never cached.
#[async_trait]
pub trait RecordApi: Send + Sync {
    /// Find the record currently holding `domain_name`
    ///
    /// Domain names are globally unique on the controller, so at most one
    /// record can match.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))`: the record as the controller holds it
    /// - `Ok(None)`: no record with that name exists (absence is a value,
    ///   not an error)
    /// - `Err(Error)`: classified failure
    async fn find_by_name(&self, domain_name: &str) -> Result<Option<ObservedRecord>>;

    /// Create a record for the desired state
    ///
    /// # Returns
    ///
    /// The created record including its controller-assigned `external_id`.
    async fn create(&self, desired: &DesiredRecord) -> Result<ObservedRecord>;

    /// Update the record addressed by `external_id` in place
    ///
    /// Only target and TTL may change through this path; the runtime
    /// realizes a domain-name change as delete-then-create instead.
    async fn update(&self, external_id: &str, desired: &DesiredRecord) -> Result<ObservedRecord>;

    /// Delete the record addressed by `external_id`
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: the record was deleted
    /// - `Ok(false)`: the record was already absent (404); implementations
    ///   report absence truthfully and leave the treat-as-success decision
    ///   to the runtime
    async fn delete(&self, external_id: &str) -> Result<bool>;
}
