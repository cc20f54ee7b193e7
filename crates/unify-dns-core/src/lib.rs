// # unify-dns-core
//
// Core library for reconciling UniFi controller DNS records against a
// declarative resource graph.
//
// ## Architecture Overview
//
// This library provides the provider side of the reconciliation contract:
// - **RecordApi**: Trait for the remote controller's record API (the client seam)
// - **RecordProvider**: Runtime implementing Create/Read/Update/Delete/Diff
//   for the host orchestration engine
// - **diff**: Pure reconciliation logic deciding no-op vs in-place update vs replace
// - **RetryPolicy / Cancellation**: Bounded, transient-only retry with
//   caller-supplied cancellation
//
// ## Design Principles
//
// 1. **Separation of Concerns**: The API client classifies failures but never
//    retries; retry policy is owned by the provider runtime so it stays
//    observable and testable
// 2. **Idempotency**: Every operation is safe to re-run after a crash between
//    "remote mutation succeeded" and "result reported"
// 3. **No hidden state**: Observed state is re-fetched from the controller on
//    every operation, never cached across calls
// 4. **Library-First**: The host engine is an external collaborator; this
//    crate exposes only the five-operation surface it depends on

pub mod config;
pub mod diff;
pub mod error;
pub mod provider;
pub mod record;
pub mod retry;
pub mod traits;

// Re-export core types for convenience
pub use config::{ApiToken, ProviderConfig};
pub use diff::{DiffOutcome, FieldDelta, diff};
pub use error::{Error, Result};
pub use provider::{CreateOutcome, RecordProvider, UpdateOutcome};
pub use record::{DesiredRecord, ObservedRecord, RecordTarget};
pub use retry::{CancelHandle, Cancellation, RetryPolicy};
pub use traits::RecordApi;
