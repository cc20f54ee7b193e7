//! Provider runtime
//!
//! `RecordProvider` implements the five-operation contract (Create, Read,
//! Update, Delete, Diff) the host orchestration engine invokes whenever the
//! declared topology changes.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   Create/Read/Update/Delete/Diff   ┌────────────────┐
//! │ host engine  │ ─────────────────────────────────▶ │ RecordProvider │
//! └──────────────┘                                    └────────────────┘
//!                                                        │           │
//!                                               diff()   │           │ retry_transient()
//!                                                        ▼           ▼
//!                                                 ┌──────────┐ ┌───────────┐
//!                                                 │   diff   │ │ RecordApi │
//!                                                 └──────────┘ └───────────┘
//! ```
//!
//! ## Idempotency
//!
//! Every operation is safe to re-run after a crash between "remote mutation
//! succeeded" and "result reported to the host engine":
//! - Create checks for an existing record first and adopts it when it
//!   already matches the desired state
//! - Delete treats an already-absent record as success
//! - A replace interrupted between its delete and create halves is finished
//!   by the retried Update, which recreates the desired record; a replace
//!   whose create half also landed is recognized and the record adopted
//!
//! ## Locking
//!
//! None. The host engine never issues two concurrent operations against the
//! same resource instance; many provider instances may share one config and
//! one connection pool.

use crate::diff::{DiffOutcome, diff};
use crate::error::{Error, Result};
use crate::record::{DesiredRecord, ObservedRecord};
use crate::retry::{Cancellation, RetryPolicy, retry_transient};
use crate::traits::RecordApi;
use tracing::{debug, info, warn};

/// Result of a Create operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A new record was created on the controller
    Created(ObservedRecord),
    /// A record matching the desired state already existed; adopted as-is
    /// (idempotent recovery from a prior partial failure)
    AlreadyExists(ObservedRecord),
}

impl CreateOutcome {
    /// The observed record, however it came to exist
    pub fn observed(&self) -> &ObservedRecord {
        match self {
            CreateOutcome::Created(o) | CreateOutcome::AlreadyExists(o) => o,
        }
    }
}

/// Result of an Update operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Observed state already matched the desired state
    Unchanged(ObservedRecord),
    /// Target and/or TTL were updated in place; `external_id` is stable
    Updated(ObservedRecord),
    /// The record was replaced (delete-then-create). The host engine must
    /// treat the returned record as a new resource identity: its
    /// `external_id` differs from the prior one.
    Replaced(ObservedRecord),
}

impl UpdateOutcome {
    /// The observed record after the operation
    pub fn observed(&self) -> &ObservedRecord {
        match self {
            UpdateOutcome::Unchanged(o)
            | UpdateOutcome::Updated(o)
            | UpdateOutcome::Replaced(o) => o,
        }
    }
}

/// Provider runtime for one resource type
///
/// Stateless between calls: observed state is re-fetched from the controller
/// on every operation. Safe to instantiate many times over one shared
/// `RecordApi` implementation.
pub struct RecordProvider {
    /// Client seam to the remote controller
    api: Box<dyn RecordApi>,

    /// Retry policy for transient failures; applied per API call
    retry: RetryPolicy,
}

impl RecordProvider {
    /// Create a provider over a record API client
    pub fn new(api: Box<dyn RecordApi>) -> Self {
        Self {
            api,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the default retry policy
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Create the desired record
    ///
    /// Looks for an existing record under the desired name first:
    /// - none → create it
    /// - one that matches target and TTL → adopt it (a prior run crashed
    ///   after the controller applied the create)
    /// - one that diverges → `Error::Conflict`; ambiguous state requires
    ///   operator resolution and is never auto-overwritten
    pub async fn create(
        &self,
        desired: &DesiredRecord,
        cancel: &Cancellation,
    ) -> Result<CreateOutcome> {
        desired.validate()?;

        let existing = retry_transient(&self.retry, cancel, "find_by_name", || {
            self.api.find_by_name(&desired.domain_name)
        })
        .await?;

        if let Some(observed) = existing {
            if observed.matches(desired) {
                info!(
                    domain = %desired.domain_name,
                    external_id = %observed.external_id,
                    "record already exists with desired content, adopting"
                );
                return Ok(CreateOutcome::AlreadyExists(observed));
            }
            return Err(Error::conflict(format!(
                "record '{}' already exists with different content \
                 (observed {} ttl={}, desired {} ttl={})",
                desired.domain_name,
                observed.target,
                observed.ttl,
                desired.target,
                desired.ttl,
            )));
        }

        let observed = retry_transient(&self.retry, cancel, "create", || {
            self.api.create(desired)
        })
        .await?;

        info!(
            domain = %observed.domain_name,
            external_id = %observed.external_id,
            "record created"
        );
        Ok(CreateOutcome::Created(observed))
    }

    /// Read current observed state
    ///
    /// The controller's API is name-addressed, so the lookup goes through
    /// the record's last-known `domain_name` (carried in `prior`).
    /// `Ok(None)` is not an error: it signals the host engine that the
    /// remote record has drifted away and must be recreated.
    pub async fn read(
        &self,
        prior: &ObservedRecord,
        cancel: &Cancellation,
    ) -> Result<Option<ObservedRecord>> {
        let found = retry_transient(&self.retry, cancel, "find_by_name", || {
            self.api.find_by_name(&prior.domain_name)
        })
        .await?;

        match found {
            Some(observed) => {
                if observed.external_id != prior.external_id {
                    // Out-of-band recreate under the same name; report what
                    // the controller holds and let the host engine decide
                    warn!(
                        domain = %prior.domain_name,
                        prior_id = %prior.external_id,
                        observed_id = %observed.external_id,
                        "record identity changed out of band"
                    );
                }
                Ok(Some(observed))
            }
            None => {
                debug!(domain = %prior.domain_name, "record absent on controller");
                Ok(None)
            }
        }
    }

    /// Reconcile the record toward the desired state
    ///
    /// Re-fetches observed state by the last-known name, diffs it against
    /// `desired`, then:
    /// - `NoOp` → returns observed state unchanged
    /// - `UpdateInPlace` → updates target/TTL keyed by `external_id`
    /// - `Replace` → deletes the old record, then creates the new one.
    ///   Delete comes first: domain names are unique on the controller, so
    ///   create-before-delete would collide. A brief window with no record
    ///   is accepted over a uniqueness conflict.
    ///
    /// If the remote record has drifted away entirely, the desired record is
    /// recreated and reported as a replacement. Both create paths adopt a
    /// record that already holds the desired name and content, so a replace
    /// that a previous run left half-done (or fully done but unreported) is
    /// converged rather than failed.
    pub async fn update(
        &self,
        prior: &ObservedRecord,
        desired: &DesiredRecord,
        cancel: &Cancellation,
    ) -> Result<UpdateOutcome> {
        desired.validate()?;

        let found = retry_transient(&self.retry, cancel, "find_by_name", || {
            self.api.find_by_name(&prior.domain_name)
        })
        .await?;

        let Some(observed) = found else {
            warn!(
                domain = %prior.domain_name,
                "record drifted away, recreating as '{}'", desired.domain_name
            );
            let created = self.adopt_or_create(desired, cancel).await?;
            return Ok(UpdateOutcome::Replaced(created));
        };

        if observed.external_id != prior.external_id {
            warn!(
                domain = %prior.domain_name,
                prior_id = %prior.external_id,
                observed_id = %observed.external_id,
                "record identity changed out of band, reconciling the observed record"
            );
        }

        match diff(desired, &observed) {
            DiffOutcome::NoOp => {
                debug!(
                    domain = %observed.domain_name,
                    external_id = %observed.external_id,
                    "record already matches desired state"
                );
                Ok(UpdateOutcome::Unchanged(observed))
            }
            DiffOutcome::UpdateInPlace(delta) => {
                debug!(
                    domain = %observed.domain_name,
                    external_id = %observed.external_id,
                    target_changed = delta.target.is_some(),
                    ttl_changed = delta.ttl.is_some(),
                    "updating record in place"
                );
                let updated = retry_transient(&self.retry, cancel, "update", || {
                    self.api.update(&observed.external_id, desired)
                })
                .await?;
                info!(
                    domain = %updated.domain_name,
                    external_id = %updated.external_id,
                    "record updated"
                );
                Ok(UpdateOutcome::Updated(updated))
            }
            DiffOutcome::Replace => {
                info!(
                    old_domain = %observed.domain_name,
                    new_domain = %desired.domain_name,
                    "domain name changed, replacing record (delete then create)"
                );

                let deleted = retry_transient(&self.retry, cancel, "delete", || {
                    self.api.delete(&observed.external_id)
                })
                .await?;
                if !deleted {
                    // Already gone; a previous half-finished replace
                    debug!(
                        external_id = %observed.external_id,
                        "old record already absent before replace"
                    );
                }

                let created = self.adopt_or_create(desired, cancel).await?;
                info!(
                    domain = %created.domain_name,
                    external_id = %created.external_id,
                    "replacement record in place"
                );
                Ok(UpdateOutcome::Replaced(created))
            }
        }
    }

    /// Find-or-create for the create half of a replace
    ///
    /// A previous run may have crashed after the controller applied the
    /// create but before the result was reported; in that window the desired
    /// record already exists under its name. Adopting it keeps the retried
    /// replace convergent. A divergent record under the desired name is a
    /// conflict, never overwritten.
    async fn adopt_or_create(
        &self,
        desired: &DesiredRecord,
        cancel: &Cancellation,
    ) -> Result<ObservedRecord> {
        let existing = retry_transient(&self.retry, cancel, "find_by_name", || {
            self.api.find_by_name(&desired.domain_name)
        })
        .await?;

        if let Some(observed) = existing {
            if observed.matches(desired) {
                info!(
                    domain = %desired.domain_name,
                    external_id = %observed.external_id,
                    "replacement record already exists with desired content, adopting"
                );
                return Ok(observed);
            }
            return Err(Error::conflict(format!(
                "record '{}' already exists with different content \
                 (observed {} ttl={}, desired {} ttl={})",
                desired.domain_name,
                observed.target,
                observed.ttl,
                desired.target,
                desired.ttl,
            )));
        }

        retry_transient(&self.retry, cancel, "create", || self.api.create(desired)).await
    }

    /// Delete the record addressed by `external_id`
    ///
    /// An already-absent record is success, not an error: a re-run after a
    /// crash between the controller applying the delete and the result being
    /// reported must converge, not fail.
    pub async fn delete(&self, external_id: &str, cancel: &Cancellation) -> Result<()> {
        let deleted = retry_transient(&self.retry, cancel, "delete", || {
            self.api.delete(external_id)
        })
        .await?;

        if deleted {
            info!(external_id = %external_id, "record deleted");
        } else {
            debug!(external_id = %external_id, "record already absent, nothing to delete");
        }
        Ok(())
    }

    /// Compute the change needed to bring `observed` to `desired`
    ///
    /// Pure; makes no network calls. Exposed so the host engine can preview
    /// whether an Update would be a no-op, an in-place change, or a replace.
    pub fn diff(&self, desired: &DesiredRecord, observed: &ObservedRecord) -> DiffOutcome {
        diff(desired, observed)
    }
}

impl std::fmt::Debug for RecordProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordProvider")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
