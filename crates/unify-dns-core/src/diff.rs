//! Reconciliation logic
//!
//! `diff` is a pure function deciding whether the observed record already
//! realizes the desired state, can be brought there in place, or must be
//! replaced. The caller handles absence (create) before diffing; absence is
//! not a diff case.

use crate::record::{DesiredRecord, ObservedRecord, RecordTarget};

/// Fields that an in-place update would change
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldDelta {
    /// New target, when it differs from the observed one
    pub target: Option<RecordTarget>,
    /// New TTL, when it differs from the observed one
    pub ttl: Option<u32>,
}

/// Outcome of diffing desired against observed state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    /// Observed state already matches; nothing to do
    NoOp,
    /// Target and/or TTL changed; the record can be updated in place
    UpdateInPlace(FieldDelta),
    /// The domain name changed. The controller has no rename operation and
    /// names are unique, so the old record must be deleted before the new
    /// one is created.
    Replace,
}

/// Compute the action needed to bring `observed` to `desired`
pub fn diff(desired: &DesiredRecord, observed: &ObservedRecord) -> DiffOutcome {
    if desired.domain_name != observed.domain_name {
        return DiffOutcome::Replace;
    }

    let delta = FieldDelta {
        target: (desired.target != observed.target).then(|| desired.target.clone()),
        ttl: (desired.ttl != observed.ttl).then_some(desired.ttl),
    };

    if delta == FieldDelta::default() {
        DiffOutcome::NoOp
    } else {
        DiffOutcome::UpdateInPlace(delta)
    }
}
