//! Record types shared between the provider runtime and the API client
//!
//! `DesiredRecord` is what the declarative graph asks for; `ObservedRecord`
//! is what the controller currently holds. Absence of an observed record is
//! a value (`Option::None`), not an error.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Target of a DNS record: an IPv4 address (A record) or a CNAME target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RecordTarget {
    /// A record pointing at an IPv4 address
    Ipv4(Ipv4Addr),
    /// CNAME record pointing at another domain name
    Cname(String),
}

impl RecordTarget {
    /// Wire record type as the controller names it
    pub fn record_type(&self) -> &'static str {
        match self {
            RecordTarget::Ipv4(_) => "A",
            RecordTarget::Cname(_) => "CNAME",
        }
    }

    /// Parse a wire value according to its declared record type
    pub fn parse(record_type: &str, value: &str) -> Result<Self> {
        match record_type {
            "A" => {
                let ip: Ipv4Addr = value
                    .parse()
                    .map_err(|e| Error::api(format!("invalid A record value '{value}': {e}")))?;
                Ok(RecordTarget::Ipv4(ip))
            }
            "CNAME" => Ok(RecordTarget::Cname(value.to_string())),
            other => Err(Error::api(format!("unsupported record type '{other}'"))),
        }
    }
}

impl fmt::Display for RecordTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordTarget::Ipv4(ip) => write!(f, "{ip}"),
            RecordTarget::Cname(name) => write!(f, "{name}"),
        }
    }
}

impl FromStr for RecordTarget {
    type Err = Error;

    /// An IPv4 literal becomes an A target, anything else a CNAME target
    fn from_str(s: &str) -> Result<Self> {
        if let Ok(ip) = s.parse::<Ipv4Addr>() {
            return Ok(RecordTarget::Ipv4(ip));
        }
        Ok(RecordTarget::Cname(s.to_string()))
    }
}

impl TryFrom<String> for RecordTarget {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<RecordTarget> for String {
    fn from(target: RecordTarget) -> Self {
        target.to_string()
    }
}

/// Desired state for one DNS record, as declared in the resource graph
///
/// Identity key is `domain_name`; a change to it is realized as a replace
/// because the controller has no rename operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesiredRecord {
    /// Fully-qualified domain name; globally unique on the controller
    pub domain_name: String,

    /// IPv4 address or CNAME target; mutable in place
    pub target: RecordTarget,

    /// Time-to-live in seconds; mutable in place
    pub ttl: u32,
}

impl DesiredRecord {
    /// Create a new desired record
    pub fn new(domain_name: impl Into<String>, target: RecordTarget, ttl: u32) -> Self {
        Self {
            domain_name: domain_name.into(),
            target,
            ttl,
        }
    }

    /// Validate the record before any network call
    ///
    /// Checks the domain name against RFC 1035 limits and, for CNAME
    /// targets, applies the same checks to the target name.
    pub fn validate(&self) -> Result<()> {
        validate_domain_name(&self.domain_name)?;

        if let RecordTarget::Cname(target) = &self.target {
            validate_domain_name(target)
                .map_err(|e| Error::validation(format!("invalid CNAME target: {e}")))?;
        }

        if self.ttl == 0 {
            return Err(Error::validation("TTL must be greater than zero"));
        }

        Ok(())
    }
}

/// Observed state of one DNS record on the controller
///
/// Addressed by `external_id` after creation, never by `domain_name` alone:
/// the name may change across a replace while the controller's id stays
/// opaque and stable for the lifetime of the remote object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedRecord {
    /// Opaque controller-assigned identifier
    pub external_id: String,

    /// Fully-qualified domain name currently held remotely
    pub domain_name: String,

    /// Current target
    pub target: RecordTarget,

    /// Current TTL in seconds
    pub ttl: u32,
}

impl ObservedRecord {
    /// Whether the remote record already realizes the desired state
    pub fn matches(&self, desired: &DesiredRecord) -> bool {
        self.domain_name == desired.domain_name
            && self.target == desired.target
            && self.ttl == desired.ttl
    }
}

/// Validate a domain name per RFC 1035 length and character rules
///
/// Not comprehensive, but catches the malformed input that would otherwise
/// surface as an opaque controller rejection.
pub fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        return Err(Error::validation("domain name cannot be empty"));
    }

    if domain.len() > 253 {
        return Err(Error::validation(format!(
            "domain name too long: {} chars (max 253)",
            domain.len()
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(Error::validation(format!(
                "domain name has empty label: '{domain}'"
            )));
        }

        if label.len() > 63 {
            return Err(Error::validation(format!(
                "domain label too long: {} chars (max 63): '{label}'",
                label.len()
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(Error::validation(format!(
                "domain label contains invalid characters: '{label}'"
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(Error::validation(format!(
                "domain label cannot start or end with hyphen: '{label}'"
            )));
        }
    }

    Ok(())
}
