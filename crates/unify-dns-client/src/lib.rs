// # UniFi Network Controller Client
//
// `RecordApi` implementation against a UniFi Network controller's static-DNS
// endpoint.
//
// ## Behavior
//
// - One HTTP round trip per trait call (list, create, update or delete)
// - Every call carries the bearer credential from `ProviderConfig.api_token`
// - TLS certificate validation is skipped when `verify_ssl=false` (accepted
//   only for private/self-signed controller endpoints)
// - Every non-2xx response is classified into the core error taxonomy before
//   being returned
// - NO retry logic (intentionally omitted - owned by `RecordProvider`)
// - NO caching (observed state is re-fetched per call)
//
// ## Security
//
// - The API token NEVER appears in logs or `Debug` output
// - The client fails fast on an empty token (config validation)
//
// ## API Reference
//
// Static DNS entries live under the controller's network application proxy:
// - List:   GET    `/proxy/network/v2/api/site/:site/static-dns`
// - Create: POST   `/proxy/network/v2/api/site/:site/static-dns`
// - Update: PUT    `/proxy/network/v2/api/site/:site/static-dns/:id`
// - Delete: DELETE `/proxy/network/v2/api/site/:site/static-dns/:id`

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use unify_dns_core::config::ProviderConfig;
use unify_dns_core::record::{DesiredRecord, ObservedRecord, RecordTarget};
use unify_dns_core::traits::RecordApi;
use unify_dns_core::{Error, Result};
use url::Url;

/// Default HTTP timeout for controller API requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Wire representation of one static-DNS entry
///
/// Field names follow the controller's JSON: `key` is the domain name,
/// `value` the target, `_id` the controller-assigned identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StaticDnsEntry {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<String>,

    key: String,

    record_type: String,

    value: String,

    ttl: u32,

    #[serde(default = "default_enabled")]
    enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl StaticDnsEntry {
    /// Build the wire payload for a desired record
    fn from_desired(desired: &DesiredRecord) -> Self {
        Self {
            id: None,
            key: desired.domain_name.clone(),
            record_type: desired.target.record_type().to_string(),
            value: desired.target.to_string(),
            ttl: desired.ttl,
            enabled: true,
        }
    }

    /// Whether this provider manages entries of this record type
    fn is_managed_type(&self) -> bool {
        matches!(self.record_type.as_str(), "A" | "CNAME")
    }

    /// Convert a controller entry into observed state
    fn into_observed(self) -> Result<ObservedRecord> {
        let external_id = self
            .id
            .ok_or_else(|| Error::api("controller entry is missing '_id'"))?;
        let target = RecordTarget::parse(&self.record_type, &self.value)?;

        Ok(ObservedRecord {
            external_id,
            domain_name: self.key,
            target,
            ttl: self.ttl,
        })
    }
}

/// UniFi Network controller client
///
/// Stateless and immutable: holds the endpoint, the credential and one
/// reqwest connection pool, all safe for concurrent reuse across provider
/// instances.
pub struct UnifyClient {
    base_url: Url,
    api_token: String,
    site: String,
    client: reqwest::Client,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for UnifyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnifyClient")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &"<REDACTED>")
            .field("site", &self.site)
            .finish()
    }
}

impl UnifyClient {
    /// Create a client from a provider configuration
    ///
    /// Validates the config and builds the HTTP connection pool with a
    /// request timeout. When `verify_ssl` is false the client accepts
    /// self-signed controller certificates.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;

        if !config.verify_ssl {
            tracing::warn!(
                controller = %config.base_url,
                "TLS certificate verification disabled for controller endpoint"
            );
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.clone(),
            api_token: config.api_token.expose().to_string(),
            site: config.site.clone(),
            client,
        })
    }

    /// Collection URL for the site's static-DNS entries
    fn records_url(&self) -> String {
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/proxy/network/v2/api/site/{}/static-dns", self.site)
    }

    /// URL for one static-DNS entry
    fn record_url(&self, external_id: &str) -> String {
        format!("{}/{external_id}", self.records_url())
    }

    /// Fetch the full entry list
    ///
    /// The controller's collection endpoint is not filterable by name, so
    /// name lookups go through the list.
    async fn list_entries(&self) -> Result<Vec<StaticDnsEntry>> {
        let url = self.records_url();
        tracing::debug!(site = %self.site, "listing static-DNS entries");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(classify_transport_error)?;

        let response = check_status(response, "list static-DNS entries").await?;

        response
            .json::<Vec<StaticDnsEntry>>()
            .await
            .map_err(|e| Error::api(format!("failed to parse entry list: {e}")))
    }
}

#[async_trait]
impl RecordApi for UnifyClient {
    async fn find_by_name(&self, domain_name: &str) -> Result<Option<ObservedRecord>> {
        let entries = self.list_entries().await?;

        for entry in entries {
            if entry.key != domain_name {
                continue;
            }
            if !entry.is_managed_type() {
                tracing::debug!(
                    domain = %domain_name,
                    record_type = %entry.record_type,
                    "skipping entry with unmanaged record type"
                );
                continue;
            }
            return entry.into_observed().map(Some);
        }

        Ok(None)
    }

    async fn create(&self, desired: &DesiredRecord) -> Result<ObservedRecord> {
        let url = self.records_url();
        let payload = StaticDnsEntry::from_desired(desired);

        tracing::info!(
            domain = %desired.domain_name,
            record_type = %desired.target.record_type(),
            "creating static-DNS entry"
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let response = check_status(response, "create static-DNS entry").await?;

        let entry: StaticDnsEntry = response
            .json()
            .await
            .map_err(|e| Error::api(format!("failed to parse created entry: {e}")))?;
        entry.into_observed()
    }

    async fn update(&self, external_id: &str, desired: &DesiredRecord) -> Result<ObservedRecord> {
        let url = self.record_url(external_id);
        let mut payload = StaticDnsEntry::from_desired(desired);
        payload.id = Some(external_id.to_string());

        tracing::info!(
            domain = %desired.domain_name,
            external_id = %external_id,
            "updating static-DNS entry"
        );

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let response = check_status(response, "update static-DNS entry").await?;

        let entry: StaticDnsEntry = response
            .json()
            .await
            .map_err(|e| Error::api(format!("failed to parse updated entry: {e}")))?;
        entry.into_observed()
    }

    async fn delete(&self, external_id: &str) -> Result<bool> {
        let url = self.record_url(external_id);

        tracing::info!(external_id = %external_id, "deleting static-DNS entry");

        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(classify_transport_error)?;

        match check_status(response, "delete static-DNS entry").await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Classify a reqwest transport failure
///
/// Timeouts and connection failures are transient; everything else (request
/// construction, TLS handshake rejection) is not worth retrying.
fn classify_transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() || e.is_connect() {
        Error::transient(format!("HTTP request failed: {e}"))
    } else {
        Error::api(format!("HTTP request failed: {e}"))
    }
}

/// Classify a non-2xx controller response into the error taxonomy
fn classify_status(status: u16, context: &str, body: &str) -> Error {
    match status {
        401 | 403 => Error::auth(format!(
            "{context}: invalid API token or insufficient permissions (status {status})"
        )),
        404 => Error::not_found(format!("{context}: status 404")),
        409 => Error::conflict(format!("{context}: status 409 - {body}")),
        429 => Error::transient(format!("{context}: rate limit exceeded (status 429)")),
        500..=599 => Error::transient(format!(
            "{context}: controller server error (status {status}) - {body}"
        )),
        _ => Error::api(format!("{context}: unexpected status {status} - {body}")),
    }
}

/// Return the response when 2xx, otherwise classify it
async fn check_status(response: reqwest::Response, context: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read error response".to_string());
    Err(classify_status(status.as_u16(), context, &body))
}
