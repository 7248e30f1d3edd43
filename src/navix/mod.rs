//! Navix (IXC Soft) webservice integration
//!
//! Connection settings, query bodies and response decoding are plain
//! functions so they can be exercised without a network. The HTTP client
//! itself lives behind the `navix` feature.

use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;

use crate::types::*;

#[cfg(feature = "navix")]
pub mod client;

#[cfg(feature = "navix")]
pub use client::NavixClient;

/// Default webservice root
pub const DEFAULT_BASE_URL: &str = "https://navixtelecom.com.br/webservice/v1";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Header value the webservice requires to treat a POST as a listing
pub const LIST_HEADER: (&str, &str) = ("ixcsoft", "listar");

/// Resource names
pub const CUSTOMER_RESOURCE: &str = "cliente";
pub const INVOICE_RESOURCE: &str = "fn_areceber";
pub const CONTRACT_RESOURCE: &str = "cliente_contrato";

/// Connection settings for the Navix webservice
#[derive(Clone, PartialEq, Eq)]
pub struct NavixConfig {
    pub base_url: String,
    pub user: String,
    /// API token sent as the basic-auth password
    pub token: String,
    pub timeout: Duration,
}

impl NavixConfig {
    pub fn new(user: String, token: String) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user,
            token,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Read settings from the process environment.
    ///
    /// `API_USER` and `API_PASS` are required; `NAVIX_BASE_URL` and
    /// `NAVIX_TIMEOUT_SECS` override the defaults.
    pub fn from_env() -> PortalResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`NavixConfig::from_env`] over an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> PortalResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| PortalError::Configuration(format!("{} is not set", key)))
        };

        let mut config = Self::new(required("API_USER")?, required("API_PASS")?);

        if let Some(url) = lookup("NAVIX_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(secs) = lookup("NAVIX_TIMEOUT_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                PortalError::Configuration(format!("NAVIX_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Full URL of a resource
    pub fn resource_url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource)
    }
}

impl fmt::Debug for NavixConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NavixConfig")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Listing query for one customer by id
pub fn customer_query(customer_id: &str) -> Value {
    json!({
        "qtype": "cliente.id",
        "query": customer_id,
        "oper": "=",
        "page": "1",
        "rp": "20",
        "sortname": "cliente.id",
        "sortorder": "desc"
    })
}

/// Listing query for the receivables of a customer, optionally of one contract
pub fn invoice_query(customer_id: &str, contract_id: Option<&str>) -> Value {
    let mut rules = vec![json!({
        "qtype": "fn_areceber.id_cliente",
        "query": customer_id,
        "oper": "="
    })];
    if let Some(contract_id) = contract_id {
        rules.push(json!({
            "qtype": "fn_areceber.id_contrato",
            "query": contract_id,
            "oper": "="
        }));
    }

    json!({
        "search": "true",
        "page": "1",
        "rp": "100",
        "sortname": "fn_areceber.id",
        "sortorder": "desc",
        "rules": rules
    })
}

/// Listing query for the contracts of a customer
pub fn contract_query(customer_id: &str) -> Value {
    json!({
        "qtype": "cliente_contrato.id_cliente",
        "query": customer_id,
        "oper": "=",
        "page": "1",
        "rp": "100",
        "sortname": "cliente_contrato.id",
        "sortorder": "asc"
    })
}

/// Pull the records out of a listing response.
///
/// `registros` comes back either as an array or as an object keyed by id.
/// A missing `registros` means no matches. An explicit error payload or a
/// `registros` of any other shape is reported as the upstream being
/// unavailable.
pub fn extract_records(body: &Value) -> PortalResult<Vec<serde_json::Map<String, Value>>> {
    if body.get("type").and_then(Value::as_str) == Some("error") {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unspecified error");
        return Err(PortalError::UpstreamUnavailable(message.to_string()));
    }

    let entries: Vec<&Value> = match body.get("registros") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Object(items)) => items.values().collect(),
        Some(other) => {
            return Err(PortalError::UpstreamUnavailable(format!(
                "unexpected registros payload: {}",
                other
            )))
        }
    };

    Ok(entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::Object(record) => Some(record.clone()),
            other => {
                log::warn!("skipping non-object record in listing: {}", other);
                None
            }
        })
        .collect())
}

/// Decode the body of a single-contract read.
///
/// The webservice answers either with a listing (`registros`) or with the
/// bare contract record.
pub fn decode_contract(body: &Value) -> PortalResult<Option<Contract>> {
    let is_error = body.get("type").and_then(Value::as_str) == Some("error");
    if is_error || body.get("registros").is_some() {
        return Ok(extract_records(body)?
            .into_iter()
            .find_map(Contract::from_record));
    }
    Ok(body.as_object().cloned().and_then(Contract::from_record))
}
