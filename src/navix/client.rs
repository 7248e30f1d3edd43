//! HTTP billing source backed by the Navix webservice

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde_json::Value;
use std::fmt;

use super::*;
use crate::traits::BillingSource;
use crate::types::*;

fn unavailable(context: &str, err: impl fmt::Display) -> PortalError {
    warn!("navix {} failed: {}", context, err);
    PortalError::UpstreamUnavailable(format!("{}: {}", context, err))
}

/// [`BillingSource`] talking to the Navix webservice over HTTPS
#[derive(Clone)]
pub struct NavixClient {
    client: Client,
    config: NavixConfig,
}

impl NavixClient {
    pub fn new(config: NavixConfig) -> PortalResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PortalError::Configuration(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Build a client from `API_USER`/`API_PASS` and friends
    pub fn from_env() -> PortalResult<Self> {
        Self::new(NavixConfig::from_env()?)
    }

    pub fn config(&self) -> &NavixConfig {
        &self.config
    }

    async fn list(
        &self,
        resource: &str,
        query: &Value,
    ) -> PortalResult<Vec<serde_json::Map<String, Value>>> {
        let url = self.config.resource_url(resource);
        debug!("POST {} {}", url, query);

        let response = self
            .client
            .post(&url)
            .header(LIST_HEADER.0, LIST_HEADER.1)
            .basic_auth(&self.config.user, Some(&self.config.token))
            .json(query)
            .send()
            .await
            .map_err(|e| unavailable(resource, e))?
            .error_for_status()
            .map_err(|e| unavailable(resource, e))?;

        let body: Value = response.json().await.map_err(|e| unavailable(resource, e))?;
        extract_records(&body)
    }
}

#[async_trait]
impl BillingSource for NavixClient {
    async fn find_customer(&self, customer_id: &str) -> PortalResult<Option<Customer>> {
        let records = self
            .list(CUSTOMER_RESOURCE, &customer_query(customer_id))
            .await?;
        Ok(records.into_iter().find_map(Customer::from_record))
    }

    async fn list_invoices(
        &self,
        customer_id: &str,
        contract_id: Option<&str>,
    ) -> PortalResult<Vec<RawInvoice>> {
        self.list(INVOICE_RESOURCE, &invoice_query(customer_id, contract_id))
            .await
    }

    async fn list_contracts(&self, customer_id: &str) -> PortalResult<Vec<Contract>> {
        let records = self
            .list(CONTRACT_RESOURCE, &contract_query(customer_id))
            .await?;
        Ok(records.into_iter().filter_map(Contract::from_record).collect())
    }

    async fn get_contract(&self, contract_id: &str) -> PortalResult<Option<Contract>> {
        let url = format!("{}/{}", self.config.resource_url(CONTRACT_RESOURCE), contract_id);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(LIST_HEADER.0, LIST_HEADER.1)
            .basic_auth(&self.config.user, Some(&self.config.token))
            .send()
            .await
            .map_err(|e| unavailable(CONTRACT_RESOURCE, e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body: Value = response
            .error_for_status()
            .map_err(|e| unavailable(CONTRACT_RESOURCE, e))?
            .json()
            .await
            .map_err(|e| unavailable(CONTRACT_RESOURCE, e))?;

        decode_contract(&body)
    }
}
