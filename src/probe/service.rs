// src/probe/service.rs

//! Registered API endpoints and website checks, and running them.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::config::ProbeSection;
use crate::errors::{QahubError, Result};
use crate::probe::http::{HttpProbe, ProbeRequest, ProbeResult};
use crate::store::{ApiEndpoint, NewCheck, NewEndpoint, ProbeStore, WebsiteCheck};

/// One entry of `run_all_endpoints`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointProbe {
    pub id: u64,
    pub name: String,
    #[serde(flatten)]
    pub result: ProbeResult,
}

/// One entry of `run_all_checks`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckProbe {
    pub id: u64,
    pub label: Option<String>,
    pub url: String,
    #[serde(flatten)]
    pub result: ProbeResult,
}

/// A website check together with its most recent result, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckStatus {
    pub id: u64,
    pub url: String,
    pub label: Option<String>,
    pub last_status: Option<bool>,
    pub last_checked: Option<DateTime<Utc>>,
    pub latency_ms: Option<f64>,
    pub status_code: Option<u16>,
}

#[derive(Debug, Clone)]
pub struct ProbeService {
    store: Arc<dyn ProbeStore>,
    http: HttpProbe,
    api_timeout: Duration,
    website_timeout: Duration,
}

fn validate_url(url: &str) -> Result<()> {
    reqwest::Url::parse(url)
        .map(|_| ())
        .map_err(|e| QahubError::Validation(format!("invalid url '{url}': {e}")))
}

impl ProbeService {
    pub fn new(
        store: Arc<dyn ProbeStore>,
        http: HttpProbe,
        api_timeout: Duration,
        website_timeout: Duration,
    ) -> Self {
        Self {
            store,
            http,
            api_timeout,
            website_timeout,
        }
    }

    pub fn from_config(store: Arc<dyn ProbeStore>, probe: &ProbeSection) -> Result<Self> {
        Ok(Self::new(
            store,
            HttpProbe::new()?,
            Duration::from_secs_f64(probe.api_timeout_secs),
            Duration::from_secs_f64(probe.website_timeout_secs),
        ))
    }

    // API endpoints

    pub fn create_endpoint(&self, endpoint: NewEndpoint) -> Result<ApiEndpoint> {
        validate_url(&endpoint.url)?;
        let endpoint = self.store.insert_endpoint(endpoint)?;
        info!(endpoint_id = endpoint.id, url = %endpoint.url, "endpoint created");
        Ok(endpoint)
    }

    pub fn list_endpoints(&self) -> Result<Vec<ApiEndpoint>> {
        self.store.list_endpoints()
    }

    pub fn delete_endpoint(&self, id: u64) -> Result<()> {
        if !self.store.delete_endpoint(id)? {
            return Err(QahubError::not_found("endpoint", id));
        }
        Ok(())
    }

    pub async fn run_endpoint(&self, id: u64) -> Result<ProbeResult> {
        let endpoint = self
            .store
            .get_endpoint(id)?
            .ok_or_else(|| QahubError::not_found("endpoint", id))?;
        self.probe_endpoint(&endpoint).await
    }

    /// Probe every endpoint, one after another.
    pub async fn run_all_endpoints(&self) -> Result<Vec<EndpointProbe>> {
        let mut results = Vec::new();
        for endpoint in self.store.list_endpoints()?.into_iter().rev() {
            let result = self.probe_endpoint(&endpoint).await?;
            results.push(EndpointProbe {
                id: endpoint.id,
                name: endpoint.name,
                result,
            });
        }
        Ok(results)
    }

    async fn probe_endpoint(&self, endpoint: &ApiEndpoint) -> Result<ProbeResult> {
        let result = self
            .http
            .perform(ProbeRequest {
                method: endpoint.method,
                url: &endpoint.url,
                headers: endpoint.headers.as_ref(),
                body: endpoint.body.as_ref(),
                timeout: self.api_timeout,
            })
            .await;

        self.store.record_api_run(endpoint.id, result.outcome())?;
        info!(
            endpoint_id = endpoint.id,
            ok = result.ok,
            status_code = ?result.status_code,
            latency_ms = result.latency_ms,
            "endpoint probed"
        );
        Ok(result)
    }

    // Website checks

    pub fn create_check(&self, check: NewCheck) -> Result<WebsiteCheck> {
        validate_url(&check.url)?;
        let check = self.store.insert_check(check)?;
        info!(check_id = check.id, url = %check.url, "website check created");
        Ok(check)
    }

    pub fn list_checks(&self) -> Result<Vec<WebsiteCheck>> {
        self.store.list_checks()
    }

    pub fn delete_check(&self, id: u64) -> Result<()> {
        if !self.store.delete_check(id)? {
            return Err(QahubError::not_found("check", id));
        }
        Ok(())
    }

    pub async fn run_check(&self, id: u64) -> Result<ProbeResult> {
        let check = self
            .store
            .get_check(id)?
            .ok_or_else(|| QahubError::not_found("check", id))?;
        self.probe_check(&check).await
    }

    pub async fn run_all_checks(&self) -> Result<Vec<CheckProbe>> {
        let mut results = Vec::new();
        for check in self.store.list_checks()?.into_iter().rev() {
            let result = self.probe_check(&check).await?;
            results.push(CheckProbe {
                id: check.id,
                label: check.label,
                url: check.url,
                result,
            });
        }
        Ok(results)
    }

    /// Every check, newest first, with its latest result.
    pub fn checks_with_status(&self) -> Result<Vec<CheckStatus>> {
        self.store
            .list_checks()?
            .into_iter()
            .map(|check| {
                let latest = self.store.latest_website_run(check.id)?;
                Ok(CheckStatus {
                    id: check.id,
                    url: check.url,
                    label: check.label,
                    last_status: latest.as_ref().map(|r| r.outcome.ok),
                    last_checked: latest.as_ref().map(|r| r.created_at),
                    latency_ms: latest.as_ref().map(|r| r.outcome.latency_ms),
                    status_code: latest.as_ref().and_then(|r| r.outcome.status_code),
                })
            })
            .collect()
    }

    async fn probe_check(&self, check: &WebsiteCheck) -> Result<ProbeResult> {
        let result = self
            .http
            .perform(ProbeRequest::get(&check.url, self.website_timeout))
            .await;

        self.store.record_website_run(check.id, result.outcome())?;
        info!(
            check_id = check.id,
            ok = result.ok,
            status_code = ?result.status_code,
            latency_ms = result.latency_ms,
            "website checked"
        );
        Ok(result)
    }
}
