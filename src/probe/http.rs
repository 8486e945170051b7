// src/probe/http.rs

//! One-shot HTTP request with latency measurement.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use reqwest::Method;
use serde::Serialize;
use tracing::debug;

use crate::errors::{QahubError, Result};
use crate::store::ProbeOutcome;
use crate::types::HttpMethod;

/// How much of the response body is kept.
pub const BODY_PREVIEW_CHARS: usize = 1000;

#[derive(Debug, Clone, Copy)]
pub struct ProbeRequest<'a> {
    pub method: HttpMethod,
    pub url: &'a str,
    pub headers: Option<&'a BTreeMap<String, String>>,
    pub body: Option<&'a serde_json::Value>,
    pub timeout: Duration,
}

impl<'a> ProbeRequest<'a> {
    pub fn get(url: &'a str, timeout: Duration) -> Self {
        Self {
            method: HttpMethod::Get,
            url,
            headers: None,
            body: None,
            timeout,
        }
    }
}

/// Result of a probe. Server errors (5xx) and transport failures are not ok;
/// everything below 500 is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeResult {
    pub ok: bool,
    pub status_code: Option<u16>,
    pub latency_ms: f64,
    pub error: Option<String>,
    pub text: Option<String>,
}

impl ProbeResult {
    pub fn outcome(&self) -> ProbeOutcome {
        ProbeOutcome {
            status_code: self.status_code,
            ok: self.ok,
            latency_ms: self.latency_ms,
            error: self.error.clone(),
        }
    }

    fn failure(latency_ms: f64, error: String) -> Self {
        Self {
            ok: false,
            status_code: None,
            latency_ms,
            error: Some(error),
            text: None,
        }
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Options => Method::OPTIONS,
    }
}

/// First `BODY_PREVIEW_CHARS` characters of `text`.
pub fn preview(text: &str) -> String {
    text.chars().take(BODY_PREVIEW_CHARS).collect()
}

#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    /// Client following redirects (reqwest's default policy).
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| QahubError::ConfigError(format!("building HTTP client: {e}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Perform the request. Never fails; problems are reported in the result.
    pub async fn perform(&self, request: ProbeRequest<'_>) -> ProbeResult {
        let started = Instant::now();
        let elapsed_ms = || started.elapsed().as_secs_f64() * 1000.0;

        let mut builder = self
            .client
            .request(to_method(request.method), request.url)
            .timeout(request.timeout);
        if let Some(headers) = request.headers {
            for (name, value) in headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        if let Some(body) = request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!(url = %request.url, error = %e, "probe request failed");
                return ProbeResult::failure(elapsed_ms(), e.to_string());
            }
        };

        let status = response.status().as_u16();
        match response.text().await {
            Ok(text) => {
                let latency_ms = elapsed_ms();
                debug!(url = %request.url, status, latency_ms, "probe completed");
                ProbeResult {
                    ok: status < 500,
                    status_code: Some(status),
                    latency_ms,
                    error: None,
                    text: Some(preview(&text)),
                }
            }
            Err(e) => ProbeResult::failure(elapsed_ms(), e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_by_characters() {
        let long = "é".repeat(BODY_PREVIEW_CHARS + 10);
        let p = preview(&long);
        assert_eq!(p.chars().count(), BODY_PREVIEW_CHARS);
        assert_eq!(preview("short"), "short");
    }
}
