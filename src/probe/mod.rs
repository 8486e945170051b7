// src/probe/mod.rs

//! HTTP probing of registered API endpoints and websites.
//!
//! - [`http`] performs a single request and measures its latency.
//! - [`service`] manages endpoint/check definitions and records every result.

pub mod http;
pub mod service;

pub use http::{HttpProbe, ProbeRequest, ProbeResult};
pub use service::{CheckProbe, CheckStatus, EndpointProbe, ProbeService};
