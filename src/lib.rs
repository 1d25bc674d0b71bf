pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod execution;
pub mod gateway;
pub mod intelligence;
pub mod metrics;
pub mod models;
pub mod services;

use std::sync::Arc;

use crate::db::DomainStore;

/// Shared state for the reporting API.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DomainStore>,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    /// Bearer token required on `/api` routes; `None` disables the check.
    pub api_token: Option<String>,
}
