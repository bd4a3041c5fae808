pub mod api;
pub mod config;
pub mod db;
pub mod engine;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod pagination;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::engine::MarketEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MarketEngine>,
    pub config: AppConfig,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}
