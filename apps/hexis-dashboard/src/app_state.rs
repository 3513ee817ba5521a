use std::sync::Arc;

use hexis_store::Store;

use crate::config::{DashboardConfig, ReadModelConfig};

#[derive(Clone)]
pub(crate) struct AppState {
    store: Store,
    config: Arc<DashboardConfig>,
    endpoints: Arc<Vec<String>>,
    endpoints_meta: Arc<Vec<serde_json::Value>>,
}

impl AppState {
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn read_models(&self) -> &ReadModelConfig {
        &self.config.read_models
    }

    pub fn endpoints(&self) -> Arc<Vec<String>> {
        self.endpoints.clone()
    }

    pub fn endpoints_meta(&self) -> Arc<Vec<serde_json::Value>> {
        self.endpoints_meta.clone()
    }

    pub(crate) fn builder(store: Store, config: DashboardConfig) -> AppStateBuilder {
        AppStateBuilder {
            store,
            config,
            endpoints: Arc::new(Vec::new()),
            endpoints_meta: Arc::new(Vec::new()),
        }
    }
}

pub(crate) struct AppStateBuilder {
    store: Store,
    config: DashboardConfig,
    endpoints: Arc<Vec<String>>,
    endpoints_meta: Arc<Vec<serde_json::Value>>,
}

impl AppStateBuilder {
    pub(crate) fn with_endpoints(mut self, endpoints: Vec<String>) -> Self {
        self.endpoints = Arc::new(endpoints);
        self
    }

    pub(crate) fn with_endpoints_meta(mut self, endpoints_meta: Vec<serde_json::Value>) -> Self {
        self.endpoints_meta = Arc::new(endpoints_meta);
        self
    }

    pub(crate) fn build(self) -> AppState {
        AppState {
            store: self.store,
            config: Arc::new(self.config),
            endpoints: self.endpoints,
            endpoints_meta: self.endpoints_meta,
        }
    }
}
