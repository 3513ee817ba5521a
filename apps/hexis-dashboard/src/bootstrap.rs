use std::time::Duration;

use anyhow::Context;
use axum::Router;
use tracing::{info, warn};
use utoipa::OpenApi;

use hexis_store::Store;

use crate::{access_log, config::DashboardConfig, router, AppState};

pub(crate) struct BootstrapOutput {
    pub router: Router<()>,
    pub state: AppState,
}

/// Opens the store handle, optionally applies the agent schema, and wires the
/// routes to shared state. A store that cannot be reached is not fatal: the
/// service starts and reports it through `/health`.
pub(crate) async fn build(config: DashboardConfig) -> anyhow::Result<BootstrapOutput> {
    let store = Store::new(config.db_path())
        .with_busy_timeout(Duration::from_millis(config.store.busy_timeout_ms));
    if config.store.bootstrap_schema {
        let target = store.clone();
        tokio::task::spawn_blocking(move || target.bootstrap())
            .await
            .context("schema bootstrap task")?
            .context("apply agent schema")?;
        info!(db = %store.db_path().display(), "agent schema applied");
    }
    if let Err(err) = store.ping_async().await {
        warn!(
            db = %store.db_path().display(),
            error = %format!("{err:#}"),
            "store not reachable at startup; serving degraded"
        );
    }

    let (routes, endpoints, endpoints_meta) = router::build_router();
    let state = AppState::builder(store, config)
        .with_endpoints(endpoints)
        .with_endpoints_meta(endpoints_meta)
        .build();
    let router = routes.with_state(state.clone());
    Ok(BootstrapOutput { router, state })
}

pub(crate) fn attach_http_layers(router: Router<()>, concurrency_limit: usize) -> Router<()> {
    use tower::limit::ConcurrencyLimitLayer;
    use tower_http::{compression::CompressionLayer, trace::TraceLayer};

    router
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(ConcurrencyLimitLayer::new(concurrency_limit))
}

pub(crate) fn attach_global_layers(router: Router<()>, cors_any: bool) -> Router<()> {
    let router = router.layer(axum::middleware::from_fn(access_log::access_log_mw));
    if cors_any {
        router.layer(tower_http::cors::CorsLayer::permissive())
    } else {
        router
    }
}

/// Writes the OpenAPI document as YAML when `OPENAPI_OUT` is set.
pub(crate) fn ensure_openapi_export() -> Result<Option<String>, std::io::Error> {
    if let Ok(path) = std::env::var("OPENAPI_OUT") {
        export_openapi(&path)?;
        return Ok(Some(path));
    }
    Ok(None)
}

fn export_openapi(path: &str) -> Result<(), std::io::Error> {
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let yaml = crate::openapi::ApiDoc::openapi()
        .to_yaml()
        .unwrap_or_else(|_| "openapi: 3.1.0".into());
    std::fs::write(path, yaml)
}
