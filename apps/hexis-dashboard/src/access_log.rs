use axum::extract::{ConnectInfo, MatchedPath};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use once_cell::sync::Lazy;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

#[derive(Clone, Debug, PartialEq)]
struct Cfg {
    enabled: bool,
    sample_n: u64,
    ua: bool,
}

impl Cfg {
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |key: &str| get(key).as_deref().map(str::trim) == Some("1");
        Self {
            enabled: flag("HEXIS_ACCESS_LOG"),
            sample_n: get("HEXIS_ACCESS_SAMPLE_N")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(1)
                .max(1),
            ua: flag("HEXIS_ACCESS_UA"),
        }
    }

    /// Emit every `sample_n`-th request, counting from one.
    fn sampled(&self, n: u64) -> bool {
        self.sample_n <= 1 || n % self.sample_n == 0
    }
}

static CFG: Lazy<Cfg> = Lazy::new(|| Cfg::from_lookup(|key| std::env::var(key).ok()));

static COUNTER: AtomicU64 = AtomicU64::new(0);

/// One `http.access` event per request: method, matched route, status,
/// duration and peer address.
pub async fn access_log_mw(req: Request<axum::body::Body>, next: Next) -> Response {
    if !CFG.enabled {
        return next.run(req).await;
    }
    let started = Instant::now();
    let method = req.method().clone();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|c| c.0.ip().to_string())
        .unwrap_or_default();
    let ua = if CFG.ua {
        req.headers()
            .get(axum::http::header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
    } else {
        None
    };
    let res = next.run(req).await;
    let n = COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    if !CFG.sampled(n) {
        return res;
    }
    tracing::info!(
        target: hexis_otel::ACCESS_TARGET,
        method = method.as_str(),
        path = %path,
        status = res.status().as_u16(),
        dur_ms = started.elapsed().as_millis() as u64,
        remote = %remote,
        ua = ua.as_deref().unwrap_or(""),
        "request"
    );
    res
}
