use std::net::SocketAddr;

use tracing::{error, info};

mod access_log;
mod api;
mod app_state;
mod bootstrap;
pub mod config;
mod openapi;
mod read_models;
mod responses;
mod router;
#[cfg(test)]
mod test_support;

pub(crate) use app_state::AppState;

#[tokio::main]
async fn main() {
    match bootstrap::ensure_openapi_export() {
        Ok(Some(_)) => return,
        Ok(None) => {}
        Err(err) => {
            eprintln!("error: failed to write generated OPENAPI_OUT: {err}");
            std::process::exit(2);
        }
    }

    hexis_otel::init();

    let cfg = match config::DashboardConfig::load() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    };
    let addr = match cfg.socket_addr() {
        Ok(addr) => addr,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(2);
        }
    };
    let concurrency_limit = cfg.server.concurrency_limit;
    let cors_any = cfg.server.cors_any;

    let bootstrap::BootstrapOutput { router, state } = match bootstrap::build(cfg).await {
        Ok(out) => out,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    };

    let app = bootstrap::attach_global_layers(
        bootstrap::attach_http_layers(router, concurrency_limit),
        cors_any,
    );

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            eprintln!("error: bind {addr}: {err}");
            std::process::exit(1);
        }
    };
    info!(
        %addr,
        db = %state.store().db_path().display(),
        endpoints = state.endpoints().len(),
        "hexis dashboard listening"
    );

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal());

    if let Err(err) = server.await {
        error!("http server exited with error: {err}");
    }
}

async fn shutdown_signal() {
    info!("shutdown signal listener active");
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                error!("failed to install SIGTERM handler: {err}");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("shutdown signal received");
}

#[cfg(test)]
#[allow(clippy::items_after_test_module)]
mod http_tests {
    use super::*;
    use crate::router::{self, paths};
    use crate::test_support;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use hexis_store::Store;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn app(store: Store) -> Router {
        let (routes, _, _) = router::build_router();
        routes.with_state(test_support::state_for(store))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri(uri)
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        read(response).await
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .expect("request"),
            )
            .await
            .expect("response");
        read(response).await
    }

    async fn read(response: axum::response::Response) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn missing_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::new(dir.path().join("absent.sqlite"));
        (dir, store)
    }

    #[tokio::test]
    async fn health_reports_unreachable_store() {
        let (_dir, store) = missing_store();
        let (status, body) = get_json(app(store), paths::HEALTH).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "unhealthy");
        assert_eq!(body["database"]["connected"], false);
        assert!(body["database"]["error"].as_str().is_some());
        assert!(body["timestamp"].as_str().is_some());
    }

    #[tokio::test]
    async fn health_counts_core_tables() {
        let (_dir, store) = test_support::fresh_store();
        test_support::seed(
            &store,
            "INSERT INTO memories (id, type, content, created_at) \
             VALUES ('m1', 'episodic', 'hello', '2025-03-01T10:00:00Z');",
        );
        let (status, body) = get_json(app(store), paths::HEALTH).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(
            body["database"],
            json!({"connected": true, "tables": {"memories": 1, "episodes": 0, "clusters": 0}})
        );
    }

    #[tokio::test]
    async fn read_endpoint_on_missing_store_is_500_with_details() {
        let (_dir, store) = missing_store();
        let (status, body) = get_json(app(store), paths::GOALS).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch goals");
        assert!(body["details"].as_str().is_some());
    }

    #[tokio::test]
    async fn blank_inbox_message_is_rejected_without_insert() {
        let (_dir, store) = test_support::fresh_store();
        for message in ["", "   "] {
            let (status, body) =
                post_json(app(store.clone()), paths::INBOX_MESSAGE, json!({"message": message}))
                    .await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body, json!({"success": false, "error": "Message is required"}));
        }
        let (status, _) = post_json(app(store.clone()), paths::INBOX_MESSAGE, json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(test_support::count_rows(&store, "inbox_messages"), 0);
    }

    #[tokio::test]
    async fn inbox_message_becomes_episodic_memory() {
        let (_dir, store) = test_support::fresh_store();
        let (status, body) = post_json(
            app(store.clone()),
            paths::INBOX_MESSAGE,
            json!({"message": "  how are you?  ", "tone": "warm"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let inbox_id = body["inboxId"].as_str().expect("inboxId").to_string();
        let memory_id = body["memoryId"].as_str().expect("memoryId").to_string();

        let conn = rusqlite::Connection::open(store.db_path()).expect("open");
        let (content, importance): (String, f64) = conn
            .query_row(
                "SELECT content, importance FROM memories WHERE id = ?1",
                [&memory_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("memory row");
        assert_eq!(content, "how are you?");
        assert_eq!(importance, 0.6);
        let linked: String = conn
            .query_row(
                "SELECT memory_id FROM inbox_messages WHERE id = ?1 AND processed_at IS NOT NULL",
                [&inbox_id],
                |row| row.get(0),
            )
            .expect("processed inbox row");
        assert_eq!(linked, memory_id);
    }

    #[tokio::test]
    async fn unknown_tone_is_stored_as_normal() {
        let (_dir, store) = test_support::fresh_store();
        let (status, body) = post_json(
            app(store.clone()),
            paths::INBOX_MESSAGE,
            json!({"message": "", "tone": "cheerful"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"success": false, "error": "Message is required"}));

        let (status, body) = post_json(
            app(store.clone()),
            paths::INBOX_MESSAGE,
            json!({"message": "hello", "tone": "cheerful"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let inbox_id = body["inboxId"].as_str().expect("inboxId").to_string();
        let conn = rusqlite::Connection::open(store.db_path()).expect("open");
        let (tone, importance): (String, f64) = conn
            .query_row(
                "SELECT tone, importance FROM inbox_messages WHERE id = ?1",
                [&inbox_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .expect("inbox row");
        assert_eq!(tone, "normal");
        assert_eq!(importance, 0.5);
    }

    #[tokio::test]
    async fn inbox_processing_failure_reports_inbox_id() {
        let (_dir, store) = test_support::fresh_store();
        test_support::seed(&store, "DROP TABLE episodic_memories;");
        let (status, body) =
            post_json(app(store.clone()), paths::INBOX_MESSAGE, json!({"message": "ping"})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Failed to process message");
        assert!(body["details"].as_str().is_some());
        assert!(body["inboxId"].as_str().is_some());
        assert_eq!(test_support::count_rows(&store, "inbox_messages"), 1);
        assert_eq!(test_support::count_rows(&store, "memories"), 0);
    }

    #[tokio::test]
    async fn recent_actions_resolve_costs() {
        let (_dir, store) = test_support::fresh_store();
        test_support::seed(
            &store,
            r#"
            INSERT INTO heartbeat_config (key, value) VALUES ('cost_rest', '10');
            INSERT INTO heartbeat_log (heartbeat_number, started_at, energy_start, energy_end, actions_taken)
                VALUES (4, '2025-03-01T09:00:00Z', 20, 10, '[{"action":"rest"}]'),
                       (5, '2025-03-01T10:00:00Z', 10, 7, '[{"action":"recall","cost":3}]');
            "#,
        );
        let (status, body) = get_json(app(store), paths::RECENT_ACTIONS).await;
        assert_eq!(status, StatusCode::OK);
        let shape: Vec<Value> = body
            .as_array()
            .expect("array")
            .iter()
            .map(|a| json!([a["heartbeatNumber"], a["action"], a["cost"]]))
            .collect();
        assert_eq!(shape, vec![json!([5, "recall", 3.0]), json!([4, "rest", 10.0])]);
    }

    #[tokio::test]
    async fn recent_actions_survive_missing_external_calls() {
        let (_dir, store) = test_support::fresh_store();
        test_support::seed(
            &store,
            r#"
            INSERT INTO heartbeat_log (heartbeat_number, started_at, energy_start, energy_end, actions_taken)
                VALUES (1, '2025-03-01T09:00:00Z', 20, 15,
                        '[{"action":"inquire_deep","result":{"external_call_id":"ec-1"}}]');
            DROP TABLE external_calls;
            "#,
        );
        let (status, body) = get_json(app(store), "/recent-actions?limit=5").await;
        assert_eq!(status, StatusCode::OK);
        let actions = body.as_array().expect("array");
        assert_eq!(actions.len(), 1);
        assert!(actions[0].get("externalOutput").is_none());
    }

    #[tokio::test]
    async fn malformed_limit_uses_default() {
        let (_dir, store) = test_support::fresh_store();
        let mut sql = String::new();
        for n in 1..=20 {
            sql.push_str(&format!(
                "INSERT INTO heartbeat_log (heartbeat_number, started_at, energy_start, energy_end) \
                 VALUES ({n}, '2025-03-01T{:02}:00:00Z', 20, 19);\n",
                n % 24
            ));
        }
        test_support::seed(&store, &sql);
        let (_, body) = get_json(app(store.clone()), "/recent-heartbeats?limit=abc").await;
        assert_eq!(body.as_array().expect("array").len(), 15);
        let (_, body) = get_json(app(store.clone()), "/recent-heartbeats?limit=-3").await;
        assert_eq!(body.as_array().expect("array").len(), 0);
        let (_, body) = get_json(app(store), "/recent-heartbeats?limit=2").await;
        let numbers: Vec<i64> = body
            .as_array()
            .expect("array")
            .iter()
            .filter_map(|hb| hb["heartbeat_number"].as_i64())
            .collect();
        assert_eq!(numbers, vec![20, 19]);
    }

    #[tokio::test]
    async fn drives_with_zero_threshold() {
        let (_dir, store) = test_support::fresh_store();
        test_support::seed(
            &store,
            "INSERT INTO drives (name, current_level, baseline, urgency_threshold) \
             VALUES ('rest', 0.4, 0.2, 0);",
        );
        let (status, body) = get_json(app(store), paths::DRIVES).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["drives"][0]["urgency_percent"], 0.0);
        assert_eq!(body["drives"][0]["is_urgent"], true);
        assert_eq!(body["avgDriveLevel"], 0.4);
    }

    #[tokio::test]
    async fn dashboard_lists_degraded_sections() {
        let (_dir, store) = test_support::fresh_store();
        test_support::seed(&store, "DROP TABLE drives;");
        let (status, body) = get_json(app(store), paths::DASHBOARD).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["degraded"], json!(["drives"]));
        assert_eq!(body["drives"], json!({"drives": [], "avgDriveLevel": 0.0}));
        assert_eq!(body["connectionHealth"]["database"], "connected");
        assert!(body["derived"]["energyPercent"].is_number());
    }

    #[tokio::test]
    async fn dashboard_on_missing_store_is_still_ok() {
        let (_dir, store) = missing_store();
        let (status, body) = get_json(app(store), paths::DASHBOARD).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["degraded"].as_array().expect("degraded").len(), 8);
        assert_eq!(body["connectionHealth"]["database"], "disconnected");
        assert_eq!(body["connectionHealth"]["mcpBridge"], "unknown");
    }

    #[tokio::test]
    async fn vitality_includes_connection_health() {
        let (_dir, store) = test_support::fresh_store();
        let (status, body) = get_json(app(store), paths::VITALITY).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["activeMemories"], 0);
        assert_eq!(body["connectionHealth"]["database"], "connected");
        assert_eq!(body["connectionHealth"]["llmApi"], "unknown");
    }

    #[tokio::test]
    async fn outbox_endpoints() {
        let (_dir, store) = test_support::fresh_store();
        test_support::seed(
            &store,
            r#"
            INSERT INTO outbox_messages (id, kind, payload, status, created_at, sent_at)
                VALUES ('o1', 'user', '{"message":"hi there","intent":"greet"}', 'sent',
                        '2025-03-01T10:00:00Z', '2025-03-01T10:00:05Z');
            "#,
        );
        let (status, body) = get_json(app(store.clone()), paths::OUTBOX).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["messages"][0]["message"], "hi there");
        let (_, body) = get_json(app(store), paths::OUTBOX_UNSEEN).await;
        assert_eq!(body, json!({"unseenCount": 1}));
    }

    #[tokio::test]
    async fn about_lists_endpoints() {
        let (_dir, store) = test_support::fresh_store();
        let (status, body) = get_json(app(store), paths::ABOUT).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], env!("CARGO_PKG_NAME"));
        let endpoints = body["endpoints"].as_array().expect("endpoints");
        assert!(endpoints.contains(&json!("GET /dashboard")));
        assert!(endpoints.contains(&json!("POST /inbox-message")));
        assert_eq!(body["counts"]["total"], endpoints.len());
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let (_dir, store) = test_support::fresh_store();
        let (status, body) = get_json(app(store), paths::OPENAPI_JSON).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/inbox-message"]["post"].is_object());
        assert!(body["components"]["schemas"]["DashboardSnapshot"].is_object());
    }
}
