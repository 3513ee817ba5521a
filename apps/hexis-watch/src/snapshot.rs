//! Fetches the dashboard snapshot, falling back to one request per section
//! when the composed endpoint is unavailable.

use anyhow::{bail, Context, Result};
use reqwest::blocking::Client;
use serde_json::{json, Map, Value};
use tracing::warn;

const SECTIONS: [(&str, &str); 8] = [
    ("status", "/status"),
    ("heartbeatState", "/heartbeat-state"),
    ("goals", "/goals"),
    ("recentHeartbeats", "/recent-heartbeats"),
    ("drives", "/drives"),
    ("recentActions", "/recent-actions"),
    ("maintenanceState", "/maintenance-state"),
    ("vitality", "/vitality"),
];

/// Empty value of the shape each section normally has.
fn fallback(key: &str) -> Value {
    match key {
        "goals" => json!({"active": [], "queued": [], "issues": [], "counts": {}}),
        "drives" => json!({"drives": [], "avgDriveLevel": 0.0}),
        "recentHeartbeats" | "recentActions" => json!([]),
        _ => json!({}),
    }
}

pub(crate) fn get_json(client: &Client, base: &str, path: &str) -> Result<Value> {
    let resp = client
        .get(format!("{base}{path}"))
        .send()
        .with_context(|| format!("requesting {path} from {base}"))?;
    let status = resp.status();
    let text = resp
        .text()
        .with_context(|| format!("reading {path} from {base}"))?;
    if !status.is_success() {
        bail!("{path} failed: status {} body {}", status, text.trim());
    }
    serde_json::from_str(&text).with_context(|| format!("parsing {path} JSON"))
}

/// Never fails: a section that cannot be fetched is replaced by its fallback
/// and listed in `degraded`.
pub(crate) fn fetch(client: &Client, base: &str) -> Value {
    match get_json(client, base, "/dashboard") {
        Ok(snap) => return snap,
        Err(err) => warn!("dashboard snapshot unavailable, fetching sections: {err:#}"),
    }
    let mut out = Map::new();
    let mut degraded = Vec::new();
    for (key, path) in SECTIONS {
        let value = match get_json(client, base, path) {
            Ok(value) => value,
            Err(err) => {
                warn!(section = key, "{err:#}");
                degraded.push(Value::String(key.to_string()));
                fallback(key)
            }
        };
        out.insert(key.to_string(), value);
    }
    out.insert("degraded".into(), Value::Array(degraded));
    Value::Object(out)
}
