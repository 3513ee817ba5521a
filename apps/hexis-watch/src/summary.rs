use serde_json::Value;

const ACTIONS_SHOWN: usize = 5;

fn num(v: &Value) -> Option<f64> {
    v.as_f64()
}

/// Compact text view of a snapshot. Missing fields render as `?`.
pub(crate) fn render(snap: &Value) -> String {
    let mut lines = Vec::new();

    let hb = &snap["heartbeatState"];
    let energy = match (num(&hb["currentEnergy"]), num(&hb["maxEnergy"])) {
        (Some(cur), Some(max)) if max > 0.0 => {
            format!("{cur:.1}/{max:.1} ({:.0}%)", cur / max * 100.0)
        }
        (Some(cur), Some(max)) => format!("{cur:.1}/{max:.1}"),
        _ => "?".to_string(),
    };
    let count = hb["heartbeatCount"]
        .as_i64()
        .map(|n| n.to_string())
        .unwrap_or_else(|| "?".into());
    let last = hb["lastHeartbeat"].as_str().unwrap_or("never");
    let paused = if hb["isPaused"].as_bool() == Some(true) {
        "  [paused]"
    } else {
        ""
    };
    lines.push(format!(
        "energy {energy}  heartbeats {count}  last {last}{paused}"
    ));

    let drives: Vec<String> = snap["drives"]["drives"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .map(|d| {
                    let name = d["name"].as_str().unwrap_or("?");
                    let level = num(&d["current_level"]).unwrap_or(0.0);
                    if d["is_urgent"].as_bool() == Some(true) {
                        format!("{name} {level:.2} (urgent)")
                    } else {
                        format!("{name} {level:.2}")
                    }
                })
                .collect()
        })
        .unwrap_or_default();
    if drives.is_empty() {
        lines.push("drives: none".into());
    } else {
        lines.push(format!("drives: {}", drives.join(", ")));
    }

    let counts = &snap["goals"]["counts"];
    lines.push(format!(
        "goals: {} active, {} queued, {} blocked",
        counts["active"].as_i64().unwrap_or(0),
        counts["queued"].as_i64().unwrap_or(0),
        counts["blocked"].as_i64().unwrap_or(0),
    ));

    let actions = snap["recentActions"].as_array().cloned().unwrap_or_default();
    if actions.is_empty() {
        lines.push("last actions: none".into());
    } else {
        lines.push("last actions:".into());
        for a in actions.iter().take(ACTIONS_SHOWN) {
            lines.push(format!(
                "  #{} {} {} (cost {})",
                a["heartbeatNumber"].as_i64().unwrap_or(0),
                a["action"].as_str().unwrap_or("?"),
                a["summary"].as_str().unwrap_or(""),
                num(&a["cost"]).unwrap_or(0.0),
            ));
        }
    }

    let degraded: Vec<&str> = snap["degraded"]
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    if !degraded.is_empty() {
        lines.push(format!("degraded: {}", degraded.join(", ")));
    }
    lines.join("\n")
}
