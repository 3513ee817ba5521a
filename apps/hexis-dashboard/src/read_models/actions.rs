//! The flattened action feed: heartbeat action arrays unrolled newest first,
//! costed against the configured defaults, then enriched with external call
//! outputs fetched in a single batch.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::warn;

use hexis_contracts::{CostTable, ResolvedAction};
use hexis_store::{HeartbeatActions, Store};

/// `limit` bounds the number of heartbeats read, not the number of actions.
pub(crate) async fn recent_actions(
    store: &Store,
    limit: usize,
) -> anyhow::Result<Vec<ResolvedAction>> {
    let (heartbeats, costs) = tokio::try_join!(
        store.heartbeat_actions_async(limit),
        store.action_cost_table_async()
    )?;
    let mut actions = unroll(heartbeats, &costs);
    let ids = external_call_ids(&actions);
    if ids.is_empty() {
        return Ok(actions);
    }
    match store.external_call_outputs_async(ids).await {
        Ok(outputs) => attach(&mut actions, &outputs),
        Err(err) => warn!(
            target: "hexis::read_models",
            error = %format!("{err:#}"),
            "external call enrichment failed; serving actions without outputs"
        ),
    }
    Ok(actions)
}

/// Flattens heartbeats in the order given, keeping each heartbeat's array order.
pub(crate) fn unroll(
    heartbeats: Vec<HeartbeatActions>,
    costs: &CostTable,
) -> Vec<ResolvedAction> {
    heartbeats
        .into_iter()
        .flat_map(|hb| {
            let number = hb.heartbeat_number;
            let started_at = hb.started_at;
            hb.actions
                .into_iter()
                .map(move |raw| ResolvedAction::from_raw(number, started_at.clone(), raw, costs))
        })
        .collect()
}

/// Distinct referenced call ids in first-seen order.
pub(crate) fn external_call_ids(actions: &[ResolvedAction]) -> Vec<String> {
    let mut seen = HashSet::new();
    actions
        .iter()
        .filter_map(ResolvedAction::external_call_id)
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

pub(crate) fn attach(actions: &mut [ResolvedAction], outputs: &HashMap<String, Value>) {
    for action in actions.iter_mut() {
        if let Some(output) = action
            .external_call_id()
            .and_then(|id| outputs.get(&id))
        {
            action.external_output = Some(output.clone());
        }
    }
}
