//! Log windowers and the raw lookups behind the action feed.

use std::collections::HashMap;

use anyhow::{Context, Result};
use rusqlite::{params, params_from_iter, Connection};
use serde_json::Value;

use hexis_contracts::{CostTable, HeartbeatEntry, MaintenanceRun, RawAction};

use crate::sql::{col_f64, col_i64, col_json, col_text};
use crate::{limit_param, Store};

/// Newest first; the heartbeat number and row id make ties deterministic.
pub(crate) const HEARTBEAT_ORDER: &str =
    "julianday(started_at) DESC, heartbeat_number DESC, id DESC";
pub(crate) const MAINTENANCE_ORDER: &str = "julianday(ran_at) DESC, id DESC";

/// One heartbeat's embedded action array, before flattening.
#[derive(Debug, Clone, PartialEq)]
pub struct HeartbeatActions {
    pub heartbeat_number: i64,
    pub started_at: Option<String>,
    pub actions: Vec<RawAction>,
}

/// Decodes an `actions_taken` column. Entries that are not action objects are
/// dropped.
pub(crate) fn raw_actions(column: Option<Value>) -> Vec<RawAction> {
    match column {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

pub(crate) fn read_cost_table(conn: &Connection) -> Result<CostTable> {
    let mut stmt = conn.prepare(
        "SELECT key, value FROM heartbeat_config WHERE key LIKE 'cost\\_%' ESCAPE '\\'",
    )?;
    let entries = stmt
        .query_map([], |row| {
            Ok((
                col_text(row, 0)?.unwrap_or_default(),
                col_json(row, 1)?.unwrap_or(Value::Null),
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("read action cost config")?;
    Ok(CostTable::from_config(entries))
}

impl Store {
    pub fn recent_heartbeats(&self, limit: usize) -> Result<Vec<HeartbeatEntry>> {
        let conn = self.conn()?;
        let query = format!(
            "SELECT id, heartbeat_number, started_at, ended_at, energy_start, energy_end, \
             narrative, emotional_valence FROM heartbeat_log ORDER BY {HEARTBEAT_ORDER} LIMIT ?1"
        );
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt
            .query_map(params![limit_param(limit)], |row| {
                Ok(HeartbeatEntry {
                    id: col_i64(row, 0)?.unwrap_or(0),
                    heartbeat_number: col_i64(row, 1)?.unwrap_or(0),
                    started_at: col_text(row, 2)?,
                    ended_at: col_text(row, 3)?,
                    energy_start: col_f64(row, 4)?.unwrap_or(0.0),
                    energy_end: col_f64(row, 5)?.unwrap_or(0.0),
                    narrative: col_text(row, 6)?,
                    emotional_valence: col_f64(row, 7)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read heartbeat window")?;
        Ok(rows)
    }

    pub fn maintenance_log(&self, limit: usize) -> Result<Vec<MaintenanceRun>> {
        let conn = self.conn()?;
        let query = format!(
            "SELECT id, ran_at, neighborhoods_recomputed, embedding_cache_deleted, \
             working_memory_deleted, working_memory_promoted FROM maintenance_log \
             ORDER BY {MAINTENANCE_ORDER} LIMIT ?1"
        );
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt
            .query_map(params![limit_param(limit)], |row| {
                Ok(MaintenanceRun {
                    id: col_i64(row, 0)?.unwrap_or(0),
                    ran_at: col_text(row, 1)?,
                    neighborhoods_recomputed: col_i64(row, 2)?.unwrap_or(0),
                    embedding_cache_deleted: col_i64(row, 3)?.unwrap_or(0),
                    working_memory_deleted: col_i64(row, 4)?.unwrap_or(0),
                    working_memory_promoted: col_i64(row, 5)?.unwrap_or(0),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read maintenance window")?;
        Ok(rows)
    }

    /// Last `limit` heartbeats whose action array is non-empty, newest first.
    pub fn heartbeat_actions(&self, limit: usize) -> Result<Vec<HeartbeatActions>> {
        let conn = self.conn()?;
        let query = format!(
            "SELECT heartbeat_number, started_at, actions_taken FROM heartbeat_log \
             WHERE actions_taken IS NOT NULL \
               AND (CASE WHEN json_valid(actions_taken) \
                    THEN json_array_length(actions_taken) ELSE 0 END) > 0 \
             ORDER BY {HEARTBEAT_ORDER} LIMIT ?1"
        );
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt
            .query_map(params![limit_param(limit)], |row| {
                Ok(HeartbeatActions {
                    heartbeat_number: col_i64(row, 0)?.unwrap_or(0),
                    started_at: col_text(row, 1)?,
                    actions: raw_actions(col_json(row, 2)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read heartbeat actions")?;
        Ok(rows)
    }

    pub fn action_cost_table(&self) -> Result<CostTable> {
        let conn = self.conn()?;
        read_cost_table(&conn)
    }

    /// Outputs of finished external calls, keyed by id, in one query. Pending
    /// calls and calls without output are left out.
    pub fn external_call_outputs(&self, ids: &[String]) -> Result<HashMap<String, Value>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let conn = self.conn()?;
        let placeholders = vec!["?"; ids.len()].join(",");
        let query = format!(
            "SELECT id, output FROM external_calls \
             WHERE id IN ({placeholders}) AND output IS NOT NULL \
               AND COALESCE(status, '') <> 'pending'"
        );
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt
            .query_map(params_from_iter(ids.iter()), |row| {
                Ok((col_text(row, 0)?, col_json(row, 1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read external calls")?;
        Ok(rows
            .into_iter()
            .filter_map(|(id, output)| match (id, output) {
                (Some(id), Some(output)) if !output.is_null() => Some((id, output)),
                _ => None,
            })
            .collect())
    }
}
