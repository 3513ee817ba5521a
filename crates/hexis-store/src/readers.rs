//! Metric readers: aggregate facts about the agent, each defaulting to zero or
//! null when the underlying tables are empty.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use rusqlite::types::Value as SqlValue;
use serde_json::Value;

use hexis_contracts::{
    ActionCost, AffectiveState, Drive, DriveReport, GoalsSnapshot, HeartbeatState,
    LastHeartbeatEnergy, MaintenanceState, MemoryStats, MemoryStatus, MemoryType, TableCounts,
    Trend, Vitality,
};

use crate::sql::{self, col_bool, col_f64, col_i64, col_json, col_text};
use crate::windows::{raw_actions, read_cost_table, HEARTBEAT_ORDER, MAINTENANCE_ORDER};
use crate::Store;

/// The agent's `heartbeat_state` row (`id = 1`) exactly as stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct HeartbeatSingleton {
    pub current_energy: Option<f64>,
    pub heartbeat_count: Option<i64>,
    pub last_heartbeat_at: Option<String>,
    pub next_heartbeat_at: Option<String>,
    pub is_paused: Option<bool>,
    pub affective_state: Option<Value>,
}

/// The agent's `maintenance_state` row (`id = 1`) exactly as stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct MaintenanceSingleton {
    pub last_maintenance_at: Option<String>,
    pub is_paused: Option<bool>,
}

#[derive(Clone, Copy)]
pub(crate) enum ConfigTable {
    Heartbeat,
    Maintenance,
    Agent,
}

impl ConfigTable {
    fn name(self) -> &'static str {
        match self {
            ConfigTable::Heartbeat => "heartbeat_config",
            ConfigTable::Maintenance => "maintenance_config",
            ConfigTable::Agent => "config",
        }
    }
}

pub(crate) fn config_value(
    conn: &Connection,
    table: ConfigTable,
    key: &str,
) -> Result<Option<SqlValue>> {
    let query = format!("SELECT value FROM {} WHERE key = ?1", table.name());
    conn.query_row(&query, params![key], |row| sql::value(row, 0))
        .optional()
        .with_context(|| format!("read {}.{}", table.name(), key))
}

pub(crate) fn config_f64(conn: &Connection, table: ConfigTable, key: &str) -> Result<Option<f64>> {
    Ok(config_value(conn, table, key)?.as_ref().and_then(sql::f64_of))
}

fn count(conn: &Connection, query: &str) -> Result<i64> {
    let n = conn
        .query_row(query, [], |row| col_i64(row, 0))
        .optional()
        .with_context(|| format!("count: {query}"))?;
    Ok(n.flatten().unwrap_or(0))
}

/// Totals over the whole `memories` table; only `active` is status-filtered.
struct MemoryAggregate {
    active: i64,
    avg_importance: f64,
    avg_trust: f64,
    last_created: Option<String>,
}

fn memory_aggregate(conn: &Connection) -> Result<MemoryAggregate> {
    conn.query_row(
        "SELECT COUNT(CASE WHEN status = ?1 THEN 1 END), AVG(importance), AVG(trust_level), \
                MAX(created_at) \
         FROM memories",
        params![MemoryStatus::Active.as_str()],
        |row| {
            Ok(MemoryAggregate {
                active: col_i64(row, 0)?.unwrap_or(0),
                avg_importance: col_f64(row, 1)?.unwrap_or(0.0),
                avg_trust: col_f64(row, 2)?.unwrap_or(0.0),
                last_created: col_text(row, 3)?,
            })
        },
    )
    .context("aggregate memories")
}

fn read_heartbeat_singleton(conn: &Connection) -> Result<Option<HeartbeatSingleton>> {
    conn.query_row(
        "SELECT current_energy, heartbeat_count, last_heartbeat_at, next_heartbeat_at, \
         is_paused, affective_state FROM heartbeat_state WHERE id = 1",
        [],
        |row| {
            Ok(HeartbeatSingleton {
                current_energy: col_f64(row, 0)?,
                heartbeat_count: col_i64(row, 1)?,
                last_heartbeat_at: col_text(row, 2)?,
                next_heartbeat_at: col_text(row, 3)?,
                is_paused: col_bool(row, 4)?,
                affective_state: col_json(row, 5)?,
            })
        },
    )
    .optional()
    .context("read heartbeat_state")
}

fn read_maintenance_singleton(conn: &Connection) -> Result<Option<MaintenanceSingleton>> {
    conn.query_row(
        "SELECT last_maintenance_at, is_paused FROM maintenance_state WHERE id = 1",
        [],
        |row| {
            Ok(MaintenanceSingleton {
                last_maintenance_at: col_text(row, 0)?,
                is_paused: col_bool(row, 1)?,
            })
        },
    )
    .optional()
    .context("read maintenance_state")
}

fn llm_model(conn: &Connection) -> Result<Option<String>> {
    let raw = config_value(conn, ConfigTable::Agent, "llm.heartbeat")?;
    let model = raw.as_ref().and_then(sql::json_of).and_then(|value| match value {
        Value::Object(map) => map.get("model").and_then(Value::as_str).map(str::to_string),
        Value::String(s) => Some(s),
        _ => None,
    });
    Ok(model.filter(|m| !m.trim().is_empty()))
}

/// Only valence is logged per heartbeat, so it is the only dimension with a trend.
fn valence_trend(conn: &Connection) -> Result<Trend> {
    let query = format!(
        "SELECT emotional_valence FROM heartbeat_log ORDER BY {HEARTBEAT_ORDER} LIMIT 2"
    );
    let mut stmt = conn.prepare(&query)?;
    let recent = stmt
        .query_map([], |row| col_f64(row, 0))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("read recent valence")?;
    Ok(match recent.as_slice() {
        [Some(latest), Some(previous)] => Trend::between(*previous, *latest),
        _ => Trend::Unknown,
    })
}

impl Store {
    pub fn health_counts(&self) -> Result<TableCounts> {
        let conn = self.conn()?;
        Ok(TableCounts {
            memories: count(&conn, "SELECT COUNT(*) FROM memories")?,
            episodes: count(&conn, "SELECT COUNT(*) FROM episodes")?,
            memory_clusters: count(&conn, "SELECT COUNT(*) FROM memory_clusters")?,
        })
    }

    pub fn memory_stats(&self) -> Result<MemoryStats> {
        let conn = self.conn()?;
        let mut stats = MemoryStats::default();
        let mut stmt = conn.prepare("SELECT type, COUNT(*) FROM memories GROUP BY type")?;
        let rows = stmt.query_map([], |row| {
            Ok((col_text(row, 0)?, col_i64(row, 1)?))
        })?;
        for row in rows {
            let (kind, n) = row.context("count memories by type")?;
            if let Some(kind) = kind.as_deref().and_then(MemoryType::parse) {
                stats.set_count(kind, n.unwrap_or(0));
            }
        }
        let agg = memory_aggregate(&conn)?;
        stats.total_memories = agg.active;
        stats.avg_importance = agg.avg_importance;
        stats.avg_trust = agg.avg_trust;
        stats.last_activity = agg.last_created;
        stats.cluster_count = count(&conn, "SELECT COUNT(*) FROM memory_clusters")?;
        Ok(stats)
    }

    pub fn heartbeat_state(&self) -> Result<HeartbeatState> {
        let conn = self.conn()?;
        let singleton = read_heartbeat_singleton(&conn)?.unwrap_or_default();
        let defaults = HeartbeatState::default();

        let first_heartbeat = conn
            .query_row(
                "SELECT started_at FROM heartbeat_log \
                 ORDER BY julianday(started_at) ASC, heartbeat_number ASC, id ASC LIMIT 1",
                [],
                |row| col_text(row, 0),
            )
            .optional()
            .context("read first heartbeat")?
            .flatten();

        let mut affective_state = singleton
            .affective_state
            .as_ref()
            .map(AffectiveState::from_value)
            .unwrap_or_default();
        affective_state.valence_trend = valence_trend(&conn)?;

        Ok(HeartbeatState {
            current_energy: singleton.current_energy.unwrap_or(defaults.current_energy),
            max_energy: config_f64(&conn, ConfigTable::Heartbeat, "max_energy")?
                .unwrap_or(defaults.max_energy),
            heartbeat_count: singleton.heartbeat_count.unwrap_or(0),
            first_heartbeat,
            last_heartbeat: singleton.last_heartbeat_at,
            next_heartbeat: singleton.next_heartbeat_at,
            is_paused: singleton.is_paused.unwrap_or(false),
            interval_minutes: config_f64(&conn, ConfigTable::Heartbeat, "heartbeat_interval_minutes")?
                .unwrap_or(defaults.interval_minutes),
            maintenance_interval_seconds: config_f64(
                &conn,
                ConfigTable::Maintenance,
                "maintenance_interval_seconds",
            )?
            .unwrap_or(defaults.maintenance_interval_seconds),
            active_goals: count(&conn, "SELECT COUNT(*) FROM goals WHERE priority = 'active'")?,
            llm_model: llm_model(&conn)?.unwrap_or(defaults.llm_model),
            affective_state,
            unread_messages: count(
                &conn,
                "SELECT COUNT(*) FROM outbox_messages WHERE status = 'pending'",
            )?,
            heartbeats_24h: count(
                &conn,
                "SELECT COUNT(*) FROM heartbeat_log \
                 WHERE julianday(started_at) > julianday('now', '-24 hours')",
            )?,
        })
    }

    pub fn last_heartbeat_energy(&self) -> Result<LastHeartbeatEnergy> {
        let conn = self.conn()?;
        let recharge = config_f64(&conn, ConfigTable::Heartbeat, "base_regeneration")?
            .unwrap_or(LastHeartbeatEnergy::DEFAULT_RECHARGE);
        let query = format!(
            "SELECT heartbeat_number, energy_start, energy_end, actions_taken, decision_reasoning \
             FROM heartbeat_log ORDER BY {HEARTBEAT_ORDER} LIMIT 1"
        );
        let last = conn
            .query_row(&query, [], |row| {
                Ok((
                    col_i64(row, 0)?.unwrap_or(0),
                    col_f64(row, 1)?.unwrap_or(0.0),
                    col_f64(row, 2)?.unwrap_or(0.0),
                    col_json(row, 3)?,
                    col_text(row, 4)?,
                ))
            })
            .optional()
            .context("read last heartbeat")?;
        let Some((heartbeat_number, energy_start, energy_end, actions, reasoning)) = last else {
            return Ok(LastHeartbeatEnergy::empty(recharge));
        };

        let costs = read_cost_table(&conn)?;
        let action_costs: Vec<ActionCost> = raw_actions(actions)
            .into_iter()
            .map(|raw| {
                let action = raw.kind();
                let cost = costs.resolve(&action, raw.cost);
                ActionCost { action, cost }
            })
            .collect();
        let total_cost = action_costs.iter().map(|a| a.cost).sum();

        Ok(LastHeartbeatEnergy {
            heartbeat_number,
            energy_start,
            energy_end,
            total_cost,
            recharge,
            action_costs,
            decision_reasoning: reasoning.filter(|r| !r.trim().is_empty()),
        })
    }

    pub fn drives(&self) -> Result<DriveReport> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT name, current_level, baseline, urgency_threshold, last_satisfied FROM drives \
             ORDER BY CAST(current_level AS REAL) DESC, name ASC",
        )?;
        let drives = stmt
            .query_map([], |row| {
                Ok(Drive::new(
                    col_text(row, 0)?.unwrap_or_default(),
                    col_f64(row, 1)?.unwrap_or(0.0),
                    col_f64(row, 2)?.unwrap_or(0.0),
                    col_f64(row, 3)?.unwrap_or(0.0),
                    col_text(row, 4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read drives")?;
        let avg_drive_level = if drives.is_empty() {
            0.0
        } else {
            drives.iter().map(|d| d.current_level).sum::<f64>() / drives.len() as f64
        };
        Ok(DriveReport {
            drives,
            avg_drive_level,
        })
    }

    pub fn maintenance_state(&self) -> Result<MaintenanceState> {
        let conn = self.conn()?;
        let singleton = read_maintenance_singleton(&conn)?.unwrap_or_default();
        let interval_seconds =
            config_f64(&conn, ConfigTable::Maintenance, "maintenance_interval_seconds")?
                .map(|v| v.round() as i64)
                .unwrap_or(MaintenanceState::DEFAULT_INTERVAL_SECONDS);

        let latest_query = format!(
            "SELECT neighborhoods_recomputed, embedding_cache_deleted, working_memory_deleted, \
             working_memory_promoted FROM maintenance_log ORDER BY {MAINTENANCE_ORDER} LIMIT 1"
        );
        let latest = conn
            .query_row(&latest_query, [], |row| {
                Ok([
                    col_i64(row, 0)?.unwrap_or(0),
                    col_i64(row, 1)?.unwrap_or(0),
                    col_i64(row, 2)?.unwrap_or(0),
                    col_i64(row, 3)?.unwrap_or(0),
                ])
            })
            .optional()
            .context("read latest maintenance run")?
            .unwrap_or_default();
        let [neighborhoods_recomputed, cache_deleted, wm_deleted, wm_promoted] = latest;

        Ok(MaintenanceState {
            last_maintenance_at: singleton.last_maintenance_at,
            is_paused: singleton.is_paused.unwrap_or(false),
            interval_seconds,
            working_memory_count: count(&conn, "SELECT COUNT(*) FROM working_memory")?,
            long_term_count: count(
                &conn,
                "SELECT COUNT(*) FROM memories WHERE status = 'active' AND type <> 'working'",
            )?,
            semantic_count: count(
                &conn,
                "SELECT COUNT(*) FROM memories WHERE type = 'semantic' AND status = 'active'",
            )?,
            neighborhoods_recomputed,
            cache_deleted,
            wm_deleted,
            wm_promoted,
            pending_calls: count(&conn, "SELECT pending_calls FROM cognitive_health")?,
        })
    }

    pub fn goals(&self) -> Result<GoalsSnapshot> {
        let conn = self.conn()?;
        let raw = conn
            .query_row("SELECT snapshot FROM goals_snapshot", [], |row| col_json(row, 0))
            .optional()
            .context("read goals snapshot")?
            .flatten();
        let mut snapshot = match raw {
            Some(value) => GoalsSnapshot::from_value(value).context("decode goals snapshot")?,
            None => GoalsSnapshot::default(),
        };
        snapshot.counts.blocked = count(&conn, "SELECT blocked_goals FROM cognitive_health")?;
        Ok(snapshot)
    }

    pub fn vitality(&self) -> Result<Vitality> {
        let conn = self.conn()?;
        let agg = memory_aggregate(&conn)?;
        let working_memory_count = count(
            &conn,
            "SELECT COUNT(*) FROM working_memory \
             WHERE expiry IS NULL OR julianday(expiry) > julianday('now')",
        )?;
        let heartbeat_active =
            read_heartbeat_singleton(&conn)?.map(|hb| !hb.is_paused.unwrap_or(false));
        Ok(Vitality {
            active_memories: agg.active,
            avg_importance: agg.avg_importance,
            avg_trust: agg.avg_trust,
            working_memory_count,
            last_activity: agg.last_created,
            heartbeat_active,
        })
    }
}
