//! Read access to the agent's SQLite store.
//!
//! The agent process owns the database and writes to it concurrently, so every
//! method opens its own short-lived connection and never holds a transaction
//! across reads. Results are best-effort snapshots. Methods are synchronous;
//! each has an `*_async` twin that runs it on tokio's blocking pool.

use anyhow::{anyhow, Context, Result};
use rusqlite::{Connection, OpenFlags};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use hexis_contracts::{
    Concept, CostTable, DriveReport, EpisodicMemory, GoalsSnapshot, HeartbeatEntry, HeartbeatState,
    Identity, InboxMessageRequest, LastHeartbeatEnergy, MaintenanceRun, MaintenanceState,
    MemoryDynamics, MemoryStats, OutboxMessage, SemanticMemory, TableCounts, Vitality,
};

mod inbox;
mod memories;
mod readers;
pub mod schema;
mod sql;
mod windows;

pub use inbox::InboxSubmission;
pub use windows::HeartbeatActions;

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

#[derive(Clone, Debug)]
pub struct Store {
    db_path: PathBuf,
    busy_timeout: Duration,
}

impl Store {
    /// Points at a database without touching it; a missing or unreadable file
    /// only surfaces when a query runs.
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Creates the database file if needed and applies [`schema::AGENT_SCHEMA`].
    pub fn bootstrap(&self) -> Result<()> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
        }
        let conn = Connection::open(&self.db_path)
            .with_context(|| format!("open store {}", self.db_path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.execute_batch(schema::AGENT_SCHEMA)
            .context("apply agent schema")?;
        Ok(())
    }

    fn conn(&self) -> Result<Connection> {
        // No CREATE flag: a missing database is a connectivity failure, not an
        // empty store.
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&self.db_path, flags)
            .with_context(|| format!("open store {}", self.db_path.display()))?;
        conn.busy_timeout(self.busy_timeout)?;
        let _ = conn.pragma_update(None, "temp_store", "MEMORY");
        Ok(conn)
    }

    pub fn ping(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .context("ping store")?;
        Ok(())
    }

    // ---------------- Async wrappers (spawn_blocking) ----------------

    async fn blocking<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Store) -> Result<T> + Send + 'static,
    {
        let store = self.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(|e| anyhow!("join error: {}", e))?
    }

    pub async fn ping_async(&self) -> Result<()> {
        self.blocking(|s| s.ping()).await
    }

    pub async fn health_counts_async(&self) -> Result<TableCounts> {
        self.blocking(|s| s.health_counts()).await
    }

    pub async fn memory_stats_async(&self) -> Result<MemoryStats> {
        self.blocking(|s| s.memory_stats()).await
    }

    pub async fn heartbeat_state_async(&self) -> Result<HeartbeatState> {
        self.blocking(|s| s.heartbeat_state()).await
    }

    pub async fn last_heartbeat_energy_async(&self) -> Result<LastHeartbeatEnergy> {
        self.blocking(|s| s.last_heartbeat_energy()).await
    }

    pub async fn drives_async(&self) -> Result<DriveReport> {
        self.blocking(|s| s.drives()).await
    }

    pub async fn maintenance_state_async(&self) -> Result<MaintenanceState> {
        self.blocking(|s| s.maintenance_state()).await
    }

    pub async fn goals_async(&self) -> Result<GoalsSnapshot> {
        self.blocking(|s| s.goals()).await
    }

    pub async fn vitality_async(&self) -> Result<Vitality> {
        self.blocking(|s| s.vitality()).await
    }

    pub async fn recent_heartbeats_async(&self, limit: usize) -> Result<Vec<HeartbeatEntry>> {
        self.blocking(move |s| s.recent_heartbeats(limit)).await
    }

    pub async fn maintenance_log_async(&self, limit: usize) -> Result<Vec<MaintenanceRun>> {
        self.blocking(move |s| s.maintenance_log(limit)).await
    }

    pub async fn heartbeat_actions_async(&self, limit: usize) -> Result<Vec<HeartbeatActions>> {
        self.blocking(move |s| s.heartbeat_actions(limit)).await
    }

    pub async fn action_cost_table_async(&self) -> Result<CostTable> {
        self.blocking(|s| s.action_cost_table()).await
    }

    pub async fn external_call_outputs_async(
        &self,
        ids: Vec<String>,
    ) -> Result<HashMap<String, serde_json::Value>> {
        self.blocking(move |s| s.external_call_outputs(&ids)).await
    }

    pub async fn recent_episodic_async(&self, limit: usize) -> Result<Vec<EpisodicMemory>> {
        self.blocking(move |s| s.recent_episodic(limit)).await
    }

    pub async fn semantic_memories_async(&self, limit: usize) -> Result<Vec<SemanticMemory>> {
        self.blocking(move |s| s.semantic_memories(limit)).await
    }

    pub async fn memory_dynamics_async(&self) -> Result<MemoryDynamics> {
        self.blocking(|s| s.memory_dynamics()).await
    }

    pub async fn identity_async(&self) -> Result<Identity> {
        self.blocking(|s| s.identity()).await
    }

    pub async fn concepts_async(&self, limit: usize) -> Result<Vec<Concept>> {
        self.blocking(move |s| s.concepts(limit)).await
    }

    pub async fn outbox_async(&self, limit: usize) -> Result<Vec<OutboxMessage>> {
        self.blocking(move |s| s.outbox(limit)).await
    }

    pub async fn unseen_outbox_count_async(&self) -> Result<i64> {
        self.blocking(|s| s.unseen_outbox_count()).await
    }

    /// Inserts and processes the message inside one blocking task so a dropped
    /// request cannot separate the two steps.
    pub async fn submit_inbox_message_async(
        &self,
        request: InboxMessageRequest,
    ) -> Result<InboxSubmission> {
        self.blocking(move |s| s.submit_inbox_message(&request)).await
    }
}

/// SQL `LIMIT` for a window size.
fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
