use anyhow::{Context, Result};
use rusqlite::params;
use serde_json::Value;

use hexis_contracts::{
    Concept, DailyCount, EpisodicMemory, Identity, IdentityAspect, ImportanceDistribution,
    MemoryDynamics, OutboxMessage, SemanticMemory, WorldviewPrimitive,
};

use crate::sql::{col_bool, col_f64, col_i64, col_json, col_text};
use crate::{limit_param, Store};

const TIMELINE_WINDOW: &str = "julianday('now', '-30 days')";

impl Store {
    pub fn recent_episodic(&self, limit: usize) -> Result<Vec<EpisodicMemory>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT m.id, m.content, m.importance, m.trust_level, m.created_at, \
                    em.action_taken, em.context, em.result, em.emotional_valence, \
                    em.verification_status, em.event_time \
             FROM memories m JOIN episodic_memories em ON m.id = em.memory_id \
             WHERE m.status = 'active' \
             ORDER BY julianday(m.created_at) DESC, m.id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit_param(limit)], |row| {
                Ok(EpisodicMemory {
                    id: col_text(row, 0)?.unwrap_or_default(),
                    content: col_text(row, 1)?.unwrap_or_default(),
                    importance: col_f64(row, 2)?.unwrap_or(0.0),
                    trust_level: col_f64(row, 3)?.unwrap_or(0.0),
                    created_at: col_text(row, 4)?,
                    action_taken: col_json(row, 5)?,
                    context: col_json(row, 6)?,
                    result: col_json(row, 7)?,
                    emotional_valence: col_f64(row, 8)?,
                    verification_status: col_bool(row, 9)?,
                    event_time: col_text(row, 10)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read episodic memories")?;
        Ok(rows)
    }

    pub fn semantic_memories(&self, limit: usize) -> Result<Vec<SemanticMemory>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT m.id, m.content, m.importance, m.trust_level, m.created_at, \
                    sm.confidence, sm.last_validated, sm.category, sm.related_concepts \
             FROM memories m JOIN semantic_memories sm ON m.id = sm.memory_id \
             WHERE m.status = 'active' \
             ORDER BY m.importance DESC, julianday(m.created_at) DESC, m.id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit_param(limit)], |row| {
                Ok(SemanticMemory {
                    id: col_text(row, 0)?.unwrap_or_default(),
                    content: col_text(row, 1)?.unwrap_or_default(),
                    importance: col_f64(row, 2)?.unwrap_or(0.0),
                    trust_level: col_f64(row, 3)?.unwrap_or(0.0),
                    created_at: col_text(row, 4)?,
                    confidence: col_f64(row, 5)?.unwrap_or(0.0),
                    last_validated: col_text(row, 6)?,
                    category: col_json(row, 7)?,
                    related_concepts: col_json(row, 8)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read semantic memories")?;
        Ok(rows)
    }

    pub fn memory_dynamics(&self) -> Result<MemoryDynamics> {
        let conn = self.conn()?;
        let daily = |query: &str| -> Result<Vec<DailyCount>> {
            let mut stmt = conn.prepare(query)?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(DailyCount {
                        date: col_text(row, 0)?.unwrap_or_default(),
                        kind: col_text(row, 1)?.unwrap_or_else(|| "unknown".to_string()),
                        count: col_i64(row, 2)?.unwrap_or(0),
                    })
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        };
        let creation_timeline = daily(&format!(
            "SELECT date(created_at) AS day, type, COUNT(*) FROM memories \
             WHERE julianday(created_at) > {TIMELINE_WINDOW} \
             GROUP BY day, type ORDER BY day DESC, type"
        ))
        .context("read memory creation timeline")?;
        let cluster_growth = daily(&format!(
            "SELECT date(created_at) AS day, cluster_type, COUNT(*) FROM memory_clusters \
             WHERE julianday(created_at) > {TIMELINE_WINDOW} \
             GROUP BY day, cluster_type ORDER BY day DESC, cluster_type"
        ))
        .context("read cluster growth")?;

        let mut importance_distribution = ImportanceDistribution::default();
        let mut stmt = conn.prepare(
            "SELECT CASE \
                 WHEN importance < 0.2 THEN 'very_low' \
                 WHEN importance < 0.4 THEN 'low' \
                 WHEN importance < 0.6 THEN 'medium' \
                 WHEN importance < 0.8 THEN 'high' \
                 ELSE 'very_high' END AS bucket, COUNT(*) \
             FROM memories WHERE status = 'active' GROUP BY bucket",
        )?;
        let buckets = stmt
            .query_map([], |row| {
                Ok((col_text(row, 0)?.unwrap_or_default(), col_i64(row, 1)?.unwrap_or(0)))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read importance distribution")?;
        for (bucket, n) in buckets {
            importance_distribution.add(&bucket, n);
        }

        Ok(MemoryDynamics {
            creation_timeline,
            cluster_growth,
            importance_distribution,
        })
    }

    pub fn identity(&self) -> Result<Identity> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, aspect_type, content, stability, updated_at FROM identity_aspects \
             ORDER BY stability DESC, aspect_type, id",
        )?;
        let aspects = stmt
            .query_map([], |row| {
                Ok(IdentityAspect {
                    id: col_text(row, 0)?.unwrap_or_default(),
                    aspect_type: col_text(row, 1)?.unwrap_or_default(),
                    content: col_json(row, 2)?.unwrap_or(Value::Null),
                    stability: col_f64(row, 3)?.unwrap_or(0.0),
                    updated_at: col_text(row, 4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read identity aspects")?;

        let mut stmt = conn.prepare(
            "SELECT id, category, belief, confidence, emotional_valence, stability_score \
             FROM worldview_primitives \
             ORDER BY confidence IS NULL, confidence DESC, julianday(created_at) DESC, id",
        )?;
        let worldview = stmt
            .query_map([], |row| {
                Ok(WorldviewPrimitive {
                    id: col_text(row, 0)?.unwrap_or_default(),
                    category: col_text(row, 1)?.unwrap_or_default(),
                    belief: col_text(row, 2)?.unwrap_or_default(),
                    confidence: col_f64(row, 3)?,
                    emotional_valence: col_f64(row, 4)?,
                    stability_score: col_f64(row, 5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read worldview")?;

        Ok(Identity { aspects, worldview })
    }

    pub fn concepts(&self, limit: usize) -> Result<Vec<Concept>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.name, c.ancestors, c.depth, c.description, \
                    COUNT(mc.memory_id) AS memory_count \
             FROM concepts c LEFT JOIN memory_concepts mc ON c.id = mc.concept_id \
             GROUP BY c.id ORDER BY memory_count DESC, c.name, c.id LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit_param(limit)], |row| {
                let ancestors = match col_json(row, 2)? {
                    Some(Value::Array(items)) => items
                        .into_iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect(),
                    _ => Vec::new(),
                };
                Ok(Concept {
                    id: col_text(row, 0)?.unwrap_or_default(),
                    name: col_text(row, 1)?.unwrap_or_default(),
                    description: col_text(row, 4)?,
                    ancestors,
                    depth: col_i64(row, 3)?.unwrap_or(0),
                    memory_count: col_i64(row, 5)?.unwrap_or(0),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read concepts")?;
        Ok(rows)
    }

    /// Messages the agent addressed to the user, newest first.
    pub fn outbox(&self, limit: usize) -> Result<Vec<OutboxMessage>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, created_at, payload, status, sent_at FROM outbox_messages \
             WHERE kind = 'user' ORDER BY julianday(created_at) DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit_param(limit)], |row| {
                let payload = col_json(row, 2)?.unwrap_or(Value::Null);
                let field = |name: &str| {
                    payload.get(name).and_then(|v| match v {
                        Value::String(s) => Some(s.clone()),
                        Value::Null => None,
                        other => Some(other.to_string()),
                    })
                };
                Ok(OutboxMessage {
                    id: col_text(row, 0)?.unwrap_or_default(),
                    created_at: col_text(row, 1)?,
                    message: field("message"),
                    intent: field("intent"),
                    heartbeat_id: field("heartbeat_id"),
                    status: col_text(row, 3)?.unwrap_or_else(|| "pending".to_string()),
                    sent_at: col_text(row, 4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("read outbox")?;
        Ok(rows)
    }

    pub fn unseen_outbox_count(&self) -> Result<i64> {
        let conn = self.conn()?;
        let n = conn
            .query_row(
                "SELECT COUNT(*) FROM outbox_messages WHERE status = 'sent' AND seen_at IS NULL",
                [],
                |row| col_i64(row, 0),
            )
            .context("count unseen outbox messages")?;
        Ok(n.unwrap_or(0))
    }
}
