//! The one write path: user messages dropped into the agent's inbox.

use anyhow::{anyhow, bail, Context, Result};
use rusqlite::{params, OptionalExtension};
use serde_json::json;
use uuid::Uuid;

use hexis_contracts::{InboxMessageRequest, Tone};

use crate::sql::{col_f64, col_text, now_timestamp};
use crate::Store;

const USER_MESSAGE_TRUST: f64 = 1.0;

/// Outcome of [`Store::submit_inbox_message`]. The inbox row exists whenever
/// this value does; `memory` carries the processing result.
#[derive(Debug)]
pub struct InboxSubmission {
    pub inbox_id: String,
    pub memory: Result<String>,
}

impl InboxSubmission {
    pub fn memory_id(&self) -> Option<&str> {
        self.memory.as_ref().ok().map(String::as_str)
    }
}

impl Store {
    /// Stores the raw message with its tone weights; returns the inbox id.
    pub fn insert_inbox_message(&self, request: &InboxMessageRequest) -> Result<String> {
        let message = request.trimmed_message();
        if message.is_empty() {
            bail!("{}", InboxMessageRequest::MESSAGE_REQUIRED);
        }
        let tone = request.tone();
        let weights = tone.weights();
        let id = Uuid::new_v4().to_string();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO inbox_messages \
             (id, content, in_reply_to, tone, emotional_valence, importance, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                message,
                request.in_reply_to,
                tone.as_str(),
                weights.valence,
                weights.importance,
                now_timestamp(),
            ],
        )
        .context("insert inbox message")?;
        Ok(id)
    }

    /// Turns an unprocessed inbox row into an episodic memory and marks the row
    /// processed, all in one transaction. Returns the new memory id.
    pub fn process_inbox_message(&self, inbox_id: &str) -> Result<String> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let row = tx
            .query_row(
                "SELECT content, in_reply_to, tone, emotional_valence, importance, \
                        created_at, processed_at \
                 FROM inbox_messages WHERE id = ?1",
                params![inbox_id],
                |row| {
                    Ok((
                        col_text(row, 0)?.unwrap_or_default(),
                        col_text(row, 1)?,
                        col_text(row, 2)?,
                        col_f64(row, 3)?,
                        col_f64(row, 4)?,
                        col_text(row, 5)?,
                        col_text(row, 6)?,
                    ))
                },
            )
            .optional()
            .context("load inbox message")?;
        let (content, in_reply_to, tone, valence, importance, received_at, processed_at) =
            row.ok_or_else(|| anyhow!("inbox message {inbox_id} not found"))?;
        if processed_at.is_some() {
            bail!("inbox message {inbox_id} already processed");
        }
        let fallback = Tone::default().weights();
        let now = now_timestamp();
        let memory_id = Uuid::new_v4().to_string();

        tx.execute(
            "INSERT INTO memories (id, type, status, content, importance, trust_level, created_at) \
             VALUES (?1, 'episodic', 'active', ?2, ?3, ?4, ?5)",
            params![
                memory_id,
                content,
                importance.unwrap_or(fallback.importance),
                USER_MESSAGE_TRUST,
                now,
            ],
        )
        .context("insert memory")?;

        let context = json!({
            "source": "inbox",
            "inbox_id": inbox_id,
            "in_reply_to": in_reply_to,
            "tone": tone,
        });
        tx.execute(
            "INSERT INTO episodic_memories \
             (memory_id, action_taken, context, result, emotional_valence, event_time) \
             VALUES (?1, ?2, ?3, NULL, ?4, ?5)",
            params![
                memory_id,
                json!({ "action": "received_user_message" }).to_string(),
                context.to_string(),
                valence.unwrap_or(fallback.valence),
                received_at.unwrap_or_else(|| now.clone()),
            ],
        )
        .context("insert episodic detail")?;

        tx.execute(
            "UPDATE inbox_messages SET processed_at = ?1, memory_id = ?2 WHERE id = ?3",
            params![now, memory_id, inbox_id],
        )
        .context("mark inbox message processed")?;
        tx.commit()?;
        Ok(memory_id)
    }

    /// Insert then process. Fails only when the insert fails; a processing
    /// failure is reported through [`InboxSubmission::memory`] and leaves the
    /// row unprocessed.
    pub fn submit_inbox_message(&self, request: &InboxMessageRequest) -> Result<InboxSubmission> {
        let inbox_id = self.insert_inbox_message(request)?;
        let memory = self.process_inbox_message(&inbox_id);
        Ok(InboxSubmission { inbox_id, memory })
    }
}
