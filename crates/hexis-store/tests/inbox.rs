mod common;

use common::{fresh_store, scalar_i64, seed};
use hexis_contracts::{InboxMessageRequest, Tone};

fn request(message: &str, tone: Option<Tone>) -> InboxMessageRequest {
    InboxMessageRequest {
        message: message.to_string(),
        in_reply_to: Some("o1".to_string()),
        tone,
    }
}

#[test]
fn submit_stores_and_processes_message() {
    let (_dir, store) = fresh_store();
    let submission = store
        .submit_inbox_message(&request("  how are you?  ", Some(Tone::Urgent)))
        .expect("submit");
    let memory_id = submission.memory_id().expect("processed").to_string();

    let conn = rusqlite::Connection::open(store.db_path()).expect("open");
    let (content, tone, importance, processed, linked): (String, String, f64, Option<String>, Option<String>) = conn
        .query_row(
            "SELECT content, tone, importance, processed_at, memory_id FROM inbox_messages WHERE id = ?1",
            [&submission.inbox_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )
        .expect("inbox row");
    assert_eq!(content, "how are you?");
    assert_eq!(tone, "urgent");
    assert_eq!(importance, 0.9);
    assert!(processed.is_some());
    assert_eq!(linked.as_deref(), Some(memory_id.as_str()));

    let episodic = store.recent_episodic(5).expect("episodic");
    assert_eq!(episodic.len(), 1);
    assert_eq!(episodic[0].id, memory_id);
    assert_eq!(episodic[0].importance, 0.9);
    assert_eq!(episodic[0].emotional_valence, Some(-0.1));
}

#[test]
fn default_tone_is_normal() {
    let (_dir, store) = fresh_store();
    let submission = store
        .submit_inbox_message(&request("hello", None))
        .expect("submit");
    assert!(submission.memory.is_ok());
    let conn = rusqlite::Connection::open(store.db_path()).expect("open");
    let tone: String = conn
        .query_row(
            "SELECT tone FROM inbox_messages WHERE id = ?1",
            [&submission.inbox_id],
            |row| row.get(0),
        )
        .expect("tone");
    assert_eq!(tone, "normal");
}

#[test]
fn blank_message_is_never_inserted() {
    let (_dir, store) = fresh_store();
    assert!(store.submit_inbox_message(&request("   ", None)).is_err());
    assert_eq!(scalar_i64(&store, "SELECT COUNT(*) FROM inbox_messages"), 0);
}

#[test]
fn processing_failure_leaves_row_unprocessed() {
    let (_dir, store) = fresh_store();
    seed(&store, "DROP TABLE episodic_memories;");
    let submission = store
        .submit_inbox_message(&request("remember this", Some(Tone::Warm)))
        .expect("insert still succeeds");
    assert!(submission.memory.is_err());
    assert_eq!(submission.memory_id(), None);
    assert_eq!(
        scalar_i64(&store, "SELECT COUNT(*) FROM inbox_messages WHERE processed_at IS NULL"),
        1
    );
    // The transaction rolled back the partial memory row.
    assert_eq!(scalar_i64(&store, "SELECT COUNT(*) FROM memories"), 0);
}

#[test]
fn processing_twice_is_rejected() {
    let (_dir, store) = fresh_store();
    let id = store
        .insert_inbox_message(&request("once", None))
        .expect("insert");
    store.process_inbox_message(&id).expect("first pass");
    assert!(store.process_inbox_message(&id).is_err());
    assert!(store.process_inbox_message("no-such-id").is_err());
    assert_eq!(scalar_i64(&store, "SELECT COUNT(*) FROM memories"), 1);
}

#[tokio::test]
async fn async_submit_runs_on_blocking_pool() {
    let (_dir, store) = fresh_store();
    let submission = store
        .submit_inbox_message_async(request("from async", Some(Tone::Casual)))
        .await
        .expect("submit");
    assert!(submission.memory.is_ok());
    assert_eq!(store.unseen_outbox_count_async().await.expect("unseen"), 0);
}
