#![allow(dead_code)]

use hexis_store::Store;
use rusqlite::Connection;
use tempfile::TempDir;

/// Bootstrapped store in a throwaway directory. Keep the `TempDir` alive for
/// the duration of the test.
pub fn fresh_store() -> (TempDir, Store) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Store::new(dir.path().join("hexis.sqlite"));
    store.bootstrap().expect("bootstrap schema");
    (dir, store)
}

pub fn seed(store: &Store, sql: &str) {
    let conn = Connection::open(store.db_path()).expect("open for seeding");
    conn.execute_batch(sql).expect("seed");
}

pub fn scalar_i64(store: &Store, sql: &str) -> i64 {
    let conn = Connection::open(store.db_path()).expect("open for query");
    conn.query_row(sql, [], |row| row.get(0)).expect("scalar")
}

/// Heartbeat row with an `actions_taken` array.
pub fn heartbeat(store: &Store, number: i64, started_at: &str, actions: &str) {
    let conn = Connection::open(store.db_path()).expect("open for seeding");
    conn.execute(
        "INSERT INTO heartbeat_log (heartbeat_number, started_at, energy_start, energy_end, actions_taken) \
         VALUES (?1, ?2, 20, 15, ?3)",
        rusqlite::params![number, started_at, actions],
    )
    .expect("insert heartbeat");
}
