use once_cell::sync::Lazy;
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use hexis_store::Store;
use tempfile::TempDir;

use crate::{config::DashboardConfig, AppState};

static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub(crate) mod env {
    use super::*;

    pub(crate) struct EnvGuard {
        _lock: MutexGuard<'static, ()>,
        saved: HashMap<String, Option<String>>,
    }

    pub(crate) fn guard() -> EnvGuard {
        EnvGuard {
            _lock: ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner()),
            saved: HashMap::new(),
        }
    }

    impl EnvGuard {
        fn remember(&mut self, key: &str) {
            self.saved
                .entry(key.to_string())
                .or_insert_with(|| std::env::var(key).ok());
        }

        pub(crate) fn set(&mut self, key: &str, value: impl AsRef<str>) {
            self.remember(key);
            std::env::set_var(key, value.as_ref());
        }

        pub(crate) fn remove(&mut self, key: &str) {
            self.remember(key);
            std::env::remove_var(key);
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, value) in self.saved.drain() {
                match value {
                    Some(val) => std::env::set_var(&key, val),
                    None => std::env::remove_var(&key),
                }
            }
        }
    }
}

/// Store in a temp directory with the agent schema applied. Hold on to the
/// `TempDir` for as long as the store is used.
pub(crate) fn fresh_store() -> (TempDir, Store) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Store::new(dir.path().join("hexis.sqlite"));
    store.bootstrap().expect("bootstrap schema");
    (dir, store)
}

pub(crate) fn seed(store: &Store, sql: &str) {
    let conn = rusqlite::Connection::open(store.db_path()).expect("open for seeding");
    conn.execute_batch(sql).expect("seed");
}

pub(crate) fn count_rows(store: &Store, table: &str) -> i64 {
    let conn = rusqlite::Connection::open(store.db_path()).expect("open for count");
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
        row.get(0)
    })
    .expect("count")
}

pub(crate) fn state_for(store: Store) -> AppState {
    let (_, endpoints, endpoints_meta) = crate::router::build_router();
    AppState::builder(store, DashboardConfig::default())
        .with_endpoints(endpoints)
        .with_endpoints_meta(endpoints_meta)
        .build()
}
