use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use jsonschema::validator_for;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub(crate) const DEFAULT_CONFIG_PATH: &str = "configs/default.toml";

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("{path} does not match the config schema: {errors}")]
    Schema { path: String, errors: String },
    #[error("invalid {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
    #[error("invalid bind address {0}")]
    InvalidBind(String),
    #[error("config schema unavailable: {0}")]
    SchemaUnavailable(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct DashboardConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub read_models: ReadModelConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ServerConfig {
    /// Listen address, loopback by default.
    pub bind: String,
    pub port: u16,
    /// Maximum in-flight requests.
    #[schemars(range(min = 1))]
    pub concurrency_limit: usize,
    /// Allow any origin (for a dashboard served from another port).
    pub cors_any: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct StoreConfig {
    /// SQLite database written by the agent.
    pub path: String,
    pub busy_timeout_ms: u64,
    /// Apply the bundled schema at startup (local development only).
    pub bootstrap_schema: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ReadModelConfig {
    /// Budget for each composed read before it falls back.
    #[schemars(range(min = 1))]
    pub reader_timeout_ms: u64,
    /// Upper bound for any `?limit=`.
    pub max_limit: usize,
    pub actions_limit: usize,
    pub heartbeats_limit: usize,
    pub maintenance_log_limit: usize,
    pub episodic_limit: usize,
    pub semantic_limit: usize,
    pub graph_limit: usize,
    pub outbox_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8092,
            concurrency_limit: 256,
            cors_any: false,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "hexis.sqlite".into(),
            busy_timeout_ms: 5000,
            bootstrap_schema: false,
        }
    }
}

impl Default for ReadModelConfig {
    fn default() -> Self {
        Self {
            reader_timeout_ms: 2000,
            max_limit: 500,
            actions_limit: 30,
            heartbeats_limit: 15,
            maintenance_log_limit: 10,
            episodic_limit: 20,
            semantic_limit: 50,
            graph_limit: 100,
            outbox_limit: 20,
        }
    }
}

impl ReadModelConfig {
    pub(crate) fn reader_timeout(&self) -> Duration {
        Duration::from_millis(self.reader_timeout_ms.max(1))
    }

    /// Resolves a raw `?limit=` value: unparsable falls back to `default`,
    /// negatives become zero, and everything is capped at `max_limit`.
    pub(crate) fn limit(&self, requested: Option<&str>, default: usize) -> usize {
        let wanted = match requested.map(str::trim).filter(|s| !s.is_empty()) {
            None => default,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n < 0 => 0,
                Ok(n) => usize::try_from(n).unwrap_or(usize::MAX),
                Err(_) => default,
            },
        };
        wanted.min(self.max_limit)
    }
}

impl DashboardConfig {
    /// File (from `HEXIS_CONFIG`, else `configs/default.toml` when present,
    /// else built-in defaults), then `HEXIS_*` overrides.
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let mut cfg = match config_path() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    pub(crate) fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    pub(crate) fn from_toml_str(content: &str, origin: &str) -> Result<Self, ConfigError> {
        let parse_err = |source: toml::de::Error| ConfigError::Parse {
            path: origin.to_string(),
            source,
        };
        let raw: toml::Value = toml::from_str(content).map_err(parse_err)?;
        let json_value = serde_json::to_value(&raw)
            .map_err(|e| ConfigError::SchemaUnavailable(e.to_string()))?;
        let schema = serde_json::to_value(schemars::schema_for!(DashboardConfig))
            .map_err(|e| ConfigError::SchemaUnavailable(e.to_string()))?;
        let validator =
            validator_for(&schema).map_err(|e| ConfigError::SchemaUnavailable(e.to_string()))?;
        let errors: Vec<String> = validator
            .iter_errors(&json_value)
            .map(|e| e.to_string())
            .collect();
        if !errors.is_empty() {
            return Err(ConfigError::Schema {
                path: origin.to_string(),
                errors: errors.join(", "),
            });
        }
        toml::from_str(content).map_err(parse_err)
    }

    pub(crate) fn apply_env(
        &mut self,
        get: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(path) = get("HEXIS_DB_PATH").filter(|p| !p.trim().is_empty()) {
            self.store.path = path;
        }
        if let Some(bind) = get("HEXIS_BIND").filter(|b| !b.trim().is_empty()) {
            self.server.bind = bind.trim().to_string();
        }
        if let Some(port) = parse_env::<u16>(&get, "HEXIS_PORT")? {
            self.server.port = port;
        }
        if let Some(limit) = parse_env::<usize>(&get, "HEXIS_HTTP_MAX_CONC")? {
            if limit == 0 {
                return Err(ConfigError::InvalidEnv {
                    key: "HEXIS_HTTP_MAX_CONC",
                    value: "0".into(),
                });
            }
            self.server.concurrency_limit = limit;
        }
        if let Some(ms) = parse_env::<u64>(&get, "HEXIS_READER_TIMEOUT_MS")? {
            self.read_models.reader_timeout_ms = ms;
        }
        if let Some(ms) = parse_env::<u64>(&get, "HEXIS_SQLITE_BUSY_MS")? {
            self.store.busy_timeout_ms = ms;
        }
        if let Some(raw) = get("HEXIS_DB_BOOTSTRAP") {
            self.store.bootstrap_schema = parse_flag(&raw).ok_or(ConfigError::InvalidEnv {
                key: "HEXIS_DB_BOOTSTRAP",
                value: raw,
            })?;
        }
        Ok(())
    }

    pub(crate) fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let bind = self.server.bind.trim();
        let host = if bind.contains(':') && !bind.starts_with('[') {
            format!("[{bind}]")
        } else {
            bind.to_string()
        };
        let host = if host.eq_ignore_ascii_case("localhost") {
            "127.0.0.1".to_string()
        } else {
            host
        };
        format!("{}:{}", host, self.server.port)
            .parse()
            .map_err(|_| ConfigError::InvalidBind(self.server.bind.clone()))
    }

    pub(crate) fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.store.path)
    }
}

fn config_path() -> Option<PathBuf> {
    if let Some(explicit) = std::env::var("HEXIS_CONFIG")
        .ok()
        .filter(|p| !p.trim().is_empty())
    {
        return Some(PathBuf::from(explicit));
    }
    let fallback = Path::new(DEFAULT_CONFIG_PATH);
    fallback.exists().then(|| fallback.to_path_buf())
}

fn parse_env<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    get(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidEnv { key, value: raw })
        })
        .transpose()
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::env;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = DashboardConfig::from_toml_str(
            "[server]\nport = 9000\n\n[read_models]\nactions_limit = 5\n",
            "inline",
        )
        .expect("config");
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.bind, "127.0.0.1");
        assert_eq!(cfg.read_models.actions_limit, 5);
        assert_eq!(cfg.read_models.heartbeats_limit, 15);
        assert_eq!(cfg.store.busy_timeout_ms, 5000);
    }

    #[test]
    fn schema_rejects_unknown_keys_and_wrong_types() {
        let unknown = DashboardConfig::from_toml_str("[server]\nprot = 1\n", "inline");
        assert!(matches!(unknown, Err(ConfigError::Schema { .. })));
        let wrong = DashboardConfig::from_toml_str("[server]\nport = \"eighty\"\n", "inline");
        assert!(matches!(wrong, Err(ConfigError::Schema { .. })));
        let broken = DashboardConfig::from_toml_str("[server\n", "inline");
        assert!(matches!(broken, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn env_overrides_apply_after_file() {
        let mut cfg = DashboardConfig::default();
        cfg.apply_env(lookup(&[
            ("HEXIS_DB_PATH", "/data/agent.sqlite"),
            ("HEXIS_PORT", "8100"),
            ("HEXIS_HTTP_MAX_CONC", "32"),
            ("HEXIS_READER_TIMEOUT_MS", "750"),
            ("HEXIS_DB_BOOTSTRAP", "true"),
        ]))
        .expect("overrides");
        assert_eq!(cfg.store.path, "/data/agent.sqlite");
        assert_eq!(cfg.server.port, 8100);
        assert_eq!(cfg.server.concurrency_limit, 32);
        assert_eq!(cfg.read_models.reader_timeout(), Duration::from_millis(750));
        assert!(cfg.store.bootstrap_schema);
    }

    #[test]
    fn invalid_env_values_are_errors() {
        let mut cfg = DashboardConfig::default();
        let err = cfg
            .apply_env(lookup(&[("HEXIS_PORT", "99999")]))
            .expect_err("port out of range");
        assert_eq!(err.to_string(), "invalid HEXIS_PORT: 99999");
        assert!(cfg
            .apply_env(lookup(&[("HEXIS_HTTP_MAX_CONC", "0")]))
            .is_err());
        assert!(cfg
            .apply_env(lookup(&[("HEXIS_DB_BOOTSTRAP", "maybe")]))
            .is_err());
    }

    #[test]
    fn socket_addr_accepts_ipv6_and_localhost() {
        let mut cfg = DashboardConfig::default();
        assert_eq!(
            cfg.socket_addr().expect("addr").to_string(),
            "127.0.0.1:8092"
        );
        cfg.server.bind = "::1".into();
        assert_eq!(cfg.socket_addr().expect("addr").to_string(), "[::1]:8092");
        cfg.server.bind = "localhost".into();
        assert!(cfg.socket_addr().is_ok());
        cfg.server.bind = "not an address".into();
        assert!(matches!(cfg.socket_addr(), Err(ConfigError::InvalidBind(_))));
    }

    #[test]
    fn limits_are_clamped() {
        let rm = ReadModelConfig::default();
        assert_eq!(rm.limit(None, 30), 30);
        assert_eq!(rm.limit(Some("5"), 30), 5);
        assert_eq!(rm.limit(Some("-3"), 30), 0);
        assert_eq!(rm.limit(Some("abc"), 30), 30);
        assert_eq!(rm.limit(Some("100000"), 30), 500);
    }

    #[test]
    fn load_reads_file_named_by_env() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("hexis.toml");
        std::fs::write(&path, "[store]\npath = \"from-file.sqlite\"\n").expect("write config");
        let mut guard = env::guard();
        guard.set("HEXIS_CONFIG", path.display().to_string());
        guard.remove("HEXIS_DB_PATH");
        guard.set("HEXIS_PORT", "8200");
        let cfg = DashboardConfig::load().expect("load");
        assert_eq!(cfg.store.path, "from-file.sqlite");
        assert_eq!(cfg.server.port, 8200);

        guard.set("HEXIS_CONFIG", dir.path().join("missing.toml").display().to_string());
        assert!(matches!(DashboardConfig::load(), Err(ConfigError::Read { .. })));
    }

    #[test]
    fn shipped_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../configs/default.toml");
        let cfg = DashboardConfig::from_file(&path).expect("shipped config");
        assert_eq!(cfg, DashboardConfig::default());
    }
}
