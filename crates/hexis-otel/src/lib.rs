use once_cell::sync::OnceCell;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{
    fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

/// Target used by the HTTP access middleware.
pub const ACCESS_TARGET: &str = "http.access";

static ACCESS_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

/// Rolling access-log settings read from `HEXIS_ACCESS_LOG_*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLogRoll {
    pub dir: String,
    pub prefix: String,
    pub rotation: Rotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Minutely,
    Hourly,
    Daily,
}

impl Rotation {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "hourly" => Rotation::Hourly,
            "minutely" => Rotation::Minutely,
            _ => Rotation::Daily,
        }
    }
}

impl AccessLogRoll {
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Option<Self> {
        if get("HEXIS_ACCESS_LOG_ROLL").as_deref() != Some("1") {
            return None;
        }
        let dir = get("HEXIS_ACCESS_LOG_DIR")
            .or_else(|| get("HEXIS_LOGS_DIR"))
            .unwrap_or_else(|| "logs".to_string());
        let prefix = get("HEXIS_ACCESS_LOG_PREFIX").unwrap_or_else(|| "http-access".into());
        let rotation = Rotation::parse(&get("HEXIS_ACCESS_LOG_ROTATION").unwrap_or_default());
        Some(Self {
            dir,
            prefix,
            rotation,
        })
    }
}

/// Console tracing filtered by `RUST_LOG` (default `info`), plus an optional
/// rolling file that only receives access-log events. Safe to call twice; the
/// second call is a no-op.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer();
    let registry = tracing_subscriber::registry().with(fmt_layer.with_filter(filter));
    let Some(roll) = AccessLogRoll::from_env() else {
        let _ = registry.try_init();
        return;
    };
    if std::fs::create_dir_all(&roll.dir).is_err() {
        eprintln!("failed to create access log directory {}", roll.dir);
    }
    let writer = match roll.rotation {
        Rotation::Hourly => tracing_appender::rolling::hourly(&roll.dir, &roll.prefix),
        Rotation::Minutely => tracing_appender::rolling::minutely(&roll.dir, &roll.prefix),
        Rotation::Daily => tracing_appender::rolling::daily(&roll.dir, &roll.prefix),
    };
    let (nb, guard) = tracing_appender::non_blocking(writer);
    let _ = ACCESS_GUARD.set(guard);
    let targets = Targets::new().with_target(ACCESS_TARGET, tracing::Level::INFO);
    let access_layer = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(nb)
        .with_filter(targets);
    if registry.with(access_layer).try_init().is_ok() {
        tracing::info!(directory = %roll.dir, prefix = %roll.prefix, "access log rolling enabled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn roll_disabled_unless_flagged() {
        assert_eq!(AccessLogRoll::from_lookup(lookup(&[])), None);
        assert_eq!(
            AccessLogRoll::from_lookup(lookup(&[("HEXIS_ACCESS_LOG_ROLL", "true")])),
            None
        );
    }

    #[test]
    fn roll_falls_back_to_logs_dir() {
        let roll = AccessLogRoll::from_lookup(lookup(&[
            ("HEXIS_ACCESS_LOG_ROLL", "1"),
            ("HEXIS_LOGS_DIR", "/var/log/hexis"),
            ("HEXIS_ACCESS_LOG_ROTATION", "Hourly"),
        ]))
        .expect("enabled");
        assert_eq!(roll.dir, "/var/log/hexis");
        assert_eq!(roll.prefix, "http-access");
        assert_eq!(roll.rotation, Rotation::Hourly);
    }
}
