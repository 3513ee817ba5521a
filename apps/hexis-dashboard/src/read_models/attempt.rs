use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Result of one composed read: the real value, or the fallback together with
/// the label of the section that fell back.
#[derive(Debug)]
pub(crate) struct Attempt<T> {
    pub value: T,
    pub degraded: Option<&'static str>,
}

/// Runs `read` with a time budget. Never fails: errors and timeouts are logged
/// and replaced by `fallback`.
pub(crate) async fn attempt<T, F>(
    label: &'static str,
    read: F,
    fallback: T,
    budget: Duration,
) -> Attempt<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    match tokio::time::timeout(budget, read).await {
        Ok(Ok(value)) => Attempt {
            value,
            degraded: None,
        },
        Ok(Err(err)) => {
            warn!(
                target: "hexis::read_models",
                section = label,
                error = %format!("{err:#}"),
                "read failed; serving fallback"
            );
            Attempt {
                value: fallback,
                degraded: Some(label),
            }
        }
        Err(_) => {
            warn!(
                target: "hexis::read_models",
                section = label,
                budget_ms = budget.as_millis() as u64,
                "read timed out; serving fallback"
            );
            Attempt {
                value: fallback,
                degraded: Some(label),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn success_keeps_value() {
        let got = attempt("drives", async { Ok(7) }, 0, Duration::from_secs(1)).await;
        assert_eq!(got.value, 7);
        assert_eq!(got.degraded, None);
    }

    #[tokio::test]
    async fn error_uses_fallback_and_label() {
        let got = attempt(
            "goals",
            async { Err::<i32, _>(anyhow::anyhow!("no such table: goals")) },
            -1,
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(got.value, -1);
        assert_eq!(got.degraded, Some("goals"));
    }

    #[tokio::test]
    async fn slow_read_times_out() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(1)
        };
        let got = attempt("status", slow, 0, Duration::from_millis(20)).await;
        assert_eq!(got.value, 0);
        assert_eq!(got.degraded, Some("status"));
    }
}
