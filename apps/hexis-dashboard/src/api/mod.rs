pub mod dashboard;
pub mod inbox;
pub mod memory;
pub mod meta;
pub mod state;

use serde::Deserialize;
use utoipa::IntoParams;

/// `?limit=` as sent by the dashboard. Kept as text so a malformed value
/// falls back to the endpoint default instead of rejecting the request.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LimitQuery {
    /// Maximum rows; capped by `read_models.max_limit`.
    #[param(value_type = Option<i64>)]
    pub limit: Option<String>,
}

impl LimitQuery {
    pub(crate) fn raw(&self) -> Option<&str> {
        self.limit.as_deref()
    }
}
