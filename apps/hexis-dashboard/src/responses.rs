use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Error body shared by every endpoint: `{error, details?}`.
pub fn problem_response(status: StatusCode, error: &str, details: Option<&str>) -> Response {
    let mut body = json!({ "error": error });
    if let Some(d) = details {
        body["details"] = json!(d);
    }
    (status, Json(body)).into_response()
}

/// Failure of a read endpoint. `title` names what was being read; the cause
/// goes to `details`.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ApiError {
    #[error("{title}")]
    Store {
        title: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    pub(crate) fn store(title: &'static str, source: anyhow::Error) -> Self {
        ApiError::Store { title, source }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Store { title, source } => {
                let details = format!("{source:#}");
                tracing::error!(target: "hexis::api", error = %details, "{title}");
                problem_response(StatusCode::INTERNAL_SERVER_ERROR, title, Some(&details))
            }
        }
    }
}

/// Maps a store result into a handler result with a fixed error title.
pub(crate) trait StoreResultExt<T> {
    fn or_api(self, title: &'static str) -> Result<T, ApiError>;
}

impl<T> StoreResultExt<T> for anyhow::Result<T> {
    fn or_api(self, title: &'static str) -> Result<T, ApiError> {
        self.map_err(|source| ApiError::store(title, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn store_errors_render_error_and_details() {
        let resp = ApiError::store("Failed to fetch drives", anyhow::anyhow!("no such table"))
            .into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = resp.into_body().collect().await.expect("body").to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(body["error"], "Failed to fetch drives");
        assert_eq!(body["details"], "no such table");
    }
}
