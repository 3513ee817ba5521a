use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};
use utoipa::ToSchema;

use hexis_contracts::{InboxMessageRequest, Validate};

use crate::AppState;

const PROCESS_FAILED: &str = "Failed to process message";

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InboxAccepted {
    pub success: bool,
    pub inbox_id: String,
    pub memory_id: String,
}

fn rejected(
    status: StatusCode,
    error: &str,
    details: Option<String>,
    inbox_id: Option<&str>,
) -> Response {
    let mut body = json!({ "success": false, "error": error });
    if let Some(details) = details {
        body["details"] = json!(details);
    }
    if let Some(id) = inbox_id {
        body["inboxId"] = json!(id);
    }
    (status, Json(body)).into_response()
}

/// Queue a user message and turn it into an episodic memory.
#[utoipa::path(
    post,
    path = "/inbox-message",
    tag = "Inbox",
    request_body = InboxMessageRequest,
    responses(
        (status = 200, description = "Stored and processed", body = InboxAccepted),
        (status = 400, description = "Missing or blank message"),
        (status = 500, description = "Insert or processing failed; inboxId is set when the row was stored")
    )
)]
pub async fn inbox_message(
    State(state): State<AppState>,
    payload: Result<Json<InboxMessageRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            return rejected(
                StatusCode::BAD_REQUEST,
                "Invalid request body",
                Some(rejection.body_text()),
                None,
            )
        }
    };
    if let Err(err) = request.validate() {
        return rejected(StatusCode::BAD_REQUEST, &err.to_string(), None, None);
    }
    let tone = request.tone();
    let submission = match state.store().submit_inbox_message_async(request).await {
        Ok(sub) => sub,
        Err(err) => {
            let details = format!("{err:#}");
            error!(target: "hexis::api", error = %details, "inbox insert failed");
            return rejected(
                StatusCode::INTERNAL_SERVER_ERROR,
                PROCESS_FAILED,
                Some(details),
                None,
            );
        }
    };
    match submission.memory {
        Ok(memory_id) => {
            info!(
                target: "hexis::api",
                inbox_id = %submission.inbox_id,
                memory_id = %memory_id,
                tone = tone.as_str(),
                "inbox message processed"
            );
            Json(InboxAccepted {
                success: true,
                inbox_id: submission.inbox_id,
                memory_id,
            })
            .into_response()
        }
        Err(err) => {
            let details = format!("{err:#}");
            error!(
                target: "hexis::api",
                inbox_id = %submission.inbox_id,
                error = %details,
                "inbox processing failed; row left unprocessed"
            );
            rejected(
                StatusCode::INTERNAL_SERVER_ERROR,
                PROCESS_FAILED,
                Some(details),
                Some(&submission.inbox_id),
            )
        }
    }
}
