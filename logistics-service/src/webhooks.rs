//! AmoCRM notification receivers.
//!
//! AmoCRM retries anything that is not a 200, so these handlers answer 200
//! no matter what happens internally and report failures in the body.

use axum::{body::Body, extract::State, http::StatusCode, response::Json};
use diesel_async::RunQueryDsl;
use serde::Serialize;
use serde_json::{json, Value};

use crate::api::AppState;
use crate::error::ApiError;
use crate::models::NewCrmWebhookEvent;
use crate::schema::crm_webhook_events;

pub const DISCONNECT: &str = "disconnect";
pub const WIDGET_DISABLE: &str = "widget_disable";

/// Bodies are read up to this size; anything larger is acknowledged and
/// dropped.
pub const WEBHOOK_BODY_LIMIT: usize = 8 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body as JSON when it parses, otherwise the raw text wrapped in an object.
pub fn decode_payload(body: &[u8]) -> Value {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => value,
        Err(_) => json!({ "raw": String::from_utf8_lossy(body) }),
    }
}

/// AmoCRM sends the account id either as a number or a string, sometimes
/// nested under `account`.
pub fn account_id(payload: &Value) -> Option<String> {
    let id = payload
        .get("account_id")
        .or_else(|| payload.get("account").and_then(|a| a.get("id")))?;

    match id {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn failed(message: String) -> (StatusCode, Json<WebhookAck>) {
    (
        StatusCode::OK,
        Json(WebhookAck {
            success: false,
            error: Some(message),
        }),
    )
}

async fn receive(state: AppState, kind: &str, body: Body) -> (StatusCode, Json<WebhookAck>) {
    let body = match axum::body::to_bytes(body, WEBHOOK_BODY_LIMIT).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!("Unreadable AmoCRM {} webhook body: {}", kind, e);
            return failed("Payload too large or unreadable".to_string());
        }
    };

    let payload = decode_payload(&body);
    tracing::info!("AmoCRM {} webhook received: {}", kind, payload);

    match record_event(&state, kind, payload).await {
        Ok(()) => (StatusCode::OK, Json(WebhookAck { success: true, error: None })),
        Err(e) => {
            tracing::error!("Failed to record AmoCRM {} webhook: {}", kind, e);
            failed(format!("Failed to record {} notification", kind))
        }
    }
}

async fn record_event(state: &AppState, kind: &str, payload: Value) -> Result<(), ApiError> {
    let event = NewCrmWebhookEvent {
        kind: kind.to_string(),
        account_id: account_id(&payload),
        payload,
    };

    let mut conn = state.pool.get().await?;
    diesel::insert_into(crm_webhook_events::table)
        .values(&event)
        .execute(&mut conn)
        .await?;

    Ok(())
}

pub async fn disconnect(State(state): State<AppState>, body: Body) -> (StatusCode, Json<WebhookAck>) {
    receive(state, DISCONNECT, body).await
}

pub async fn widget_disable(State(state): State<AppState>, body: Body) -> (StatusCode, Json<WebhookAck>) {
    receive(state, WIDGET_DISABLE, body).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_support::{body_json, offline_router};
    use axum::http::Request;
    use tower::ServiceExt;

    #[test]
    fn malformed_body_is_kept_as_raw_text() {
        assert_eq!(decode_payload(b"{\"account_id\": 5"), json!({"raw": "{\"account_id\": 5"}));
        assert_eq!(decode_payload(b"{\"a\": 1}"), json!({"a": 1}));
    }

    #[test]
    fn account_id_accepts_numbers_strings_and_nesting() {
        assert_eq!(account_id(&json!({"account_id": 31337})), Some("31337".to_string()));
        assert_eq!(account_id(&json!({"account_id": " 42 "})), Some("42".to_string()));
        assert_eq!(account_id(&json!({"account": {"id": 7}})), Some("7".to_string()));
        assert_eq!(account_id(&json!({"raw": "x"})), None);
    }

    #[tokio::test]
    async fn disconnect_answers_200_on_malformed_json() {
        let response = offline_router()
            .oneshot(
                Request::post("/api/amocrm/disconnect")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        // The offline pool cannot store the event.
        assert_eq!(body_json(response).await["success"], false);
    }

    #[tokio::test]
    async fn widget_disable_answers_200_without_a_body() {
        let response = offline_router()
            .oneshot(Request::post("/api/amocrm/widget/disable").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn webhooks_allow_any_origin() {
        let response = offline_router()
            .oneshot(
                Request::options("/api/amocrm/disconnect")
                    .header("origin", "https://example.amocrm.ru")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "*"
        );
    }

    async fn post_disconnect(size: usize) -> serde_json::Value {
        let response = offline_router()
            .oneshot(
                Request::post("/api/amocrm/disconnect")
                    .body(Body::from(vec![b'x'; size]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await
    }

    #[tokio::test]
    async fn large_bodies_still_answer_200() {
        // Past axum's default extractor limit, within ours.
        let body = post_disconnect(3 * 1024 * 1024).await;
        assert_eq!(body["error"], "Failed to record disconnect notification");

        let body = post_disconnect(WEBHOOK_BODY_LIMIT + 1).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Payload too large or unreadable");
    }
}
