//! HTTP surface: Telegram webhook, cron trigger, health check.

use std::future::Future;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use optimo_models::Update;

use crate::error::ApiError;
use crate::handlers;
use crate::state::AppState;
use crate::sweeper::SweepReport;

/// Header Telegram uses to echo the webhook secret.
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Creates the router with all routes configured.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/cron", get(cron).post(cron))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves until `shutdown` resolves.
pub async fn serve<F>(addr: &str, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

fn ack() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// POST /webhook - one Telegram update.
///
/// Always 200 once authenticated: Telegram disables webhooks that keep
/// failing, so malformed bodies and handler errors are only logged.
async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    if let Some(secret) = &state.settings.webhook_secret {
        let given = headers.get(SECRET_HEADER).and_then(|v| v.to_str().ok());
        if given != Some(secret.as_str()) {
            warn!("Webhook call with missing or wrong secret");
            return Err(ApiError::Unauthorized);
        }
    }

    let update = match Update::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, bytes = body.len(), "Malformed update");
            return Ok(ack());
        }
    };

    if update.is_empty() {
        debug!(update_id = ?update.update_id, "Update without message or callback");
        return Ok(ack());
    }

    match handlers::handle_update(&state, update).await {
        Ok(dispatch) => debug!(?dispatch, "Update handled"),
        Err(e) => error!(error = %e, "Update handler failed"),
    }
    Ok(ack())
}

#[derive(Debug, Serialize)]
struct CronResponse {
    ok: bool,
    #[serde(flatten)]
    report: SweepReport,
}

/// GET|POST /cron - run one reminder sweep.
async fn cron(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CronResponse>, ApiError> {
    if let Some(secret) = &state.settings.cron_secret {
        let given = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        if given != Some(secret.as_str()) {
            warn!("Cron call with missing or wrong secret");
            return Err(ApiError::Unauthorized);
        }
    }

    let report = state.sweeper().run_now().await.map_err(|e| {
        error!(error = %e, "Sweep failed");
        ApiError::from(e)
    })?;
    Ok(Json(CronResponse { ok: true, report }))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    uptime_seconds: u64,
}

/// GET /health - health check endpoint.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: state.settings.uptime_seconds(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages;
    use crate::state::ServerSettings;
    use crate::testing::{FakeCompletion, FakeTranscriber, Harness};
    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use optimo_models::{ChatMode, Reminder};
    use optimo_persistence::{KvStore, REMINDERS_KEY};
    use std::time::Duration;

    fn make_server(h: &Harness) -> TestServer {
        TestServer::new(create_router(h.state.clone())).unwrap()
    }

    fn secured() -> Harness {
        let mut settings = ServerSettings::new(chrono_tz::Asia::Singapore, Duration::from_secs(60));
        settings.webhook_secret = Some("hook-secret".to_string());
        settings.cron_secret = Some("cron-secret".to_string());
        Harness::with_settings(
            settings,
            FakeCompletion::replying("ok"),
            FakeTranscriber::completed("hi"),
        )
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let h = Harness::new();
        let response = make_server(&h).get("/health").await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
        assert!(!body["version"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_malformed_body_acknowledged() {
        let h = Harness::new();
        let response = make_server(&h).post("/webhook").text("{not json").await;

        response.assert_status_ok();
        response.assert_json(&json!({ "ok": true }));
        assert!(h.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_unrecognized_update_acknowledged() {
        let h = Harness::new();
        let response = make_server(&h)
            .post("/webhook")
            .json(&json!({ "update_id": 5, "edited_message": { "text": "hi" } }))
            .await;

        response.assert_status_ok();
        assert!(h.transport.sent().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_dispatches_message() {
        let h = Harness::new();
        let response = make_server(&h)
            .post("/webhook")
            .json(&json!({
                "update_id": 6,
                "message": { "message_id": 1, "chat": { "id": 42 }, "text": "remember the eggs" }
            }))
            .await;

        response.assert_status_ok();
        assert_eq!(h.state.notes.all(42).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_webhook_callback() {
        let h = Harness::new();
        make_server(&h)
            .post("/webhook")
            .json(&json!({
                "update_id": 7,
                "callback_query": { "id": "cb-9", "data": "reminder", "message": { "chat": { "id": 42 } } }
            }))
            .await
            .assert_status_ok();

        assert_eq!(h.state.modes.get(42).await.unwrap(), Some(ChatMode::Reminder));
        assert_eq!(h.transport.answered(), vec!["cb-9"]);
        assert_eq!(h.transport.texts(), vec![messages::REMINDER_PROMPT]);
    }

    #[tokio::test]
    async fn test_webhook_handler_error_still_ok() {
        let h = Harness::with(FakeCompletion::failing(), FakeTranscriber::stuck());
        let response = make_server(&h)
            .post("/webhook")
            .json(&json!({
                "update_id": 8,
                "message": { "chat": { "id": 42 }, "text": "Should I go?" }
            }))
            .await;

        response.assert_status_ok();
        assert_eq!(
            h.transport.texts().last().map(String::as_str),
            Some(messages::ADVICE_FAILED)
        );
    }

    #[tokio::test]
    async fn test_webhook_transport_down_still_ok() {
        let h = Harness::new();
        h.transport.fail_sends(true);
        make_server(&h)
            .post("/webhook")
            .json(&json!({ "message": { "chat": { "id": 42 }, "text": "/start" } }))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_webhook_secret_enforced() {
        let h = secured();
        let server = make_server(&h);

        server
            .post("/webhook")
            .json(&json!({ "message": { "chat": { "id": 1 }, "text": "hi" } }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        assert!(h.transport.sent().is_empty());

        server
            .post("/webhook")
            .add_header(
                HeaderName::from_static(SECRET_HEADER),
                HeaderValue::from_static("hook-secret"),
            )
            .json(&json!({ "message": { "chat": { "id": 1 }, "text": "hi" } }))
            .await
            .assert_status_ok();
        assert_eq!(h.transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_cron_delivers_due_reminders() {
        let h = Harness::new();
        h.state.reminders.add(&Reminder::new(42, "stand up", 1_000)).await.unwrap();
        h.state
            .reminders
            .add(&Reminder::new(42, "far future", i64::MAX - 1))
            .await
            .unwrap();
        let server = make_server(&h);

        let response = server.get("/cron").await;
        response.assert_status_ok();
        response.assert_json(&json!({ "ok": true, "sent": 1, "failed": 0, "skipped": 0 }));

        let again = server.post("/cron").await;
        again.assert_json(&json!({ "ok": true, "sent": 0, "failed": 0, "skipped": 0 }));

        assert_eq!(h.transport.texts(), vec!["⏰ Reminder: stand up"]);
    }

    #[tokio::test]
    async fn test_cron_secret_enforced() {
        let h = secured();
        let server = make_server(&h);

        server.get("/cron").await.assert_status(StatusCode::UNAUTHORIZED);
        server
            .get("/cron")
            .add_header(header::AUTHORIZATION, HeaderValue::from_static("Bearer wrong"))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
        server
            .get("/cron")
            .add_header(
                header::AUTHORIZATION,
                HeaderValue::from_static("Bearer cron-secret"),
            )
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn test_cron_store_failure_is_500() {
        let h = Harness::new();
        // A string under the sorted-set key makes ZRANGEBYSCORE fail
        h.kv.set(REMINDERS_KEY, "oops", None).await.unwrap();

        let response = make_server(&h).get("/cron").await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert_eq!(body["ok"], false);
    }
}
