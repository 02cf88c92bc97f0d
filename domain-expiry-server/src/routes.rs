//! HTTP routing and request handling.
//!
//! The surface is deliberately small: a root status endpoint and the check
//! endpoint, with the check handler additionally mounted on any configured
//! extra paths so webhook-style callers keep their hardcoded URLs working.
//! Both GET and POST are accepted everywhere the check handler is mounted.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, HeaderName, Method, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use domain_expiry_lib::{CheckResponse, DomainExpiryError, ExpiryChecker, ServerConfig};

/// Hint shown in the root payload for the primary endpoint.
const CHECK_ENDPOINT_HINT: &str = "/api/check?domain=example.com";

/// Root status message.
const ROOT_MESSAGE: &str = "Domain Checker API is running";

/// Shared state behind every handler.
pub struct AppState {
    checker: ExpiryChecker,
    /// Request fields accepted as the domain input, tried in order
    field_aliases: Vec<String>,
    /// Extra paths the check handler is mounted on
    check_paths: Vec<String>,
}

impl AppState {
    pub fn new(checker: ExpiryChecker, server: &ServerConfig) -> Self {
        Self {
            checker,
            field_aliases: server.field_aliases.clone(),
            check_paths: server.check_paths.clone(),
        }
    }
}

/// Build the service router with CORS applied to every route.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]);

    let check_routes = get(check_get).post(check_post);

    let mut router = Router::new()
        .route("/", get(root))
        .route("/api/check", check_routes.clone());

    for path in &state.check_paths {
        router = router.route(path, check_routes.clone());
    }

    router.layer(cors).with_state(state)
}

/// Root status payload: confirms the service is up and lists endpoints.
async fn root(State(state): State<Arc<AppState>>) -> Json<Value> {
    let mut endpoints = serde_json::Map::new();
    endpoints.insert("check".to_string(), json!(CHECK_ENDPOINT_HINT));
    if let Some(webhook) = state.check_paths.first() {
        endpoints.insert("webhook".to_string(), json!(webhook));
    }

    Json(json!({
        "success": true,
        "message": ROOT_MESSAGE,
        "endpoints": endpoints,
    }))
}

async fn check_get(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<CheckResponse>) {
    let requested = field_from_query(&state.field_aliases, &query);
    run_check(&state, requested).await
}

/// POST variant: the domain may arrive in the JSON body or the query string.
///
/// The body is read leniently. Callers in the wild send empty bodies, plain
/// text, or broken JSON alongside a perfectly good query parameter, and none
/// of that should turn into a 415 or 422.
async fn check_post(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> (StatusCode, Json<CheckResponse>) {
    let body_json = serde_json::from_slice::<Value>(&body).ok();

    let requested = body_json
        .as_ref()
        .and_then(|body| field_from_body(&state.field_aliases, body))
        .or_else(|| field_from_query(&state.field_aliases, &query));

    run_check(&state, requested).await
}

async fn run_check(
    state: &AppState,
    requested: Option<String>,
) -> (StatusCode, Json<CheckResponse>) {
    let Some(requested) = requested else {
        return respond_error(None, DomainExpiryError::MissingDomain);
    };

    match state.checker.check(&requested).await {
        Ok(report) => {
            tracing::info!(
                domain = %report.domain_name,
                expires = %report.iso_date(),
                "expiry check succeeded"
            );
            (StatusCode::OK, Json(CheckResponse::success(&report)))
        }
        Err(err) => {
            if err.status_code() >= 500 {
                tracing::warn!(domain = %requested, error = %err, "expiry check failed");
            } else {
                tracing::info!(domain = %requested, error = %err, "expiry check failed");
            }
            respond_error(Some(&requested), err)
        }
    }
}

fn respond_error(
    requested: Option<&str>,
    err: DomainExpiryError,
) -> (StatusCode, Json<CheckResponse>) {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    let mut response = CheckResponse::failure(&err);
    // Backend errors do not know which domain they were about; echo the
    // requested one so the caller can correlate.
    if response.domain_name.is_none() {
        response.domain_name = requested.map(str::to_string);
    }

    (status, Json(response))
}

/// First non-blank query value under any accepted alias.
fn field_from_query(aliases: &[String], query: &HashMap<String, String>) -> Option<String> {
    aliases
        .iter()
        .find_map(|alias| query.get(alias).filter(|v| !v.trim().is_empty()).cloned())
}

/// First non-blank string value under any accepted alias in a JSON body.
fn field_from_body(aliases: &[String], body: &Value) -> Option<String> {
    aliases.iter().find_map(|alias| {
        body.get(alias)
            .and_then(Value::as_str)
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
    })
}
