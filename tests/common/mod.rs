#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::{json, Value};

use permify_gate::config::PermifyConfig;
use permify_gate::PermifyClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckReply {
    Allow,
    Deny,
    Fail,
    /// 200 OK carrying this raw body verbatim.
    Malformed(&'static str),
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct MockState {
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    check_reply: Arc<Mutex<CheckReply>>,
    watch_body: Arc<Mutex<String>>,
}

/// In-process stand-in for the Permify HTTP API, bound to an ephemeral port.
pub struct MockPermify {
    pub base_url: String,
    state: MockState,
}

impl MockPermify {
    pub async fn start() -> Result<Self> {
        let state = MockState {
            calls: Arc::new(Mutex::new(Vec::new())),
            check_reply: Arc::new(Mutex::new(CheckReply::Allow)),
            watch_body: Arc::new(Mutex::new(String::new())),
        };

        let app = Router::new().fallback(handle).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url: format!("http://{addr}"),
            state,
        })
    }

    pub fn config(&self) -> PermifyConfig {
        PermifyConfig::new(&self.base_url).skip_health_check(true)
    }

    pub fn client(&self) -> Result<PermifyClient> {
        Ok(PermifyClient::new(&self.config())?)
    }

    pub fn set_check_reply(&self, reply: CheckReply) {
        *self.state.check_reply.lock().unwrap() = reply;
    }

    /// Newline-delimited frames returned by the watch endpoint.
    pub fn set_watch_frames(&self, frames: &[Value]) {
        let body: String = frames.iter().map(|frame| format!("{frame}\n")).collect();
        *self.state.watch_body.lock().unwrap() = body;
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state.calls.lock().unwrap().clone()
    }

    pub fn check_calls(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.path.ends_with("/permissions/check"))
            .collect()
    }
}

async fn handle(State(state): State<MockState>, method: Method, uri: Uri, headers: HeaderMap, body: Bytes) -> Response {
    let path = uri.path().to_string();
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    state.calls.lock().unwrap().push(RecordedCall {
        method: method.clone(),
        path: path.clone(),
        authorization,
        body: body.clone(),
    });

    if method == Method::GET && path == "/healthz" {
        return Json(json!({"status": "SERVING"})).into_response();
    }
    if method == Method::DELETE {
        if let Some(id) = path.strip_prefix("/v1/tenants/") {
            return Json(json!({"tenant": {"id": id, "name": id}})).into_response();
        }
    }

    if path == "/v1/tenants/create" {
        return Json(json!({"tenant": {"id": body["id"], "name": body["name"], "created_at": "2024-01-01T00:00:00Z"}}))
            .into_response();
    }
    if path == "/v1/tenants/list" {
        return Json(json!({"tenants": [{"id": "t1", "name": "default"}], "continuous_token": ""})).into_response();
    }

    let Some(suffix) = path.strip_prefix("/v1/tenants/").and_then(|rest| rest.split_once('/')).map(|(_, s)| s) else {
        return not_found();
    };

    match suffix {
        "permissions/check" => check_reply(*state.check_reply.lock().unwrap()),
        "permissions/lookup-entity" => Json(json!({"entity_ids": ["1", "2"], "continuous_token": "next"})).into_response(),
        "permissions/subject-permission" => Json(json!({
            "results": {"view": "CHECK_RESULT_ALLOWED", "edit": "CHECK_RESULT_DENIED"}
        }))
        .into_response(),
        "schemas/write" => Json(json!({"schema_version": "cnf3vhvd2dqc73a0bq4g"})).into_response(),
        "schemas/list" => Json(json!({"head": "v2", "schemas": "not-a-list"})).into_response(),
        "data/write" | "relationships/write" | "data/delete" | "relationships/delete" | "data/run-bundle" => {
            Json(json!({"snap_token": "FxYzAAAAAAA="})).into_response()
        }
        "data/relationships/read" => Json(json!({
            "tuples": [{
                "entity": {"type": "document", "id": "d1"},
                "relation": "viewer",
                "subject": {"type": "user", "id": "u1"}
            }],
            "continuous_token": ""
        }))
        .into_response(),
        "bundle/write" => Json(json!({"names": ["organization_created"]})).into_response(),
        "bundle/delete" => Json(json!({"name": body["name"]})).into_response(),
        "watch" => {
            let frames = state.watch_body.lock().unwrap().clone();
            Response::builder()
                .header(header::CONTENT_TYPE, "application/x-ndjson")
                .body(Body::from(frames))
                .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
        _ => not_found(),
    }
}

fn check_reply(reply: CheckReply) -> Response {
    match reply {
        CheckReply::Allow => Json(json!({
            "can": "CHECK_RESULT_ALLOWED",
            "metadata": {"check_count": 1}
        }))
        .into_response(),
        CheckReply::Deny => Json(json!({
            "can": "CHECK_RESULT_DENIED",
            "metadata": {"check_count": 1}
        }))
        .into_response(),
        CheckReply::Fail => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"code": 13, "message": "internal database failure"})),
        )
            .into_response(),
        CheckReply::Malformed(raw) => Response::builder()
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(raw))
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response()),
    }
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"code": 5, "message": "not found"}))).into_response()
}
