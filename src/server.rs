//! HTTP 接口
//!
//! - `POST /chat`：`{message, thread_id = "default"}` -> `{response}`；失败 500 `{detail}`，空消息 400，
//!   请求体不合法时沿用 axum 的状态码（400/415/422），同样返回 `{detail}`
//! - `GET /`、`GET /health`：存活检查
//!
//! 对话在独立任务中运行：客户端断开不会取消进行中的循环，成功时状态照常写回。

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};

use crate::core::{AgentError, Orchestrator};

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default = "default_thread_id")]
    pub thread_id: String,
}

fn default_thread_id() -> String {
    "default".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// 错误响应体 `{detail}`
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn bad_request(detail: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            detail: detail.into(),
        }
    }
}

impl From<AgentError> for ApiError {
    fn from(e: AgentError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            detail: e.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn create_router(orchestrator: Arc<Orchestrator>, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/chat", post(chat))
        .layer(ServiceBuilder::new().layer(cors_layer(cors_origins)))
        .with_state(orchestrator)
}

async fn root() -> Json<serde_json::Value> {
    Json(json!({ "message": "Pizza Bot API is running" }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn chat(
    State(orchestrator): State<Arc<Orchestrator>>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(req) = payload?;
    let message = req.message.trim().to_string();
    if message.is_empty() {
        return Err(ApiError::bad_request("message is required"));
    }
    let thread_id = if req.thread_id.trim().is_empty() {
        default_thread_id()
    } else {
        req.thread_id
    };
    tracing::info!(thread_id = %thread_id, "Received message");

    let handle =
        tokio::spawn(async move { orchestrator.chat(&thread_id, &message).await });
    let response = handle
        .await
        .map_err(|e| AgentError::Aborted(e.to_string()))??;

    Ok(Json(ChatResponse { response }))
}
