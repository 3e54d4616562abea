//! HTTP 介面
//!
//! - `POST /convert` 回傳完整結果
//! - `POST /convert/stream` 以 SSE 推送進度
//! - `POST /api/convert` 只確認受理，事件由 `GET /api/progress/:session_id` 訂閱

use crate::app::progress::ProgressHub;
use crate::config::settings::CompareSettings;
use crate::core::engine::CompareEngine;
use crate::core::OfferSource;
use crate::domain::model::RunEvent;
use crate::domain::session::Session;
use crate::utils::error::CompareError;
use crate::utils::validation::validate_listing_url;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    #[serde(default)]
    pub url: String,
    pub session_id: Option<String>,
    /// 使用者瀏覽器的 cookie（名稱 → 值），覆蓋設定檔中的樣板
    pub user_cookies: Option<BTreeMap<String, String>>,
}

impl ConvertRequest {
    fn session(&self, settings: &CompareSettings) -> Option<Session> {
        self.user_cookies
            .as_ref()
            .filter(|cookies| !cookies.is_empty())
            .map(|cookies| settings.session.with_cookies(cookies))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Accepted {
    pub success: bool,
    pub session_id: String,
}

pub struct AppState<S> {
    pub engine: Arc<CompareEngine<S>>,
    pub hub: ProgressHub,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            hub: self.hub.clone(),
        }
    }
}

impl<S> AppState<S> {
    pub fn new(engine: Arc<CompareEngine<S>>) -> Self {
        Self {
            engine,
            hub: ProgressHub::new(),
        }
    }
}

pub fn router<S: OfferSource + 'static>(engine: Arc<CompareEngine<S>>) -> Router {
    Router::new()
        .route("/convert", post(convert::<S>))
        .route("/convert/stream", post(convert_stream::<S>))
        .route("/api/convert", post(accept::<S>))
        .route("/api/progress/:session_id", get(progress::<S>))
        .with_state(AppState::new(engine))
}

fn error_response(status: StatusCode, message: String) -> Response {
    let body = ErrorBody {
        success: false,
        message,
    };
    (status, Json(body)).into_response()
}

/// 事件不帶名稱，用戶端以 `onmessage` 接收並依 JSON 的 `type` 分辨
fn event_stream(
    rx: UnboundedReceiver<RunEvent>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let events = UnboundedReceiverStream::new(rx).map(|event| {
        Ok::<_, Infallible>(Event::default().json_data(&event).unwrap_or_else(|e| {
            tracing::error!("❌ Failed to encode event: {}", e);
            Event::default().data(r#"{"type":"error","message":"Failed to encode event"}"#)
        }))
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}

pub async fn convert<S: OfferSource + 'static>(
    State(state): State<AppState<S>>,
    Json(request): Json<ConvertRequest>,
) -> Response {
    let engine = &state.engine;
    let session = request
        .session(engine.settings())
        .unwrap_or_else(|| engine.settings().session.clone());

    match engine.run_with_session(&request.url, &session, None).await {
        Ok(run) => (StatusCode::OK, Json(run.response())).into_response(),
        Err(e) => {
            let status = match e {
                CompareError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                _ => {
                    tracing::error!("❌ /convert failed: {}", e);
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            error_response(status, e.user_friendly_message())
        }
    }
}

pub async fn convert_stream<S: OfferSource + 'static>(
    State(state): State<AppState<S>>,
    Json(request): Json<ConvertRequest>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::unbounded_channel();
    let session = request.session(state.engine.settings());
    state.engine.spawn_run(request.url, session, tx);
    event_stream(rx)
}

/// 驗證後在背景開始比價，立即回覆；同一個 sessionId 只能開始一次
pub async fn accept<S: OfferSource + 'static>(
    State(state): State<AppState<S>>,
    Json(request): Json<ConvertRequest>,
) -> Response {
    let Some(session_id) = request
        .session_id
        .clone()
        .filter(|id| !id.trim().is_empty())
    else {
        return error_response(StatusCode::BAD_REQUEST, "sessionId is required".to_string());
    };

    let settings = state.engine.settings();
    if let Err(e) = validate_listing_url(&request.url, &settings.site_domain) {
        return error_response(StatusCode::BAD_REQUEST, e.user_friendly_message());
    }

    let Some(tx) = state.hub.start(&session_id) else {
        return error_response(
            StatusCode::CONFLICT,
            format!("Session {} has already been started", session_id),
        );
    };

    tracing::info!("📨 Accepted comparison for session {}", session_id);
    let session = request.session(settings);
    let handle = state.engine.spawn_run(request.url, session, tx);

    let hub = state.hub.clone();
    let finished_id = session_id.clone();
    tokio::spawn(async move {
        if let Err(e) = handle.await {
            tracing::error!("❌ Session {} task failed: {}", finished_id, e);
        }
        hub.finish(&finished_id);
    });

    (
        StatusCode::OK,
        Json(Accepted {
            success: true,
            session_id,
        }),
    )
        .into_response()
}

/// 訂閱某個 sessionId 的事件；可在 `POST /api/convert` 之前或之後連線
pub async fn progress<S: OfferSource + 'static>(
    State(state): State<AppState<S>>,
    Path(session_id): Path<String>,
) -> Response {
    match state.hub.subscribe(&session_id) {
        Some(rx) => {
            tracing::debug!("📡 Subscriber attached to session {}", session_id);
            event_stream(rx).into_response()
        }
        None => error_response(
            StatusCode::CONFLICT,
            format!("Session {} already has a subscriber", session_id),
        ),
    }
}
