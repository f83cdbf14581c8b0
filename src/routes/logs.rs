//! Log viewer endpoints: static page, file list, paged content and a live
//! tail over WebSocket.

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    response::Response,
    routing::{get, get_service},
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeFile;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, OptionExt};
use crate::loader::{ApiRouter, LoadContext};
use crate::log_reader::{self, TailOptions, TailSubscription};
use crate::state::AppState;
use crate::types::{ApiResponse, LogFile, Page, TailEvent};

const HEARTBEAT: &str = "heartbeat";

pub fn router(ctx: &LoadContext<'_>) -> AppResult<ApiRouter> {
    let assets = ctx.config.viewer.static_dir.join("logs");
    Ok(ApiRouter::new("/logs")
        .with_tag("logs")
        .route("/", get_service(ServeFile::new(assets.join("index.html"))))
        .route("/style.css", get_service(ServeFile::new(assets.join("style.css"))))
        .route("/script.js", get_service(ServeFile::new(assets.join("script.js"))))
        .route("/config", get(viewer_config))
        .route("/files", get(list_files))
        .route("/content/{filename}", get(get_content))
        .route("/ws", get(tail_ws)))
}

#[derive(Debug, Serialize)]
pub struct ViewerInfo {
    pub title: String,
}

pub async fn viewer_config(State(state): State<AppState>) -> ApiResponse<ViewerInfo> {
    ApiResponse::ok(ViewerInfo { title: format!("{} Logs", state.config.app.name) })
}

pub async fn list_files(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<LogFile>>> {
    let files = log_reader::list_files(&state.config.log.dir).await?;
    Ok(ApiResponse::ok(files))
}

#[derive(Debug, Default, Deserialize)]
pub struct ContentQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

pub async fn get_content(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
    query: Result<Query<ContentQuery>, QueryRejection>,
) -> AppResult<ApiResponse<Page>> {
    let Path(filename) = path.map_err(|e| AppError::InvalidArgument(e.body_text()))?;
    let Query(q) = query.map_err(|e| AppError::InvalidArgument(e.body_text()))?;
    let viewer = &state.config.viewer;
    let page = log_reader::read_page(
        &state.config.log.dir,
        &filename,
        q.page.unwrap_or(1),
        q.page_size.unwrap_or(viewer.default_page_size),
        viewer.max_page_size,
    )
    .await?;
    Ok(ApiResponse::ok(page))
}

#[derive(Debug, Default, Deserialize)]
pub struct TailQuery {
    pub filename: Option<String>,
}

/// Upgrades to a WebSocket that streams lines appended to `filename`, or to
/// the most recently modified log file when none is named.
///
/// The file is resolved before the upgrade so bad names get a normal error
/// envelope instead of a socket that closes immediately.
pub async fn tail_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    query: Result<Query<TailQuery>, QueryRejection>,
) -> AppResult<Response> {
    let Query(q) = query.map_err(|e| AppError::InvalidArgument(e.body_text()))?;
    let logs_dir = &state.config.log.dir;

    let filename = match q.filename {
        Some(name) => name,
        None => log_reader::list_files(logs_dir)
            .await?
            .into_iter()
            .next()
            .map(|f| f.filename)
            .ok_or_not_found("log file")?,
    };

    let subscription =
        TailSubscription::open(logs_dir, &filename, TailOptions::from(&state.config.viewer)).await?;
    Ok(ws.on_upgrade(move |socket| stream_tail(socket, subscription, filename)))
}

async fn stream_tail(socket: WebSocket, mut subscription: TailSubscription, filename: String) {
    info!(file = %filename, "Tail client connected");
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            event = subscription.next_event() => {
                let Some(event) = event else {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                };
                let terminal = matches!(event, TailEvent::Error { .. });
                let text = match serde_json::to_string(&event) {
                    Ok(t) => t,
                    Err(e) => {
                        warn!(error = %e, "Failed to serialize tail event");
                        continue;
                    }
                };
                if ws_tx.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
                if terminal {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
            }
            msg = ws_rx.next() => match msg {
                Some(Ok(Message::Text(text))) if text.as_str() == HEARTBEAT => {
                    if ws_tx.send(Message::Text(HEARTBEAT.into())).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!(error = %e, "Tail client socket error");
                    break;
                }
                Some(Ok(_)) => {}
            }
        }
    }

    subscription.close().await;
    info!(file = %filename, "Tail client disconnected");
}
