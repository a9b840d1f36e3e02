//! API Server module
//!
//! This module provides the HTTP API server for the task forest: JSON endpoints
//! for reading the forest and applying gestures, plus a small HTML grid view
//! that refreshes itself through server-sent events.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::gesture::Gesture;
use crate::guide::{get_guide_string, GuideMode};
use crate::models::{Forest, ForestError, TaskId};
use crate::view::LevelView;
use crate::Core;

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub address: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: ([127, 0, 0, 1], 3000).into(),
        }
    }
}

/// API responses
#[derive(Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Span of a single task
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanResponse {
    pub level_index: usize,
    pub task_id: TaskId,
    pub span: usize,
}

/// Result of appending a level
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLevelResponse {
    pub level_index: usize,
    pub level_count: usize,
}

fn status_for(error: &ForestError) -> StatusCode {
    match error {
        ForestError::NotFound(_) => StatusCode::NOT_FOUND,
        ForestError::InvalidGesture(_) => StatusCode::BAD_REQUEST,
        ForestError::InvariantViolation(_) => StatusCode::CONFLICT,
    }
}

/// Helper function to map Core results to Axum responses
fn map_core_result<T: Serialize>(result: Result<T, ForestError>) -> Response {
    match result {
        Ok(data) => (StatusCode::OK, Json(ApiResponse::success(data))).into_response(),
        Err(e) => (status_for(&e), Json(ApiResponse::<T>::error(e.to_string()))).into_response(),
    }
}

/// Builds the application router around a core
pub fn router(core: Core) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { Redirect::temporary("/ui") }))
        // --- Forest --- //
        .route("/api/forest", get(get_forest).put(replace_forest))
        .route("/api/view", get(get_view))
        .route("/api/span/:level/:id", get(get_span))
        .route("/api/gesture", post(apply_gesture))
        .route("/api/levels", post(add_level))
        .route("/api/history", get(get_history))
        .route("/api/guide", get(get_guide))
        // --- UI --- //
        .route("/ui", get(ui_handler))
        .route("/ui/events", get(events_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(core)
}

/// Starts the API server
pub async fn serve(core: Core, config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let app = router(core);

    // Start server
    tracing::info!("Starting server on {}", config.address);
    let listener = TcpListener::bind(config.address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Forest Handlers --- //

async fn get_forest(State(core): State<Core>) -> impl IntoResponse {
    let forest = core.forest();
    map_core_result(Ok::<&Forest, ForestError>(forest.as_ref()))
}

async fn replace_forest(State(core): State<Core>, Json(forest): Json<Forest>) -> impl IntoResponse {
    map_core_result(core.replace_forest(forest))
}

async fn get_view(State(core): State<Core>) -> impl IntoResponse {
    map_core_result(Ok::<Vec<LevelView>, ForestError>(core.view()))
}

async fn get_span(
    State(core): State<Core>,
    Path((level_index, task_id)): Path<(usize, TaskId)>,
) -> impl IntoResponse {
    let span = core.span(task_id, level_index);
    map_core_result(Ok::<SpanResponse, ForestError>(SpanResponse {
        level_index,
        task_id,
        span,
    }))
}

async fn apply_gesture(State(core): State<Core>, Json(gesture): Json<Gesture>) -> impl IntoResponse {
    map_core_result(core.apply_gesture(&gesture))
}

async fn add_level(State(core): State<Core>) -> impl IntoResponse {
    let level_index = core.add_level();
    let level_count = core.forest().level_count();
    map_core_result(Ok::<AddLevelResponse, ForestError>(AddLevelResponse {
        level_index,
        level_count,
    }))
}

async fn get_history(State(core): State<Core>) -> impl IntoResponse {
    map_core_result(Ok::<_, ForestError>(core.history()))
}

async fn get_guide() -> impl IntoResponse {
    map_core_result(Ok::<String, ForestError>(get_guide_string(GuideMode::Api)))
}

// --- UI and Event Handlers --- //

async fn events_handler(State(core): State<Core>) -> impl IntoResponse {
    let receiver = core.subscribe();
    let stream = EventStream::new(core, receiver);

    // Set headers for event stream
    let headers = [
        (
            axum::http::header::CONTENT_TYPE,
            axum::http::HeaderValue::from_static("text/event-stream"),
        ),
        (
            axum::http::header::CACHE_CONTROL,
            axum::http::HeaderValue::from_static("no-cache"),
        ),
    ];

    (headers, axum::body::Body::from_stream(stream))
}

const UPDATE_EVENT: &str = "event: update\ndata: change\n\n";

struct EventStream {
    core: Core,
    receiver: tokio::sync::broadcast::Receiver<()>,
}

impl EventStream {
    fn new(core: Core, receiver: tokio::sync::broadcast::Receiver<()>) -> Self {
        Self { core, receiver }
    }
}

impl Stream for EventStream {
    type Item = Result<String, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.receiver.try_recv() {
            Ok(()) => Poll::Ready(Some(Ok(UPDATE_EVENT.to_string()))),
            Err(tokio::sync::broadcast::error::TryRecvError::Empty) => {
                // Nothing yet, poll again shortly
                let waker = cx.waker().clone();
                tokio::spawn(async move {
                    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                    waker.wake();
                });
                Poll::Pending
            }
            // Missed updates still mean the forest changed
            Err(tokio::sync::broadcast::error::TryRecvError::Lagged(_)) => {
                Poll::Ready(Some(Ok(UPDATE_EVENT.to_string())))
            }
            Err(tokio::sync::broadcast::error::TryRecvError::Closed) => {
                self.receiver = self.core.subscribe();
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }
    }
}

async fn ui_handler(State(core): State<Core>) -> impl IntoResponse {
    let view = core.view();
    let forest = core.forest();
    Html(render_ui_template(&view, forest.task_count()))
}

// --- Template Rendering --- //

fn render_ui_template(view: &[LevelView], task_count: usize) -> String {
    let mut html = String::from(HTML_TEMPLATE_HEADER);

    html.push_str(&format!(
        "<p class='summary'>{} task(s) on {} level(s)</p>",
        task_count,
        view.len()
    ));
    html.push_str(&render_grid_html(view));
    html.push_str(HTML_TEMPLATE_FOOTER);
    html
}

/// Renders one table row per level. Every cell covers `span` columns so that
/// children sit directly below their parent.
fn render_grid_html(view: &[LevelView]) -> String {
    let mut html = String::from("<table class='grid'>");

    for level in view {
        html.push_str(&format!(
            "<tr data-level='{}'><th>L{}</th>",
            level.key, level.key
        ));
        for row in &level.rows {
            if row.is_placeholder() {
                html.push_str(&format!(
                    "<td class='placeholder' colspan='{}' data-id='{}'></td>",
                    row.span, row.task_id
                ));
                continue;
            }

            let content = row.content.as_deref().unwrap_or_default();
            html.push_str(&format!(
                "<td class='task' colspan='{}' data-id='{}'><span class='task-id'>#{}</span> {}</td>",
                row.span,
                row.task_id,
                row.task_id,
                html_escape::encode_text(content)
            ));
        }
        html.push_str("</tr>");
    }

    html.push_str("</table>");
    html
}

const HTML_TEMPLATE_HEADER: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Taskline</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, Cantarell, 'Open Sans', 'Helvetica Neue', sans-serif;
            line-height: 1.6;
            color: #333;
            max-width: 1200px;
            margin: 0 auto;
            padding: 20px;
            background-color: #f7f9fc;
        }
        h1 {
            color: #2c3e50;
            border-bottom: 2px solid #3498db;
            padding-bottom: 10px;
        }
        .summary {
            color: #7f8c8d;
        }
        table.grid {
            width: 100%;
            border-collapse: separate;
            border-spacing: 6px;
            table-layout: fixed;
        }
        table.grid th {
            width: 40px;
            color: #7f8c8d;
            font-weight: normal;
        }
        td.task {
            background: white;
            border-left: 4px solid #3498db;
            border-radius: 4px;
            padding: 8px 10px;
            box-shadow: 0 2px 4px rgba(0,0,0,0.08);
        }
        td.placeholder {
            border: 1px dashed #d5dbe1;
            border-radius: 4px;
        }
        .task-id {
            color: #95a5a6;
            font-size: 0.85em;
        }
        .status {
            position: fixed;
            bottom: 10px;
            right: 10px;
            font-size: 0.85em;
            color: #7f8c8d;
        }
        .status-indicator {
            display: inline-block;
            width: 8px;
            height: 8px;
            border-radius: 50%;
            background: #e74c3c;
            margin-right: 6px;
        }
        .status-indicator.connected {
            background: #2ecc71;
        }
        .status-indicator.updating {
            background: #f39c12;
        }
    </style>
</head>
<body>
    <h1>Taskline</h1>
    <div class="status">
        <span id="connection-status" class="status-indicator"></span>
        <span id="status-text">Connecting...</span>
    </div>
    <div class="container">
"#;

// HTML template footer with EventSource JavaScript for reactive refreshing
const HTML_TEMPLATE_FOOTER: &str = r#"
    </div>
    <script>
        const statusIndicator = document.getElementById('connection-status');
        const statusText = document.getElementById('status-text');
        let eventSource;

        function connectEvents() {
            eventSource = new EventSource('/ui/events');

            eventSource.onopen = () => {
                statusIndicator.classList.add('connected');
                statusText.textContent = 'Connected: Listening for changes';
            };

            eventSource.addEventListener('update', () => {
                statusIndicator.classList.remove('connected');
                statusIndicator.classList.add('updating');
                statusText.textContent = 'Updating...';
                window.location.reload();
            });

            eventSource.onerror = () => {
                statusIndicator.classList.remove('connected');
                statusIndicator.classList.remove('updating');
                statusText.textContent = 'Connection lost. Reconnecting...';
                eventSource.close();
                setTimeout(connectEvents, 3000);
            };
        }

        window.addEventListener('load', connectEvents);
        window.addEventListener('beforeunload', () => {
            if (eventSource) {
                eventSource.close();
            }
        });
    </script>
</body>
</html>
"#;
