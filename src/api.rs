use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::CorsLayer;

use crate::error::{AppError, ErrorKind};
use crate::registry::{catalog, execute, CommandOutput};
use crate::state::AppState;

// ── Response types ───────────────────────────────────────────────

#[derive(Serialize)]
struct ApiOk<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Serialize)]
struct ApiErr {
    ok: bool,
    error: String,
    code: &'static str,
}

fn ok_json<T: Serialize>(data: T) -> impl IntoResponse {
    Json(ApiOk { ok: true, data })
}

fn err_json(e: &AppError) -> impl IntoResponse {
    let status = match e.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::OutOfBounds | ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::IoFailure | ErrorKind::RollbackFailure => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ApiErr {
            ok: false,
            error: e.to_string(),
            code: e.code(),
        }),
    )
}

// ── Handlers ─────────────────────────────────────────────────────

async fn post_tool(
    Extension(state): Extension<Arc<AppState>>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let worker = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || {
        worker.exclusive(|| execute::execute_tool_call(&worker, &name, &body))
    })
    .await;
    match result {
        Ok(Ok(output)) => ok_json::<CommandOutput>(output).into_response(),
        Ok(Err(e)) => err_json(&e).into_response(),
        Err(join) => err_json(&AppError::Io {
            message: format!("tool task failed: {join}"),
        })
        .into_response(),
    }
}

async fn get_tools() -> impl IntoResponse {
    ok_json(catalog::to_json_schema())
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/tools/{name}", post(post_tool))
        .route("/api/tools", get(get_tools))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}

// ── Server startup ───────────────────────────────────────────────

/// Serve the HTTP tool API on `127.0.0.1:<port>` until the task is dropped.
/// Port 0 picks a free port; the bound port is logged.
pub async fn serve(state: Arc<AppState>, port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound = listener.local_addr()?;
    tracing::info!(addr = %bound, "HTTP tool API listening");
    axum::serve(listener, router(state)).await
}
