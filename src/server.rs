//! HTTP transport: a thin axum router mapping verbs and paths onto
//! repository operations.
//!
//! Handlers decode parameters, call one repository operation, and encode the
//! result; all branching logic lives in the db layer.

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post},
};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::db::query::PageParams;
use crate::db::{Database, now_rfc3339};
use crate::error::Result;
use crate::types::{NewTask, Status, Task, TaskPatch};

/// Server state shared across handlers.
#[derive(Clone)]
pub struct BoardServer {
    db: Arc<Database>,
}

impl BoardServer {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Arc<Database> {
        &self.db
    }
}

/// `archived=1` or `archived=true` selects the archived view; anything else
/// keeps the default active view.
fn archived_flag(value: Option<&str>) -> bool {
    matches!(value, Some(v) if v == "1" || v.eq_ignore_ascii_case("true"))
}

/// Lenient integer parse for pagination inputs; garbage becomes absence so
/// the defaults apply instead of a client error.
fn lenient_int(value: Option<&str>) -> Option<i64> {
    value.and_then(|v| v.trim().parse().ok())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "time": now_rfc3339() }))
}

/// Query parameters for the combined active/archived task listing.
#[derive(Debug, Deserialize)]
struct ListParams {
    archived: Option<String>,
    q: Option<String>,
    page: Option<String>,
    page_size: Option<String>,
}

async fn list_tasks(
    State(state): State<BoardServer>,
    Query(params): Query<ListParams>,
) -> Result<Response> {
    if archived_flag(params.archived.as_deref()) {
        let page = PageParams::resolve(
            lenient_int(params.page.as_deref()),
            lenient_int(params.page_size.as_deref()),
        );
        let page = state.db().list_archived(params.q.as_deref(), page)?;
        return Ok(Json(page).into_response());
    }

    let items = state.db().list_active()?;
    Ok(Json(json!({ "items": items })).into_response())
}

async fn create_task(
    State(state): State<BoardServer>,
    Json(body): Json<NewTask>,
) -> Result<impl IntoResponse> {
    let task = state.db().create_task(&body)?;
    info!(id = task.id, "task created");
    Ok((StatusCode::CREATED, Json(json!({ "id": task.id }))))
}

async fn get_task(State(state): State<BoardServer>, Path(id): Path<i64>) -> Result<Json<Task>> {
    Ok(Json(state.db().get_task(id)?))
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: String,
}

async fn set_status(
    State(state): State<BoardServer>,
    Path(id): Path<i64>,
    Json(body): Json<StatusBody>,
) -> Result<Json<serde_json::Value>> {
    let status: Status = body.status.parse()?;
    state.db().set_status(id, status)?;
    Ok(Json(json!({ "id": id, "status": status })))
}

async fn update_task(
    State(state): State<BoardServer>,
    Path(id): Path<i64>,
    Json(body): Json<TaskPatch>,
) -> Result<Json<serde_json::Value>> {
    state.db().update_task(id, &body)?;
    Ok(Json(json!({ "id": id, "updated": true })))
}

async fn archive_task(
    State(state): State<BoardServer>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    state.db().archive(id)?;
    Ok(Json(json!({ "id": id, "archived": true })))
}

async fn restore_task(
    State(state): State<BoardServer>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    state.db().restore(id)?;
    Ok(Json(json!({ "id": id, "archived": false, "status": Status::Planning })))
}

async fn copy_task(
    State(state): State<BoardServer>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse> {
    let copy = state.db().duplicate(id)?;
    info!(source = id, id = copy.id, "task duplicated");
    Ok((StatusCode::CREATED, Json(json!({ "id": copy.id }))))
}

async fn delete_task(
    State(state): State<BoardServer>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    state.db().delete_task(id)?;
    info!(id, "task deleted");
    Ok(Json(json!({ "id": id, "deleted": true })))
}

#[derive(Debug, Deserialize)]
struct TagParams {
    q: Option<String>,
}

async fn list_tags(
    State(state): State<BoardServer>,
    Query(params): Query<TagParams>,
) -> Result<Json<serde_json::Value>> {
    let items = state.db().list_tags(params.q.as_deref())?;
    Ok(Json(json!({ "items": items })))
}

/// Build the router with all routes.
fn build_router(state: BoardServer) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/tasks", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}", get(get_task).delete(delete_task))
        .route("/api/tasks/{id}/status", patch(set_status))
        .route("/api/tasks/{id}/update", patch(update_task))
        .route("/api/tasks/{id}/archive", post(archive_task))
        .route("/api/tasks/{id}/restore", post(restore_task))
        .route("/api/tasks/{id}/copy", post(copy_task))
        .route("/api/tags", get(list_tags))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the HTTP server on the specified port.
///
/// Returns a oneshot sender that can be used to signal shutdown, and the
/// actual address the server is bound to.
pub async fn start_server(
    db: Arc<Database>,
    port: u16,
) -> anyhow::Result<(oneshot::Sender<()>, SocketAddr)> {
    let state = BoardServer::new(db);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("task board listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("task board shutting down");
            })
            .await
        {
            tracing::error!("server error: {}", e);
        }
    });

    Ok((shutdown_tx, bound_addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_archived_flag() {
        assert!(archived_flag(Some("1")));
        assert!(archived_flag(Some("true")));
        assert!(archived_flag(Some("TRUE")));
        assert!(!archived_flag(Some("0")));
        assert!(!archived_flag(Some("yes")));
        assert!(!archived_flag(None));
    }

    #[test]
    fn test_lenient_int() {
        assert_eq!(lenient_int(Some("20")), Some(20));
        assert_eq!(lenient_int(Some(" 3 ")), Some(3));
        assert_eq!(lenient_int(Some("abc")), None);
        assert_eq!(lenient_int(Some("")), None);
        assert_eq!(lenient_int(None), None);
    }

    #[test]
    fn test_router_builds() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let _router = build_router(BoardServer::new(db));
    }
}
