//! Storage browsing endpoints.
//!
//! - GET /api/v1/storage/list?path=
//!   One level of entries at `path` (empty = root).
//!
//! - GET /api/v1/storage/download?path=
//!   Raw file bytes, with a content type guessed from the extension.
//!
//! - GET /api/v1/storage/tree?path=&max_depth=
//!   Depth-bounded tree; `max_depth` defaults to the configured depth and
//!   must be at least 1.
//!
//! Errors are rendered by `ExplorerError`'s `IntoResponse` impl.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::{ExplorerError, Result};
use crate::models::{DirectoryListResponse, DirectoryTreeResponse};
use crate::storage::SharedExplorer;

pub fn routes(explorer: SharedExplorer) -> Router {
    Router::new()
        .route("/api/v1/storage/list", get(list_directory))
        .route("/api/v1/storage/download", get(download_file))
        .route("/api/v1/storage/tree", get(list_directory_tree))
        .with_state(explorer)
}

#[derive(Debug, Deserialize)]
struct PathQuery {
    #[serde(default)]
    path: String,
}

#[derive(Debug, Deserialize)]
struct TreeQuery {
    #[serde(default)]
    path: String,
    max_depth: Option<i64>,
}

async fn list_directory(
    State(explorer): State<SharedExplorer>,
    Query(query): Query<PathQuery>,
) -> Result<Json<DirectoryListResponse>> {
    let entries = explorer.list_directory(&query.path).await?;
    Ok(Json(DirectoryListResponse { entries }))
}

async fn download_file(
    State(explorer): State<SharedExplorer>,
    Query(query): Query<PathQuery>,
) -> Result<Response> {
    let content = explorer.download_file(&query.path).await?;

    let file_name = query
        .path
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("download");
    let mime = mime_guess::from_path(file_name).first_or_octet_stream();
    let disposition = format!("attachment; filename=\"{}\"", file_name.replace('"', ""));

    Ok((
        [
            (header::CONTENT_TYPE, mime.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    )
        .into_response())
}

async fn list_directory_tree(
    State(explorer): State<SharedExplorer>,
    Query(query): Query<TreeQuery>,
) -> Result<Json<DirectoryTreeResponse>> {
    let max_depth = match query.max_depth {
        Some(depth) => u32::try_from(depth)
            .ok()
            .filter(|d| *d >= 1)
            .ok_or(ExplorerError::InvalidDepth(depth))?,
        None => explorer.settings().default_max_depth,
    };

    let tree = explorer.list_directory_tree(&query.path, max_depth).await?;
    Ok(Json(DirectoryTreeResponse { tree }))
}
