//! Explorer error types and HTTP response mapping.
//!
//! Defines `ExplorerError` for every failure the explorer can report and
//! implements Axum's `IntoResponse` so handlers can return errors directly.
//! Each variant belongs to exactly one `ErrorKind`, and the kind alone decides
//! the status code:
//! - `NotFound` → 404
//! - `InvalidInput` (escapes, directory downloads, bad depth, ...) → 400
//! - `BackendUnavailable` (I/O, network, timeouts, pagination) → 502

use std::io;
use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExplorerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Path escapes the storage root: {0}")]
    OutOfBounds(String),

    #[error("Is a directory: {0}")]
    IsADirectory(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Invalid max_depth {0}: must be at least 1")]
    InvalidDepth(i64),

    #[error("Too many entries under {path}: more than {limit}")]
    TooManyEntries { path: String, limit: usize },

    #[error("Backend timed out after {0:?}")]
    Timeout(Duration),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Backend error: {0}")]
    Backend(String),
}

/// The three classes of failure callers are expected to distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    BackendUnavailable,
}

impl ExplorerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExplorerError::NotFound(_) => ErrorKind::NotFound,
            ExplorerError::OutOfBounds(_)
            | ExplorerError::IsADirectory(_)
            | ExplorerError::NotADirectory(_)
            | ExplorerError::InvalidPath(_)
            | ExplorerError::InvalidDepth(_)
            | ExplorerError::TooManyEntries { .. } => ErrorKind::InvalidInput,
            ExplorerError::Timeout(_) | ExplorerError::Io { .. } | ExplorerError::Backend(_) => {
                ErrorKind::BackendUnavailable
            }
        }
    }

    /// Classify an I/O error raised while touching `path`.
    ///
    /// Missing files become `NotFound`; malformed names (interior NUL bytes and
    /// the like) become `InvalidPath`; everything else means the backend could
    /// not serve the request.
    pub fn from_io(path: impl Into<String>, source: io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            io::ErrorKind::NotFound => ExplorerError::NotFound(path),
            io::ErrorKind::InvalidInput => ExplorerError::InvalidPath(path),
            io::ErrorKind::NotADirectory => ExplorerError::NotADirectory(path),
            io::ErrorKind::IsADirectory => ExplorerError::IsADirectory(path),
            _ => ExplorerError::Io { path, source },
        }
    }
}

impl ErrorKind {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::BackendUnavailable => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ExplorerError {
    fn into_response(self) -> Response {
        let kind = self.kind();

        let body = Json(json!({
            "error": self.to_string(),
            "kind": kind,
        }));

        (kind.status_code(), body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ExplorerError>;
