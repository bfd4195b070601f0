//! Response envelopes for the storage endpoints.
//!
//! - `DirectoryListResponse`: `{"entries": [...]}` for single-level listings
//! - `DirectoryTreeResponse`: `{"tree": [...]}` for depth-bounded trees
//! - `HealthResponse`: liveness check body

use serde::Serialize;

use super::entry::{Entry, TreeNode};

#[derive(Debug, Clone, Serialize)]
pub struct DirectoryListResponse {
    pub entries: Vec<Entry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectoryTreeResponse {
    pub tree: Vec<TreeNode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub backend: &'static str,
}
