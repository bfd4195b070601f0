//! The capability set every storage backend provides.

use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{ExplorerError, Result};
use crate::models::Entry;

/// One child of a listed location, plus where to go to expand it.
///
/// `location` is `None` for files and for directories the driver refuses to
/// descend into; the tree builder lists those with empty children.
#[derive(Debug, Clone)]
pub struct Child<L> {
    pub entry: Entry,
    pub location: Option<L>,
}

impl<L> Child<L> {
    pub fn file(entry: Entry) -> Self {
        Self { entry, location: None }
    }

    pub fn directory(entry: Entry, location: Option<L>) -> Self {
        Self { entry, location }
    }
}

/// Primitive operations of a storage backend.
///
/// Sibling order is whatever the backend yields. Filesystem order is stable
/// for an unchanged directory; object-store order is not guaranteed across
/// calls.
#[async_trait]
pub trait StorageDriver: Send + Sync {
    /// Backend-native address of a listable location or a file.
    type Location: Clone + Debug + Send + Sync;

    /// All immediate children of `location`, every page included.
    async fn list_one_level(&self, location: &Self::Location) -> Result<Vec<Entry>>;

    /// The whole content of a file or object.
    async fn get_bytes(&self, location: &Self::Location) -> Result<Vec<u8>>;

    /// Same data as `list_one_level`, with descend locations for recursion.
    async fn enumerate_children(
        &self,
        location: &Self::Location,
    ) -> Result<Vec<Child<Self::Location>>>;
}

/// Enforce the per-level breadth cap, if any.
pub(crate) fn check_breadth(count: usize, limit: Option<usize>, path: &str) -> Result<()> {
    match limit {
        Some(limit) if count > limit => Err(ExplorerError::TooManyEntries {
            path: path.to_string(),
            limit,
        }),
        _ => Ok(()),
    }
}

/// Run a backend call, failing with `Timeout` once `limit` elapses.
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!("Backend call exceeded {:?}", limit);
            Err(ExplorerError::Timeout(limit))
        }
    }
}
