//! Depth-bounded tree assembly over any `StorageDriver`.
//!
//! Depth 1 is the listing of the start location. Directories found at
//! `max_depth` are kept with empty children instead of being expanded.
//!
//! Sibling subdirectories are expanded concurrently. A semaphore caps the
//! number of listing calls in flight across the whole build, and ordered
//! buffering puts results back in the order the backend listed them. The first
//! error drops every pending sibling and is returned as-is; dropping the build
//! future cancels everything still running.

use std::time::Duration;

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt, TryStreamExt};
use futures::FutureExt;
use tokio::sync::Semaphore;

use crate::error::{ExplorerError, Result};
use crate::models::TreeNode;
use crate::storage::driver::{with_timeout, Child, StorageDriver};

pub struct TreeBuilder<'a, D: StorageDriver> {
    driver: &'a D,
    max_depth: u32,
    workers: usize,
    permits: Semaphore,
    timeout: Duration,
}

impl<'a, D: StorageDriver> TreeBuilder<'a, D> {
    pub fn new(driver: &'a D, max_depth: u32, workers: usize, timeout: Duration) -> Result<Self> {
        if max_depth == 0 {
            return Err(ExplorerError::InvalidDepth(0));
        }
        let workers = workers.max(1);
        Ok(Self {
            driver,
            max_depth,
            workers,
            permits: Semaphore::new(workers),
            timeout,
        })
    }

    pub async fn build(&self, start: &D::Location) -> Result<Vec<TreeNode>> {
        self.level(start.clone(), 1).await
    }

    fn level(&self, location: D::Location, depth: u32) -> BoxFuture<'_, Result<Vec<TreeNode>>> {
        self.expand(location, depth).boxed()
    }

    async fn expand(&self, location: D::Location, depth: u32) -> Result<Vec<TreeNode>> {
        let children = {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|e| ExplorerError::Backend(e.to_string()))?;
            with_timeout(self.timeout, self.driver.enumerate_children(&location)).await?
        };

        stream::iter(children)
            .map(|child| self.node(child, depth))
            .buffered(self.workers)
            .try_collect()
            .await
    }

    async fn node(&self, child: Child<D::Location>, depth: u32) -> Result<TreeNode> {
        let Child { entry, location } = child;
        if !entry.is_dir {
            return Ok(TreeNode::from_entry(entry));
        }

        let children = match location {
            Some(location) if depth < self.max_depth => self.level(location, depth + 1).await?,
            _ => Vec::new(),
        };
        Ok(TreeNode::directory(entry.name, children))
    }
}
