//! The public entry point: one explorer bound to one backend.
//!
//! - `list_directory`: one level of entries
//! - `download_file`: the full content of one file
//! - `list_directory_tree`: a depth-bounded tree rooted at a path
//!
//! The filesystem backend confines every path with its `PathGuard` before
//! anything else happens. Object-store prefixes go straight to the driver;
//! they have no root to escape from.

use std::path::Path;
use std::sync::Arc;

use crate::config::ExplorerSettings;
use crate::error::{ExplorerError, Result};
use crate::models::{Entry, TreeNode};
use crate::storage::bucket::{ObjectStoreClient, ObjectStoreDriver};
use crate::storage::driver::{with_timeout, StorageDriver};
use crate::storage::filesystem::FilesystemDriver;
use crate::storage::guard::PathGuard;
use crate::storage::tree::TreeBuilder;

pub enum Backend {
    Filesystem(FilesystemDriver),
    ObjectStore(ObjectStoreDriver),
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Filesystem(_) => "filesystem",
            Backend::ObjectStore(_) => "object_store",
        }
    }
}

pub struct StorageExplorer {
    backend: Backend,
    settings: ExplorerSettings,
}

pub type SharedExplorer = Arc<StorageExplorer>;

impl StorageExplorer {
    pub fn new(backend: Backend, settings: ExplorerSettings) -> Self {
        Self { backend, settings }
    }

    pub fn filesystem<P: AsRef<Path>>(root: P, settings: ExplorerSettings) -> Result<Self> {
        let guard = PathGuard::new(root)?;
        tracing::info!("Serving filesystem root {}", guard.root().display());
        let driver = FilesystemDriver::new(guard, settings.max_entries_per_level);
        Ok(Self::new(Backend::Filesystem(driver), settings))
    }

    pub fn object_store(
        client: Arc<dyn ObjectStoreClient>,
        bucket: impl Into<String>,
        settings: ExplorerSettings,
    ) -> Self {
        let driver = ObjectStoreDriver::new(client, bucket, settings.max_entries_per_level);
        tracing::info!("Serving bucket '{}'", driver.bucket());
        Self::new(Backend::ObjectStore(driver), settings)
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn settings(&self) -> &ExplorerSettings {
        &self.settings
    }

    pub async fn list_directory(&self, path: &str) -> Result<Vec<Entry>> {
        tracing::debug!("list_directory {:?} on {}", path, self.backend.name());
        let timeout = self.settings.timeout;
        match &self.backend {
            Backend::Filesystem(driver) => {
                with_timeout(timeout, async {
                    let location = driver.resolve(path).await?;
                    driver.list_one_level(&location).await
                })
                .await
            }
            Backend::ObjectStore(driver) => {
                with_timeout(timeout, driver.list_one_level(&path.to_string())).await
            }
        }
    }

    pub async fn download_file(&self, path: &str) -> Result<Vec<u8>> {
        tracing::debug!("download_file {:?} on {}", path, self.backend.name());
        let timeout = self.settings.timeout;
        match &self.backend {
            Backend::Filesystem(driver) => {
                with_timeout(timeout, async {
                    let location = driver.resolve(path).await?;
                    driver.get_bytes(&location).await
                })
                .await
            }
            Backend::ObjectStore(driver) => {
                with_timeout(timeout, driver.get_bytes(&path.to_string())).await
            }
        }
    }

    /// Build a tree of at most `max_depth` levels below `path`.
    ///
    /// Sibling order follows the backend and is not guaranteed to be stable
    /// across calls for object storage.
    pub async fn list_directory_tree(&self, path: &str, max_depth: u32) -> Result<Vec<TreeNode>> {
        if max_depth == 0 {
            return Err(ExplorerError::InvalidDepth(0));
        }
        tracing::debug!(
            "list_directory_tree {:?} (max_depth {}) on {}",
            path,
            max_depth,
            self.backend.name()
        );

        let timeout = self.settings.timeout;
        let workers = self.settings.tree_concurrency;
        match &self.backend {
            Backend::Filesystem(driver) => {
                let start = with_timeout(timeout, driver.resolve(path)).await?;
                TreeBuilder::new(driver, max_depth, workers, timeout)?
                    .build(&start)
                    .await
            }
            Backend::ObjectStore(driver) => {
                TreeBuilder::new(driver, max_depth, workers, timeout)?
                    .build(&path.to_string())
                    .await
            }
        }
    }

    /// `list_directory_tree` with the configured default depth.
    pub async fn list_default_tree(&self, path: &str) -> Result<Vec<TreeNode>> {
        self.list_directory_tree(path, self.settings.default_max_depth).await
    }
}
