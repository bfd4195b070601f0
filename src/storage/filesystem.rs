//! Local directory backend.
//!
//! Operates on absolute paths that already went through the `PathGuard`.
//! Children handed back by the OS stay inside the root by construction;
//! symlinks are the exception and get re-checked before anything about their
//! target is reported or the tree builder descends into them.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::error::{ExplorerError, Result};
use crate::models::Entry;
use crate::storage::driver::{check_breadth, Child, StorageDriver};
use crate::storage::guard::PathGuard;

pub struct FilesystemDriver {
    guard: PathGuard,
    max_entries: Option<usize>,
}

impl FilesystemDriver {
    pub fn new(guard: PathGuard, max_entries: Option<usize>) -> Self {
        Self { guard, max_entries }
    }

    pub fn guard(&self) -> &PathGuard {
        &self.guard
    }

    /// Confine a caller-supplied relative path to the root.
    pub async fn resolve(&self, relative: &str) -> Result<PathBuf> {
        self.guard.resolve(relative).await
    }

    /// Symlinks are followed only when their target stays inside the root.
    /// Anything else (outside targets, dangling links) is described by the
    /// link itself, except that an outside directory still lists as a
    /// directory that is never descended.
    async fn symlink_child(&self, name: String, path: &Path, link: &fs::DirEntry) -> Result<Child<PathBuf>> {
        match self.guard.contain(path).await {
            Ok(target) => {
                let metadata = fs::metadata(&target)
                    .await
                    .map_err(|e| ExplorerError::from_io(self.display(path), e))?;
                if metadata.is_dir() {
                    Ok(Child::directory(Entry::directory(name), Some(target)))
                } else {
                    Ok(Child::file(Entry::file(name, metadata.len())))
                }
            }
            Err(e) => {
                tracing::debug!("Not following {:?}: {}", path, e);
                if fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false) {
                    return Ok(Child::directory(Entry::directory(name), None));
                }
                let own = link
                    .metadata()
                    .await
                    .map_err(|e| ExplorerError::from_io(self.display(path), e))?;
                Ok(Child::file(Entry::file(name, own.len())))
            }
        }
    }

    /// Path relative to the root, for messages that reach the caller.
    fn display(&self, path: &Path) -> String {
        path.strip_prefix(self.guard.root())
            .unwrap_or(path)
            .to_string_lossy()
            .to_string()
    }
}

#[async_trait]
impl StorageDriver for FilesystemDriver {
    type Location = PathBuf;

    async fn list_one_level(&self, location: &PathBuf) -> Result<Vec<Entry>> {
        let children = self.enumerate_children(location).await?;
        Ok(children.into_iter().map(|c| c.entry).collect())
    }

    async fn get_bytes(&self, location: &PathBuf) -> Result<Vec<u8>> {
        let display = self.display(location);
        let metadata = fs::metadata(location)
            .await
            .map_err(|e| ExplorerError::from_io(display.clone(), e))?;
        if metadata.is_dir() {
            return Err(ExplorerError::IsADirectory(display));
        }

        fs::read(location)
            .await
            .map_err(|e| ExplorerError::from_io(display, e))
    }

    async fn enumerate_children(&self, location: &PathBuf) -> Result<Vec<Child<PathBuf>>> {
        let display = self.display(location);
        let metadata = fs::metadata(location)
            .await
            .map_err(|e| ExplorerError::from_io(display.clone(), e))?;
        if !metadata.is_dir() {
            return Err(ExplorerError::NotADirectory(display));
        }

        let mut read_dir = fs::read_dir(location)
            .await
            .map_err(|e| ExplorerError::from_io(display.clone(), e))?;

        let mut children = Vec::new();
        while let Some(dir_entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| ExplorerError::from_io(display.clone(), e))?
        {
            let name = dir_entry.file_name().to_string_lossy().to_string();
            let path = dir_entry.path();
            let file_type = dir_entry
                .file_type()
                .await
                .map_err(|e| ExplorerError::from_io(self.display(&path), e))?;

            let child = if file_type.is_symlink() {
                self.symlink_child(name, &path, &dir_entry).await?
            } else if file_type.is_dir() {
                Child::directory(Entry::directory(name), Some(path))
            } else {
                let metadata = dir_entry
                    .metadata()
                    .await
                    .map_err(|e| ExplorerError::from_io(self.display(&path), e))?;
                Child::file(Entry::file(name, metadata.len()))
            };
            children.push(child);

            check_breadth(children.len(), self.max_entries, &display)?;
        }

        Ok(children)
    }
}
