//! Root confinement for the filesystem backend.
//!
//! A `PathGuard` owns the canonical storage root. User-supplied paths are
//! checked lexically before anything touches the disk, so an escape attempt
//! is rejected the same way whether or not its target exists. Only then is the
//! joined path canonicalized and compared component-wise with the root, which
//! catches symlinks pointing outside.

use std::path::{Component, Path, PathBuf};

use crate::error::{ExplorerError, Result};

#[derive(Debug, Clone)]
pub struct PathGuard {
    root: PathBuf,
}

impl PathGuard {
    /// Canonicalize `root` once. It must exist and be a directory.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let display = root.as_ref().to_string_lossy().to_string();
        let root = std::fs::canonicalize(root.as_ref())
            .map_err(|e| ExplorerError::from_io(display.clone(), e))?;
        if !root.is_dir() {
            return Err(ExplorerError::NotADirectory(display));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `relative` to an absolute path inside the root.
    pub async fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let joined = self.lexical_join(relative)?;
        let canonical = match tokio::fs::canonicalize(&joined).await {
            Ok(canonical) => canonical,
            Err(e) => {
                self.confine_existing_ancestor(&joined, relative).await?;
                return Err(ExplorerError::from_io(relative, e));
            }
        };
        self.confine(canonical, relative)
    }

    /// A path that cannot be resolved is only reported as such once the part of
    /// it that does exist is known to be inside the root.
    async fn confine_existing_ancestor(&self, joined: &Path, requested: &str) -> Result<()> {
        for ancestor in joined.ancestors().skip(1) {
            if let Ok(canonical) = tokio::fs::canonicalize(ancestor).await {
                return self.confine(canonical, requested).map(|_| ());
            }
        }
        Err(self.reject(requested))
    }

    /// Re-check a path produced by the OS itself (a symlinked child, say).
    pub async fn contain(&self, path: &Path) -> Result<PathBuf> {
        let display = path.to_string_lossy().to_string();
        let canonical = tokio::fs::canonicalize(path)
            .await
            .map_err(|e| ExplorerError::from_io(display.clone(), e))?;
        self.confine(canonical, &display)
    }

    /// Join without syscalls, refusing anything that leaves the root on paper.
    fn lexical_join(&self, relative: &str) -> Result<PathBuf> {
        let mut joined = self.root.clone();
        let mut depth = 0usize;

        for component in Path::new(relative).components() {
            match component {
                Component::Normal(segment) => {
                    joined.push(segment);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if depth == 0 {
                        return Err(self.reject(relative));
                    }
                    joined.pop();
                    depth -= 1;
                }
                Component::RootDir | Component::Prefix(_) => return Err(self.reject(relative)),
            }
        }

        Ok(joined)
    }

    fn confine(&self, canonical: PathBuf, requested: &str) -> Result<PathBuf> {
        // Path::starts_with compares whole components, so /data-evil is not under /data.
        if canonical.starts_with(&self.root) {
            Ok(canonical)
        } else {
            Err(self.reject(requested))
        }
    }

    fn reject(&self, requested: &str) -> ExplorerError {
        tracing::warn!("Rejected path outside storage root: {:?}", requested);
        ExplorerError::OutOfBounds(requested.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn setup() -> (tempfile::TempDir, PathGuard) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b")).unwrap();
        fs::write(dir.path().join("a/file.txt"), b"hi").unwrap();
        let guard = PathGuard::new(dir.path()).unwrap();
        (dir, guard)
    }

    #[tokio::test]
    async fn empty_path_is_root() {
        let (_dir, guard) = setup();
        assert_eq!(guard.resolve("").await.unwrap(), guard.root());
        assert_eq!(guard.resolve(".").await.unwrap(), guard.root());
    }

    #[tokio::test]
    async fn resolves_nested_paths() {
        let (_dir, guard) = setup();
        let resolved = guard.resolve("a/b/../file.txt").await.unwrap();
        assert_eq!(resolved, guard.root().join("a/file.txt"));
    }

    #[tokio::test]
    async fn rejects_traversal_without_touching_disk() {
        let (_dir, guard) = setup();
        for path in ["..", "../../etc/passwd", "a/../../etc/passwd", "a/b/../../../etc", "/etc/passwd"] {
            let err = guard.resolve(path).await.unwrap_err();
            assert!(matches!(err, ExplorerError::OutOfBounds(_)), "{path}: {err:?}");
        }
    }

    #[tokio::test]
    async fn escape_to_missing_target_is_still_out_of_bounds() {
        let (_dir, guard) = setup();
        let err = guard.resolve("../definitely-not-here").await.unwrap_err();
        assert!(matches!(err, ExplorerError::OutOfBounds(_)));
    }

    #[tokio::test]
    async fn missing_path_inside_root_is_not_found() {
        let (_dir, guard) = setup();
        let err = guard.resolve("a/missing.txt").await.unwrap_err();
        assert!(matches!(err, ExplorerError::NotFound(_)));
    }

    #[tokio::test]
    async fn sibling_with_shared_name_prefix_is_outside() {
        let parent = tempfile::tempdir().unwrap();
        fs::create_dir(parent.path().join("data")).unwrap();
        fs::create_dir(parent.path().join("data-evil")).unwrap();
        let guard = PathGuard::new(parent.path().join("data")).unwrap();

        let outside = fs::canonicalize(parent.path().join("data-evil")).unwrap();
        let err = guard.contain(&outside).await.unwrap_err();
        assert!(matches!(err, ExplorerError::OutOfBounds(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_out_of_root_is_rejected() {
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret"), b"x").unwrap();
        let (dir, guard) = setup();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        let err = guard.resolve("link/secret").await.unwrap_err();
        assert!(matches!(err, ExplorerError::OutOfBounds(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn missing_path_behind_escaping_symlink_is_out_of_bounds() {
        let outside = tempfile::tempdir().unwrap();
        let (dir, guard) = setup();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();

        fs::write(outside.path().join("plain"), b"x").unwrap();
        for path in ["link/missing", "link/missing/deeper.txt", "link/plain/under-a-file"] {
            let err = guard.resolve(path).await.unwrap_err();
            assert!(matches!(err, ExplorerError::OutOfBounds(_)), "{path}: {err:?}");
        }
        let err = guard.resolve("a/missing/deeper.txt").await.unwrap_err();
        assert!(matches!(err, ExplorerError::NotFound(_)));
    }

    #[test]
    fn root_must_be_a_directory() {
        let (dir, _guard) = setup();
        let err = PathGuard::new(dir.path().join("a/file.txt")).unwrap_err();
        assert!(matches!(err, ExplorerError::NotADirectory(_)));
        let err = PathGuard::new(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, ExplorerError::NotFound(_)));
    }
}
