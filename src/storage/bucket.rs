//! Object-store backend.
//!
//! Buckets have no directories: the driver derives them from `/`-delimited
//! listings, where each common prefix stands for one folder. The client trait
//! below is the only thing a concrete store has to provide; pagination,
//! marker handling and error classification all live in `ObjectStoreDriver`.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::error::{ExplorerError, Result};
use crate::models::Entry;
use crate::storage::driver::{check_breadth, Child, StorageDriver};

pub const DELIMITER: &str = "/";

/// One request for a single page of a delimited listing.
#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    pub prefix: String,
    pub delimiter: String,
    pub continuation_token: Option<String>,
}

impl ListRequest {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            delimiter: DELIMITER.to_string(),
            continuation_token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.continuation_token = Some(token.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
}

/// One page of a delimited listing, as reported by the store.
#[derive(Debug, Clone, Default)]
pub struct ListPage {
    /// Full prefixes including the trailing delimiter, e.g. `a/c/`.
    pub common_prefixes: Vec<String>,
    pub objects: Vec<ObjectSummary>,
    pub next_continuation_token: Option<String>,
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("No such key: {0}")]
    NoSuchKey(String),

    #[error("No such bucket: {0}")]
    NoSuchBucket(String),

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("{0}")]
    Transport(String),
}

/// An authenticated connection to one bucket.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    async fn list_page(&self, request: &ListRequest) -> std::result::Result<ListPage, ClientError>;

    async fn get_object(&self, key: &str) -> std::result::Result<Vec<u8>, ClientError>;
}

pub struct ObjectStoreDriver {
    client: Arc<dyn ObjectStoreClient>,
    bucket: String,
    max_entries: Option<usize>,
}

impl ObjectStoreDriver {
    pub fn new(client: Arc<dyn ObjectStoreClient>, bucket: impl Into<String>, max_entries: Option<usize>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            max_entries,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn classify(&self, err: ClientError) -> ExplorerError {
        match err {
            ClientError::NoSuchKey(key) => ExplorerError::NotFound(key),
            ClientError::NoSuchBucket(bucket) => {
                ExplorerError::NotFound(format!("bucket '{}'", bucket))
            }
            ClientError::InvalidKey(key) => ExplorerError::InvalidPath(key),
            ClientError::Transport(msg) => {
                ExplorerError::Backend(format!("bucket '{}': {}", self.bucket, msg))
            }
        }
    }

    /// Fetch every page under `prefix`. Pages depend on each other's tokens, so
    /// this is strictly sequential.
    ///
    /// The zero-byte marker object whose key equals `prefix` is dropped here;
    /// the returned flag records whether it was present.
    async fn list_all_pages(&self, prefix: &str) -> Result<(Vec<String>, Vec<ObjectSummary>, bool)> {
        let mut prefixes = Vec::new();
        let mut objects = Vec::new();
        let mut has_marker = false;
        let mut seen_tokens = HashSet::new();
        let mut request = ListRequest::new(prefix);
        let mut pages = 0usize;

        loop {
            let page = self.client.list_page(&request).await.map_err(|e| self.classify(e))?;
            pages += 1;
            prefixes.extend(page.common_prefixes);
            for object in page.objects {
                if !prefix.is_empty() && object.key == prefix {
                    has_marker = true;
                } else {
                    objects.push(object);
                }
            }
            check_breadth(prefixes.len() + objects.len(), self.max_entries, prefix)?;

            match page.next_continuation_token {
                Some(token) => {
                    if !seen_tokens.insert(token.clone()) {
                        return Err(ExplorerError::Backend(format!(
                            "bucket '{}': pagination repeated token while listing '{}'",
                            self.bucket, prefix
                        )));
                    }
                    request = request.with_token(token);
                }
                None => break,
            }
        }

        tracing::debug!(
            "Listed '{}' in bucket '{}': {} prefixes, {} objects over {} page(s)",
            prefix,
            self.bucket,
            prefixes.len(),
            objects.len(),
            pages
        );
        Ok((prefixes, objects, has_marker))
    }
}

/// Last non-empty segment of a key or prefix, falling back to the whole string.
fn display_name(key: &str) -> &str {
    key.trim_end_matches(DELIMITER)
        .rsplit(DELIMITER)
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or(key)
}

#[async_trait]
impl StorageDriver for ObjectStoreDriver {
    type Location = String;

    async fn list_one_level(&self, prefix: &String) -> Result<Vec<Entry>> {
        let children = self.enumerate_children(prefix).await?;
        Ok(children.into_iter().map(|c| c.entry).collect())
    }

    async fn get_bytes(&self, key: &String) -> Result<Vec<u8>> {
        if key.is_empty() || key.ends_with(DELIMITER) {
            return Err(ExplorerError::IsADirectory(key.clone()));
        }
        self.client.get_object(key).await.map_err(|e| self.classify(e))
    }

    async fn enumerate_children(&self, prefix: &String) -> Result<Vec<Child<String>>> {
        let (prefixes, objects, has_marker) = self.list_all_pages(prefix).await?;

        if !prefix.is_empty() && !has_marker && prefixes.is_empty() && objects.is_empty() {
            return Err(ExplorerError::NotFound(prefix.clone()));
        }

        // The listing reports prefixes and objects separately; folders come first.
        let mut children = Vec::with_capacity(prefixes.len() + objects.len());
        for common in prefixes {
            let entry = Entry::directory(display_name(&common));
            children.push(Child::directory(entry, Some(common)));
        }
        for object in objects {
            children.push(Child::file(Entry::file(display_name(&object.key), object.size)));
        }

        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::InMemoryBucket;

    fn driver(bucket: InMemoryBucket) -> ObjectStoreDriver {
        ObjectStoreDriver::new(Arc::new(bucket), "test-bucket", None)
    }

    fn sorted(mut entries: Vec<Entry>) -> Vec<Entry> {
        entries.sort_by(|a, b| (&a.name, a.is_dir).cmp(&(&b.name, b.is_dir)));
        entries
    }

    #[test]
    fn names_use_last_segment() {
        assert_eq!(display_name("a/b.txt"), "b.txt");
        assert_eq!(display_name("a/c/"), "c");
        assert_eq!(display_name("top.txt"), "top.txt");
        assert_eq!(display_name("/"), "/");
    }

    #[tokio::test]
    async fn folder_marker_is_hidden() {
        let bucket = InMemoryBucket::new()
            .with_object("a/b.txt", b"bb".to_vec())
            .with_object("a/c/d.txt", b"ddd".to_vec())
            .with_object("a/c/", Vec::new());
        let entries = sorted(driver(bucket).list_one_level(&"a/".to_string()).await.unwrap());
        assert_eq!(entries, vec![Entry::file("b.txt", 2), Entry::directory("c")]);
    }

    #[tokio::test]
    async fn marker_only_folder_is_empty_not_missing() {
        let bucket = InMemoryBucket::new().with_object("empty/", Vec::new());
        let entries = driver(bucket).list_one_level(&"empty/".to_string()).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn unknown_prefix_is_not_found() {
        let bucket = InMemoryBucket::new().with_object("a/b.txt", b"x".to_vec());
        let err = driver(bucket).list_one_level(&"zzz/".to_string()).await.unwrap_err();
        assert!(matches!(err, ExplorerError::NotFound(_)));
    }

    #[tokio::test]
    async fn empty_bucket_root_lists_nothing() {
        let entries = driver(InMemoryBucket::new()).list_one_level(&String::new()).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn pages_are_aggregated() {
        let mut bucket = InMemoryBucket::new().with_page_size(2);
        for i in 0..7 {
            bucket = bucket.with_object(format!("logs/{i}.log"), vec![0; i]);
        }
        bucket = bucket.with_object("logs/old/x.log", b"x".to_vec());
        let bucket = Arc::new(bucket);
        let driver = ObjectStoreDriver::new(bucket.clone(), "test-bucket", None);

        let entries = driver.list_one_level(&"logs/".to_string()).await.unwrap();
        assert_eq!(entries.len(), 8);
        assert!(entries.contains(&Entry::file("6.log", 6)));
        assert!(entries.contains(&Entry::directory("old")));
        assert!(bucket.list_calls() >= 4);
    }

    #[tokio::test]
    async fn same_name_file_and_prefix_both_surface() {
        let bucket = InMemoryBucket::new()
            .with_object("a/c", b"file".to_vec())
            .with_object("a/c/d.txt", b"d".to_vec());
        let entries = sorted(driver(bucket).list_one_level(&"a/".to_string()).await.unwrap());
        assert_eq!(entries, vec![Entry::file("c", 4), Entry::directory("c")]);
    }

    #[tokio::test]
    async fn downloads_objects() {
        let bucket = InMemoryBucket::new().with_object("a/b.txt", b"payload".to_vec());
        let bytes = driver(bucket).get_bytes(&"a/b.txt".to_string()).await.unwrap();
        assert_eq!(bytes, b"payload");
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let err = driver(InMemoryBucket::new())
            .get_bytes(&"nope.txt".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, ExplorerError::NotFound(_)));
    }

    #[tokio::test]
    async fn prefix_download_is_a_directory() {
        let bucket = InMemoryBucket::new().with_object("a/", Vec::new());
        let err = driver(bucket).get_bytes(&"a/".to_string()).await.unwrap_err();
        assert!(matches!(err, ExplorerError::IsADirectory(_)));
    }

    struct LoopingClient;

    #[async_trait]
    impl ObjectStoreClient for LoopingClient {
        async fn list_page(&self, _request: &ListRequest) -> std::result::Result<ListPage, ClientError> {
            Ok(ListPage {
                common_prefixes: Vec::new(),
                objects: vec![ObjectSummary { key: "k".into(), size: 1 }],
                next_continuation_token: Some("same".into()),
            })
        }

        async fn get_object(&self, key: &str) -> std::result::Result<Vec<u8>, ClientError> {
            Err(ClientError::Transport(format!("refused {key}")))
        }
    }

    #[tokio::test]
    async fn repeated_token_fails_instead_of_looping() {
        let driver = ObjectStoreDriver::new(Arc::new(LoopingClient), "loop", None);
        let err = driver.list_one_level(&String::new()).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::BackendUnavailable);

        let err = driver.get_bytes(&"k".to_string()).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::BackendUnavailable);
    }

    #[tokio::test]
    async fn breadth_cap_stops_pagination() {
        let mut bucket = InMemoryBucket::new().with_page_size(1);
        for i in 0..10 {
            bucket = bucket.with_object(format!("{i}.txt"), Vec::new());
        }
        let bucket = Arc::new(bucket);
        let driver = ObjectStoreDriver::new(bucket.clone(), "b", Some(3));
        let err = driver.list_one_level(&String::new()).await.unwrap_err();
        assert!(matches!(err, ExplorerError::TooManyEntries { limit: 3, .. }));
        assert!(bucket.list_calls() < 10);
    }
}
