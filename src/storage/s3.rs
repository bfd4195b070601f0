//! Amazon S3 client built on the `object_store` crate.
//!
//! Credentials come from the usual `AWS_*` environment variables; the bucket,
//! region and an optional custom endpoint (MinIO, LocalStack) are explicit.
//!
//! `object_store` follows S3 continuation tokens itself, so each `list_page`
//! call already returns a complete level and never hands back a token. Prefixes
//! are interpreted as directory paths: `a` and `a/` both list the children of
//! `a/`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{ClientOptions, ListResult, ObjectStore};

use crate::error::{ExplorerError, Result};
use crate::storage::bucket::{ClientError, ListPage, ListRequest, ObjectStoreClient, ObjectSummary, DELIMITER};

#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub timeout: Duration,
}

pub struct S3Client {
    store: Arc<dyn ObjectStore>,
}

impl S3Client {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub fn from_env(config: &S3Config) -> Result<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(&config.bucket)
            .with_client_options(ClientOptions::new().with_timeout(config.timeout));
        if let Some(region) = &config.region {
            builder = builder.with_region(region);
        }
        if let Some(endpoint) = &config.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        let store = builder
            .build()
            .map_err(|e| ExplorerError::Backend(format!("S3 client for '{}': {}", config.bucket, e)))?;
        Ok(Self::new(Arc::new(store)))
    }
}

fn client_error(err: object_store::Error) -> ClientError {
    match err {
        object_store::Error::NotFound { path, .. } => ClientError::NoSuchKey(path),
        other => ClientError::Transport(other.to_string()),
    }
}

/// Keys are used verbatim, the same form listings report them in.
fn object_path(key: &str) -> std::result::Result<ObjectPath, ClientError> {
    ObjectPath::parse(key).map_err(|_| ClientError::InvalidKey(key.to_string()))
}

/// Translate one `list_with_delimiter` result into a page for `prefix`.
///
/// `object_store` strips trailing delimiters from listed keys, so the folder
/// marker `a/c/` comes back as `a/c` when listing `a/c/`. It is reported under
/// the requested prefix so the driver recognises it as the marker.
fn page_from_listing(prefix: &str, listing: ListResult) -> ListPage {
    let trimmed = prefix.trim_end_matches(DELIMITER);

    ListPage {
        common_prefixes: listing
            .common_prefixes
            .into_iter()
            .map(|p| format!("{}{}", p, DELIMITER))
            .collect(),
        objects: listing
            .objects
            .into_iter()
            .map(|meta| {
                let key = meta.location.to_string();
                let key = if !trimmed.is_empty() && key == trimmed {
                    prefix.to_string()
                } else {
                    key
                };
                ObjectSummary {
                    key,
                    size: meta.size as u64,
                }
            })
            .collect(),
        next_continuation_token: None,
    }
}

#[async_trait]
impl ObjectStoreClient for S3Client {
    async fn list_page(&self, request: &ListRequest) -> std::result::Result<ListPage, ClientError> {
        let trimmed = request.prefix.trim_end_matches(DELIMITER);
        let prefix = if trimmed.is_empty() {
            None
        } else {
            Some(object_path(trimmed)?)
        };

        let listing = self
            .store
            .list_with_delimiter(prefix.as_ref())
            .await
            .map_err(client_error)?;

        Ok(page_from_listing(&request.prefix, listing))
    }

    async fn get_object(&self, key: &str) -> std::result::Result<Vec<u8>, ClientError> {
        let result = self
            .store
            .get(&object_path(key)?)
            .await
            .map_err(client_error)?;
        let bytes = result.bytes().await.map_err(client_error)?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Entry;
    use crate::storage::bucket::ObjectStoreDriver;
    use crate::storage::driver::StorageDriver;
    use object_store::memory::InMemory;
    use object_store::{ObjectMeta, PutPayload};

    async fn store_with(keys: &[(&str, &'static [u8])]) -> S3Client {
        let store = InMemory::new();
        for (key, body) in keys {
            store
                .put(&ObjectPath::parse(*key).unwrap(), PutPayload::from_static(*body))
                .await
                .unwrap();
        }
        S3Client::new(Arc::new(store))
    }

    #[tokio::test]
    async fn lists_one_level_with_trailing_delimiters() {
        let client = store_with(&[("a/b.txt", b"bb"), ("a/c/d.txt", b"d")]).await;
        let page = client.list_page(&ListRequest::new("a/")).await.unwrap();
        assert_eq!(page.common_prefixes, vec!["a/c/".to_string()]);
        assert_eq!(page.objects, vec![ObjectSummary { key: "a/b.txt".into(), size: 2 }]);
        assert!(page.next_continuation_token.is_none());
    }

    #[tokio::test]
    async fn missing_object_maps_to_no_such_key() {
        let client = store_with(&[]).await;
        let err = client.get_object("missing.bin").await.unwrap_err();
        assert!(matches!(err, ClientError::NoSuchKey(_)));
    }

    #[tokio::test]
    async fn fetches_object_bodies() {
        let client = store_with(&[("x/y.bin", b"\x00\x01\x02")]).await;
        assert_eq!(client.get_object("x/y.bin").await.unwrap(), vec![0, 1, 2]);
    }

    fn driver(client: impl ObjectStoreClient + 'static) -> ObjectStoreDriver {
        ObjectStoreDriver::new(Arc::new(client), "test-bucket", None)
    }

    fn meta(key: &str, size: usize) -> ObjectMeta {
        ObjectMeta {
            location: ObjectPath::parse(key).unwrap(),
            last_modified: chrono::Utc::now(),
            size,
            e_tag: None,
            version: None,
        }
    }

    /// Replays what S3 returns for a delimited listing of `a/c/` when the
    /// folder marker `a/c/` exists: the marker is listed as an object.
    struct MarkerListing;

    #[async_trait]
    impl ObjectStoreClient for MarkerListing {
        async fn list_page(&self, request: &ListRequest) -> std::result::Result<ListPage, ClientError> {
            let objects = match request.prefix.as_str() {
                "a/c/" => vec![meta("a/c/", 0), meta("a/c/d.txt", 4)],
                "empty/" => vec![meta("empty/", 0)],
                _ => Vec::new(),
            };
            Ok(page_from_listing(
                &request.prefix,
                ListResult {
                    common_prefixes: Vec::new(),
                    objects,
                },
            ))
        }

        async fn get_object(&self, key: &str) -> std::result::Result<Vec<u8>, ClientError> {
            Err(ClientError::NoSuchKey(key.to_string()))
        }
    }

    #[test]
    fn marker_is_reported_under_the_requested_prefix() {
        let listing = ListResult {
            common_prefixes: Vec::new(),
            objects: vec![meta("a/c/", 0), meta("a/c/d.txt", 4)],
        };
        let page = page_from_listing("a/c/", listing);
        assert_eq!(
            page.objects,
            vec![
                ObjectSummary { key: "a/c/".into(), size: 0 },
                ObjectSummary { key: "a/c/d.txt".into(), size: 4 },
            ]
        );
    }

    #[tokio::test]
    async fn listed_marker_never_becomes_a_file() {
        let driver = driver(MarkerListing);
        let entries = driver.list_one_level(&"a/c/".to_string()).await.unwrap();
        assert_eq!(entries, vec![Entry::file("d.txt", 4)]);

        let entries = driver.list_one_level(&"empty/".to_string()).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn marker_shaped_keys_stay_hidden() {
        let client = store_with(&[("a/b.txt", b"bb"), ("a/c/", b""), ("a/c/d.txt", b"dddd")]).await;
        let entries = driver(client).list_one_level(&"a/c/".to_string()).await.unwrap();
        assert_eq!(entries, vec![Entry::file("d.txt", 4)]);
    }

    #[tokio::test]
    async fn reserved_characters_round_trip() {
        let client = store_with(&[("docs/report[1].txt", b"q1"), ("odd #dir%/x~y.txt", b"xy")]).await;
        let driver = driver(client);

        let entries = driver.list_one_level(&"docs/".to_string()).await.unwrap();
        assert_eq!(entries, vec![Entry::file("report[1].txt", 2)]);
        let bytes = driver.get_bytes(&"docs/report[1].txt".to_string()).await.unwrap();
        assert_eq!(bytes, b"q1");

        let entries = driver.list_one_level(&"odd #dir%/".to_string()).await.unwrap();
        assert_eq!(entries, vec![Entry::file("x~y.txt", 2)]);
        let bytes = driver.get_bytes(&"odd #dir%/x~y.txt".to_string()).await.unwrap();
        assert_eq!(bytes, b"xy");
    }

    #[tokio::test]
    async fn unparseable_keys_are_invalid_paths() {
        let driver = driver(store_with(&[]).await);
        let err = driver.get_bytes(&"a/../b.txt".to_string()).await.unwrap_err();
        assert!(matches!(err, ExplorerError::InvalidPath(_)));
        let err = driver.list_one_level(&"a//b/".to_string()).await.unwrap_err();
        assert!(matches!(err, ExplorerError::InvalidPath(_)));
    }
}
