//! In-process bucket with S3-style delimited, paginated listings.
//!
//! Useful for tests and for running the explorer without cloud credentials.
//! Keys are kept sorted, common prefixes are rolled up the way S3 does, and
//! both objects and prefixes count against the page size.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::storage::bucket::{ClientError, ListPage, ListRequest, ObjectStoreClient, ObjectSummary};

const DEFAULT_PAGE_SIZE: usize = 1000;

enum Item {
    Prefix(String),
    Object(ObjectSummary),
}

pub struct InMemoryBucket {
    objects: BTreeMap<String, Vec<u8>>,
    page_size: usize,
    latency: Option<Duration>,
    failure: Option<String>,
    list_calls: AtomicUsize,
}

impl Default for InMemoryBucket {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBucket {
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            page_size: DEFAULT_PAGE_SIZE,
            latency: None,
            failure: None,
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_object(mut self, key: impl Into<String>, body: Vec<u8>) -> Self {
        self.objects.insert(key.into(), body);
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Delay every call, to exercise timeouts.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every listing whose prefix starts with `prefix`.
    pub fn with_failing_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.failure = Some(prefix.into());
        self
    }

    /// Number of `list_page` calls served so far.
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn roll_up(&self, prefix: &str, delimiter: &str) -> Vec<Item> {
        let mut items = Vec::new();
        let mut last_prefix: Option<String> = None;

        for (key, body) in self.objects.range(prefix.to_string()..) {
            let Some(rest) = key.strip_prefix(prefix) else {
                break;
            };

            let split = if delimiter.is_empty() { None } else { rest.find(delimiter) };
            match split {
                Some(pos) => {
                    let common = &key[..prefix.len() + pos + delimiter.len()];
                    if last_prefix.as_deref() != Some(common) {
                        items.push(Item::Prefix(common.to_string()));
                        last_prefix = Some(common.to_string());
                    }
                }
                None => items.push(Item::Object(ObjectSummary {
                    key: key.clone(),
                    size: body.len() as u64,
                })),
            }
        }

        items
    }
}

#[async_trait]
impl ObjectStoreClient for InMemoryBucket {
    async fn list_page(&self, request: &ListRequest) -> Result<ListPage, ClientError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(failing) = &self.failure {
            if request.prefix.starts_with(failing.as_str()) {
                return Err(ClientError::Transport(format!("listing '{}' failed", request.prefix)));
            }
        }

        let items = self.roll_up(&request.prefix, &request.delimiter);
        let start = match &request.continuation_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| ClientError::Transport(format!("invalid continuation token '{}'", token)))?,
            None => 0,
        };
        let total = items.len();
        let end = start.saturating_add(self.page_size).min(total);

        let mut page = ListPage::default();
        for item in items.into_iter().skip(start).take(end.saturating_sub(start)) {
            match item {
                Item::Prefix(p) => page.common_prefixes.push(p),
                Item::Object(o) => page.objects.push(o),
            }
        }
        if end < total {
            page.next_continuation_token = Some(end.to_string());
        }

        Ok(page)
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, ClientError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.objects
            .get(key)
            .cloned()
            .ok_or_else(|| ClientError::NoSuchKey(key.to_string()))
    }
}
