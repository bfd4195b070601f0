//! Storage backends and the explorer built on top of them.
//!
//! - `guard`: PathGuard, root confinement for the filesystem
//! - `driver`: StorageDriver trait shared by all backends
//! - `filesystem`: FilesystemDriver over a local directory
//! - `bucket`: ObjectStoreDriver and the ObjectStoreClient it drives
//! - `memory`: in-process bucket client
//! - `s3`: S3 client over the `object_store` crate
//! - `tree`: TreeBuilder, depth-bounded recursive listings
//! - `explorer`: StorageExplorer facade

pub mod bucket;
pub mod driver;
pub mod explorer;
pub mod filesystem;
pub mod guard;
pub mod memory;
pub mod s3;
pub mod tree;

pub use bucket::{ClientError, ListPage, ListRequest, ObjectStoreClient, ObjectStoreDriver, ObjectSummary};
pub use driver::{Child, StorageDriver};
pub use explorer::{Backend, SharedExplorer, StorageExplorer};
pub use filesystem::FilesystemDriver;
pub use guard::PathGuard;
pub use memory::InMemoryBucket;
pub use s3::{S3Client, S3Config};
pub use tree::TreeBuilder;
