//! Storage Explorer - browse a local directory or an object-store bucket
//! through one uniform API: list a level, download a file, or build a
//! depth-bounded tree.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod storage;

pub use config::ExplorerSettings;
pub use error::{ErrorKind, ExplorerError, Result};
pub use models::{Entry, TreeNode};
pub use storage::{SharedExplorer, StorageExplorer};
