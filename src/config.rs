//! Explorer tuning knobs, fixed at construction and never mutated afterwards.

use std::time::Duration;

/// Depth used by tree listings when the caller does not ask for one.
pub const DEFAULT_MAX_DEPTH: u32 = 5;

#[derive(Debug, Clone)]
pub struct ExplorerSettings {
    /// Upper bound on every individual backend call.
    pub timeout: Duration,
    /// Maximum number of listing calls a single tree build keeps in flight.
    pub tree_concurrency: usize,
    /// Reject any level holding more entries than this. `None` means unbounded.
    pub max_entries_per_level: Option<usize>,
    pub default_max_depth: u32,
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            tree_concurrency: 8,
            max_entries_per_level: None,
            default_max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ExplorerSettings {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_tree_concurrency(mut self, workers: usize) -> Self {
        self.tree_concurrency = workers.max(1);
        self
    }

    pub fn with_max_entries_per_level(mut self, limit: Option<usize>) -> Self {
        self.max_entries_per_level = limit;
        self
    }
}
