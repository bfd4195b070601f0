//! Data transfer objects (DTOs) for explorer results and API responses.
//!
//! - `entry`: Entry, TreeNode (the uniform result shapes of every backend)
//! - `responses`: JSON envelopes returned by the HTTP layer

pub mod entry;
pub mod responses;

pub use entry::*;
pub use responses::*;
