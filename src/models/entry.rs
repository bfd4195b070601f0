//! Listing and tree DTOs shared by every backend.
//!
//! - `Entry`: one child seen at a single listing level (FileList view)
//! - `TreeNode`: an `Entry` plus its expanded children (tree sidebar)
//!
//! Both uphold the same shape invariant: directories never carry a size,
//! files always do, and only directories carry `children`. The constructors
//! are the intended way to build them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub is_dir: bool,
    pub size: Option<u64>,
}

impl Entry {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            size: Some(size),
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            size: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    pub is_dir: bool,
    pub size: Option<u64>,
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            size: Some(size),
            children: None,
        }
    }

    pub fn directory(name: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            size: None,
            children: Some(children),
        }
    }

    /// Build a leaf or an empty directory from a listing entry.
    pub fn from_entry(entry: Entry) -> Self {
        if entry.is_dir {
            Self::directory(entry.name, Vec::new())
        } else {
            Self::file(entry.name, entry.size.unwrap_or(0))
        }
    }

    /// Depth of the deepest node below and including this one (self = 1).
    pub fn depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .flatten()
            .map(TreeNode::depth)
            .max()
            .unwrap_or(0)
    }
}
