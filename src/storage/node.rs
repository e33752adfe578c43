//! Node types của virtual file system.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tham chiếu tới một chunk đã lưu ở backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRef {
    /// Locator do backend trả về (attachment URL)
    pub url: String,
    /// Kích thước plaintext của chunk
    pub size: u64,
    /// SHA256 của bytes đã lưu (sau encryption)
    pub sha256: String,
}

/// Một node trong cây: file hoặc directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    File {
        name: String,
        size: u64,
        created_at: DateTime<Utc>,
        #[serde(default)]
        chunks: Vec<ChunkRef>,
    },
    Directory {
        name: String,
        #[serde(default)]
        children: Vec<Node>,
    },
}

impl Node {
    /// Directory rỗng
    pub fn directory(name: impl Into<String>) -> Self {
        Node::Directory {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Tên của node (root có tên rỗng)
    pub fn name(&self) -> &str {
        match self {
            Node::File { name, .. } | Node::Directory { name, .. } => name,
        }
    }

    pub fn set_name(&mut self, new_name: impl Into<String>) {
        match self {
            Node::File { name, .. } | Node::Directory { name, .. } => *name = new_name.into(),
        }
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Node::Directory { .. })
    }

    /// Tìm child theo tên
    pub fn child(&self, child_name: &str) -> Option<&Node> {
        match self {
            Node::Directory { children, .. } => children.iter().find(|c| c.name() == child_name),
            Node::File { .. } => None,
        }
    }

    pub(crate) fn child_mut(&mut self, child_name: &str) -> Option<&mut Node> {
        match self {
            Node::Directory { children, .. } => {
                children.iter_mut().find(|c| c.name() == child_name)
            }
            Node::File { .. } => None,
        }
    }
}
