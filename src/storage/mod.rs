//! Storage module - Virtual file system được lưu thành chunks trên backend.
//!
//! Module này chứa:
//! - `FileSystem`: cây thư mục + các operations (exists, copy, delete, transfers)
//! - Snapshot format để lưu/khôi phục cây thư mục
//! - Chunk codec (encryption + checksum) và transfers
//!
//! Tất cả path truyền vào đều là absolute path đã được normalize.

pub mod chunked;
pub mod error;
pub mod node;
pub mod snapshot;
pub mod transfer;

pub use error::{FsError, Result};
pub use node::{ChunkRef, Node};
pub use transfer::{Download, TransferStats, Upload};

use crate::crypto::{generate_salt, ChunkCipher, SALT_LEN};
use crate::transport::ChunkStore;
use chunked::CHUNK_SIZE;
use snapshot::{Snapshot, SNAPSHOT_VERSION};

/// Tách path thành các segments (bỏ segment rỗng)
fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn join(segments: &[&str]) -> String {
    format!("/{}", segments.join("/"))
}

/// Virtual file system gắn với một chunk backend và một secret key
pub struct FileSystem {
    store: Box<dyn ChunkStore>,
    cipher: Option<ChunkCipher>,
    salt: [u8; SALT_LEN],
    root: Node,
    chunk_size: usize,
}

impl FileSystem {
    /// Khởi tạo từ snapshot (nếu có) hoặc tạo drive rỗng.
    ///
    /// Secret rỗng nghĩa là chunks được lưu không mã hóa.
    pub fn init(store: Box<dyn ChunkStore>, secret: &str, data: Option<&[u8]>) -> Result<Self> {
        let (salt, root) = match data {
            Some(bytes) => {
                let snapshot = Snapshot::decode(bytes)?;
                (snapshot.salt, snapshot.root)
            }
            None => (generate_salt(), Node::directory("")),
        };

        let cipher = if secret.is_empty() {
            None
        } else {
            let cipher = ChunkCipher::from_secret(secret, &salt)
                .map_err(|e| FsError::Crypto(e.to_string()))?;
            Some(cipher)
        };

        tracing::debug!(
            "Opened file system on {} backend (encrypted: {})",
            store.name(),
            cipher.is_some()
        );

        Ok(Self {
            store,
            cipher,
            salt,
            root,
            chunk_size: CHUNK_SIZE,
        })
    }

    /// Đổi kích thước chunk (tests dùng chunk nhỏ)
    #[cfg(test)]
    pub(crate) fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub(crate) fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Serialize toàn bộ cây thành snapshot bytes
    pub fn export(&self) -> Result<Vec<u8>> {
        Snapshot {
            version: SNAPSHOT_VERSION,
            salt: self.salt,
            root: self.root.clone(),
        }
        .encode()
    }

    pub fn exists(&self, path: &str) -> bool {
        self.get_node(path).is_some()
    }

    pub fn get_node(&self, path: &str) -> Option<&Node> {
        self.node_at(&segments(path))
    }

    fn node_at(&self, segments: &[&str]) -> Option<&Node> {
        segments
            .iter()
            .try_fold(&self.root, |node, segment| node.child(segment))
    }

    /// Children của directory tại `segments`
    fn children_mut(&mut self, segments: &[&str]) -> Result<&mut Vec<Node>> {
        let mut current = &mut self.root;
        for (i, segment) in segments.iter().enumerate() {
            current = current
                .child_mut(segment)
                .ok_or_else(|| FsError::NotFound(join(&segments[..=i])))?;
        }

        match current {
            Node::Directory { children, .. } => Ok(children),
            Node::File { .. } => Err(FsError::NotADirectory(join(segments))),
        }
    }

    /// Đặt node tại `segments`, thay thế node cùng tên nếu đã có
    pub(crate) fn insert(&mut self, segments: &[&str], mut node: Node) -> Result<()> {
        let (name, parent) = segments.split_last().ok_or_else(|| {
            FsError::InvalidOperation("cannot replace the root directory".to_string())
        })?;

        node.set_name(*name);
        let children = self.children_mut(parent)?;
        match children.iter_mut().find(|c| c.name() == *name) {
            Some(existing) => *existing = node,
            None => children.push(node),
        }
        Ok(())
    }

    /// Tạo các directory còn thiếu dọc theo `segments` (như `mkdir -p`)
    pub(crate) fn make_dirs(&mut self, segments: &[&str]) -> Result<()> {
        let mut current = &mut self.root;
        for (depth, segment) in segments.iter().enumerate() {
            let children = match current {
                Node::Directory { children, .. } => children,
                Node::File { .. } => return Err(FsError::NotADirectory(join(&segments[..depth]))),
            };
            let index = match children.iter().position(|c| c.name() == *segment) {
                Some(index) => index,
                None => {
                    tracing::debug!("Creating directory {}", join(&segments[..=depth]));
                    children.push(Node::directory(*segment));
                    children.len() - 1
                }
            };
            current = &mut children[index];
        }

        match current {
            Node::Directory { .. } => Ok(()),
            Node::File { .. } => Err(FsError::NotADirectory(join(segments))),
        }
    }

    /// Tính path đích cho copy/move.
    ///
    /// Target là directory có sẵn → source được đặt vào trong với tên cũ;
    /// ngược lại parent của target phải là directory.
    fn placement<'p>(&self, source: &[&'p str], target: &[&'p str]) -> Result<Vec<&'p str>> {
        let name = source.last().ok_or_else(|| {
            FsError::InvalidOperation("cannot copy the root directory".to_string())
        })?;

        let placed = match self.node_at(target) {
            Some(node) if node.is_directory() => {
                let mut placed = target.to_vec();
                placed.push(*name);
                placed
            }
            Some(_) => target.to_vec(),
            None => {
                // Root luôn tồn tại nên target ở đây không rỗng
                let parent = &target[..target.len().saturating_sub(1)];
                match self.node_at(parent) {
                    None => return Err(FsError::NotFound(join(parent))),
                    Some(node) if !node.is_directory() => {
                        return Err(FsError::NotADirectory(join(parent)))
                    }
                    Some(_) => target.to_vec(),
                }
            }
        };

        // Đích là ancestor của source: ghi đè sẽ xoá luôn source
        if placed != source && source.starts_with(&placed) {
            return Err(FsError::InvalidOperation(format!(
                "cannot replace {} with its own descendant {}",
                join(&placed),
                join(source)
            )));
        }
        Ok(placed)
    }

    /// Copy file hoặc directory (đệ quy). Chunks được chia sẻ, không upload lại.
    pub fn copy(&mut self, source: &str, target: &str) -> Result<()> {
        let source = segments(source);
        let target = segments(target);

        let node = self
            .node_at(&source)
            .cloned()
            .ok_or_else(|| FsError::NotFound(join(&source)))?;
        let placed = self.placement(&source, &target)?;
        if placed == source {
            return Ok(());
        }

        tracing::debug!("Copying {} to {}", join(&source), join(&placed));
        self.insert(&placed, node)
    }

    /// Move = copy + delete source
    pub fn rename(&mut self, source: &str, target: &str) -> Result<()> {
        let source = segments(source);
        let target = segments(target);

        let node = self
            .node_at(&source)
            .cloned()
            .ok_or_else(|| FsError::NotFound(join(&source)))?;
        let placed = self.placement(&source, &target)?;
        if placed == source {
            return Ok(());
        }
        if placed.starts_with(&source) {
            return Err(FsError::InvalidOperation(format!(
                "cannot move {} into itself",
                join(&source)
            )));
        }

        tracing::debug!("Moving {} to {}", join(&source), join(&placed));
        self.insert(&placed, node)?;
        self.remove(&source)
    }

    /// Xoá file hoặc directory (đệ quy)
    pub fn delete(&mut self, path: &str) -> Result<()> {
        self.remove(&segments(path))
    }

    fn remove(&mut self, segments: &[&str]) -> Result<()> {
        let (name, parent) = segments.split_last().ok_or_else(|| {
            FsError::InvalidOperation("cannot delete the root directory".to_string())
        })?;

        let children = self.children_mut(parent)?;
        let index = children
            .iter()
            .position(|c| c.name() == *name)
            .ok_or_else(|| FsError::NotFound(join(segments)))?;
        children.remove(index);
        Ok(())
    }

    /// Bắt đầu upload vào `path`. File cũ (nếu có) bị thay thế khi `finish`.
    pub fn begin_upload(&mut self, path: &str) -> Result<Upload<'_>> {
        let target = segments(path);
        let Some((_, parent)) = target.split_last() else {
            return Err(FsError::IsADirectory(path.to_string()));
        };

        match self.node_at(&target) {
            Some(node) if node.is_directory() => {
                return Err(FsError::IsADirectory(join(&target)));
            }
            _ => {}
        }
        // Parent còn thiếu sẽ được tạo khi `finish`, nhưng không được là file
        for depth in 1..=parent.len() {
            match self.node_at(&parent[..depth]) {
                None => break,
                Some(node) if !node.is_directory() => {
                    return Err(FsError::NotADirectory(join(&parent[..depth])));
                }
                Some(_) => {}
            }
        }

        let owned = target.iter().map(|s| s.to_string()).collect();
        Ok(Upload::new(self, owned))
    }

    /// Bắt đầu download file tại `path`
    pub fn begin_download(&self, path: &str) -> Result<Download<'_>> {
        match self.get_node(path) {
            None => Err(FsError::NotFound(path.to_string())),
            Some(Node::Directory { .. }) => Err(FsError::IsADirectory(path.to_string())),
            Some(Node::File { size, chunks, .. }) => Ok(Download::new(self, *size, chunks.clone())),
        }
    }

    pub(crate) fn store_chunk(&self, data: &[u8]) -> Result<ChunkRef> {
        chunked::store_chunk(self.store.as_ref(), self.cipher.as_ref(), data)
    }

    pub(crate) fn fetch_chunk(&self, chunk: &ChunkRef) -> Result<Vec<u8>> {
        chunked::fetch_chunk(self.store.as_ref(), self.cipher.as_ref(), chunk)
    }
}
