//! Transport module - Nơi lưu trữ thật sự của chunk bytes.
//!
//! Module này chứa:
//! - `ChunkStore` trait: abstraction cho backend lưu chunk
//! - `WebhookStore`: backend đẩy chunk lên webhook dưới dạng attachment

pub mod webhook;

pub use webhook::WebhookStore;

use crate::storage::Result;

/// Trait cho tất cả chunk backends
///
/// Backend chỉ biết bytes và locator; encryption, checksum và
/// cấu trúc cây thư mục nằm ở tầng `storage`.
pub trait ChunkStore: Send + Sync {
    /// Tên của backend (dùng cho log)
    fn name(&self) -> &'static str;

    /// Lưu một chunk, trả về locator để đọc lại sau này
    fn put(&self, data: &[u8]) -> Result<String>;

    /// Đọc lại chunk từ locator
    fn get(&self, locator: &str) -> Result<Vec<u8>>;
}

#[cfg(test)]
pub use memory::MemoryStore;

#[cfg(test)]
mod memory {
    use super::ChunkStore;
    use crate::storage::{FsError, Result};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// In-memory backend cho tests. Clone chia sẻ cùng storage,
    /// nên một "session" mới có thể đọc chunk của session trước.
    #[derive(Clone, Default)]
    pub struct MemoryStore {
        chunks: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn len(&self) -> usize {
            self.chunks.lock().map(|c| c.len()).unwrap_or(0)
        }

        /// Lấy raw bytes đã lưu (để kiểm tra encryption)
        pub fn raw(&self, locator: &str) -> Option<Vec<u8>> {
            self.chunks.lock().ok()?.get(locator).cloned()
        }
    }

    impl ChunkStore for MemoryStore {
        fn name(&self) -> &'static str {
            "memory"
        }

        fn put(&self, data: &[u8]) -> Result<String> {
            let mut chunks = self
                .chunks
                .lock()
                .map_err(|_| FsError::Remote("memory store poisoned".to_string()))?;
            let locator = format!("mem://{}", chunks.len());
            chunks.insert(locator.clone(), data.to_vec());
            Ok(locator)
        }

        fn get(&self, locator: &str) -> Result<Vec<u8>> {
            let chunks = self
                .chunks
                .lock()
                .map_err(|_| FsError::Remote("memory store poisoned".to_string()))?;
            chunks
                .get(locator)
                .cloned()
                .ok_or_else(|| FsError::Remote(format!("unknown chunk: {}", locator)))
        }
    }
}
