//! Cart persistence backends.
//!
//! A cart is stored as one serialized record under a string key. Backends
//! only move strings around; parsing belongs to the engine.

use dashmap::DashMap;
use std::{fmt::Write as _, io, path::PathBuf};

/// Fixed storage key of the cart record.
pub const CART_STORAGE_KEY: &str = "storefront-cart";

/// Key of the record holding the cart identified by `cart_id`.
pub fn cart_storage_key(cart_id: &str) -> String {
    format!("{CART_STORAGE_KEY}:{cart_id}")
}

/// Key/value storage for serialized carts.
pub trait CartStorage: Send + Sync {
    /// Returns the raw record under `key`, or `None` when absent or unreadable.
    fn load(&self, key: &str) -> Option<String>;

    fn save(&self, key: &str, value: &str) -> io::Result<()>;
}

/// Process-local storage.
#[derive(Default)]
pub struct MemoryStorage {
    records: DashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStorage for MemoryStorage {
    fn load(&self, key: &str) -> Option<String> {
        self.records.get(key).map(|v| v.value().clone())
    }

    fn save(&self, key: &str, value: &str) -> io::Result<()> {
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One JSON file per key inside a directory.
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Opens (and creates if needed) the storage directory.
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Maps a key to its file. Bytes outside `[A-Za-z0-9-]` are
    /// percent-encoded, so distinct keys always get distinct files.
    fn path_for(&self, key: &str) -> PathBuf {
        let mut file_name = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                file_name.push(char::from(byte));
            } else {
                let _ = write!(file_name, "%{byte:02X}");
            }
        }
        self.root.join(format!("{file_name}.json"))
    }
}

impl CartStorage for FileStorage {
    fn load(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    fn save(&self, key: &str, value: &str) -> io::Result<()> {
        // Readers never observe a half-written record.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(tmp, path)
    }
}
