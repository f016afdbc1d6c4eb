//! # Binary Content Sinks
//!
//! Content-addressed storage for the byte streams of non-RDF sources. Keys
//! are blake3 hex digests, so rewriting identical content is a no-op and a
//! rolled-back request can at worst leave an unreferenced blob behind.

use crate::types::LdpError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Sink for binary payloads, keyed by hex digest.
pub trait BinaryStore {
    fn persist(&mut self, digest: &str, bytes: &[u8]) -> Result<(), LdpError>;

    fn fetch(&self, digest: &str) -> Result<Option<Vec<u8>>, LdpError>;
}

/// Volatile binary sink.
#[derive(Debug, Default, Clone)]
pub struct MemoryBinaryStore {
    blobs: BTreeMap<String, Vec<u8>>,
}

impl MemoryBinaryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl BinaryStore for MemoryBinaryStore {
    fn persist(&mut self, digest: &str, bytes: &[u8]) -> Result<(), LdpError> {
        self.blobs
            .entry(digest.to_string())
            .or_insert_with(|| bytes.to_vec());
        Ok(())
    }

    fn fetch(&self, digest: &str) -> Result<Option<Vec<u8>>, LdpError> {
        Ok(self.blobs.get(digest).cloned())
    }
}

/// Directory-backed binary sink: `<root>/<digest[0..2]>/<digest>`.
#[derive(Debug, Clone)]
pub struct DirBinaryStore {
    root: PathBuf,
}

impl DirBinaryStore {
    /// Open (creating if needed) a binary store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> Result<Self, LdpError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| LdpError::Storage(e.to_string()))?;
        Ok(Self { root })
    }

    fn path_for(&self, digest: &str) -> Result<PathBuf, LdpError> {
        if digest.len() < 3 || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(LdpError::Storage(format!("malformed digest: {digest}")));
        }
        Ok(self.root.join(&digest[..2]).join(digest))
    }
}

impl BinaryStore for DirBinaryStore {
    fn persist(&mut self, digest: &str, bytes: &[u8]) -> Result<(), LdpError> {
        let path = self.path_for(digest)?;
        if path.exists() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| LdpError::Storage(e.to_string()))?;
        }
        fs::write(&path, bytes).map_err(|e| LdpError::Storage(e.to_string()))
    }

    fn fetch(&self, digest: &str) -> Result<Option<Vec<u8>>, LdpError> {
        let path = self.path_for(digest)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LdpError::Storage(e.to_string())),
        }
    }
}
