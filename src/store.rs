//! Key-value persistence for snapshots and timestamps.

mod file;
mod qinglong;

pub use file::FileStore;
pub use qinglong::QinglongStore;

use crate::Result;

/// Single-writer-per-key string store.
///
/// Runs are serialized by the external scheduler, so implementations do no
/// locking across processes.
pub trait StateStore {
    /// `Ok(None)` when the key was never written.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Creates or overwrites `key`.
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// The backend picked from configuration.
pub enum Store {
    File(FileStore),
    Qinglong(QinglongStore),
}

impl StateStore for Store {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self {
            Self::File(s) => s.get(key).await,
            Self::Qinglong(s) => s.get(key).await,
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        match self {
            Self::File(s) => s.set(key, value).await,
            Self::Qinglong(s) => s.set(key, value).await,
        }
    }
}
