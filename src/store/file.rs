use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::PathBuf,
};

use serde_json::Value;

use super::StateStore;
use crate::{Error, Result};

type Entries = BTreeMap<String, Value>;

/// A JSON object on disk, one string value per key.
///
/// A missing file is an empty store. Writes go to a sibling temporary file
/// that is renamed over the original.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[cfg(test)]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    async fn load(&self) -> Result<Entries> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Entries::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Entries::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl StateStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.load().await?.remove(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(Error::malformed(
                "cache file",
                format!("{key} holds {other}, not a string"),
            )),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = match self.load().await {
            Err(Error::Json(e)) => {
                tracing::warn!(target: "store", "{} is corrupt, rewriting from scratch: {e}", self.path.display());
                Entries::new()
            }
            loaded => loaded?,
        };
        entries.insert(key.to_owned(), Value::String(value.to_owned()));

        let bytes = serde_json::to_vec_pretty(&entries)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!(target: "store", "{key} written to {}", self.path.display());
        Ok(())
    }
}
