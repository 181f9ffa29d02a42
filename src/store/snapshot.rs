use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fs;
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, warn};

/// Bumped whenever a persisted payload changes shape.
pub const SNAPSHOT_VERSION: u32 = 2;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to replace snapshot: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Result of reading a snapshot file.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded<T> {
    Found(T),
    /// No readable file at the path.
    Missing,
    /// The file existed but did not decode; it has been deleted.
    Corrupt,
}

impl<T> Loaded<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Loaded::Found(value) => Some(value),
            Loaded::Missing | Loaded::Corrupt => None,
        }
    }
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    format: &'a str,
    version: u32,
    payload: &'a T,
}

#[derive(Deserialize)]
struct Envelope<T> {
    format: String,
    version: u32,
    payload: T,
}

/// A single value persisted to one file, tagged with a format name and version.
///
/// Writes land in a temporary sibling file that is renamed over the target, so a
/// reader sees either the previous snapshot or the new one.
pub struct SnapshotFile<T> {
    path: PathBuf,
    format: &'static str,
    _marker: PhantomData<T>,
}

impl<T> SnapshotFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>, format: &'static str) -> Self {
        Self {
            path: path.into(),
            format,
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Loaded<T> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No snapshot at {}", self.path.display());
                return Loaded::Missing;
            }
            Err(e) => {
                warn!("Cannot read snapshot {}: {}", self.path.display(), e);
                return Loaded::Missing;
            }
        };

        match self.decode(&bytes) {
            Ok(value) => {
                debug!("Loaded snapshot from {}", self.path.display());
                Loaded::Found(value)
            }
            Err(reason) => {
                warn!(
                    "Discarding corrupt snapshot {}: {}",
                    self.path.display(),
                    reason
                );
                self.remove();
                Loaded::Corrupt
            }
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<T, String> {
        let envelope: Envelope<T> = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        if envelope.format != self.format {
            return Err(format!(
                "expected format '{}', found '{}'",
                self.format, envelope.format
            ));
        }
        if envelope.version != SNAPSHOT_VERSION {
            return Err(format!(
                "expected version {}, found {}",
                SNAPSHOT_VERSION, envelope.version
            ));
        }
        Ok(envelope.payload)
    }

    pub fn store(&self, value: &T) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let bytes = serde_json::to_vec(&EnvelopeRef {
            format: self.format,
            version: SNAPSHOT_VERSION,
            payload: value,
        })?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)?;
        debug!("Stored snapshot to {}", self.path.display());
        Ok(())
    }

    pub fn remove(&self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                warn!("Failed to delete {}: {}", self.path.display(), e);
            }
        }
    }
}
