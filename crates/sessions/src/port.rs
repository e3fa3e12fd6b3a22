//! Persistence port — the single key-value slot the session store lives in.
//!
//! The store never touches a storage medium directly; it reads and writes one
//! serialized blob through a [`PersistencePort`].  [`FilePort`] keeps the blob
//! in `<state_dir>/chatSessions.json`; [`MemoryPort`] keeps it in process.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use parley_domain::error::{Error, Result};

/// Fixed key under which the whole session collection is stored.
pub const STORAGE_KEY: &str = "chatSessions";

/// Read/write access to the stored session blob.
///
/// `read` returns `Ok(None)` when nothing has been written yet.
pub trait PersistencePort: Send + Sync {
    fn read(&self) -> Result<Option<String>>;
    fn write(&self, blob: &str) -> Result<()>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-memory port
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Process-local port.  Counts writes so callers can assert that an
/// operation did not touch storage.
#[derive(Default)]
pub struct MemoryPort {
    blob: RwLock<Option<String>>,
    writes: AtomicUsize,
}

impl MemoryPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing blob (which need not be valid JSON).
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            blob: RwLock::new(Some(blob.into())),
            writes: AtomicUsize::new(0),
        }
    }

    /// Number of successful `write` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Option<String> {
        self.blob.read().clone()
    }
}

impl PersistencePort for MemoryPort {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.blob.read().clone())
    }

    fn write(&self, blob: &str) -> Result<()> {
        *self.blob.write() = Some(blob.to_owned());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// File-backed port
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Stores the blob in `<state_dir>/chatSessions.json`.
///
/// Writes go to a temp file in the same directory which is then renamed over
/// the target, so a crash mid-write leaves the previous collection intact.
pub struct FilePort {
    dir: PathBuf,
    path: PathBuf,
}

impl FilePort {
    /// Open (creating the directory if needed) the port rooted at `state_dir`.
    pub fn open(state_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(state_dir).map_err(Error::Io)?;
        let path = state_dir.join(format!("{STORAGE_KEY}.json"));

        tracing::debug!(path = %path.display(), "session file port opened");

        Ok(Self {
            dir: state_dir.to_path_buf(),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PersistencePort for FilePort {
    fn read(&self) -> Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn write(&self, blob: &str) -> Result<()> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(Error::Io)?;
        tmp.write_all(blob.as_bytes()).map_err(Error::Io)?;
        tmp.as_file().sync_all().map_err(Error::Io)?;
        tmp.persist(&self.path)
            .map_err(|e| Error::Storage(format!("persisting {}: {e}", self.path.display())))?;
        Ok(())
    }
}
