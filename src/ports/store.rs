// ABOUTME: Persisted slot holding the next node port to hand out.
// ABOUTME: File-backed store under the XDG state directory plus an in-memory store.

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::StoreError;

/// State directory relative to $HOME when XDG_STATE_HOME is unset.
const STATE_DIR: &str = ".local/state";

const STATE_FILE: &str = "webdeploy/node_port";

/// A single integer slot. Last writer wins; no compare-and-swap.
pub trait CounterStore: Send + Sync {
    /// Returns `Ok(None)` when nothing has been persisted yet.
    fn read_counter(&self) -> Result<Option<u16>, StoreError>;

    fn write_counter(&self, value: u16) -> Result<(), StoreError>;
}

impl<T: CounterStore + ?Sized> CounterStore for Arc<T> {
    fn read_counter(&self) -> Result<Option<u16>, StoreError> {
        (**self).read_counter()
    }

    fn write_counter(&self, value: u16) -> Result<(), StoreError> {
        (**self).write_counter(value)
    }
}

/// Counter persisted as decimal text in a file.
#[derive(Debug, Clone)]
pub struct FileCounterStore {
    path: PathBuf,
}

impl FileCounterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `$XDG_STATE_HOME/webdeploy/node_port`, else `~/.local/state/webdeploy/node_port`.
    pub fn default_path() -> PathBuf {
        if let Some(dir) = std::env::var_os("XDG_STATE_HOME").filter(|d| !d.is_empty()) {
            return PathBuf::from(dir).join(STATE_FILE);
        }
        match std::env::var_os("HOME").filter(|d| !d.is_empty()) {
            Some(home) => PathBuf::from(home).join(STATE_DIR).join(STATE_FILE),
            None => PathBuf::from(".webdeploy").join("node_port"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, e: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            message: e.to_string(),
        }
    }
}

impl CounterStore for FileCounterStore {
    fn read_counter(&self) -> Result<Option<u16>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed
            .parse::<u16>()
            .map(Some)
            .map_err(|_| StoreError::Malformed(trimmed.to_string()))
    }

    fn write_counter(&self, value: u16) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        // Readers see either the old or the new value.
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, format!("{}\n", value)).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }
}

/// Process-local counter slot with a write journal and write-failure injection.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    value: Mutex<Option<u16>>,
    writes: Mutex<Vec<u16>>,
    fail_writes: Mutex<bool>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: u16) -> Self {
        Self {
            value: Mutex::new(Some(value)),
            ..Self::default()
        }
    }

    pub fn value(&self) -> Option<u16> {
        *self.value.lock()
    }

    /// Every value written, oldest first.
    pub fn writes(&self) -> Vec<u16> {
        self.writes.lock().clone()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }
}

impl CounterStore for MemoryCounterStore {
    fn read_counter(&self) -> Result<Option<u16>, StoreError> {
        Ok(*self.value.lock())
    }

    fn write_counter(&self, value: u16) -> Result<(), StoreError> {
        if *self.fail_writes.lock() {
            return Err(StoreError::Io {
                path: "<memory>".to_string(),
                message: "write rejected".to_string(),
            });
        }
        *self.value.lock() = Some(value);
        self.writes.lock().push(value);
        Ok(())
    }
}
