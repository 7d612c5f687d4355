//! Sink openers.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

/// Opens a writable sink for a sink name.
pub trait SinkOpener {
    type Sink: Write;

    /// Open (creating or truncating) the sink called `name`.
    fn open(&mut self, name: &str) -> io::Result<Self::Sink>;
}

/// Opens buffered files; the sink name is used as the file path, relative
/// to an optional base directory.
#[derive(Debug, Clone, Default)]
pub struct FileSinkOpener {
    base_dir: Option<PathBuf>,
}

impl FileSinkOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(dir.into()),
        }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        match &self.base_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }
}

impl SinkOpener for FileSinkOpener {
    type Sink = BufWriter<File>;

    fn open(&mut self, name: &str) -> io::Result<Self::Sink> {
        let path = self.path_for(name);
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(&path)?;
        debug!(path = %path.display(), "Created output file");
        Ok(BufWriter::new(file))
    }
}

#[derive(Debug, Default)]
struct MemoryStore {
    contents: BTreeMap<String, Vec<u8>>,
    open: BTreeSet<String>,
}

/// Keeps sink contents in a shared in-memory map.
///
/// Clones share the same store, so a test can keep one handle and inspect
/// what a pipeline wrote through another.
#[derive(Debug, Clone, Default)]
pub struct MemorySinkOpener {
    store: Arc<Mutex<MemoryStore>>,
}

fn lock(store: &Mutex<MemoryStore>) -> io::Result<MutexGuard<'_, MemoryStore>> {
    store
        .lock()
        .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory sink store poisoned"))
}

impl MemorySinkOpener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written so far to the named sink.
    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.store.lock().ok()?.contents.get(name).cloned()
    }

    /// Names of every sink ever opened, sorted.
    pub fn names(&self) -> Vec<String> {
        self.store
            .lock()
            .map(|s| s.contents.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of sinks currently open.
    pub fn open_count(&self) -> usize {
        self.store.lock().map(|s| s.open.len()).unwrap_or(0)
    }
}

impl SinkOpener for MemorySinkOpener {
    type Sink = MemorySink;

    fn open(&mut self, name: &str) -> io::Result<Self::Sink> {
        let mut store = lock(&self.store)?;
        store.contents.insert(name.to_string(), Vec::new());
        store.open.insert(name.to_string());
        Ok(MemorySink {
            name: name.to_string(),
            store: Arc::clone(&self.store),
        })
    }
}

/// Handle to one in-memory sink; dropping it marks the sink closed.
#[derive(Debug)]
pub struct MemorySink {
    name: String,
    store: Arc<Mutex<MemoryStore>>,
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut store = lock(&self.store)?;
        store
            .contents
            .entry(self.name.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for MemorySink {
    fn drop(&mut self) {
        if let Ok(mut store) = self.store.lock() {
            store.open.remove(&self.name);
        }
    }
}
