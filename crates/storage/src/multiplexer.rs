//! Lazily opened, run-scoped sink cache.

use std::collections::HashMap;
use std::io::Write;

use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};
use crate::key::OutputKey;
use crate::sink::SinkOpener;

/// Multiplexer statistics.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MultiplexerStats {
    /// Sinks opened since creation
    pub opened: u64,
    /// Lookups answered by an already open sink
    pub reused: u64,
    /// Sinks closed by `close_all`
    pub closed: u64,
}

/// Maps output keys to open sinks.
///
/// A sink is opened the first time its key is requested and stays open
/// until [`close_all`](Self::close_all). Writes to one key land in the
/// order they are issued. If the multiplexer is dropped with sinks still
/// open they are flushed and closed, and the failure to call `close_all`
/// is logged.
pub struct OutputMultiplexer<O: SinkOpener> {
    opener: O,
    sinks: HashMap<String, O::Sink>,
    /// Sink names in opening order
    order: Vec<String>,
    stats: MultiplexerStats,
}

impl<O: SinkOpener> OutputMultiplexer<O> {
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            sinks: HashMap::new(),
            order: Vec::new(),
            stats: MultiplexerStats::default(),
        }
    }

    /// Return the open sink for `key`, opening it on first use.
    pub fn get(&mut self, key: &OutputKey) -> StorageResult<&mut O::Sink> {
        let name = key.name();

        if self.sinks.contains_key(&name) {
            self.stats.reused += 1;
        } else {
            let sink = self.opener.open(&name).map_err(|source| StorageError::Open {
                name: name.clone(),
                source,
            })?;
            debug!(sink = %name, "Opened output sink");
            self.sinks.insert(name.clone(), sink);
            self.order.push(name.clone());
            self.stats.opened += 1;
        }

        self.sinks
            .get_mut(&name)
            .ok_or(StorageError::NotOpen(name))
    }

    /// Number of currently open sinks.
    pub fn open_count(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_open(&self, key: &OutputKey) -> bool {
        self.sinks.contains_key(&key.name())
    }

    pub fn stats(&self) -> MultiplexerStats {
        self.stats
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Flush and close every open sink, then clear the cache.
    ///
    /// Every sink is closed even when an earlier one fails; the first
    /// failure is returned.
    pub fn close_all(&mut self) -> StorageResult<()> {
        let mut first_error = None;
        let count = self.order.len();

        for name in self.order.drain(..) {
            let Some(mut sink) = self.sinks.remove(&name) else {
                continue;
            };
            if let Err(source) = sink.flush() {
                warn!(sink = %name, error = %source, "Failed to flush output sink");
                if first_error.is_none() {
                    first_error = Some(StorageError::Close { name, source });
                }
            }
            self.stats.closed += 1;
        }

        if count > 0 {
            info!(sinks = count, "Closed output sinks");
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<O: SinkOpener> Drop for OutputMultiplexer<O> {
    fn drop(&mut self) {
        if !self.sinks.is_empty() {
            warn!(
                sinks = self.sinks.len(),
                "Output multiplexer dropped with open sinks; closing them"
            );
            let _ = self.close_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySinkOpener;
    use chrono::{TimeZone, Utc};
    use std::io;

    fn key(prefix: &str, hour: u32) -> OutputKey {
        OutputKey::new(prefix, Utc.with_ymd_and_hms(2015, 1, 1, hour, 0, 0).unwrap())
    }

    #[test]
    fn test_reuses_open_sink() {
        let opener = MemorySinkOpener::new();
        let mut mux = OutputMultiplexer::new(opener.clone());

        mux.get(&key("FILE", 0)).unwrap().write_all(b"a").unwrap();
        mux.get(&key("FILE", 6)).unwrap().write_all(b"b").unwrap();
        mux.get(&key("FILE", 0)).unwrap().write_all(b"c").unwrap();

        assert_eq!(mux.open_count(), 2);
        assert_eq!(
            mux.stats(),
            MultiplexerStats {
                opened: 2,
                reused: 1,
                closed: 0
            }
        );
        assert_eq!(opener.contents("FILE:2015-01-01_00"), Some(b"ac".to_vec()));
        assert_eq!(opener.contents("FILE:2015-01-01_06"), Some(b"b".to_vec()));
    }

    #[test]
    fn test_close_all_clears() {
        let opener = MemorySinkOpener::new();
        let mut mux = OutputMultiplexer::new(opener.clone());
        mux.get(&key("FILE", 0)).unwrap();
        mux.get(&key("FILE", 12)).unwrap();
        assert_eq!(opener.open_count(), 2);

        mux.close_all().unwrap();
        assert_eq!(mux.open_count(), 0);
        assert_eq!(mux.stats().closed, 2);
        assert_eq!(opener.open_count(), 0);
    }

    #[test]
    fn test_drop_closes_sinks() {
        let opener = MemorySinkOpener::new();
        {
            let mut mux = OutputMultiplexer::new(opener.clone());
            mux.get(&key("FILE", 0)).unwrap();
        }
        assert_eq!(opener.open_count(), 0);
    }

    struct FailingOpener;

    impl SinkOpener for FailingOpener {
        type Sink = Vec<u8>;

        fn open(&mut self, _name: &str) -> io::Result<Self::Sink> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }
    }

    #[test]
    fn test_open_failure_names_sink() {
        let mut mux = OutputMultiplexer::new(FailingOpener);
        match mux.get(&key("FILE", 0)) {
            Err(StorageError::Open { name, .. }) => assert_eq!(name, "FILE:2015-01-01_00"),
            other => panic!("Expected Open error, got {:?}", other.map(|_| ())),
        }
        assert_eq!(mux.open_count(), 0);
    }

    struct UnflushableSink;

    impl Write for UnflushableSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::Other, "disk full"))
        }
    }

    struct UnflushableOpener;

    impl SinkOpener for UnflushableOpener {
        type Sink = UnflushableSink;

        fn open(&mut self, _name: &str) -> io::Result<Self::Sink> {
            Ok(UnflushableSink)
        }
    }

    #[test]
    fn test_close_failure_still_closes_everything() {
        let mut mux = OutputMultiplexer::new(UnflushableOpener);
        mux.get(&key("FILE", 0)).unwrap();
        mux.get(&key("FILE", 6)).unwrap();

        assert!(matches!(mux.close_all(), Err(StorageError::Close { .. })));
        assert_eq!(mux.open_count(), 0);
        assert_eq!(mux.stats().closed, 2);
    }
}
