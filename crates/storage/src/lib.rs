//! Output sink management.
//!
//! Every field written during a run goes to the sink named after its
//! [`OutputKey`]. The [`OutputMultiplexer`] opens sinks lazily, keeps them
//! open for the whole run and closes all of them exactly once.
//!
//! Sinks come from a [`SinkOpener`]: [`FileSinkOpener`] for real runs and
//! [`MemorySinkOpener`] for tests and dry runs.

pub mod error;
pub mod key;
pub mod multiplexer;
pub mod sink;

pub use error::{StorageError, StorageResult};
pub use key::OutputKey;
pub use multiplexer::{MultiplexerStats, OutputMultiplexer};
pub use sink::{FileSinkOpener, MemorySink, MemorySinkOpener, SinkOpener};
