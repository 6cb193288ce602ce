//! The backend capability set `spec.md` §6 treats as an external
//! collaborator. Everything above this layer (container, planner, encoder,
//! decoder) only ever calls through these two traits.

use crate::errors::Result;

pub trait OmFileReaderBackend {
    /// Total readable length in bytes.
    fn count(&self) -> u64;

    /// Whether `prefetch` is worth calling (false for in-memory backends).
    fn needs_prefetch(&self) -> bool;

    /// Advisory prefetch/prefault hint; may be a no-op.
    fn prefetch(&self, offset: u64, count: u64);

    /// Read `count` bytes starting at `offset`, returning an owned copy.
    /// `IoError`/`OutOfBoundRead` on failure.
    fn read(&self, offset: u64, count: u64) -> Result<Vec<u8>>;

    /// Scoped variant of `read` avoiding a copy where the backend can hand
    /// back a borrowed view (e.g. into a memory-mapped region).
    fn with_read<R>(&self, offset: u64, count: u64, f: impl FnOnce(&[u8]) -> R) -> Result<R>;
}

pub trait OmFileWriterBackend {
    fn write(&mut self, data: &[u8]) -> Result<()>;
    fn synchronize(&self) -> Result<()>;
}
