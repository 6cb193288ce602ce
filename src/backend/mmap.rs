use memmap2::{Advice, Mmap};
use std::fs::File;

use crate::backend::traits::OmFileReaderBackend;
use crate::errors::{OmFilesError, Result};

/// A read-only memory-mapped file backend. `prefetch` advises the kernel via
/// `madvise(WILLNEED)` on the requested, page-aligned range.
pub struct MmapBackend {
    mmap: Mmap,
}

impl MmapBackend {
    pub fn open(file: &File) -> Result<Self> {
        let mmap = unsafe { Mmap::map(file) }?;
        Ok(Self { mmap })
    }
}

impl OmFileReaderBackend for MmapBackend {
    fn count(&self) -> u64 {
        self.mmap.len() as u64
    }

    fn needs_prefetch(&self) -> bool {
        true
    }

    fn prefetch(&self, offset: u64, count: u64) {
        let _ = self
            .mmap
            .advise_range(Advice::WillNeed, offset as usize, count as usize);
    }

    fn read(&self, offset: u64, count: u64) -> Result<Vec<u8>> {
        self.with_read(offset, count, |s| s.to_vec())
    }

    fn with_read<R>(&self, offset: u64, count: u64, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        let (offset, count) = (offset as usize, count as usize);
        if offset + count > self.mmap.len() {
            return Err(OmFilesError::OutOfBoundRead {
                offset: offset as u64,
                count: count as u64,
                dimension: self.mmap.len() as u64,
            });
        }
        Ok(f(&self.mmap[offset..offset + count]))
    }
}
