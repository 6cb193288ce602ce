use crate::backend::traits::{OmFileReaderBackend, OmFileWriterBackend};
use crate::errors::{OmFilesError, Result};

/// An in-memory byte buffer backend; supports both reading and writing, used
/// for tests and for building a file entirely in memory before handing it
/// to a real backend.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBackend {
    data: Vec<u8>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}

impl OmFileWriterBackend for InMemoryBackend {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.data.extend_from_slice(data);
        Ok(())
    }

    fn synchronize(&self) -> Result<()> {
        Ok(())
    }
}

impl OmFileReaderBackend for InMemoryBackend {
    fn count(&self) -> u64 {
        self.data.len() as u64
    }

    fn needs_prefetch(&self) -> bool {
        false
    }

    fn prefetch(&self, _offset: u64, _count: u64) {}

    fn read(&self, offset: u64, count: u64) -> Result<Vec<u8>> {
        let (offset, count) = (offset as usize, count as usize);
        if offset + count > self.data.len() {
            return Err(OmFilesError::OutOfBoundRead {
                offset: offset as u64,
                count: count as u64,
                dimension: self.data.len() as u64,
            });
        }
        Ok(self.data[offset..offset + count].to_vec())
    }

    fn with_read<R>(&self, offset: u64, count: u64, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        let (offset, count) = (offset as usize, count as usize);
        if offset + count > self.data.len() {
            return Err(OmFilesError::OutOfBoundRead {
                offset: offset as u64,
                count: count as u64,
                dimension: self.data.len() as u64,
            });
        }
        Ok(f(&self.data[offset..offset + count]))
    }
}
