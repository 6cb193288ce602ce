//! A buffered file handle backend using positional reads (`pread`-style via
//! `FileExt`), so it is safe to share across threads without an internal
//! seek cursor racing between readers.

use std::fs::File;
#[cfg(unix)]
use std::os::unix::fs::FileExt;

use crate::backend::traits::{OmFileReaderBackend, OmFileWriterBackend};
use crate::errors::{OmFilesError, Result};

pub struct FileBackend {
    file: File,
    len: u64,
}

impl FileBackend {
    pub fn open(file: File) -> Result<Self> {
        let len = file.metadata()?.len();
        Ok(Self { file, len })
    }
}

impl OmFileReaderBackend for FileBackend {
    fn count(&self) -> u64 {
        self.len
    }

    fn needs_prefetch(&self) -> bool {
        false
    }

    fn prefetch(&self, _offset: u64, _count: u64) {}

    #[cfg(unix)]
    fn read(&self, offset: u64, count: u64) -> Result<Vec<u8>> {
        if offset + count > self.len {
            return Err(OmFilesError::OutOfBoundRead {
                offset,
                count,
                dimension: self.len,
            });
        }
        let mut buf = vec![0u8; count as usize];
        self.file.read_exact_at(&mut buf, offset)?;
        Ok(buf)
    }

    #[cfg(not(unix))]
    fn read(&self, offset: u64, count: u64) -> Result<Vec<u8>> {
        use std::io::{Read, Seek, SeekFrom};
        if offset + count > self.len {
            return Err(OmFilesError::OutOfBoundRead {
                offset,
                count,
                dimension: self.len,
            });
        }
        let mut file = self.file.try_clone()?;
        file.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; count as usize];
        file.read_exact(&mut buf)?;
        Ok(buf)
    }

    fn with_read<R>(&self, offset: u64, count: u64, f: impl FnOnce(&[u8]) -> R) -> Result<R> {
        let buf = self.read(offset, count)?;
        Ok(f(&buf))
    }
}

impl OmFileWriterBackend for &mut FileBackend {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        use std::io::Write;
        self.file.write_all(data)?;
        self.len += data.len() as u64;
        Ok(())
    }

    fn synchronize(&self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}
