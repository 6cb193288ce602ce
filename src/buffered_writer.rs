//! An append-only byte buffer standing between the encoder/container layer
//! and a write backend. Codecs write directly into
//! [`BufferedWriter::buffer_at_write_position`] without knowing whether a
//! flush will happen first; [`BufferedWriter::reallocate`] guarantees the
//! requested capacity is available before the caller touches the buffer.

use crate::backend::traits::OmFileWriterBackend;
use crate::errors::Result;
use crate::utils::padding_to_align;

pub struct BufferedWriter<Backend: OmFileWriterBackend> {
    buffer: Vec<u8>,
    pub backend: Backend,
    write_position: usize,
    total_bytes_written: u64,
    initial_capacity: usize,
}

impl<Backend: OmFileWriterBackend> BufferedWriter<Backend> {
    pub fn new(backend: Backend, initial_capacity: usize) -> Self {
        Self {
            buffer: vec![0; initial_capacity.max(64)],
            backend,
            write_position: 0,
            total_bytes_written: 0,
            initial_capacity: initial_capacity.max(64),
        }
    }

    /// Monotonic file offset of the next byte that will be written.
    pub fn total_bytes_written(&self) -> u64 {
        self.total_bytes_written
    }

    pub fn remaining_capacity(&self) -> usize {
        self.buffer.len() - self.write_position
    }

    /// A mutable view of the buffer starting at the current write cursor,
    /// for codecs that want to write their output directly rather than
    /// through an intermediate `Vec`.
    pub fn buffer_at_write_position(&mut self) -> &mut [u8] {
        &mut self.buffer[self.write_position..]
    }

    pub fn increment_write_position(&mut self, bytes: usize) {
        self.write_position += bytes;
        self.total_bytes_written += bytes as u64;
    }

    /// Ensure at least `minimum_capacity` bytes are available at the write
    /// cursor, flushing first if growing in place isn't enough.
    pub fn reallocate(&mut self, minimum_capacity: usize) -> Result<()> {
        if self.remaining_capacity() >= minimum_capacity {
            return Ok(());
        }
        self.flush()?;
        if self.buffer.len() >= minimum_capacity {
            return Ok(());
        }
        let growth = self.initial_capacity.max(minimum_capacity);
        let new_capacity = ((minimum_capacity + growth - 1) / growth) * growth;
        self.buffer.resize(new_capacity, 0);
        Ok(())
    }

    /// Zero-pad the write cursor up to the next multiple of `align` bytes
    /// of *total* file offset.
    pub fn align(&mut self, align: usize) -> Result<()> {
        let pad = padding_to_align(self.total_bytes_written as usize, align);
        if pad == 0 {
            return Ok(());
        }
        self.reallocate(pad)?;
        for b in &mut self.buffer[self.write_position..self.write_position + pad] {
            *b = 0;
        }
        self.increment_write_position(pad);
        Ok(())
    }

    /// Append `data` verbatim, growing/flushing as needed.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.reallocate(data.len())?;
        self.buffer[self.write_position..self.write_position + data.len()].copy_from_slice(data);
        self.increment_write_position(data.len());
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        if self.write_position == 0 {
            return Ok(());
        }
        self.backend.write(&self.buffer[..self.write_position])?;
        self.write_position = 0;
        Ok(())
    }

    pub fn finish(mut self) -> Result<Backend> {
        self.flush()?;
        self.backend.synchronize()?;
        Ok(self.backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::InMemoryBackend;

    #[test]
    fn write_and_align_track_total_bytes() {
        let mut w = BufferedWriter::new(InMemoryBackend::new(), 16);
        w.write(&[1, 2, 3]).unwrap();
        assert_eq!(w.total_bytes_written(), 3);
        w.align(8).unwrap();
        assert_eq!(w.total_bytes_written(), 8);
        w.align(8).unwrap();
        assert_eq!(w.total_bytes_written(), 8);
    }

    #[test]
    fn flush_moves_data_to_backend() {
        let mut w = BufferedWriter::new(InMemoryBackend::new(), 4);
        w.write(&[1, 2, 3, 4, 5]).unwrap();
        let backend = w.finish().unwrap();
        assert_eq!(backend.into_vec(), vec![1, 2, 3, 4, 5]);
    }
}
