//! Top-level reader facade: opens a file (current tree format or legacy
//! single-array format), walks the variable tree, and drives
//! [`crate::decoder::Decoder`] for array reads. Mirrors the shape of the
//! teacher's `OmFileReader`/`OmFileReader2`, generalized to a tree of named
//! variables instead of a single rank-2 array with JSON-carried metadata.

use ndarray::ArrayD;

use crate::array_codec::ArrayCodec;
use crate::backend::traits::OmFileReaderBackend;
use crate::compression::CompressionType;
use crate::data_type::{DataType, OmFileScalarDataType};
use crate::decoder::Decoder;
use crate::dimensions::Dimensions;
use crate::errors::{OmFilesError, Result};
use crate::header::{self, Header, LegacyHeader};
use crate::trailer;
use crate::variable::{ArrayMeta, VariablePayload, VariableRecord};

pub struct Reader<Backend: OmFileReaderBackend> {
    backend: Backend,
    root: VariableRecord,
}

impl<Backend: OmFileReaderBackend> Reader<Backend> {
    pub fn open(backend: Backend) -> Result<Self> {
        let file_size = backend.count();
        if file_size < header::PREAMBLE_LENGTH as u64 {
            return Err(OmFilesError::NotAnOmFile);
        }
        let probe_len = file_size.min(header::LEGACY_HEADER_LENGTH as u64);
        let probe = backend.read(0, probe_len)?;

        let root = match header::read_header(&probe)? {
            Header::Legacy(legacy) => Self::synthesize_legacy_root(&legacy, &backend)?,
            Header::Current => Self::read_current_root(&backend, file_size)?,
        };
        Ok(Self { backend, root })
    }

    fn read_current_root(backend: &Backend, file_size: u64) -> Result<VariableRecord> {
        let tail_len = (trailer::TRAILER_LENGTH as u64).min(file_size);
        let tail = backend.read(file_size - tail_len, tail_len)?;
        let root_ptr = trailer::read_trailer(&tail)?;
        let bytes = backend.read(root_ptr.offset, root_ptr.size)?;
        VariableRecord::decode(&bytes)
    }

    /// A version-1/2 file is exactly one unnamed, childless 2-D `f32`
    /// array, with its LUT stored as a plain (uncompressed) table of
    /// absolute `u64` offsets directly after the header — this crate never
    /// writes that form, so there is no compressed-LUT byte layout to match.
    fn synthesize_legacy_root(legacy: &LegacyHeader, backend: &Backend) -> Result<VariableRecord> {
        let dims = Dimensions::new(vec![legacy.dim0, legacy.dim1], vec![legacy.chunk0, legacy.chunk1])?;
        let lut_offset = header::LEGACY_HEADER_LENGTH as u64;
        let lut_len = dims.total_chunks() + 1;
        let lut_size = lut_len * 8;
        let data_offset = lut_offset + lut_size;

        Ok(VariableRecord {
            name: "data".to_string(),
            payload: VariablePayload::Array(ArrayMeta {
                data_type: DataType::FloatArray,
                dimensions: dims.dimensions,
                chunks: dims.chunks,
                compression: legacy.compression,
                scale_factor: legacy.scale_factor,
                add_offset: 0.0,
                lut_offset,
                lut_size,
                data_offset,
                lut_is_raw: true,
            }),
            children: vec![],
        })
    }

    pub fn root(&self) -> Variable<'_, Backend> {
        Variable {
            backend: &self.backend,
            record: self.root.clone(),
        }
    }
}

/// A handle onto one node of the variable tree, borrowed from a [`Reader`].
pub struct Variable<'a, Backend: OmFileReaderBackend> {
    backend: &'a Backend,
    record: VariableRecord,
}

impl<'a, Backend: OmFileReaderBackend> Variable<'a, Backend> {
    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn is_array(&self) -> bool {
        matches!(self.record.payload, VariablePayload::Array(_))
    }

    pub fn children_count(&self) -> usize {
        self.record.children.len()
    }

    pub fn child(&self, index: usize) -> Result<Variable<'a, Backend>> {
        let ptr = self
            .record
            .children
            .get(index)
            .ok_or_else(|| OmFilesError::NoSuchChild(index.to_string()))?;
        let bytes = self.backend.read(ptr.offset, ptr.size)?;
        Ok(Variable {
            backend: self.backend,
            record: VariableRecord::decode(&bytes)?,
        })
    }

    pub fn child_by_name(&self, name: &str) -> Result<Variable<'a, Backend>> {
        for i in 0..self.children_count() {
            let child = self.child(i)?;
            if child.name() == name {
                return Ok(child);
            }
        }
        Err(OmFilesError::NoSuchChild(name.to_string()))
    }

    fn array_meta(&self) -> Result<&ArrayMeta> {
        match &self.record.payload {
            VariablePayload::Array(meta) => Ok(meta),
            VariablePayload::Scalar { .. } => Err(OmFilesError::NotAnArray),
        }
    }

    pub fn dimensions(&self) -> Result<&[u64]> {
        Ok(&self.array_meta()?.dimensions)
    }

    pub fn chunk_dimensions(&self) -> Result<&[u64]> {
        Ok(&self.array_meta()?.chunks)
    }

    pub fn compression(&self) -> Result<CompressionType> {
        Ok(self.array_meta()?.compression)
    }

    pub fn scale_factor(&self) -> Result<f32> {
        Ok(self.array_meta()?.scale_factor)
    }

    pub fn add_offset(&self) -> Result<f32> {
        Ok(self.array_meta()?.add_offset)
    }

    pub fn read_scalar<T: OmFileScalarDataType>(&self) -> Result<T> {
        match &self.record.payload {
            VariablePayload::Scalar { data_type, raw } if *data_type == T::DATA_TYPE_SCALAR => {
                Ok(T::from_raw_bytes(raw))
            }
            _ => Err(OmFilesError::NotAScalarOfType),
        }
    }

    fn open_decoder<T: ArrayCodec>(&self) -> Result<Decoder<T>> {
        let meta = self.array_meta()?;
        if meta.data_type != T::DATA_TYPE_ARRAY {
            return Err(OmFilesError::InvalidDataType);
        }
        let dims = Dimensions::new(meta.dimensions.clone(), meta.chunks.clone())?;
        Decoder::new(
            dims,
            meta.compression,
            meta.scale_factor,
            meta.add_offset,
            meta.lut_offset,
            meta.lut_size,
            meta.lut_is_raw,
        )
    }

    /// Read `[offset, offset+count)` into a freshly allocated, dense
    /// row-major buffer shaped `count`.
    pub fn read<T: ArrayCodec>(&self, offset: &[u64], count: &[u64]) -> Result<Vec<T>> {
        let decoder = self.open_decoder::<T>()?;
        let mut out = vec![T::default(); count.iter().product::<u64>() as usize];
        decoder.read_into(self.backend, offset, count, &mut out)?;
        Ok(out)
    }

    /// Read the entire array.
    pub fn read_full<T: ArrayCodec>(&self) -> Result<Vec<T>> {
        let dims = Dimensions::new(self.dimensions()?.to_vec(), self.chunk_dimensions()?.to_vec())?;
        let mut out = vec![T::default(); dims.total_elements() as usize];
        let offset = vec![0u64; dims.rank()];
        self.read_into(&offset, &dims.dimensions, &mut out)?;
        Ok(out)
    }

    /// Read `[offset, offset+count)` into an owned [`ndarray::ArrayD`], for
    /// callers that want shape-aware indexing rather than a flat buffer.
    pub fn read_ndarray<T: ArrayCodec>(&self, offset: &[u64], count: &[u64]) -> Result<ArrayD<T>> {
        let flat = self.read::<T>(offset, count)?;
        let shape: Vec<usize> = count.iter().map(|&c| c as usize).collect();
        ArrayD::from_shape_vec(shape, flat)
            .map_err(|e| OmFilesError::InvalidArgument(e.to_string()))
    }

    /// Read `[offset, offset+count)` directly into `out`, a dense
    /// row-major buffer shaped `count`, avoiding an extra allocation.
    pub fn read_into<T: ArrayCodec>(&self, offset: &[u64], count: &[u64], out: &mut [T]) -> Result<()> {
        let decoder = self.open_decoder::<T>()?;
        decoder.read_into(self.backend, offset, count, out)
    }

    /// Read `[offset, offset+count)` the same way as [`Variable::read`], but
    /// split across axis 0 and fanned out over a bounded pool of worker
    /// threads sized to `std::thread::available_parallelism()`. Each worker
    /// decodes a disjoint row range directly into its slice of `out`, so the
    /// result is bit-for-bit identical to the sequential read.
    pub fn read_concurrent<T: ArrayCodec>(&self, offset: &[u64], count: &[u64]) -> Result<Vec<T>>
    where
        Backend: Sync,
    {
        let mut out = vec![T::default(); count.iter().product::<u64>() as usize];
        self.read_concurrent_into(offset, count, &mut out)?;
        Ok(out)
    }

    /// Like [`Variable::read_concurrent`] but writes into a caller-supplied
    /// dense row-major buffer shaped `count`.
    pub fn read_concurrent_into<T: ArrayCodec>(
        &self,
        offset: &[u64],
        count: &[u64],
        out: &mut [T],
    ) -> Result<()>
    where
        Backend: Sync,
    {
        let decoder = self.open_decoder::<T>()?;
        if count.is_empty() || count[0] == 0 {
            return Ok(());
        }

        let worker_count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(count[0] as usize)
            .max(1);
        let rows_per_worker = (count[0] as usize + worker_count - 1) / worker_count;
        let row_stride = count[1..].iter().product::<u64>() as usize;

        let backend = self.backend;
        let decoder_ref = &decoder;
        std::thread::scope(|scope| -> Result<()> {
            let mut remaining: &mut [T] = out;
            let mut handles = Vec::with_capacity(worker_count);
            let mut row_start = 0usize;
            while row_start < count[0] as usize {
                let rows = rows_per_worker.min(count[0] as usize - row_start);
                let (this_slice, rest) = remaining.split_at_mut(rows * row_stride);
                remaining = rest;

                let mut sub_offset = offset.to_vec();
                sub_offset[0] += row_start as u64;
                let mut sub_count = count.to_vec();
                sub_count[0] = rows as u64;

                handles.push(scope.spawn(move || {
                    decoder_ref.read_into(backend, &sub_offset, &sub_count, this_slice)
                }));
                row_start += rows;
            }
            for handle in handles {
                handle.join().expect("decode worker panicked")?;
            }
            Ok(())
        })
    }

    /// Advise the backend it will soon need this array's LUT and data
    /// (mmap-backed readers prefetch; buffered-file readers no-op).
    pub fn will_need(&self) -> Result<()> {
        let meta = self.array_meta()?;
        if self.backend.needs_prefetch() {
            self.backend.prefetch(meta.lut_offset, meta.lut_size);
            let data_size = if meta.lut_is_raw {
                self.backend.count().saturating_sub(meta.data_offset)
            } else {
                meta.lut_offset.saturating_sub(meta.data_offset)
            };
            self.backend.prefetch(meta.data_offset, data_size);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::InMemoryBackend;
    use crate::encoder::ArrayEncoder;
    use crate::writer::Writer;

    #[test]
    fn round_trips_a_scalar_through_the_facade() {
        let backend = InMemoryBackend::new();
        let mut writer = Writer::new(backend, 256).unwrap();
        let root = writer.write_scalar("greeting", &"hello".to_string(), vec![]).unwrap();
        let backend = writer.finish(root).unwrap();

        let reader = Reader::open(backend).unwrap();
        let root = reader.root();
        assert_eq!(root.name(), "greeting");
        assert_eq!(root.read_scalar::<String>().unwrap(), "hello");
    }

    #[test]
    fn round_trips_an_array_with_two_scalar_children() {
        let backend = InMemoryBackend::new();
        let mut writer = Writer::new(backend, 4096).unwrap();

        let units = writer.write_scalar("units", &"celsius".to_string(), vec![]).unwrap();
        let source = writer.write_scalar("source", &"sensor-7".to_string(), vec![]).unwrap();

        let dims = Dimensions::new(vec![4, 4], vec![2, 2]).unwrap();
        let mut encoder: ArrayEncoder<f32> = writer
            .prepare_array(dims, CompressionType::FPXor2D, 1.0, 0.0)
            .unwrap();
        let data: Vec<f32> = (0..16).map(|i| i as f32 * 1.5).collect();
        {
            let raw = writer.raw_writer();
            encoder.write_data(raw, &data, &[4, 4], &[0, 0], &[4, 4]).unwrap();
        }
        let root_ptr = writer.finish_array("temperature", encoder, vec![units, source]).unwrap();
        let backend = writer.finish(root_ptr).unwrap();

        let reader = Reader::open(backend).unwrap();
        let root = reader.root();
        assert_eq!(root.name(), "temperature");
        assert_eq!(root.children_count(), 2);
        assert_eq!(root.child_by_name("units").unwrap().read_scalar::<String>().unwrap(), "celsius");
        assert_eq!(root.child_by_name("source").unwrap().read_scalar::<String>().unwrap(), "sensor-7");

        let read_back: Vec<f32> = root.read_full().unwrap();
        for (a, b) in data.iter().zip(read_back.iter()) {
            assert_eq!(a, b);
        }

        let cube = root.read_ndarray::<f32>(&[1, 1], &[2, 2]).unwrap();
        assert_eq!(cube.shape(), &[2, 2]);
        assert_eq!(cube[[0, 0]], data[(1 * 4 + 1) as usize]);
    }

    #[test]
    fn concurrent_read_matches_sequential_read() {
        let backend = InMemoryBackend::new();
        let mut writer = Writer::new(backend, 4096).unwrap();

        let dims = Dimensions::new(vec![20, 7], vec![3, 3]).unwrap();
        let mut encoder: ArrayEncoder<f32> = writer
            .prepare_array(dims, CompressionType::PForDelta2D, 1.0, 0.0)
            .unwrap();
        let data: Vec<f32> = (0..140).map(|i| i as f32).collect();
        {
            let raw = writer.raw_writer();
            encoder.write_data(raw, &data, &[20, 7], &[0, 0], &[20, 7]).unwrap();
        }
        let root_ptr = writer.finish_array("grid", encoder, vec![]).unwrap();
        let backend = writer.finish(root_ptr).unwrap();

        let reader = Reader::open(backend).unwrap();
        let root = reader.root();

        let sequential: Vec<f32> = root.read(&[2, 1], &[15, 5]).unwrap();
        let concurrent: Vec<f32> = root.read_concurrent(&[2, 1], &[15, 5]).unwrap();
        assert_eq!(sequential, concurrent);
    }

    #[test]
    fn reads_a_legacy_header_file() {
        // Build a minimal legacy-format file by hand: header, raw LUT, one chunk.
        let dims = Dimensions::new(vec![2, 2], vec![2, 2]).unwrap();
        let compression = CompressionType::PForDelta2DInt16;
        let mut encoder: ArrayEncoder<f32> =
            ArrayEncoder::new(dims, compression, 100.0, 0.0, 0).unwrap();
        let mut raw_writer = crate::buffered_writer::BufferedWriter::new(InMemoryBackend::new(), 256);
        let data = vec![1.0f32, 2.0, 3.0, 4.0];
        encoder
            .write_data(&mut raw_writer, &data, &[2, 2], &[0, 0], &[2, 2])
            .unwrap();
        let finalised = encoder.finalise().unwrap();
        let chunk_bytes_backend = raw_writer.finish().unwrap();
        let chunk_bytes = chunk_bytes_backend.into_vec();

        let mut file = vec![0u8; header::LEGACY_HEADER_LENGTH];
        file[0] = header::MAGIC_NUMBER_1;
        file[1] = header::MAGIC_NUMBER_2;
        file[2] = 2;
        file[3] = compression.to_u8();
        file[4..8].copy_from_slice(&100.0f32.to_le_bytes());
        file[8..16].copy_from_slice(&2u64.to_le_bytes());
        file[16..24].copy_from_slice(&2u64.to_le_bytes());
        file[24..32].copy_from_slice(&2u64.to_le_bytes());
        file[32..40].copy_from_slice(&2u64.to_le_bytes());
        let data_offset =
            header::LEGACY_HEADER_LENGTH as u64 + (finalised.lut.len() as u64 * 8);
        for offset in &finalised.lut {
            file.extend_from_slice(&(offset + data_offset).to_le_bytes());
        }
        file.extend_from_slice(&chunk_bytes);

        let reader = Reader::open(InMemoryBackend::from_vec(file)).unwrap();
        let root = reader.root();
        assert_eq!(root.dimensions().unwrap(), &[2, 2]);
        let read_back: Vec<f32> = root.read_full().unwrap();
        for (a, b) in data.iter().zip(read_back.iter()) {
            assert!((a - b).abs() < 0.01);
        }
    }
}
