//! Write-side array codec: chunks one array variable's data, filters and
//! entropy-codes each chunk as it becomes fully available, and maintains the
//! per-chunk LUT of absolute byte offsets (`spec.md` §4.1).

use crate::array_codec::ArrayCodec;
use crate::backend::traits::OmFileWriterBackend;
use crate::buffered_writer::BufferedWriter;
use crate::compression::CompressionType;
use crate::dimensions::Dimensions;
use crate::errors::{OmFilesError, Result};
use crate::traversal::{chunk_bounds, for_each_run, linear_offset};

pub struct ArrayEncoder<T: ArrayCodec> {
    dims: Dimensions,
    compression: CompressionType,
    scale_factor: f32,
    add_offset: f32,

    /// Linear index (ravel order) of the chunk currently being gathered.
    chunk_index: u64,
    /// Position along axis 0 of the next element this encoder expects.
    axis0_cursor: u64,

    scratch: Vec<T>,
    scratch_filled: u64,

    /// Absolute byte offsets, `lut[k]` = start of chunk `k`; `lut.last()` is
    /// the current write cursor once chunk `k-1` has been flushed.
    lut: Vec<u64>,
}

impl<T: ArrayCodec> ArrayEncoder<T> {
    pub fn new(
        dims: Dimensions,
        compression: CompressionType,
        scale_factor: f32,
        add_offset: f32,
        stream_start_offset: u64,
    ) -> Result<Self> {
        T::bytes_per_element_stored(compression)?; // validates the (type, compression) pair
        let elements_per_chunk = dims.elements_per_chunk() as usize;
        Ok(Self {
            dims,
            compression,
            scale_factor,
            add_offset,
            chunk_index: 0,
            axis0_cursor: 0,
            scratch: vec![T::default(); elements_per_chunk],
            scratch_filled: 0,
            lut: vec![stream_start_offset],
        })
    }

    pub fn total_chunks(&self) -> u64 {
        self.dims.total_chunks()
    }

    /// Upper bound, in bytes, on one chunk's compressed size.
    pub fn compressed_chunk_bound(&self) -> Result<usize> {
        T::compressed_bound(self.compression, self.dims.elements_per_chunk() as usize)
    }

    fn chunk_element_count(&self, chunk_index: u64) -> u64 {
        let (start, end) = chunk_bounds(&self.dims, chunk_index);
        start
            .iter()
            .zip(end.iter())
            .map(|(s, e)| e - s)
            .product()
    }

    /// Feed one slab of new data, shaped `cube_dims`, of which the region
    /// `[cube_offset, cube_offset+cube_count)` is the payload. Writers
    /// stream along axis 0: `cube_count[1..]` must equal the array's full
    /// extent on every other axis, and successive calls must cover
    /// contiguous, increasing ranges of axis 0 starting at 0 — the same
    /// contract the teacher's rank-2 writer enforces, generalized to rank
    /// `n`.
    pub fn write_data<Backend: OmFileWriterBackend>(
        &mut self,
        writer: &mut BufferedWriter<Backend>,
        cube: &[T],
        cube_dims: &[u64],
        cube_offset: &[u64],
        cube_count: &[u64],
    ) -> Result<()> {
        let rank = self.dims.rank();
        if cube_dims.len() != rank || cube_offset.len() != rank || cube_count.len() != rank {
            return Err(OmFilesError::MismatchingCubeDimensionLength {
                got: cube_count.len(),
                expected: rank,
            });
        }
        for i in 1..rank {
            if cube_count[i] != self.dims.dimensions[i] {
                return Err(OmFilesError::InvalidArgument(format!(
                    "streaming writes must supply the full extent on axis {}",
                    i
                )));
            }
        }

        let mut global_offset = vec![0u64; rank];
        global_offset[0] = self.axis0_cursor;
        let global_count = cube_count.to_vec();

        self.axis0_cursor += cube_count[0];

        while self.chunk_index < self.total_chunks() {
            let (chunk_start, _) = chunk_bounds(&self.dims, self.chunk_index);
            if chunk_start[0] >= global_offset[0] + global_count[0] {
                break;
            }

            let actual_shape: Vec<u64> = {
                let (s, e) = chunk_bounds(&self.dims, self.chunk_index);
                s.iter().zip(e.iter()).map(|(s, e)| e - s).collect()
            };

            for_each_run(&self.dims, self.chunk_index, &global_offset, &global_count, |run| {
                let chunk_pos = linear_offset(&run.chunk_local, &actual_shape) as usize;
                let src_pos =
                    linear_offset(&add_offsets(&cube_offset, &run.region_local), cube_dims)
                        as usize;
                self.scratch[chunk_pos..chunk_pos + run.len as usize]
                    .copy_from_slice(&cube[src_pos..src_pos + run.len as usize]);
                self.scratch_filled += run.len;
            });

            let needed = self.chunk_element_count(self.chunk_index);
            if self.scratch_filled < needed {
                // This chunk straddles the boundary with the next write_data
                // call; stop here and let that call finish it.
                break;
            }
            self.flush_current_chunk(writer, &actual_shape)?;
        }

        Ok(())
    }

    fn flush_current_chunk<Backend: OmFileWriterBackend>(
        &mut self,
        writer: &mut BufferedWriter<Backend>,
        actual_shape: &[u64],
    ) -> Result<()> {
        let rank = actual_shape.len();
        let cols = actual_shape[rank - 1] as usize;
        let rows = (actual_shape.iter().product::<u64>() / actual_shape[rank - 1].max(1)) as usize;
        let n_elements = actual_shape.iter().product::<u64>() as usize;

        let bound = self.compressed_chunk_bound()?;
        writer.reallocate(bound)?;
        let written = T::encode_chunk(
            self.compression,
            self.scale_factor,
            self.add_offset,
            &self.scratch[..n_elements],
            rows,
            cols,
            writer.buffer_at_write_position(),
        )?;
        writer.increment_write_position(written);

        self.lut.push(*self.lut.last().unwrap() + written as u64);
        self.scratch_filled = 0;
        self.chunk_index += 1;
        Ok(())
    }

    /// Finish the write session: the LUT so far (`total_chunks + 1`
    /// entries once every chunk has been written) and the stream offset of
    /// the end of the compressed chunk data.
    pub fn finalise(self) -> Result<FinalisedArray> {
        if self.chunk_index != self.total_chunks() {
            return Err(OmFilesError::InvalidArgument(format!(
                "array finalised with {} of {} chunks written",
                self.chunk_index,
                self.total_chunks()
            )));
        }
        Ok(FinalisedArray {
            dims: self.dims,
            compression: self.compression,
            scale_factor: self.scale_factor,
            add_offset: self.add_offset,
            lut: self.lut,
        })
    }
}

fn add_offsets(a: &[u64], b: &[u64]) -> Vec<u64> {
    a.iter().zip(b.iter()).map(|(x, y)| x + y).collect()
}

/// Everything needed to emit the array's container record and compressed
/// LUT once every chunk has been written.
pub struct FinalisedArray {
    pub dims: Dimensions,
    pub compression: CompressionType,
    pub scale_factor: f32,
    pub add_offset: f32,
    /// `total_chunks + 1` monotonically non-decreasing absolute byte offsets.
    pub lut: Vec<u64>,
}
