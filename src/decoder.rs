//! Read-side array codec: resolves a requested sub-cube into the minimal
//! set of chunks that intersect it, fetches only the LUT groups and chunk
//! byte ranges those chunks actually need (coalescing backend reads through
//! the planner), decompresses each chunk, and scatters the decoded values
//! into the caller's output buffer.

use std::collections::{BTreeSet, HashMap};
use std::ops::Range;

use crate::array_codec::ArrayCodec;
use crate::backend::traits::OmFileReaderBackend;
use crate::compression::CompressionType;
use crate::defaults::LUT_CHUNK_ELEMENT_COUNT;
use crate::dimensions::Dimensions;
use crate::errors::{OmFilesError, Result};
use crate::lut::CompressedLut;
use crate::planner::{groups_for_chunk_range, plan_reads};
use crate::traversal::{chunk_bounds, for_each_run, linear_offset, ravel_chunk_index};
use crate::utils::{add_range, divide_range};

pub struct Decoder<T: ArrayCodec> {
    dims: Dimensions,
    compression: CompressionType,
    scale_factor: f32,
    add_offset: f32,
    /// Absolute byte offset of the compressed (or, for a legacy file, raw)
    /// LUT within the backend.
    lut_offset: u64,
    lut_size: u64,
    /// `true` for a legacy-header array, whose LUT is a plain table of
    /// absolute `u64` offsets rather than the grouped, PForDelta-packed form.
    lut_is_raw: bool,
    _marker: std::marker::PhantomData<T>,
}

impl<T: ArrayCodec> Decoder<T> {
    pub fn new(
        dims: Dimensions,
        compression: CompressionType,
        scale_factor: f32,
        add_offset: f32,
        lut_offset: u64,
        lut_size: u64,
        lut_is_raw: bool,
    ) -> Result<Self> {
        T::bytes_per_element_stored(compression)?;
        if lut_is_raw {
            let expected = (dims.total_chunks() + 1) * 8;
            if lut_size != expected {
                return Err(OmFilesError::InvalidArgument(format!(
                    "raw lut has {} bytes, expected {}",
                    lut_size, expected
                )));
            }
        }
        Ok(Self {
            dims,
            compression,
            scale_factor,
            add_offset,
            lut_offset,
            lut_size,
            lut_is_raw,
            _marker: std::marker::PhantomData,
        })
    }

    pub fn dims(&self) -> &Dimensions {
        &self.dims
    }

    fn lut_len(&self) -> usize {
        (self.dims.total_chunks() + 1) as usize
    }

    /// Every chunk whose nominal extent overlaps `[offset, offset+count)`,
    /// found by intersecting the per-axis chunk-index ranges directly
    /// rather than scanning every chunk in the array.
    fn chunks_intersecting(&self, offset: &[u64], count: &[u64]) -> Vec<u64> {
        let rank = self.dims.rank();
        let chunks_per_axis = self.dims.chunks_per_axis();
        let axis_ranges: Vec<Range<u64>> = (0..rank)
            .map(|i| divide_range(&(offset[i]..offset[i] + count[i]), self.dims.chunks[i]))
            .collect();

        let mut result = Vec::new();
        let mut coord: Vec<u64> = axis_ranges.iter().map(|r| r.start).collect();
        loop {
            result.push(ravel_chunk_index(&coord, &chunks_per_axis));
            let mut axis = rank;
            loop {
                if axis == 0 {
                    return result;
                }
                axis -= 1;
                coord[axis] += 1;
                if coord[axis] < axis_ranges[axis].end {
                    break;
                }
                coord[axis] = axis_ranges[axis].start;
                if axis == 0 {
                    return result;
                }
            }
        }
    }

    /// Resolve `[start, end)` byte offsets for each chunk index in `chunks`,
    /// fetching only the LUT groups (or, for a raw legacy LUT, the entry
    /// pairs) those chunks actually need rather than the whole table.
    fn fetch_lut_entries<Backend: OmFileReaderBackend>(
        &self,
        backend: &Backend,
        chunks: &[u64],
    ) -> Result<HashMap<u64, (u64, u64)>> {
        if self.lut_is_raw {
            let reads = plan_reads(chunks.iter().map(|&k| {
                let local = (k * 8)..((k + 2) * 8);
                (k, add_range(&local, self.lut_offset))
            }));
            let mut entries = HashMap::with_capacity(chunks.len());
            for planned in reads {
                let bytes = backend.read(
                    planned.byte_range.start,
                    planned.byte_range.end - planned.byte_range.start,
                )?;
                let base = planned.byte_range.start;
                for &k in &planned.items {
                    let local = add_range(&(k * 8..(k + 2) * 8), self.lut_offset);
                    let lo = (local.start - base) as usize;
                    let hi = (local.start + 8 - base) as usize;
                    let start = u64::from_le_bytes(bytes[lo..lo + 8].try_into().unwrap());
                    let end = u64::from_le_bytes(bytes[hi..hi + 8].try_into().unwrap());
                    entries.insert(k, (start, end));
                }
            }
            return Ok(entries);
        }

        let lut_len = self.lut_len();
        let group_count = (lut_len + LUT_CHUNK_ELEMENT_COUNT as usize - 1)
            / LUT_CHUNK_ELEMENT_COUNT as usize;
        let group_stride = if group_count > 0 {
            self.lut_size as usize / group_count
        } else {
            0
        };
        let meta = CompressedLut {
            bytes: Vec::new(),
            group_stride,
            lut_len,
        };

        let mut needed_groups: BTreeSet<u64> = BTreeSet::new();
        for &k in chunks {
            for g in groups_for_chunk_range(k..k + 2) {
                needed_groups.insert(g);
            }
        }

        let reads = plan_reads(needed_groups.iter().map(|&g| {
            let local = meta.group_byte_range(g as usize);
            (g, add_range(&(local.start as u64..local.end as u64), self.lut_offset))
        }));

        let mut decoded_groups: HashMap<u64, Vec<u64>> = HashMap::new();
        for planned in reads {
            let bytes = backend.read(
                planned.byte_range.start,
                planned.byte_range.end - planned.byte_range.start,
            )?;
            let base = planned.byte_range.start;
            for &g in &planned.items {
                let local = meta.group_byte_range(g as usize);
                let abs = add_range(&(local.start as u64..local.end as u64), self.lut_offset);
                let lo = (abs.start - base) as usize;
                let hi = (abs.end - base) as usize;
                decoded_groups.insert(g, meta.decode_group(&bytes[lo..hi], g as usize));
            }
        }

        let entry_value = |entry_index: u64| -> u64 {
            let group = entry_index / LUT_CHUNK_ELEMENT_COUNT;
            let offset_in_group = (entry_index % LUT_CHUNK_ELEMENT_COUNT) as usize;
            decoded_groups[&group][offset_in_group]
        };

        let mut entries = HashMap::with_capacity(chunks.len());
        for &k in chunks {
            entries.insert(k, (entry_value(k), entry_value(k + 1)));
        }
        Ok(entries)
    }

    /// Fetch and decode `[offset, offset+count)` into `out`, a dense
    /// row-major buffer shaped `count`.
    pub fn read_into<Backend: OmFileReaderBackend>(
        &self,
        backend: &Backend,
        offset: &[u64],
        count: &[u64],
        out: &mut [T],
    ) -> Result<()> {
        self.dims.check_read_range(offset, count)?;
        if count.iter().product::<u64>() as usize != out.len() {
            return Err(OmFilesError::InvalidArgument(
                "output buffer does not match requested element count".to_string(),
            ));
        }

        let chunks = self.chunks_intersecting(offset, count);
        let lut_entries = self.fetch_lut_entries(backend, &chunks)?;
        let reads = plan_reads(
            chunks
                .iter()
                .map(|&k| (k, lut_entries[&k].0..lut_entries[&k].1)),
        );

        for planned in reads {
            let bytes = backend.read(
                planned.byte_range.start,
                planned.byte_range.end - planned.byte_range.start,
            )?;
            let base = planned.byte_range.start;
            for &chunk_index in &planned.items {
                let (start, end) = lut_entries[&chunk_index];
                let lo = (start - base) as usize;
                let hi = (end - base) as usize;
                self.decode_chunk_into(chunk_index, &bytes[lo..hi], offset, count, out)?;
            }
        }
        Ok(())
    }

    fn decode_chunk_into(
        &self,
        chunk_index: u64,
        compressed: &[u8],
        region_offset: &[u64],
        region_count: &[u64],
        out: &mut [T],
    ) -> Result<()> {
        let (start, end) = chunk_bounds(&self.dims, chunk_index);
        let actual_shape: Vec<u64> = start.iter().zip(end.iter()).map(|(s, e)| e - s).collect();
        let n_elements = actual_shape.iter().product::<u64>() as usize;
        let rank = actual_shape.len();
        let cols = actual_shape[rank - 1] as usize;
        let rows = n_elements / cols.max(1);

        let mut scratch = vec![T::default(); n_elements];
        let consumed = T::decode_chunk(
            self.compression,
            self.scale_factor,
            self.add_offset,
            compressed,
            compressed.len(),
            rows,
            cols,
            &mut scratch,
        )?;
        if consumed != compressed.len() {
            return Err(OmFilesError::DeflatedSizeMismatch {
                expected: compressed.len() as u64,
                actual: consumed as u64,
            });
        }

        for_each_run(&self.dims, chunk_index, region_offset, region_count, |run| {
            let chunk_pos = linear_offset(&run.chunk_local, &actual_shape) as usize;
            let dst_pos = linear_offset(&run.region_local, region_count) as usize;
            out[dst_pos..dst_pos + run.len as usize]
                .copy_from_slice(&scratch[chunk_pos..chunk_pos + run.len as usize]);
        });
        Ok(())
    }
}
