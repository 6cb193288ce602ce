//! The mixed-base chunk traversal shared by the encoder and the decoder.
//!
//! Both sides need to answer the same question: "which elements of chunk
//! `chunk_index` fall inside this read/write region, and what is the
//! longest linear run along the fastest axis at each position?" This is the
//! only correct way to interleave partial edge chunks, chunks smaller than
//! the caller's cube, and requests spanning multiple chunks, so it is
//! implemented once and shared.

use crate::dimensions::Dimensions;

/// One maximal contiguous run produced by [`for_each_run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    /// Coordinate of the run's first element, relative to the chunk's own
    /// origin (i.e. in `0..chunk_shape[i]`). Used to address the chunk
    /// scratch buffer, which is laid out row-major over the *nominal* chunk
    /// shape (`dims.chunks`), not the possibly-smaller edge-chunk shape.
    pub chunk_local: Vec<u64>,
    /// Coordinate of the run's first element, relative to `region_offset`
    /// (i.e. in `0..region_count[i]`). Used to address the caller's cube.
    pub region_local: Vec<u64>,
    /// Number of contiguous elements along the fastest (last) axis.
    pub len: u64,
}

/// Unravel a linear chunk index into per-axis chunk coordinates, slowest
/// axis first, using `chunks_per_axis[i]` as the radix for axis `i`.
pub fn unravel_chunk_index(mut chunk_index: u64, chunks_per_axis: &[u64]) -> Vec<u64> {
    let rank = chunks_per_axis.len();
    let mut coord = vec![0u64; rank];
    for i in (0..rank).rev() {
        coord[i] = chunk_index % chunks_per_axis[i];
        chunk_index /= chunks_per_axis[i];
    }
    coord
}

/// Ravel per-axis chunk coordinates back into a linear chunk index.
pub fn ravel_chunk_index(coord: &[u64], chunks_per_axis: &[u64]) -> u64 {
    let mut index = 0u64;
    for i in 0..coord.len() {
        index = index * chunks_per_axis[i] + coord[i];
    }
    index
}

/// The inclusive/exclusive element range `[start, end)` that global chunk
/// `chunk_index` nominally spans on each axis, clamped to the array's
/// overall dimensions (edge chunks are smaller than `dims.chunks`).
pub fn chunk_bounds(dims: &Dimensions, chunk_index: u64) -> (Vec<u64>, Vec<u64>) {
    let chunks_per_axis = dims.chunks_per_axis();
    let coord = unravel_chunk_index(chunk_index, &chunks_per_axis);
    let rank = dims.rank();
    let mut start = vec![0u64; rank];
    let mut end = vec![0u64; rank];
    for i in 0..rank {
        start[i] = coord[i] * dims.chunks[i];
        end[i] = (start[i] + dims.chunks[i]).min(dims.dimensions[i]);
    }
    (start, end)
}

/// Walk every maximal contiguous run shared by chunk `chunk_index` and the
/// region `[region_offset, region_offset+region_count)`, slowest axis to
/// fastest, invoking `emit` once per run.
///
/// If the chunk and region do not intersect, `emit` is never called.
pub fn for_each_run(
    dims: &Dimensions,
    chunk_index: u64,
    region_offset: &[u64],
    region_count: &[u64],
    mut emit: impl FnMut(Run),
) {
    let rank = dims.rank();
    let (chunk_start, chunk_end) = chunk_bounds(dims, chunk_index);

    let mut lo = vec![0u64; rank];
    let mut hi = vec![0u64; rank];
    for i in 0..rank {
        lo[i] = chunk_start[i].max(region_offset[i]);
        hi[i] = chunk_end[i].min(region_offset[i] + region_count[i]);
        if lo[i] >= hi[i] {
            // Empty intersection on this axis -> nothing to do at all.
            return;
        }
    }

    let last = rank - 1;
    let run_len = hi[last] - lo[last];

    if rank == 1 {
        emit(Run {
            chunk_local: vec![lo[0] - chunk_start[0]],
            region_local: vec![lo[0] - region_offset[0]],
            len: run_len,
        });
        return;
    }

    // Mixed-base counter over axes 0..last (exclusive of the fastest axis).
    let mut pos = lo[..last].to_vec();
    loop {
        let mut chunk_local = Vec::with_capacity(rank);
        let mut region_local = Vec::with_capacity(rank);
        for i in 0..last {
            chunk_local.push(pos[i] - chunk_start[i]);
            region_local.push(pos[i] - region_offset[i]);
        }
        chunk_local.push(lo[last] - chunk_start[last]);
        region_local.push(lo[last] - region_offset[last]);

        emit(Run {
            chunk_local,
            region_local,
            len: run_len,
        });

        // Advance the mixed-base counter, carrying from the fastest of the
        // outer axes toward the slowest.
        let mut axis = last;
        loop {
            if axis == 0 {
                return;
            }
            axis -= 1;
            pos[axis] += 1;
            if pos[axis] < hi[axis] {
                break;
            }
            pos[axis] = lo[axis];
            if axis == 0 {
                return;
            }
        }
    }
}

/// Row-major linear offset of `coord` within a buffer shaped `shape`.
pub fn linear_offset(coord: &[u64], shape: &[u64]) -> u64 {
    let mut offset = 0u64;
    for i in 0..coord.len() {
        offset = offset * shape[i] + coord[i];
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unravel_ravel_roundtrip() {
        let chunks_per_axis = vec![3, 4, 2];
        for idx in 0..(3 * 4 * 2) {
            let coord = unravel_chunk_index(idx, &chunks_per_axis);
            assert_eq!(ravel_chunk_index(&coord, &chunks_per_axis), idx);
        }
    }

    #[test]
    fn full_array_traversal_covers_every_element_once() {
        let dims = Dimensions::new(vec![5, 5], vec![2, 2]).unwrap();
        let total_chunks = dims.total_chunks();
        let mut covered = vec![false; 25];
        for chunk_index in 0..total_chunks {
            for_each_run(&dims, chunk_index, &[0, 0], &[5, 5], |run| {
                for k in 0..run.len {
                    let coord = [run.region_local[0], run.region_local[1] + k];
                    let lin = (coord[0] * 5 + coord[1]) as usize;
                    assert!(!covered[lin], "element {:?} covered twice", coord);
                    covered[lin] = true;
                }
            });
        }
        assert!(covered.iter().all(|&c| c), "every element must be covered");
    }

    #[test]
    fn sub_cube_traversal_only_touches_requested_region() {
        let dims = Dimensions::new(vec![10, 10], vec![4, 4]).unwrap();
        let offset = [3u64, 2];
        let count = [4u64, 5];
        for chunk_index in 0..dims.total_chunks() {
            for_each_run(&dims, chunk_index, &offset, &count, |run| {
                assert!(run.region_local[0] < count[0]);
                assert!(run.region_local[1] + run.len <= count[1]);
            });
        }
    }
}
