//! The compressed look-up table of absolute chunk byte offsets.
//!
//! The LUT is sliced into fixed-size groups of `LUT_CHUNK_COUNT` (256)
//! offsets; each group is independently bit-packed with the 64-bit
//! PForDelta coder so the I/O planner can fetch and decode an arbitrary
//! span of groups without touching the rest of the table. All groups are
//! padded to the same stride (`lut_chunk_length`) so a group's byte range
//! can be computed without decoding anything first.

use crate::codec::pfor_delta::{encode_bound, PForDeltaU64};
use crate::codec::PrimitiveCodec;
use crate::defaults::LUT_CHUNK_ELEMENT_COUNT;

pub struct CompressedLut {
    pub bytes: Vec<u8>,
    /// Fixed byte stride of every group (including the last, zero-padded).
    pub group_stride: usize,
    /// Number of absolute offsets in the original (uncompressed) LUT.
    pub lut_len: usize,
}

impl CompressedLut {
    pub fn group_count(&self) -> usize {
        (self.lut_len + LUT_CHUNK_ELEMENT_COUNT as usize - 1) / LUT_CHUNK_ELEMENT_COUNT as usize
    }

    /// Number of LUT entries stored in `group_index` (the last group may be
    /// short).
    pub fn entries_in_group(&self, group_index: usize) -> usize {
        let start = group_index * LUT_CHUNK_ELEMENT_COUNT as usize;
        (self.lut_len - start).min(LUT_CHUNK_ELEMENT_COUNT as usize)
    }

    /// Byte range of `group_index` within `self.bytes` (or within the
    /// on-disk compressed LUT region, which is a byte-identical copy).
    pub fn group_byte_range(&self, group_index: usize) -> std::ops::Range<usize> {
        let start = group_index * self.group_stride;
        start..start + self.group_stride
    }

    /// Decode `group_index`'s offsets out of an already-fetched byte
    /// window. `window` must start at `self.group_byte_range(group_index).start`
    /// relative to the LUT's own start (callers fetching a sub-range of
    /// groups must offset accordingly; see `crate::planner`).
    pub fn decode_group(&self, window: &[u8], group_index: usize) -> Vec<u64> {
        let n = self.entries_in_group(group_index);
        let mut out = vec![0u64; n];
        PForDeltaU64::decompress(window, self.group_stride.min(window.len()), &mut out);
        out
    }
}

/// Compress the full LUT (`total_chunks + 1` monotonically non-decreasing
/// absolute byte offsets) into fixed-stride, independently seekable groups.
pub fn compress_lut(lut: &[u64]) -> CompressedLut {
    let n = LUT_CHUNK_ELEMENT_COUNT as usize;
    let n_groups = (lut.len() + n - 1) / n.max(1);

    let mut packed_groups: Vec<Vec<u8>> = Vec::with_capacity(n_groups);
    let mut max_len = 0usize;
    for group in lut.chunks(n) {
        let mut buf = vec![0u8; encode_bound(group.len())];
        let written = PForDeltaU64::compress(group, &mut buf);
        buf.truncate(written);
        max_len = max_len.max(written);
        packed_groups.push(buf);
    }

    let stride = max_len;
    let mut bytes = vec![0u8; stride * n_groups];
    for (i, group) in packed_groups.into_iter().enumerate() {
        bytes[i * stride..i * stride + group.len()].copy_from_slice(&group);
    }

    CompressedLut {
        bytes,
        group_stride: stride,
        lut_len: lut.len(),
    }
}

/// Upper bound (bytes) for the compressed LUT of `total_chunks + 1` entries,
/// matching `spec.md`'s `lut_bound`.
pub fn lut_bound(lut_len: usize) -> usize {
    let n = LUT_CHUNK_ELEMENT_COUNT as usize;
    let n_groups = (lut_len + n - 1) / n.max(1);
    let max_group_len = encode_bound(n);
    max_group_len * n_groups.max(1) + 32 * 8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lut_roundtrips_through_groups() {
        let lut: Vec<u64> = (0..600).map(|i| i * 37).collect();
        let compressed = compress_lut(&lut);
        let mut decoded = Vec::new();
        for g in 0..compressed.group_count() {
            let range = compressed.group_byte_range(g);
            let window = &compressed.bytes[range];
            decoded.extend(compressed.decode_group(window, g));
        }
        assert_eq!(decoded, lut);
    }

    #[test]
    fn monotonic_lut_stays_monotonic_after_roundtrip() {
        let mut lut = vec![0u64];
        for i in 0..300u64 {
            lut.push(lut[i as usize] + (i % 7) + 1);
        }
        let compressed = compress_lut(&lut);
        let mut decoded = Vec::new();
        for g in 0..compressed.group_count() {
            let range = compressed.group_byte_range(g);
            decoded.extend(compressed.decode_group(&compressed.bytes[range], g));
        }
        for w in decoded.windows(2) {
            assert!(w[0] <= w[1]);
        }
    }
}
