//! Primitive entropy coders.
//!
//! `spec.md` treats the bit-packers as opaque external collaborators: the
//! rest of the crate only needs `compress(src, len) -> bytes_written` and
//! `decompress(src, compressed_len, dst) -> elements_decoded`. These two
//! modules provide concrete, from-scratch implementations of that
//! interface (a frame-of-reference bit-packer for integers, and a
//! zero-byte-suppression coder for XOR-filtered floats) so the crate has no
//! external C dependency, while every caller above this layer only ever
//! talks to the trait below.

pub mod fp_xor;
pub mod pfor_delta;

/// A swappable entropy coder over a fixed-width element type.
pub trait PrimitiveCodec<T> {
    /// Compress `src` into `dst`, returning the number of bytes written.
    /// `dst` is guaranteed by the caller to be at least as large as the
    /// relevant `*_bound()` helper demands.
    fn compress(src: &[T], dst: &mut [u8]) -> usize;

    /// Decompress exactly `compressed_len` bytes from the front of `src`
    /// into `dst`, returning the number of bytes actually consumed from
    /// `src`. `dst.len()` is the number of elements the caller expects back;
    /// callers compare the returned count against `compressed_len` to catch
    /// a LUT entry that understates or overstates a chunk's true span.
    fn decompress(src: &[u8], compressed_len: usize, dst: &mut [T]) -> usize;
}
