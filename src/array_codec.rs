//! Ties together convert/filter/entropy-code into the "callback triple"
//! `spec.md` §9 describes (the original chooses function pointers per
//! `(data_type, compression)` at init time; here each valid combination is
//! a trait method implemented once per user-facing element type `T`, with
//! `CompressionType` providing the runtime switch between the handful of
//! combinations that type supports).

use crate::codec::fp_xor::{fp_xor32_encode_bound, fp_xor64_encode_bound, FPXor32, FPXor64};
use crate::codec::pfor_delta::{
    self, PForDeltaI16, PForDeltaI32, PForDeltaI64, PForDeltaI8, PForDeltaU16, PForDeltaU32,
    PForDeltaU64, PForDeltaU8,
};
use crate::codec::PrimitiveCodec;
use crate::compression::CompressionType;
use crate::convert;
use crate::data_type::OmFileArrayDataType;
use crate::errors::{OmFilesError, Result};
use crate::filter;

/// Per-element-type encode/decode of one gathered chunk buffer (dense,
/// row-major over the chunk's *actual* — possibly edge-clamped — shape).
pub trait ArrayCodec: OmFileArrayDataType {
    /// Bytes the stored form of one element occupies for `compression`, or
    /// `InvalidCompressionType` if this type doesn't support it.
    fn bytes_per_element_stored(compression: CompressionType) -> Result<usize>;

    /// Upper bound (bytes) for the compressed form of `n` elements.
    fn compressed_bound(compression: CompressionType, n: usize) -> Result<usize> {
        let bytes = Self::bytes_per_element_stored(compression)?;
        Ok(match compression {
            CompressionType::FPXor2D if bytes == 4 => fp_xor32_encode_bound(n),
            CompressionType::FPXor2D => fp_xor64_encode_bound(n),
            _ => pfor_delta::encode_bound(n).max(crate::compression::pfor_delta_encode_bound(n, bytes)),
        })
    }

    /// `chunk`: dense, row-major over `(rows, cols)` where `cols` is the
    /// chunk's fastest axis extent and `rows` the product of the rest.
    fn encode_chunk(
        compression: CompressionType,
        scale_factor: f32,
        add_offset: f32,
        chunk: &[Self],
        rows: usize,
        cols: usize,
        dst: &mut [u8],
    ) -> Result<usize>;

    /// Decode one chunk, returning the number of bytes the entropy coder
    /// actually consumed from `compressed` so callers can verify it against
    /// the LUT-claimed span.
    fn decode_chunk(
        compression: CompressionType,
        scale_factor: f32,
        add_offset: f32,
        compressed: &[u8],
        compressed_len: usize,
        rows: usize,
        cols: usize,
        out: &mut [Self],
    ) -> Result<usize>;
}

macro_rules! unsupported {
    () => {
        Err(OmFilesError::InvalidCompressionType)
    };
}

impl ArrayCodec for f32 {
    fn bytes_per_element_stored(compression: CompressionType) -> Result<usize> {
        match compression {
            CompressionType::PForDelta2DInt16 | CompressionType::PForDelta2DInt16Logarithmic => {
                Ok(2)
            }
            CompressionType::PForDelta2D => Ok(4),
            CompressionType::FPXor2D => Ok(4),
        }
    }

    fn encode_chunk(
        compression: CompressionType,
        scale_factor: f32,
        add_offset: f32,
        chunk: &[Self],
        rows: usize,
        cols: usize,
        dst: &mut [u8],
    ) -> Result<usize> {
        match compression {
            CompressionType::PForDelta2DInt16 => {
                let mut stored = vec![0i16; chunk.len()];
                convert::f32_to_i16(chunk, &mut stored, scale_factor, add_offset);
                filter::delta2d_encode(rows, cols, &mut stored);
                Ok(PForDeltaI16::compress(&stored, dst))
            }
            CompressionType::PForDelta2DInt16Logarithmic => {
                let mut stored = vec![0i16; chunk.len()];
                convert::f32_to_i16_log10(chunk, &mut stored, scale_factor, add_offset);
                filter::delta2d_encode(rows, cols, &mut stored);
                Ok(PForDeltaI16::compress(&stored, dst))
            }
            CompressionType::PForDelta2D => {
                let mut stored = vec![0i32; chunk.len()];
                convert::f32_to_i32(chunk, &mut stored, scale_factor, add_offset);
                filter::delta2d_encode(rows, cols, &mut stored);
                Ok(PForDeltaI32::compress(&stored, dst))
            }
            CompressionType::FPXor2D => {
                let mut stored = chunk.to_vec();
                filter::xor2d_encode_f32(rows, cols, &mut stored);
                Ok(FPXor32::compress(&stored, dst))
            }
        }
    }

    fn decode_chunk(
        compression: CompressionType,
        scale_factor: f32,
        add_offset: f32,
        compressed: &[u8],
        compressed_len: usize,
        rows: usize,
        cols: usize,
        out: &mut [Self],
    ) -> Result<usize> {
        let consumed = match compression {
            CompressionType::PForDelta2DInt16 => {
                let mut stored = vec![0i16; out.len()];
                let consumed = PForDeltaI16::decompress(compressed, compressed_len, &mut stored);
                filter::delta2d_decode(rows, cols, &mut stored);
                convert::i16_to_f32(&stored, out, scale_factor, add_offset);
                consumed
            }
            CompressionType::PForDelta2DInt16Logarithmic => {
                let mut stored = vec![0i16; out.len()];
                let consumed = PForDeltaI16::decompress(compressed, compressed_len, &mut stored);
                filter::delta2d_decode(rows, cols, &mut stored);
                convert::i16_to_f32_log10(&stored, out, scale_factor, add_offset);
                consumed
            }
            CompressionType::PForDelta2D => {
                let mut stored = vec![0i32; out.len()];
                let consumed = PForDeltaI32::decompress(compressed, compressed_len, &mut stored);
                filter::delta2d_decode(rows, cols, &mut stored);
                convert::i32_to_f32(&stored, out, scale_factor, add_offset);
                consumed
            }
            CompressionType::FPXor2D => {
                let consumed = FPXor32::decompress(compressed, compressed_len, out);
                filter::xor2d_decode_f32(rows, cols, out);
                consumed
            }
        };
        Ok(consumed)
    }
}

impl ArrayCodec for f64 {
    fn bytes_per_element_stored(compression: CompressionType) -> Result<usize> {
        match compression {
            CompressionType::FPXor2D => Ok(8),
            CompressionType::PForDelta2D => Ok(8),
            _ => unsupported!(),
        }
    }

    fn encode_chunk(
        compression: CompressionType,
        scale_factor: f32,
        add_offset: f32,
        chunk: &[Self],
        rows: usize,
        cols: usize,
        dst: &mut [u8],
    ) -> Result<usize> {
        match compression {
            CompressionType::FPXor2D => {
                let mut stored = chunk.to_vec();
                filter::xor2d_encode_f64(rows, cols, &mut stored);
                Ok(FPXor64::compress(&stored, dst))
            }
            CompressionType::PForDelta2D => {
                let mut stored = vec![0i64; chunk.len()];
                convert::f64_to_i64(chunk, &mut stored, scale_factor as f64, add_offset as f64);
                filter::delta2d_encode(rows, cols, &mut stored);
                Ok(PForDeltaI64::compress(&stored, dst))
            }
            _ => unsupported!(),
        }
    }

    fn decode_chunk(
        compression: CompressionType,
        scale_factor: f32,
        add_offset: f32,
        compressed: &[u8],
        compressed_len: usize,
        rows: usize,
        cols: usize,
        out: &mut [Self],
    ) -> Result<usize> {
        let consumed = match compression {
            CompressionType::FPXor2D => {
                let consumed = FPXor64::decompress(compressed, compressed_len, out);
                filter::xor2d_decode_f64(rows, cols, out);
                consumed
            }
            CompressionType::PForDelta2D => {
                let mut stored = vec![0i64; out.len()];
                let consumed = PForDeltaI64::decompress(compressed, compressed_len, &mut stored);
                filter::delta2d_decode(rows, cols, &mut stored);
                convert::i64_to_f64(&stored, out, scale_factor as f64, add_offset as f64);
                consumed
            }
            _ => return unsupported!(),
        };
        Ok(consumed)
    }
}

macro_rules! impl_native_int_codec {
    ($ty:ty, $codec:ty) => {
        impl ArrayCodec for $ty {
            fn bytes_per_element_stored(compression: CompressionType) -> Result<usize> {
                match compression {
                    CompressionType::PForDelta2D => Ok(std::mem::size_of::<$ty>()),
                    _ => unsupported!(),
                }
            }

            fn encode_chunk(
                compression: CompressionType,
                _scale_factor: f32,
                _add_offset: f32,
                chunk: &[Self],
                rows: usize,
                cols: usize,
                dst: &mut [u8],
            ) -> Result<usize> {
                match compression {
                    CompressionType::PForDelta2D => {
                        let mut stored = chunk.to_vec();
                        filter::delta2d_encode(rows, cols, &mut stored);
                        Ok(<$codec>::compress(&stored, dst))
                    }
                    _ => unsupported!(),
                }
            }

            fn decode_chunk(
                compression: CompressionType,
                _scale_factor: f32,
                _add_offset: f32,
                compressed: &[u8],
                compressed_len: usize,
                rows: usize,
                cols: usize,
                out: &mut [Self],
            ) -> Result<usize> {
                match compression {
                    CompressionType::PForDelta2D => {
                        let consumed = <$codec>::decompress(compressed, compressed_len, out);
                        filter::delta2d_decode(rows, cols, out);
                        Ok(consumed)
                    }
                    _ => unsupported!(),
                }
            }
        }
    };
}

impl_native_int_codec!(i8, PForDeltaI8);
impl_native_int_codec!(u8, PForDeltaU8);
impl_native_int_codec!(i16, PForDeltaI16);
impl_native_int_codec!(u16, PForDeltaU16);
impl_native_int_codec!(i32, PForDeltaI32);
impl_native_int_codec!(u32, PForDeltaU32);
impl_native_int_codec!(i64, PForDeltaI64);
impl_native_int_codec!(u64, PForDeltaU64);
