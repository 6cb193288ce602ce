//! A zero-byte-suppression coder, standing in for the FPXor family named by
//! `spec.md` (`fpxenc32`/`fpxenc64`). It is meant to run *after* the in-place
//! XOR filter (`crate::filter`) has replaced each element with the XOR of
//! itself and its predecessor row: neighboring floating point samples tend
//! to be close in value, so the XOR difference tends to have many leading
//! zero bytes, which this coder drops. Every value is stored as a one-byte
//! "significant byte count" followed by that many raw little-endian bytes.

use super::PrimitiveCodec;

fn significant_bytes_u32(v: u32) -> usize {
    4 - (v.leading_zeros() / 8) as usize
}

fn significant_bytes_u64(v: u64) -> usize {
    8 - (v.leading_zeros() / 8) as usize
}

pub fn fp_xor32_encode_bound(n: usize) -> usize {
    n * (1 + 4)
}

pub fn fp_xor64_encode_bound(n: usize) -> usize {
    n * (1 + 8)
}

pub struct FPXor32;

impl PrimitiveCodec<f32> for FPXor32 {
    fn compress(src: &[f32], dst: &mut [u8]) -> usize {
        let mut pos = 0;
        for &v in src {
            let bits = v.to_bits();
            let sig = significant_bytes_u32(bits);
            dst[pos] = sig as u8;
            dst[pos + 1..pos + 1 + sig].copy_from_slice(&bits.to_le_bytes()[..sig]);
            pos += 1 + sig;
        }
        pos
    }

    fn decompress(src: &[u8], compressed_len: usize, dst: &mut [f32]) -> usize {
        let src = &src[..compressed_len];
        let mut pos = 0;
        for out in dst.iter_mut() {
            let sig = src[pos] as usize;
            pos += 1;
            let mut raw = [0u8; 4];
            raw[..sig].copy_from_slice(&src[pos..pos + sig]);
            pos += sig;
            *out = f32::from_bits(u32::from_le_bytes(raw));
        }
        pos
    }
}

pub struct FPXor64;

impl PrimitiveCodec<f64> for FPXor64 {
    fn compress(src: &[f64], dst: &mut [u8]) -> usize {
        let mut pos = 0;
        for &v in src {
            let bits = v.to_bits();
            let sig = significant_bytes_u64(bits);
            dst[pos] = sig as u8;
            dst[pos + 1..pos + 1 + sig].copy_from_slice(&bits.to_le_bytes()[..sig]);
            pos += 1 + sig;
        }
        pos
    }

    fn decompress(src: &[u8], compressed_len: usize, dst: &mut [f64]) -> usize {
        let src = &src[..compressed_len];
        let mut pos = 0;
        for out in dst.iter_mut() {
            let sig = src[pos] as usize;
            pos += 1;
            let mut raw = [0u8; 8];
            raw[..sig].copy_from_slice(&src[pos..pos + sig]);
            pos += sig;
            *out = f64::from_bits(u64::from_le_bytes(raw));
        }
        pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_f32() {
        let values: Vec<f32> = vec![0.0, 1.0, -1.0, 3.14159, f32::NAN, f32::MAX, -0.0];
        let mut buf = vec![0u8; fp_xor32_encode_bound(values.len())];
        let written = FPXor32::compress(&values, &mut buf);
        let mut out = vec![0f32; values.len()];
        FPXor32::decompress(&buf, written, &mut out);
        for (a, b) in values.iter().zip(out.iter()) {
            if a.is_nan() {
                assert!(b.is_nan());
            } else {
                assert_eq!(a.to_bits(), b.to_bits());
            }
        }
    }

    #[test]
    fn roundtrip_f64() {
        let values: Vec<f64> = vec![0.0, 1.0, -1.0, 2.718281828, f64::NAN];
        let mut buf = vec![0u8; fp_xor64_encode_bound(values.len())];
        let written = FPXor64::compress(&values, &mut buf);
        let mut out = vec![0f64; values.len()];
        FPXor64::decompress(&buf, written, &mut out);
        for (a, b) in values.iter().zip(out.iter()) {
            if a.is_nan() {
                assert!(b.is_nan());
            } else {
                assert_eq!(a.to_bits(), b.to_bits());
            }
        }
    }
}
