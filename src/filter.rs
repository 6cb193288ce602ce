//! The in-place 2-D delta/XOR filter applied to a chunk buffer before
//! entropy coding (and inverted after decoding it). The chunk is reshaped
//! as `(rows, cols)` where `cols` is the chunk's fastest axis and `rows` is
//! the product of all slower axes; the filter runs along `rows`, i.e. each
//! row is replaced by its difference from the previous row.
//!
//! Zig-zag mapping of signed deltas happens one layer down, inside the
//! entropy coder (`crate::codec::pfor_delta`) — this module only computes
//! plain wrapping differences, matching the teacher's `delta2d.rs`.

use num_traits::{WrappingAdd, WrappingSub};
use std::ops::BitXor;

pub fn delta2d_encode<T>(rows: usize, cols: usize, buf: &mut [T])
where
    T: WrappingSub + Copy,
{
    if rows <= 1 {
        return;
    }
    for r in (1..rows).rev() {
        for c in 0..cols {
            let idx = r * cols + c;
            let prev = (r - 1) * cols + c;
            buf[idx] = buf[idx].wrapping_sub(&buf[prev]);
        }
    }
}

pub fn delta2d_decode<T>(rows: usize, cols: usize, buf: &mut [T])
where
    T: WrappingAdd + Copy,
{
    if rows <= 1 {
        return;
    }
    for r in 1..rows {
        for c in 0..cols {
            let idx = r * cols + c;
            let prev = (r - 1) * cols + c;
            buf[idx] = buf[idx].wrapping_add(&buf[prev]);
        }
    }
}

pub fn xor2d_encode<T>(rows: usize, cols: usize, buf: &mut [T])
where
    T: BitXor<Output = T> + Copy,
{
    if rows <= 1 {
        return;
    }
    for r in (1..rows).rev() {
        for c in 0..cols {
            let idx = r * cols + c;
            let prev = (r - 1) * cols + c;
            buf[idx] = buf[idx] ^ buf[prev];
        }
    }
}

pub fn xor2d_decode<T>(rows: usize, cols: usize, buf: &mut [T])
where
    T: BitXor<Output = T> + Copy,
{
    if rows <= 1 {
        return;
    }
    for r in 1..rows {
        for c in 0..cols {
            let idx = r * cols + c;
            let prev = (r - 1) * cols + c;
            buf[idx] = buf[idx] ^ buf[prev];
        }
    }
}

/// XOR filter over `f32`, operating on the bit pattern (the element type
/// the entropy coder sees is an opaque integer, but `crate::encoder`
/// prefers to keep working in `f32` up to the last moment).
pub fn xor2d_encode_f32(rows: usize, cols: usize, buf: &mut [f32]) {
    if rows <= 1 {
        return;
    }
    for r in (1..rows).rev() {
        for c in 0..cols {
            let idx = r * cols + c;
            let prev = (r - 1) * cols + c;
            let v = buf[idx].to_bits() ^ buf[prev].to_bits();
            buf[idx] = f32::from_bits(v);
        }
    }
}

pub fn xor2d_decode_f32(rows: usize, cols: usize, buf: &mut [f32]) {
    if rows <= 1 {
        return;
    }
    for r in 1..rows {
        for c in 0..cols {
            let idx = r * cols + c;
            let prev = (r - 1) * cols + c;
            let v = buf[idx].to_bits() ^ buf[prev].to_bits();
            buf[idx] = f32::from_bits(v);
        }
    }
}

pub fn xor2d_encode_f64(rows: usize, cols: usize, buf: &mut [f64]) {
    if rows <= 1 {
        return;
    }
    for r in (1..rows).rev() {
        for c in 0..cols {
            let idx = r * cols + c;
            let prev = (r - 1) * cols + c;
            let v = buf[idx].to_bits() ^ buf[prev].to_bits();
            buf[idx] = f64::from_bits(v);
        }
    }
}

pub fn xor2d_decode_f64(rows: usize, cols: usize, buf: &mut [f64]) {
    if rows <= 1 {
        return;
    }
    for r in 1..rows {
        for c in 0..cols {
            let idx = r * cols + c;
            let prev = (r - 1) * cols + c;
            let v = buf[idx].to_bits() ^ buf[prev].to_bits();
            buf[idx] = f64::from_bits(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta2d_roundtrip() {
        let mut buf: Vec<i32> = vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10];
        let original = buf.clone();
        delta2d_encode(5, 2, &mut buf);
        delta2d_decode(5, 2, &mut buf);
        assert_eq!(buf, original);
    }

    #[test]
    fn xor2d_f32_roundtrip() {
        let mut buf: Vec<f32> = vec![1.0, 2.0, 3.0, 4.0, 5.5, -6.25];
        let original = buf.clone();
        xor2d_encode_f32(3, 2, &mut buf);
        xor2d_decode_f32(3, 2, &mut buf);
        assert_eq!(buf, original);
    }

    #[test]
    fn single_row_is_a_no_op() {
        let mut buf: Vec<i32> = vec![5, 6, 7];
        let original = buf.clone();
        delta2d_encode(1, 3, &mut buf);
        assert_eq!(buf, original);
    }
}
