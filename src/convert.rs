//! Element-wise conversion between the user's float/double representation
//! and the stored integer (or bit-identical float) form. `scale_factor`/
//! `add_offset` implement `stored = round(value * scale + offset)`
//! (round-half-away-from-zero, which is exactly `f32::round`/`f64::round`'s
//! behavior); NaN always maps to the stored type's signed maximum, and any
//! other out-of-range value is clamped rather than wrapped.

/// Convert one run of `f32` user values into `i16` stored values
/// (`scale_factor`/`add_offset` affine quantization).
pub fn f32_to_i16(src: &[f32], dst: &mut [i16], scale_factor: f32, add_offset: f32) {
    for (s, d) in src.iter().zip(dst.iter_mut()) {
        *d = if s.is_nan() {
            i16::MAX
        } else {
            let scaled = (*s * scale_factor + add_offset).round();
            clamp_to_i16(scaled)
        };
    }
}

pub fn i16_to_f32(src: &[i16], dst: &mut [f32], scale_factor: f32, add_offset: f32) {
    for (s, d) in src.iter().zip(dst.iter_mut()) {
        *d = if *s == i16::MAX {
            f32::NAN
        } else {
            (*s as f32 - add_offset) / scale_factor
        };
    }
}

/// `log10(1+x) * scale_factor` quantized to `i16`, used for compression of
/// strictly non-negative, heavy-tailed quantities (precipitation etc).
pub fn f32_to_i16_log10(src: &[f32], dst: &mut [i16], scale_factor: f32, add_offset: f32) {
    for (s, d) in src.iter().zip(dst.iter_mut()) {
        *d = if s.is_nan() {
            i16::MAX
        } else {
            let scaled = ((1.0 + *s).log10() * scale_factor + add_offset).round();
            clamp_to_i16(scaled)
        };
    }
}

pub fn i16_to_f32_log10(src: &[i16], dst: &mut [f32], scale_factor: f32, add_offset: f32) {
    for (s, d) in src.iter().zip(dst.iter_mut()) {
        *d = if *s == i16::MAX {
            f32::NAN
        } else {
            let unscaled = (*s as f32 - add_offset) / scale_factor;
            10f32.powf(unscaled) - 1.0
        };
    }
}

pub fn f32_to_i32(src: &[f32], dst: &mut [i32], scale_factor: f32, add_offset: f32) {
    for (s, d) in src.iter().zip(dst.iter_mut()) {
        *d = if s.is_nan() {
            i32::MAX
        } else {
            let scaled = (*s * scale_factor + add_offset).round();
            clamp_to_i32(scaled)
        };
    }
}

pub fn i32_to_f32(src: &[i32], dst: &mut [f32], scale_factor: f32, add_offset: f32) {
    for (s, d) in src.iter().zip(dst.iter_mut()) {
        *d = if *s == i32::MAX {
            f32::NAN
        } else {
            (*s as f32 - add_offset) / scale_factor
        };
    }
}

pub fn f64_to_i64(src: &[f64], dst: &mut [i64], scale_factor: f64, add_offset: f64) {
    for (s, d) in src.iter().zip(dst.iter_mut()) {
        *d = if s.is_nan() {
            i64::MAX
        } else {
            let scaled = (*s * scale_factor + add_offset).round();
            clamp_to_i64(scaled)
        };
    }
}

pub fn i64_to_f64(src: &[i64], dst: &mut [f64], scale_factor: f64, add_offset: f64) {
    for (s, d) in src.iter().zip(dst.iter_mut()) {
        *d = if *s == i64::MAX {
            f64::NAN
        } else {
            (*s as f64 - add_offset) / scale_factor
        };
    }
}

pub fn memcpy<T: Copy>(src: &[T], dst: &mut [T]) {
    dst.copy_from_slice(src);
}

fn clamp_to_i16(v: f32) -> i16 {
    if v >= (i16::MAX - 1) as f32 {
        i16::MAX - 1
    } else if v <= i16::MIN as f32 {
        i16::MIN
    } else {
        v as i16
    }
}

fn clamp_to_i32(v: f32) -> i32 {
    if v >= (i32::MAX - 1) as f32 {
        i32::MAX - 1
    } else if v <= i32::MIN as f32 {
        i32::MIN
    } else {
        v as i32
    }
}

fn clamp_to_i64(v: f64) -> i64 {
    if v >= (i64::MAX - 1) as f64 {
        i64::MAX - 1
    } else if v <= i64::MIN as f64 {
        i64::MIN
    } else {
        v as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_round_trips_to_nan() {
        let src = [1.0f32, f32::NAN, -3.5];
        let mut stored = [0i16; 3];
        f32_to_i16(&src, &mut stored, 100.0, 0.0);
        assert_eq!(stored[1], i16::MAX);
        let mut back = [0f32; 3];
        i16_to_f32(&stored, &mut back, 100.0, 0.0);
        assert!(back[1].is_nan());
        assert!((back[0] - 1.0).abs() < 0.01);
        assert!((back[2] + 3.5).abs() < 0.01);
    }

    #[test]
    fn log10_round_trips_within_quantization() {
        let src = [0.0f32, 9.0, 99.0];
        let mut stored = [0i16; 3];
        f32_to_i16_log10(&src, &mut stored, 1000.0, 0.0);
        let mut back = [0f32; 3];
        i16_to_f32_log10(&stored, &mut back, 1000.0, 0.0);
        for (a, b) in src.iter().zip(back.iter()) {
            assert!((a - b).abs() < 0.01, "{} vs {}", a, b);
        }
    }

    #[test]
    fn out_of_range_values_clamp_instead_of_wrapping() {
        let src = [1.0e30f32];
        let mut stored = [0i16; 1];
        f32_to_i16(&src, &mut stored, 1.0, 0.0);
        assert_eq!(stored[0], i16::MAX - 1);
    }
}
