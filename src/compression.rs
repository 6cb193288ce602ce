use crate::errors::OmFilesError;

/// The four storage/compression combinations described by the container
/// format. Each pairs a convert step, a 2-D filter, and an entropy coder;
/// see `crate::encoder` and `crate::decoder` for the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompressionType {
    /// `f32`/ints -> 4-byte (or native) integers, delta-filtered, PForDelta packed.
    PForDelta2D = 0,
    /// `f32` -> scaled `i16`, delta-filtered, PForDelta packed.
    PForDelta2DInt16 = 1,
    /// floating point stored bit-for-bit, XOR-filtered, FPXor packed.
    FPXor2D = 2,
    /// `f32` -> `log10(1+x)` scaled `i16`, delta-filtered, PForDelta packed.
    PForDelta2DInt16Logarithmic = 3,
}

impl CompressionType {
    /// Bytes per stored (not user-facing) element, per the §4.1 table.
    pub fn bytes_per_element_stored(&self, user_bytes: usize) -> usize {
        match self {
            CompressionType::PForDelta2DInt16 | CompressionType::PForDelta2DInt16Logarithmic => 2,
            CompressionType::PForDelta2D => user_bytes,
            CompressionType::FPXor2D => user_bytes,
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for CompressionType {
    type Error = OmFilesError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CompressionType::PForDelta2D),
            1 => Ok(CompressionType::PForDelta2DInt16),
            2 => Ok(CompressionType::FPXor2D),
            3 => Ok(CompressionType::PForDelta2DInt16Logarithmic),
            _ => Err(OmFilesError::InvalidCompressionType),
        }
    }
}

/// Upper bound on the compressed size of `n` elements of `bytes_per_element`
/// each, for the PForDelta entropy coder: one block header byte per group of
/// 256 values, plus a `bytes_per_element`-wide slack term covering the
/// bit-packer's tail-write behavior (it may over-write past the logical end
/// of a 256-element group).
pub fn pfor_delta_encode_bound(n: usize, bytes_per_element: usize) -> usize {
    (n + 255) / 256 + (n + 32) * bytes_per_element
}
