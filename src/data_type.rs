use std::mem;

use crate::errors::OmFilesError;

/// Tag discriminating the payload interpretation of a [`crate::variable::Variable`].
///
/// Scalars and arrays of the same element kind are distinct tags, following
/// the original format: e.g. a single `f32` is `Float`, an n-dimensional
/// array of `f32` is `FloatArray`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DataType {
    None = 0,
    Int8 = 1,
    Uint8 = 2,
    Int16 = 3,
    Uint16 = 4,
    Int32 = 5,
    Uint32 = 6,
    Int64 = 7,
    Uint64 = 8,
    Float = 9,
    Double = 10,
    String = 11,
    Int8Array = 12,
    Uint8Array = 13,
    Int16Array = 14,
    Uint16Array = 15,
    Int32Array = 16,
    Uint32Array = 17,
    Int64Array = 18,
    Uint64Array = 19,
    FloatArray = 20,
    DoubleArray = 21,
    StringArray = 22,
}

impl TryFrom<u8> for DataType {
    type Error = OmFilesError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        use DataType::*;
        Ok(match value {
            0 => None,
            1 => Int8,
            2 => Uint8,
            3 => Int16,
            4 => Uint16,
            5 => Int32,
            6 => Uint32,
            7 => Int64,
            8 => Uint64,
            9 => Float,
            10 => Double,
            11 => String,
            12 => Int8Array,
            13 => Uint8Array,
            14 => Int16Array,
            15 => Uint16Array,
            16 => Int32Array,
            17 => Uint32Array,
            18 => Int64Array,
            19 => Uint64Array,
            20 => FloatArray,
            21 => DoubleArray,
            22 => StringArray,
            _ => return Err(OmFilesError::InvalidDataType),
        })
    }
}

/// Implemented by every element type that can be the payload of an array
/// variable's `*_array` data type.
pub trait OmFileArrayDataType: Copy + Default + Send + Sync + 'static {
    const DATA_TYPE_ARRAY: DataType;
}

/// Implemented by every element type that can be the payload of a scalar
/// variable: the fixed-width numeric types plus `String`.
pub trait OmFileScalarDataType: Sized {
    const DATA_TYPE_SCALAR: DataType;

    /// Reinterpret raw little-endian bytes as `Self`. For `String` this is a
    /// lossy UTF-8 decode rather than a bitwise reinterpretation.
    fn from_raw_bytes(bytes: &[u8]) -> Self;

    /// Run `f` with a view of `self`'s bytes in storage order.
    fn with_raw_bytes<T>(&self, f: impl FnOnce(&[u8]) -> T) -> T;
}

macro_rules! impl_numeric_scalar_and_array {
    ($ty:ty, $scalar:ident, $array:ident) => {
        impl OmFileArrayDataType for $ty {
            const DATA_TYPE_ARRAY: DataType = DataType::$array;
        }

        impl OmFileScalarDataType for $ty {
            const DATA_TYPE_SCALAR: DataType = DataType::$scalar;

            fn from_raw_bytes(bytes: &[u8]) -> Self {
                assert!(
                    bytes.len() >= mem::size_of::<Self>(),
                    "buffer too small to contain a value of size {}",
                    mem::size_of::<Self>()
                );
                let mut raw = [0u8; mem::size_of::<Self>()];
                raw.copy_from_slice(&bytes[..mem::size_of::<Self>()]);
                <$ty>::from_le_bytes(raw)
            }

            fn with_raw_bytes<T>(&self, f: impl FnOnce(&[u8]) -> T) -> T {
                f(&self.to_le_bytes())
            }
        }
    };
}

impl_numeric_scalar_and_array!(i8, Int8, Int8Array);
impl_numeric_scalar_and_array!(u8, Uint8, Uint8Array);
impl_numeric_scalar_and_array!(i16, Int16, Int16Array);
impl_numeric_scalar_and_array!(u16, Uint16, Uint16Array);
impl_numeric_scalar_and_array!(i32, Int32, Int32Array);
impl_numeric_scalar_and_array!(u32, Uint32, Uint32Array);
impl_numeric_scalar_and_array!(i64, Int64, Int64Array);
impl_numeric_scalar_and_array!(u64, Uint64, Uint64Array);
impl_numeric_scalar_and_array!(f32, Float, FloatArray);
impl_numeric_scalar_and_array!(f64, Double, DoubleArray);

impl OmFileScalarDataType for String {
    const DATA_TYPE_SCALAR: DataType = DataType::String;

    fn from_raw_bytes(bytes: &[u8]) -> Self {
        String::from_utf8_lossy(bytes).into_owned()
    }

    fn with_raw_bytes<T>(&self, f: impl FnOnce(&[u8]) -> T) -> T {
        f(self.as_bytes())
    }
}
