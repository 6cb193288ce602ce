//! The fixed file preamble: a 2-byte magic plus a version byte. Versions 1
//! and 2 are the legacy single-array format this crate still reads
//! (mirroring `OmFileReader::new`'s version branch in the teacher); version
//! 3 is the tree-of-variables container this crate writes.

use crate::compression::CompressionType;
use crate::errors::{OmFilesError, Result};

pub const MAGIC_NUMBER_1: u8 = b'O';
pub const MAGIC_NUMBER_2: u8 = b'M';
pub const CURRENT_VERSION: u8 = 3;

pub const PREAMBLE_LENGTH: usize = 3;
pub const LEGACY_HEADER_LENGTH: usize = 40;

/// A fully parsed version-1/2 header: a single 2-D `f32` array with no
/// name and no children.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyHeader {
    pub compression: CompressionType,
    pub scale_factor: f32,
    pub dim0: u64,
    pub dim1: u64,
    pub chunk0: u64,
    pub chunk1: u64,
}

impl LegacyHeader {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < LEGACY_HEADER_LENGTH {
            return Err(OmFilesError::NotAnOmFile);
        }
        Ok(Self {
            compression: CompressionType::try_from(bytes[3])?,
            scale_factor: f32::from_le_bytes(bytes[4..8].try_into().unwrap()),
            dim0: u64::from_le_bytes(bytes[8..16].try_into().unwrap()),
            dim1: u64::from_le_bytes(bytes[16..24].try_into().unwrap()),
            chunk0: u64::from_le_bytes(bytes[24..32].try_into().unwrap()),
            chunk1: u64::from_le_bytes(bytes[32..40].try_into().unwrap()),
        })
    }
}

/// The two shapes a file's opening bytes can take.
#[derive(Debug, Clone, PartialEq)]
pub enum Header {
    Legacy(LegacyHeader),
    /// Version 3; the rest of the file is a variable-record tree plus a trailer.
    Current,
}

/// Classify the first [`PREAMBLE_LENGTH`] bytes of a file and, for the
/// legacy form, parse the header that follows immediately after.
pub fn read_header(preamble_and_body: &[u8]) -> Result<Header> {
    if preamble_and_body.len() < PREAMBLE_LENGTH
        || preamble_and_body[0] != MAGIC_NUMBER_1
        || preamble_and_body[1] != MAGIC_NUMBER_2
    {
        return Err(OmFilesError::NotAnOmFile);
    }
    match preamble_and_body[2] {
        1 | 2 => Ok(Header::Legacy(LegacyHeader::from_bytes(preamble_and_body)?)),
        3 => Ok(Header::Current),
        other => Err(OmFilesError::InvalidArgument(format!(
            "unsupported om file version {}",
            other
        ))),
    }
}

/// Write the 3-byte preamble for a newly created file. This crate only
/// ever writes the current version.
pub fn write_preamble(dst: &mut [u8; PREAMBLE_LENGTH]) {
    dst[0] = MAGIC_NUMBER_1;
    dst[1] = MAGIC_NUMBER_2;
    dst[2] = CURRENT_VERSION;
}
