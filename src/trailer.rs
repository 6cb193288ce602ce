//! The file trailer: a fixed 16-byte footer giving the offset and size of
//! the root variable record, the entry point into the tree. Mirrors the
//! teacher's v3 layout of a fixed-size pointer as the last bytes of the
//! file (there it points at a JSON blob; here it points at the root
//! `VariableRecord`).

use byteorder::{ByteOrder, LittleEndian};

use crate::errors::{OmFilesError, Result};
use crate::variable::OmOffsetSize;

pub const TRAILER_LENGTH: usize = 16;

pub fn encode_trailer(root: OmOffsetSize) -> [u8; TRAILER_LENGTH] {
    let mut bytes = [0u8; TRAILER_LENGTH];
    LittleEndian::write_u64(&mut bytes[0..8], root.offset);
    LittleEndian::write_u64(&mut bytes[8..16], root.size);
    bytes
}

pub fn read_trailer(last_bytes: &[u8]) -> Result<OmOffsetSize> {
    if last_bytes.len() < TRAILER_LENGTH {
        return Err(OmFilesError::NotAnOmFile);
    }
    let start = last_bytes.len() - TRAILER_LENGTH;
    let tail = &last_bytes[start..];
    Ok(OmOffsetSize {
        offset: LittleEndian::read_u64(&tail[0..8]),
        size: LittleEndian::read_u64(&tail[8..16]),
    })
}
