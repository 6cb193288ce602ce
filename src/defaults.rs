//! Ambient defaults, mirroring the teacher's `core/c_defaults.rs` role but
//! holding plain constants instead of zeroed FFI structs.

/// Below this gap (in bytes) between two candidate reads, merge them into one
/// backend call instead of issuing two.
pub const IO_SIZE_MERGE: u64 = 512;

/// Above this size (in bytes), split an emitted read range on a chunk/group
/// boundary rather than issuing one oversized backend call.
pub const IO_SIZE_MAX: u64 = 65_536;

/// Number of LUT offsets bit-packed together into one independently
/// seekable group.
pub const LUT_CHUNK_ELEMENT_COUNT: u64 = 256;

/// Alignment (bytes) scalar variable records are padded to.
pub const SCALAR_RECORD_ALIGNMENT: usize = 8;

/// Alignment (bytes) array variable records are padded to.
pub const ARRAY_RECORD_ALIGNMENT: usize = 64;
