//! On-disk variable records: the node type of the variable tree. Every
//! variable — scalar or array — is one record with a name, a payload, and a
//! list of child pointers (`OmOffsetSize`), giving the format its tree
//! structure (`spec.md` §3, §4.4).

use byteorder::{ByteOrder, LittleEndian};

use crate::compression::CompressionType;
use crate::data_type::DataType;
use crate::defaults::{ARRAY_RECORD_ALIGNMENT, SCALAR_RECORD_ALIGNMENT};
use crate::errors::{OmFilesError, Result};

/// Absolute byte offset and size of a child's record within the file,
/// mirroring the teacher's `io::writer::OmOffsetSize`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OmOffsetSize {
    pub offset: u64,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct ArrayMeta {
    pub data_type: DataType,
    pub dimensions: Vec<u64>,
    pub chunks: Vec<u64>,
    pub compression: CompressionType,
    pub scale_factor: f32,
    pub add_offset: f32,
    /// Where the compressed LUT for this array starts/how large it is.
    pub lut_offset: u64,
    pub lut_size: u64,
    /// Where this array's compressed chunk data section starts.
    pub data_offset: u64,
    /// `true` only for a legacy-header array synthesized by `crate::reader`:
    /// its LUT is a plain table of absolute `u64` offsets rather than the
    /// grouped, PForDelta-packed form `crate::lut` produces. Never set for
    /// a record that came off disk via `decode`, since this crate never
    /// writes the legacy form.
    pub lut_is_raw: bool,
}

#[derive(Debug, Clone)]
pub enum VariablePayload {
    Scalar { data_type: DataType, raw: Vec<u8> },
    Array(ArrayMeta),
}

/// One node of the variable tree.
#[derive(Debug, Clone)]
pub struct VariableRecord {
    pub name: String,
    pub payload: VariablePayload,
    pub children: Vec<OmOffsetSize>,
}

const KIND_SCALAR: u8 = 0;
const KIND_ARRAY: u8 = 1;

impl VariableRecord {
    pub fn record_alignment(&self) -> usize {
        match &self.payload {
            VariablePayload::Scalar { .. } => SCALAR_RECORD_ALIGNMENT,
            VariablePayload::Array(_) => ARRAY_RECORD_ALIGNMENT,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        if self.name.len() > u16::MAX as usize {
            return Err(OmFilesError::NameTooLong(self.name.len()));
        }
        let mut buf = Vec::new();
        push_u16(&mut buf, self.name.len() as u16);
        buf.extend_from_slice(self.name.as_bytes());

        match &self.payload {
            VariablePayload::Scalar { data_type, raw } => {
                buf.push(KIND_SCALAR);
                buf.push(*data_type as u8);
                push_u32(&mut buf, raw.len() as u32);
                buf.extend_from_slice(raw);
            }
            VariablePayload::Array(meta) => {
                buf.push(KIND_ARRAY);
                buf.push(meta.data_type as u8);
                buf.push(meta.compression.to_u8());
                buf.push(meta.dimensions.len() as u8);
                for d in &meta.dimensions {
                    push_u64(&mut buf, *d);
                }
                for c in &meta.chunks {
                    push_u64(&mut buf, *c);
                }
                push_f32(&mut buf, meta.scale_factor);
                push_f32(&mut buf, meta.add_offset);
                push_u64(&mut buf, meta.lut_offset);
                push_u64(&mut buf, meta.lut_size);
                push_u64(&mut buf, meta.data_offset);
            }
        }

        push_u32(&mut buf, self.children.len() as u32);
        for child in &self.children {
            push_u64(&mut buf, child.offset);
            push_u64(&mut buf, child.size);
        }
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut cur = Cursor { bytes, pos: 0 };
        let name_len = cur.read_u16()? as usize;
        let name = String::from_utf8_lossy(cur.read_bytes(name_len)?).into_owned();

        let kind = cur.read_u8()?;
        let payload = match kind {
            KIND_SCALAR => {
                let data_type = DataType::try_from(cur.read_u8()?)?;
                let len = cur.read_u32()? as usize;
                let raw = cur.read_bytes(len)?.to_vec();
                VariablePayload::Scalar { data_type, raw }
            }
            KIND_ARRAY => {
                let data_type = DataType::try_from(cur.read_u8()?)?;
                let compression = CompressionType::try_from(cur.read_u8()?)?;
                let rank = cur.read_u8()? as usize;
                let dimensions = (0..rank).map(|_| cur.read_u64()).collect::<Result<_>>()?;
                let chunks = (0..rank).map(|_| cur.read_u64()).collect::<Result<_>>()?;
                let scale_factor = cur.read_f32()?;
                let add_offset = cur.read_f32()?;
                let lut_offset = cur.read_u64()?;
                let lut_size = cur.read_u64()?;
                let data_offset = cur.read_u64()?;
                VariablePayload::Array(ArrayMeta {
                    data_type,
                    dimensions,
                    chunks,
                    compression,
                    scale_factor,
                    add_offset,
                    lut_offset,
                    lut_size,
                    data_offset,
                    lut_is_raw: false,
                })
            }
            _ => return Err(OmFilesError::InvalidArgument(format!("unknown variable kind {}", kind))),
        };

        let children_count = cur.read_u32()? as usize;
        let mut children = Vec::with_capacity(children_count);
        for _ in 0..children_count {
            let offset = cur.read_u64()?;
            let size = cur.read_u64()?;
            children.push(OmOffsetSize { offset, size });
        }

        Ok(Self { name, payload, children })
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.bytes.len() {
            return Err(OmFilesError::NotAnOmFile);
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.read_bytes(2)?))
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    fn read_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    fn read_f32(&mut self) -> Result<f32> {
        Ok(LittleEndian::read_f32(self.read_bytes(4)?))
    }
}

fn push_u16(buf: &mut Vec<u8>, v: u16) {
    let mut tmp = [0u8; 2];
    LittleEndian::write_u16(&mut tmp, v);
    buf.extend_from_slice(&tmp);
}

fn push_u32(buf: &mut Vec<u8>, v: u32) {
    let mut tmp = [0u8; 4];
    LittleEndian::write_u32(&mut tmp, v);
    buf.extend_from_slice(&tmp);
}

fn push_u64(buf: &mut Vec<u8>, v: u64) {
    let mut tmp = [0u8; 8];
    LittleEndian::write_u64(&mut tmp, v);
    buf.extend_from_slice(&tmp);
}

fn push_f32(buf: &mut Vec<u8>, v: f32) {
    let mut tmp = [0u8; 4];
    LittleEndian::write_f32(&mut tmp, v);
    buf.extend_from_slice(&tmp);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_record_roundtrips() {
        let record = VariableRecord {
            name: "greeting".to_string(),
            payload: VariablePayload::Scalar {
                data_type: DataType::String,
                raw: b"hello".to_vec(),
            },
            children: vec![],
        };
        let bytes = record.encode().unwrap();
        let decoded = VariableRecord::decode(&bytes).unwrap();
        assert_eq!(decoded.name, "greeting");
        match decoded.payload {
            VariablePayload::Scalar { data_type, raw } => {
                assert_eq!(data_type, DataType::String);
                assert_eq!(raw, b"hello");
            }
            _ => panic!("expected scalar"),
        }
    }

    #[test]
    fn array_record_with_children_roundtrips() {
        let record = VariableRecord {
            name: "temperature".to_string(),
            payload: VariablePayload::Array(ArrayMeta {
                data_type: DataType::Float,
                dimensions: vec![5, 5],
                chunks: vec![2, 2],
                compression: CompressionType::PForDelta2DInt16,
                scale_factor: 100.0,
                add_offset: 0.0,
                lut_offset: 128,
                lut_size: 64,
                data_offset: 3,
                lut_is_raw: false,
            }),
            children: vec![
                OmOffsetSize { offset: 10, size: 20 },
                OmOffsetSize { offset: 30, size: 5 },
            ],
        };
        let bytes = record.encode().unwrap();
        let decoded = VariableRecord::decode(&bytes).unwrap();
        assert_eq!(decoded.name, "temperature");
        assert_eq!(decoded.children.len(), 2);
        match decoded.payload {
            VariablePayload::Array(meta) => {
                assert_eq!(meta.dimensions, vec![5, 5]);
                assert_eq!(meta.chunks, vec![2, 2]);
                assert_eq!(meta.compression, CompressionType::PForDelta2DInt16);
            }
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn truncated_bytes_are_rejected_not_panicked_on() {
        let record = VariableRecord {
            name: "x".to_string(),
            payload: VariablePayload::Scalar {
                data_type: DataType::Int32,
                raw: 42i32.to_le_bytes().to_vec(),
            },
            children: vec![],
        };
        let bytes = record.encode().unwrap();
        assert!(VariableRecord::decode(&bytes[..bytes.len() - 3]).is_err());
    }
}
