//! Top-level writer facade: wires the header, one or more array/scalar
//! variable records, and the trailer onto a [`BufferedWriter`]. Mirrors the
//! shape of the teacher's `OmFileWriter`/`OmFileWriter2`, generalized from a
//! single rank-2 array to an arbitrary tree of named variables.

use crate::array_codec::ArrayCodec;
use crate::backend::traits::OmFileWriterBackend;
use crate::buffered_writer::BufferedWriter;
use crate::compression::CompressionType;
use crate::data_type::OmFileScalarDataType;
use crate::defaults::{ARRAY_RECORD_ALIGNMENT, SCALAR_RECORD_ALIGNMENT};
use crate::dimensions::Dimensions;
use crate::encoder::ArrayEncoder;
use crate::errors::Result;
use crate::header;
use crate::lut::{compress_lut, lut_bound};
use crate::trailer;
use crate::variable::{ArrayMeta, OmOffsetSize, VariablePayload, VariableRecord};

pub struct Writer<Backend: OmFileWriterBackend> {
    writer: BufferedWriter<Backend>,
}

impl<Backend: OmFileWriterBackend> Writer<Backend> {
    /// `initial_capacity` sizes the internal scratch buffer; it grows as needed.
    pub fn new(backend: Backend, initial_capacity: usize) -> Result<Self> {
        let mut writer = BufferedWriter::new(backend, initial_capacity);
        let mut preamble = [0u8; header::PREAMBLE_LENGTH];
        header::write_preamble(&mut preamble);
        writer.write(&preamble)?;
        Ok(Self { writer })
    }

    /// Begin writing one array variable's chunk data; feed it through
    /// [`ArrayEncoder::write_data`] (against `self.raw_writer()`), then pass
    /// the result to [`Writer::finish_array`].
    pub fn prepare_array<T: ArrayCodec>(
        &mut self,
        dims: Dimensions,
        compression: CompressionType,
        scale_factor: f32,
        add_offset: f32,
    ) -> Result<ArrayEncoder<T>> {
        ArrayEncoder::new(dims, compression, scale_factor, add_offset, self.writer.total_bytes_written())
    }

    /// The buffered writer chunk data is streamed into via
    /// [`ArrayEncoder::write_data`].
    pub fn raw_writer(&mut self) -> &mut BufferedWriter<Backend> {
        &mut self.writer
    }

    /// Finalize an array encoder: emit its compressed LUT, then its
    /// variable record, and return a pointer to that record so the caller
    /// can list it as another variable's child (or as the file's root).
    pub fn finish_array<T: ArrayCodec>(
        &mut self,
        name: &str,
        encoder: ArrayEncoder<T>,
        children: Vec<OmOffsetSize>,
    ) -> Result<OmOffsetSize> {
        let finalised = encoder.finalise()?;
        let data_offset = *finalised.lut.first().unwrap();

        self.writer.align(8)?;
        let lut_offset = self.writer.total_bytes_written();
        self.writer.reallocate(lut_bound(finalised.lut.len()))?;
        let compressed = compress_lut(&finalised.lut);
        self.writer.write(&compressed.bytes)?;
        let lut_size = compressed.bytes.len() as u64;

        let record = VariableRecord {
            name: name.to_string(),
            payload: VariablePayload::Array(ArrayMeta {
                data_type: T::DATA_TYPE_ARRAY,
                dimensions: finalised.dims.dimensions,
                chunks: finalised.dims.chunks,
                compression: finalised.compression,
                scale_factor: finalised.scale_factor,
                add_offset: finalised.add_offset,
                lut_offset,
                lut_size,
                data_offset,
                lut_is_raw: false,
            }),
            children,
        };
        self.write_record(record, ARRAY_RECORD_ALIGNMENT)
    }

    /// Write one scalar variable's record and return a pointer to it.
    pub fn write_scalar<T: OmFileScalarDataType>(
        &mut self,
        name: &str,
        value: &T,
        children: Vec<OmOffsetSize>,
    ) -> Result<OmOffsetSize> {
        let raw = value.with_raw_bytes(|b| b.to_vec());
        let record = VariableRecord {
            name: name.to_string(),
            payload: VariablePayload::Scalar {
                data_type: T::DATA_TYPE_SCALAR,
                raw,
            },
            children,
        };
        self.write_record(record, SCALAR_RECORD_ALIGNMENT)
    }

    fn write_record(&mut self, record: VariableRecord, align: usize) -> Result<OmOffsetSize> {
        let bytes = record.encode()?;
        self.writer.align(align)?;
        let offset = self.writer.total_bytes_written();
        self.writer.write(&bytes)?;
        Ok(OmOffsetSize {
            offset,
            size: bytes.len() as u64,
        })
    }

    /// Write the trailer pointing at `root` and flush everything to the backend.
    pub fn finish(mut self, root: OmOffsetSize) -> Result<Backend> {
        let trailer_bytes = trailer::encode_trailer(root);
        self.writer.write(&trailer_bytes)?;
        self.writer.finish()
    }
}
