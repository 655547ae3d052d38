//! # FLV Writer Module
//!
//! Byte-exact construction of FLV headers and tags.
//!
//! The `build_*` functions return complete byte sequences, ready to be spliced
//! into an existing file. [`FlvWriter`] wraps an output and writes the same
//! structures in order.
//!
//! ## Usage
//!
//! ```
//! use amf0::Amf0Value;
//! use flv::writer::FlvWriter;
//!
//! fn main() -> Result<(), flv::error::FlvError> {
//!     let mut writer = FlvWriter::new(Vec::new());
//!     writer.write_header(true, true)?;
//!
//!     let metadata = Amf0Value::ecma_array([("duration", 60.0), ("width", 1280.0)]);
//!     writer.write_script_tag("onMetaData", &metadata, 0)?;
//!
//!     let output = writer.into_inner();
//!     assert_eq!(&output[..3], b"FLV");
//!     Ok(())
//! }
//! ```

use std::io::{self, Read, Seek, SeekFrom, Write};

use amf0::{Amf0Encoder, Amf0Marker, Amf0Value};
use bytes_util::{UI24_MAX, WritePrimitivesExt};
use tracing::debug;

use crate::error::FlvError;
use crate::header::FlvHeader;
use crate::tag::{FlvTag, FlvTagType, TAG_HEADER_SIZE};

/// Builds a complete tag: header, payload and the trailing PreviousTagSize.
///
/// Fails if the payload does not fit the 24-bit size field.
pub fn build_raw_tag(
    tag_type: FlvTagType,
    payload: &[u8],
    timestamp: i32,
) -> Result<Vec<u8>, FlvError> {
    let mut buf = Vec::with_capacity(payload.len() + (TAG_HEADER_SIZE + 4) as usize);
    write_raw_tag(&mut buf, tag_type, payload, timestamp)?;
    Ok(buf)
}

/// Builds a script tag holding `name` and `value`.
pub fn build_script_tag(
    name: &str,
    value: &Amf0Value,
    timestamp: i32,
) -> Result<Vec<u8>, FlvError> {
    let payload = script_payload(name, value)?;
    build_raw_tag(FlvTagType::ScriptData, &payload, timestamp)
}

/// Builds a version 1 file header of the standard size, followed by the
/// zero PreviousTagSize0.
pub fn build_file_header(has_audio: bool, has_video: bool) -> Vec<u8> {
    FlvHeader::new(has_audio, has_video).to_bytes()
}

fn script_payload(name: &str, value: &Amf0Value) -> Result<Vec<u8>, FlvError> {
    let mut payload = vec![Amf0Marker::String as u8];
    Amf0Encoder::encode_named_value(&mut payload, name.as_bytes(), value)?;
    Ok(payload)
}

fn write_tag_header<W: Write>(
    writer: &mut W,
    tag_type: u8,
    data_size: u32,
    timestamp: i32,
) -> io::Result<()> {
    writer.write_ui8(tag_type)?;
    writer.write_ui24(data_size)?;
    writer.write_si32_extended(timestamp)?;
    // StreamID, always 0
    writer.write_ui24(0)?;
    Ok(())
}

fn write_raw_tag<W: Write>(
    writer: &mut W,
    tag_type: FlvTagType,
    payload: &[u8],
    timestamp: i32,
) -> Result<u32, FlvError> {
    let data_size = u32::try_from(payload.len())
        .ok()
        .filter(|size| *size <= UI24_MAX)
        .ok_or_else(|| {
            FlvError::MalformedContainer(format!(
                "Tag payload of {} bytes does not fit in a tag",
                payload.len()
            ))
        })?;

    write_tag_header(writer, tag_type.into(), data_size, timestamp)?;
    writer.write_all(payload)?;

    let tag_size = data_size + TAG_HEADER_SIZE;
    writer.write_ui32(tag_size)?;
    Ok(tag_size)
}

/// Copies `tag` from `source` to `out` with `timestamp` replacing the original
/// one. Size, stream id, payload and trailer are copied verbatim.
pub fn write_retimestamped_tag<R, W>(
    source: &mut R,
    out: &mut W,
    tag: &FlvTag,
    timestamp: i32,
) -> Result<(), FlvError>
where
    R: Read + Seek,
    W: Write,
{
    debug!(
        offset = tag.offset,
        from = tag.timestamp,
        to = timestamp,
        "Rewriting tag timestamp"
    );

    out.write_ui8(tag.tag_type().into())?;
    out.write_ui24(tag.size)?;
    out.write_si32_extended(timestamp)?;

    // Skip type (1), size (3) and timestamp (4), copy the stream id (3),
    // the payload and the trailer (4).
    source.seek(SeekFrom::Start(tag.offset + 8))?;
    let remaining = tag.size as u64 + 7;
    let copied = io::copy(&mut source.by_ref().take(remaining), out)?;
    if copied < remaining {
        return Err(FlvError::EndOfInput);
    }

    Ok(())
}

/// Sequential FLV writer.
#[derive(Debug)]
pub struct FlvWriter<W: Write> {
    writer: W,
    previous_tag_size: u32,
}

impl<W: Write> FlvWriter<W> {
    /// Creates a new FLV writer with the specified output writer
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            previous_tag_size: 0,
        }
    }

    pub fn write_header(&mut self, has_audio: bool, has_video: bool) -> Result<(), FlvError> {
        FlvHeader::new(has_audio, has_video).write_to(&mut self.writer)?;
        self.previous_tag_size = 0;
        Ok(())
    }

    /// Writes a tag with an opaque payload.
    pub fn write_tag(
        &mut self,
        tag_type: FlvTagType,
        payload: &[u8],
        timestamp: i32,
    ) -> Result<(), FlvError> {
        self.previous_tag_size = write_raw_tag(&mut self.writer, tag_type, payload, timestamp)?;
        Ok(())
    }

    /// Writes a script tag (metadata) to the output
    pub fn write_script_tag(
        &mut self,
        name: &str,
        value: &Amf0Value,
        timestamp: i32,
    ) -> Result<(), FlvError> {
        let payload = script_payload(name, value)?;
        self.write_tag(FlvTagType::ScriptData, &payload, timestamp)
    }

    /// Copies a parsed tag from `source` with a new timestamp.
    pub fn write_retimestamped_tag<R: Read + Seek>(
        &mut self,
        source: &mut R,
        tag: &FlvTag,
        timestamp: i32,
    ) -> Result<(), FlvError> {
        write_retimestamped_tag(source, &mut self.writer, tag, timestamp)?;
        self.previous_tag_size = tag.tag_size();
        Ok(())
    }

    /// The PreviousTagSize value written last.
    pub fn previous_tag_size(&self) -> u32 {
        self.previous_tag_size
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Consumes the `FlvWriter`, returning the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
