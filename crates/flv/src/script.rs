use std::io::{Read, Seek};

use amf0::{Amf0Decoder, Amf0Marker, Amf0Value};
use bytes::Bytes;
use bytes_util::ReadPrimitivesExt;
use tracing::debug;

use crate::conformance::Conformance;
use crate::error::FlvError;

/// Name of the script tag carrying the file metadata.
pub const ON_META_DATA: &str = "onMetaData";

/// FLV Tag ScriptData
///
/// A script data variable: a name and one AMF0 value.
///
/// Defined by:
/// - video_file_format_spec_v10.pdf (Chapter 1 - The FLV File Format - Data tags)
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptTagBody {
    /// The name of the script data
    pub name: Bytes,
    /// The value of the script data
    pub variable: Amf0Value,
}

impl ScriptTagBody {
    pub fn new(name: impl Into<Bytes>, variable: Amf0Value) -> Self {
        Self {
            name: name.into(),
            variable,
        }
    }

    /// Parses the script payload. The reader must be at the start of the
    /// payload, `payload_end` is the absolute position right after it.
    ///
    /// Some producers end the metadata object at the declared tag size without
    /// the required end marker. Lenient parsing accepts this by bounding the
    /// value at `payload_end`. Strict parsing demands the marker.
    pub fn parse<R: Read + Seek>(
        reader: &mut R,
        conformance: &mut Conformance,
        payload_end: u64,
    ) -> Result<Self, FlvError> {
        let value_type = reader.read_ui8()?;
        conformance.ensure(value_type, Amf0Marker::String as u8, || {
            "The name of a script tag is not a string".to_string()
        })?;

        let max_offset = if conformance.is_strict() {
            None
        } else {
            Some(payload_end)
        };
        debug!(?max_offset, "Decoding script data variable");

        let mut decoder = Amf0Decoder::new(&mut *reader);
        let (name, variable) = decoder.decode_named_value(max_offset)?;
        let position = decoder.position()?;

        debug!(
            "A script tag with a name of {} and value of {:?}",
            String::from_utf8_lossy(&name),
            variable
        );

        conformance.ensure(position, payload_end, || {
            format!(
                "Script data ends at 0x{:08X}, the tag payload ends at 0x{:08X}",
                position, payload_end
            )
        })?;

        Ok(ScriptTagBody { name, variable })
    }

    /// The name as text, if it is valid UTF-8.
    pub fn name_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.name).ok()
    }

    pub fn is_metadata(&self) -> bool {
        self.name.as_ref() == ON_META_DATA.as_bytes()
    }
}
