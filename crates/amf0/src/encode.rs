use std::collections::HashMap;
use std::io;

use bytes_util::WritePrimitivesExt;

use super::define::{Amf0Marker, MAX_NESTING_DEPTH};
use super::{Amf0Array, Amf0Date, Amf0Object, Amf0Value, Amf0WriteError};

/// AMF0 encoder.
///
/// Allows for encoding an AMF0 value to some writer. Containers are tracked by
/// identity: the first time an object, ECMA array or strict array handle is
/// seen it is assigned the next reference index (starting at 0, depth first),
/// and every later occurrence of the same handle is written as a `Reference`.
///
/// The reference table lives as long as the encoder, so use one encoder per
/// top-level value. The associated functions [`Amf0Encoder::encode`] and
/// [`Amf0Encoder::encode_to_vec`] do that for you.
#[derive(Debug, Default)]
pub struct Amf0Encoder {
    references: HashMap<usize, u16>,
    depth: usize,
}

impl Amf0Encoder {
    /// Creates an encoder with an empty reference table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode a top-level value with a fresh reference table.
    pub fn encode(writer: &mut impl io::Write, value: &Amf0Value) -> Result<(), Amf0WriteError> {
        Self::new().encode_value(writer, value)
    }

    /// Encode a top-level value into a new buffer.
    pub fn encode_to_vec(value: &Amf0Value) -> Result<Vec<u8>, Amf0WriteError> {
        let mut buf = Vec::new();
        Self::encode(&mut buf, value)?;
        Ok(buf)
    }

    /// Encode a script data variable: the name as a short string payload
    /// followed by the value, with a fresh reference table.
    pub fn encode_named_value(
        writer: &mut impl io::Write,
        name: &[u8],
        value: &Amf0Value,
    ) -> Result<(), Amf0WriteError> {
        Self::write_string(writer, name)?;
        Self::encode(writer, value)
    }

    /// Encode a generic AMF0 value, sharing this encoder's reference table.
    ///
    /// Fails with [`Amf0WriteError::NestingTooDeep`] if containers are nested
    /// more than [`MAX_NESTING_DEPTH`] levels deep.
    pub fn encode_value(
        &mut self,
        writer: &mut impl io::Write,
        value: &Amf0Value,
    ) -> Result<(), Amf0WriteError> {
        match value {
            Amf0Value::Number(val) => Self::encode_number(writer, *val),
            Amf0Value::Boolean(val) => Self::encode_bool(writer, *val),
            Amf0Value::String(val) => Self::encode_string(writer, val),
            Amf0Value::Null => Self::encode_null(writer),
            Amf0Value::Undefined => Self::encode_undefined(writer),
            Amf0Value::Reference(index) => Self::encode_reference(writer, *index),
            Amf0Value::Date(val) => Self::encode_date(writer, val),
            Amf0Value::MovieClip(path) => Self::encode_movie_clip(writer, path),
            Amf0Value::Object(val) => self.nested(|e| e.encode_object(writer, val)),
            Amf0Value::EcmaArray(val) => self.nested(|e| e.encode_ecma_array(writer, val)),
            Amf0Value::StrictArray(val) => self.nested(|e| e.encode_strict_array(writer, val)),
        }
    }

    /// Write object end marker to signify the end of an AMF0 object
    pub fn object_eof(writer: &mut impl io::Write) -> Result<(), Amf0WriteError> {
        writer.write_ui16(0)?;
        writer.write_ui8(Amf0Marker::ObjectEnd as u8)?;
        Ok(())
    }

    /// Encode an AMF0 number
    pub fn encode_number(writer: &mut impl io::Write, value: f64) -> Result<(), Amf0WriteError> {
        writer.write_ui8(Amf0Marker::Number as u8)?;
        writer.write_double(value)?;
        Ok(())
    }

    /// Encode an AMF0 boolean
    pub fn encode_bool(writer: &mut impl io::Write, value: bool) -> Result<(), Amf0WriteError> {
        writer.write_ui8(Amf0Marker::Boolean as u8)?;
        writer.write_ui8(value as u8)?;
        Ok(())
    }

    /// Encode an AMF0 string. Always uses the short string form.
    pub fn encode_string(writer: &mut impl io::Write, value: &[u8]) -> Result<(), Amf0WriteError> {
        if value.len() > u16::MAX as usize {
            return Err(Amf0WriteError::StringTooLong(value.len()));
        }

        writer.write_ui8(Amf0Marker::String as u8)?;
        Self::write_string(writer, value)
    }

    /// Write a u16-length-prefixed string payload without a marker, as used
    /// for object keys and script data variable names.
    pub fn write_string(writer: &mut impl io::Write, value: &[u8]) -> Result<(), Amf0WriteError> {
        let len =
            u16::try_from(value.len()).map_err(|_| Amf0WriteError::StringTooLong(value.len()))?;
        writer.write_ui16(len)?;
        writer.write_all(value)?;
        Ok(())
    }

    /// Write a u32-length-prefixed string payload without a marker.
    pub fn write_long_string(
        writer: &mut impl io::Write,
        value: &[u8],
    ) -> Result<(), Amf0WriteError> {
        let len = u32::try_from(value.len())
            .map_err(|_| Amf0WriteError::LongStringTooLong(value.len()))?;
        writer.write_ui32(len)?;
        writer.write_all(value)?;
        Ok(())
    }

    /// Encode an AMF0 null
    pub fn encode_null(writer: &mut impl io::Write) -> Result<(), Amf0WriteError> {
        writer.write_ui8(Amf0Marker::Null as u8)?;
        Ok(())
    }

    /// Encode an AMF0 undefined
    pub fn encode_undefined(writer: &mut impl io::Write) -> Result<(), Amf0WriteError> {
        writer.write_ui8(Amf0Marker::Undefined as u8)?;
        Ok(())
    }

    /// Encode an AMF0 reference
    pub fn encode_reference(writer: &mut impl io::Write, index: u16) -> Result<(), Amf0WriteError> {
        writer.write_ui8(Amf0Marker::Reference as u8)?;
        writer.write_ui16(index)?;
        Ok(())
    }

    /// Encode an AMF0 date with its own timezone offset
    pub fn encode_date(
        writer: &mut impl io::Write,
        value: &Amf0Date,
    ) -> Result<(), Amf0WriteError> {
        writer.write_ui8(Amf0Marker::Date as u8)?;
        writer.write_double(value.millis)?;
        writer.write_si16(value.timezone_offset)?;
        Ok(())
    }

    /// Encode a movie clip path
    pub fn encode_movie_clip(
        writer: &mut impl io::Write,
        path: &[u8],
    ) -> Result<(), Amf0WriteError> {
        writer.write_ui8(Amf0Marker::MovieClip as u8)?;
        Self::write_string(writer, path)
    }

    /// Encode an AMF0 object
    pub fn encode_object(
        &mut self,
        writer: &mut impl io::Write,
        object: &Amf0Object,
    ) -> Result<(), Amf0WriteError> {
        if self.encode_seen(writer, object.id())? {
            return Ok(());
        }

        writer.write_ui8(Amf0Marker::Object as u8)?;
        self.write_properties(writer, object)
    }

    /// Encode an AMF0 ECMA array. The count written is the number of entries.
    pub fn encode_ecma_array(
        &mut self,
        writer: &mut impl io::Write,
        object: &Amf0Object,
    ) -> Result<(), Amf0WriteError> {
        if self.encode_seen(writer, object.id())? {
            return Ok(());
        }

        let len = object.len();
        writer.write_ui8(Amf0Marker::EcmaArray as u8)?;
        writer.write_ui32(u32::try_from(len).map_err(|_| Amf0WriteError::ArrayTooLong(len))?)?;
        self.write_properties(writer, object)
    }

    /// Encode an AMF0 strict array
    pub fn encode_strict_array(
        &mut self,
        writer: &mut impl io::Write,
        array: &Amf0Array,
    ) -> Result<(), Amf0WriteError> {
        if self.encode_seen(writer, array.id())? {
            return Ok(());
        }

        let values = array.borrow();
        let len = values.len();
        writer.write_ui8(Amf0Marker::StrictArray as u8)?;
        writer.write_ui32(u32::try_from(len).map_err(|_| Amf0WriteError::ArrayTooLong(len))?)?;
        for value in values.iter() {
            self.encode_value(writer, value)?;
        }
        Ok(())
    }

    fn write_properties(
        &mut self,
        writer: &mut impl io::Write,
        object: &Amf0Object,
    ) -> Result<(), Amf0WriteError> {
        let properties = object.borrow();
        for (key, value) in properties.iter() {
            Self::write_string(writer, key)?;
            self.encode_value(writer, value)?;
        }

        Self::object_eof(writer)
    }

    fn nested(
        &mut self,
        write: impl FnOnce(&mut Self) -> Result<(), Amf0WriteError>,
    ) -> Result<(), Amf0WriteError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(Amf0WriteError::NestingTooDeep);
        }

        self.depth += 1;
        let result = write(self);
        self.depth -= 1;
        result
    }

    /// Writes a reference if the container was already visited, otherwise
    /// assigns it the next index. Returns true if a reference was written.
    fn encode_seen(
        &mut self,
        writer: &mut impl io::Write,
        id: usize,
    ) -> Result<bool, Amf0WriteError> {
        if let Some(&index) = self.references.get(&id) {
            Self::encode_reference(writer, index)?;
            return Ok(true);
        }

        let index = u16::try_from(self.references.len())
            .map_err(|_| Amf0WriteError::TooManyReferences)?;
        self.references.insert(id, index);
        Ok(false)
    }
}
