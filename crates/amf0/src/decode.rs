use std::io::{Read, Seek, SeekFrom};

use bytes::Bytes;
use bytes_util::ReadPrimitivesExt;
use num_traits::FromPrimitive;

use super::{
    Amf0Array, Amf0Date, Amf0Marker, Amf0Object, Amf0Properties, Amf0ReadError, Amf0Value,
    MAX_NESTING_DEPTH,
};

/// An AMF0 Decoder.
///
/// This decoder reads script data values from any seekable reader, starting at
/// the reader's current position. Strings and keys are copied out of the
/// reader into [`Bytes`].
///
/// Containers may be nested at most [`MAX_NESTING_DEPTH`] levels deep.
pub struct Amf0Decoder<R> {
    reader: R,
    depth: usize,
}

impl<R: Read + Seek> Amf0Decoder<R> {
    /// Create a new AMF0 decoder.
    pub const fn new(reader: R) -> Self {
        Self { reader, depth: 0 }
    }

    /// Returns the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Returns a mutable reference to the underlying reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Current absolute position of the underlying reader.
    pub fn position(&mut self) -> Result<u64, Amf0ReadError> {
        Ok(self.reader.stream_position()?)
    }

    /// Read the next encoded value from the decoder.
    pub fn decode(&mut self) -> Result<Amf0Value, Amf0ReadError> {
        self.decode_value(None)
    }

    /// Read the next encoded value.
    ///
    /// `max_offset` is an absolute position at which an `Object` or
    /// `EcmaArray` body may end without the end marker. The bound is handed
    /// down to nested values, so every container open when the reader hits it
    /// ends there.
    pub fn decode_value(&mut self, max_offset: Option<u64>) -> Result<Amf0Value, Amf0ReadError> {
        let marker = self.reader.read_ui8()?;
        let marker = Amf0Marker::from_u8(marker).ok_or(Amf0ReadError::MalformedValue(marker))?;

        match marker {
            Amf0Marker::Number => Ok(Amf0Value::Number(self.read_number()?)),
            Amf0Marker::Boolean => Ok(Amf0Value::Boolean(self.read_bool()?)),
            Amf0Marker::String => Ok(Amf0Value::String(self.read_string()?)),
            Amf0Marker::Object => {
                let object = self.nested(|d| d.read_object(max_offset))?;
                Ok(Amf0Value::Object(object))
            }
            Amf0Marker::Null => Ok(Amf0Value::Null),
            Amf0Marker::Undefined => Ok(Amf0Value::Undefined),
            Amf0Marker::Reference => Ok(Amf0Value::Reference(self.read_reference()?)),
            Amf0Marker::EcmaArray => {
                let object = self.nested(|d| d.read_ecma_array(max_offset))?;
                Ok(Amf0Value::EcmaArray(object))
            }
            Amf0Marker::StrictArray => {
                let array = self.nested(|d| d.read_strict_array(max_offset))?;
                Ok(Amf0Value::StrictArray(array))
            }
            Amf0Marker::Date => Ok(Amf0Value::Date(self.read_date()?)),
            Amf0Marker::LongString => Ok(Amf0Value::String(self.read_long_string()?)),
            Amf0Marker::MovieClip => Ok(Amf0Value::MovieClip(self.read_movie_clip()?)),
            Amf0Marker::ObjectEnd => Err(Amf0ReadError::MalformedValue(marker as u8)),
        }
    }

    /// Read a script data variable: a short string name followed by a value.
    pub fn decode_named_value(
        &mut self,
        max_offset: Option<u64>,
    ) -> Result<(Bytes, Amf0Value), Amf0ReadError> {
        let name = self.read_string()?;
        let value = self.decode_value(max_offset)?;
        Ok((name, value))
    }

    /// Read a Number payload.
    pub fn read_number(&mut self) -> Result<f64, Amf0ReadError> {
        Ok(self.reader.read_double()?)
    }

    /// Read a Boolean payload. Any nonzero byte is true.
    pub fn read_bool(&mut self) -> Result<bool, Amf0ReadError> {
        Ok(self.reader.read_ui8()? != 0)
    }

    /// Read a u16-length-prefixed string payload.
    pub fn read_string(&mut self) -> Result<Bytes, Amf0ReadError> {
        let len = self.reader.read_ui16()?;
        self.read_bytes(len as u64)
    }

    /// Read a u32-length-prefixed string payload.
    pub fn read_long_string(&mut self) -> Result<Bytes, Amf0ReadError> {
        let len = self.reader.read_ui32()?;
        self.read_bytes(len as u64)
    }

    /// Read a Reference payload.
    pub fn read_reference(&mut self) -> Result<u16, Amf0ReadError> {
        Ok(self.reader.read_ui16()?)
    }

    /// Read a Date payload.
    pub fn read_date(&mut self) -> Result<Amf0Date, Amf0ReadError> {
        let millis = self.reader.read_double()?;
        let timezone_offset = self.reader.read_si16()?;
        Ok(Amf0Date::new(millis, timezone_offset))
    }

    /// Read a MovieClip payload.
    pub fn read_movie_clip(&mut self) -> Result<Bytes, Amf0ReadError> {
        self.read_string()
    }

    /// Read an Object body.
    pub fn read_object(&mut self, max_offset: Option<u64>) -> Result<Amf0Object, Amf0ReadError> {
        Ok(self.read_properties(max_offset)?.into())
    }

    /// Read an ECMA array body. The leading count is advisory and only
    /// compared against the number of decoded properties for diagnostics.
    pub fn read_ecma_array(
        &mut self,
        max_offset: Option<u64>,
    ) -> Result<Amf0Object, Amf0ReadError> {
        let count = self.reader.read_ui32()?;
        let properties = self.read_properties(max_offset)?;

        if properties.len() != count as usize {
            tracing::trace!(
                count,
                actual = properties.len(),
                "ECMA array count differs from its contents"
            );
        }

        Ok(properties.into())
    }

    /// Read a StrictArray body.
    pub fn read_strict_array(
        &mut self,
        max_offset: Option<u64>,
    ) -> Result<Amf0Array, Amf0ReadError> {
        let count = self.reader.read_ui32()?;

        // The count is untrusted, do not preallocate from it.
        let mut values = Vec::new();
        for _ in 0..count {
            values.push(self.decode_value(max_offset)?);
        }

        Ok(values.into())
    }

    fn nested<T>(
        &mut self,
        read: impl FnOnce(&mut Self) -> Result<T, Amf0ReadError>,
    ) -> Result<T, Amf0ReadError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(Amf0ReadError::NestingTooDeep);
        }

        self.depth += 1;
        let result = read(self);
        self.depth -= 1;
        result
    }

    fn read_bytes(&mut self, len: u64) -> Result<Bytes, Amf0ReadError> {
        let mut buf = Vec::new();
        let read = (&mut self.reader).take(len).read_to_end(&mut buf)?;
        if (read as u64) < len {
            return Err(Amf0ReadError::EndOfInput);
        }
        Ok(Bytes::from(buf))
    }

    fn read_properties(
        &mut self,
        max_offset: Option<u64>,
    ) -> Result<Amf0Properties, Amf0ReadError> {
        let mut properties = Amf0Properties::new();

        loop {
            if let Some(max_offset) = max_offset {
                if self.reader.stream_position()? == max_offset {
                    tracing::trace!(
                        max_offset,
                        "object ended at the size bound without an end marker"
                    );
                    break;
                }
            }

            let key = self.read_string()?;
            if key.is_empty() {
                if self.reader.read_ui8()? == Amf0Marker::ObjectEnd as u8 {
                    break;
                }
                self.reader.seek(SeekFrom::Current(-1))?;
            }

            let value = self.decode_value(max_offset)?;
            properties.insert(key, value);
        }

        Ok(properties)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn decoder(bytes: &[u8]) -> Amf0Decoder<Cursor<&[u8]>> {
        Amf0Decoder::new(Cursor::new(bytes))
    }

    #[test]
    fn test_decode_number() {
        let bytes = [0x00, 0x40, 0x1d, 0x99, 0x99, 0x99, 0x99, 0x99, 0x9a];
        let mut d = decoder(&bytes);
        assert_eq!(d.decode().unwrap(), Amf0Value::Number(7.4));
        assert_eq!(d.position().unwrap(), 9);
    }

    #[test]
    fn test_decode_boolean() {
        assert_eq!(decoder(&[0x01, 0x00]).decode().unwrap(), Amf0Value::Boolean(false));
        assert_eq!(decoder(&[0x01, 0x01]).decode().unwrap(), Amf0Value::Boolean(true));
        assert_eq!(decoder(&[0x01, 0x7f]).decode().unwrap(), Amf0Value::Boolean(true));
    }

    #[test]
    fn test_decode_string() {
        let mut bytes = vec![0x02, 0x00, 0x0b];
        bytes.extend_from_slice(b"test string");

        let value = decoder(&bytes).decode().unwrap();
        assert_eq!(value.as_str(), Some("test string"));

        // payload only, without the marker
        assert_eq!(decoder(&bytes[1..]).read_string().unwrap(), Bytes::from("test string"));
    }

    #[test]
    fn test_decode_string_arbitrary_octets() {
        let bytes = [0x02, 0x00, 0x03, 0xff, 0x00, 0xfe];
        let value = decoder(&bytes).decode().unwrap();
        assert_eq!(value, Amf0Value::String(Bytes::from_static(&[0xff, 0x00, 0xfe])));
    }

    #[test]
    fn test_decode_long_string() {
        let mut bytes = vec![0x0c, 0x00, 0x00, 0x00, 0x05];
        bytes.extend_from_slice(b"hello");
        assert_eq!(decoder(&bytes).decode().unwrap(), Amf0Value::from("hello"));
    }

    #[test]
    fn test_decode_string_truncated() {
        let bytes = [0x02, 0x00, 0x0b, b't', b'e'];
        let err = decoder(&bytes).decode().unwrap_err();
        assert!(matches!(err, Amf0ReadError::EndOfInput));
    }

    #[test]
    fn test_decode_null_undefined() {
        assert_eq!(decoder(&[0x05]).decode().unwrap(), Amf0Value::Null);
        assert_eq!(decoder(&[0x06]).decode().unwrap(), Amf0Value::Undefined);
    }

    #[test]
    fn test_decode_reference() {
        assert_eq!(decoder(&[0x07, 0x00, 0x01]).decode().unwrap(), Amf0Value::Reference(1));
    }

    #[test]
    fn test_decode_movie_clip() {
        let bytes = [0x0f, 0x00, 0x04, b'p', b'a', b't', b'h'];
        assert_eq!(
            decoder(&bytes).decode().unwrap(),
            Amf0Value::MovieClip(Bytes::from("path"))
        );
    }

    #[test]
    fn test_decode_date() {
        let bytes = [
            0x0b, // marker
            0x42, 0x5d, 0x2b, 0x75, 0x29, 0xaa, 0x00, 0x00, // millis
            0x00, 0x1e, // timezone
        ];
        let value = decoder(&bytes).decode().unwrap();
        assert_eq!(value, Amf0Value::Date(Amf0Date::new(501132601000.0, 30)));

        let Amf0Value::Date(date) = value else { unreachable!() };
        assert_eq!(
            date.to_datetime().unwrap().to_rfc3339(),
            "1985-11-18T04:00:01+00:30"
        );
    }

    #[test]
    fn test_decode_strict_array() {
        let bytes = [
            0x0a, 0x00, 0x00, 0x00, 0x03, // marker + count
            0x00, 0x3f, 0xf0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // 1.0
            0x02, 0x00, 0x01, b'2', // "2"
            0x05, // null
        ];
        let value = decoder(&bytes).decode().unwrap();
        assert_eq!(
            value,
            Amf0Value::strict_array([Amf0Value::Number(1.0), Amf0Value::from("2"), Amf0Value::Null])
        );
    }

    #[test]
    fn test_decode_strict_array_short() {
        let bytes = [0x0a, 0x00, 0x00, 0x00, 0x02, 0x05];
        assert!(matches!(decoder(&bytes).decode(), Err(Amf0ReadError::EndOfInput)));
    }

    #[test]
    fn test_decode_object() {
        #[rustfmt::skip]
        let bytes = [
            0x03, // marker
            0x00, 0x04, b't', b'e', b's', b't', // key
            0x05, // null
            0x00, 0x00, 0x09, // end
        ];
        let value = decoder(&bytes).decode().unwrap();
        assert_eq!(value, Amf0Value::object([("test", Amf0Value::Null)]));
    }

    #[test]
    fn test_decode_ecma_array() {
        #[rustfmt::skip]
        let bytes = [
            0x08, // marker
            0x00, 0x00, 0x00, 0x01, // count
            0x00, 0x08, b't', b'e', b's', b't', b' ', b'k', b'e', b'y', // key
            0x00, 0x3f, 0xf0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // 1.0
            0x00, 0x00, 0x09, // end
        ];
        let value = decoder(&bytes).decode().unwrap();
        assert_eq!(value, Amf0Value::ecma_array([("test key", 1.0)]));
    }

    #[test]
    fn test_decode_ecma_array_count_is_advisory() {
        #[rustfmt::skip]
        let bytes = [
            0x08, 0x00, 0x00, 0x00, 0x05, // claims five entries
            0x00, 0x01, b'a', 0x05,
            0x00, 0x00, 0x09,
        ];
        let value = decoder(&bytes).decode().unwrap();
        assert_eq!(value.as_object().unwrap().len(), 1);
    }

    #[test]
    fn test_decode_object_empty_key() {
        #[rustfmt::skip]
        let bytes = [
            0x03,
            0x00, 0x00, 0x01, 0x01, // "" => true
            0x00, 0x01, b'b', 0x05, // "b" => null
            0x00, 0x00, 0x09,
        ];
        let value = decoder(&bytes).decode().unwrap();
        let object = value.as_object().unwrap();
        assert_eq!(object.get(""), Some(Amf0Value::Boolean(true)));
        assert_eq!(object.get("b"), Some(Amf0Value::Null));
    }

    #[test]
    fn test_decode_object_duplicate_key() {
        #[rustfmt::skip]
        let bytes = [
            0x03,
            0x00, 0x01, b'a', 0x01, 0x00,
            0x00, 0x01, b'b', 0x05,
            0x00, 0x01, b'a', 0x01, 0x01,
            0x00, 0x00, 0x09,
        ];
        let value = decoder(&bytes).decode().unwrap();
        let object = value.as_object().unwrap();
        let keys: Vec<_> = object.borrow().keys().cloned().collect();
        assert_eq!(keys, vec![Bytes::from("a"), Bytes::from("b")]);
        assert_eq!(object.get("a"), Some(Amf0Value::Boolean(true)));
    }

    #[test]
    fn test_decode_object_missing_end() {
        #[rustfmt::skip]
        let bytes = [
            0x03,
            0x00, 0x01, b'a', 0x00, 0x3f, 0xf0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x01, b'b', 0x00, 0x40, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let expected = Amf0Value::object([("a", 1.0), ("b", 3.0)]);

        // without a bound the body runs into the end of the input
        let err = decoder(&bytes).decode_value(None).unwrap_err();
        assert!(err.is_end_of_input());

        // bound exactly at the end of the last value
        let value = decoder(&bytes).decode_value(Some(25)).unwrap();
        assert_eq!(value, expected);

        // a bound that is never hit exactly does not help
        let err = decoder(&bytes).decode_value(Some(30)).unwrap_err();
        assert!(err.is_end_of_input());
    }

    #[test]
    fn test_read_object_body_bounded() {
        #[rustfmt::skip]
        let bytes = [
            0x00, 0x00, 0x01, 0x00, // "" => false
            0x00, 0x01, b' ', 0x00, 0x40, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // " " => 3.0
            0x00, 0x03, b'g', b'o', b'o', 0x02, 0x00, 0x02, 0xce, 0xbb, // "goo" => "λ"
            0x00, 0x00,
        ];

        let object = decoder(&bytes).read_object(Some(26)).unwrap();
        let expected: Amf0Object = [
            ("", Amf0Value::Boolean(false)),
            (" ", Amf0Value::Number(3.0)),
            ("goo", Amf0Value::from("λ")),
        ]
        .into_iter()
        .collect();
        assert_eq!(object, expected);

        let err = decoder(&bytes).read_object(None).unwrap_err();
        assert!(err.is_end_of_input());
    }

    #[test]
    fn test_decode_named_value_bounded() {
        #[rustfmt::skip]
        let bytes = [
            0x00, 0x04, b'n', b'a', b'm', b'e', // name
            0x08, 0x00, 0x00, 0x00, 0x01, // ecma array, count 1
            0x00, 0x01, b'x', 0x01, 0x01, // x => true
        ];
        let len = bytes.len() as u64;

        let (name, value) = decoder(&bytes).decode_named_value(Some(len)).unwrap();
        assert_eq!(name, Bytes::from("name"));
        assert_eq!(value, Amf0Value::ecma_array([("x", true)]));

        let err = decoder(&bytes).decode_named_value(None).unwrap_err();
        assert!(err.is_end_of_input());
    }

    #[test]
    fn test_decode_nested_containers_bounded() {
        #[rustfmt::skip]
        let bytes = [
            0x03,
            0x00, 0x01, b'o', 0x03, // nested object
            0x00, 0x01, b'x', 0x05,
        ];

        // both objects end at the bound
        let value = decoder(&bytes).decode_value(Some(bytes.len() as u64)).unwrap();
        let inner = Amf0Value::object([("x", Amf0Value::Null)]);
        assert_eq!(value, Amf0Value::object([("o", inner)]));

        let err = decoder(&bytes).decode_value(None).unwrap_err();
        assert!(err.is_end_of_input());
    }

    #[test]
    fn test_decode_bound_inside_strict_array() {
        #[rustfmt::skip]
        let bytes = [
            0x0a, 0x00, 0x00, 0x00, 0x01,
            0x03, 0x00, 0x01, b'x', 0x01, 0x01,
        ];
        let value = decoder(&bytes).decode_value(Some(bytes.len() as u64)).unwrap();
        let inner = Amf0Value::object([("x", true)]);
        assert_eq!(value, Amf0Value::strict_array([inner]));
    }

    #[test]
    fn test_decode_nesting_limit() {
        let mut bytes = Vec::new();
        for _ in 0..MAX_NESTING_DEPTH {
            bytes.extend_from_slice(&[0x0a, 0x00, 0x00, 0x00, 0x01]);
        }
        bytes.push(0x05);

        let mut value = decoder(&bytes).decode().unwrap();
        let mut levels = 0;
        while let Amf0Value::StrictArray(array) = value {
            levels += 1;
            value = array.get(0).unwrap();
        }
        assert_eq!(levels, MAX_NESTING_DEPTH);
        assert_eq!(value, Amf0Value::Null);

        // one more level is rejected
        let mut deeper = vec![0x0a, 0x00, 0x00, 0x00, 0x01];
        deeper.extend_from_slice(&bytes);
        let err = decoder(&deeper).decode().unwrap_err();
        assert!(matches!(err, Amf0ReadError::NestingTooDeep));
    }

    #[test]
    fn test_decode_deep_objects_fail_without_overflow() {
        let mut bytes = vec![0x03];
        for _ in 0..100_000 {
            bytes.extend_from_slice(&[0x00, 0x01, b'a', 0x03]);
        }

        let err = decoder(&bytes).decode().unwrap_err();
        assert!(matches!(err, Amf0ReadError::NestingTooDeep));
    }

    #[test]
    fn test_decode_depth_resets_between_values() {
        let mut bytes = Vec::new();
        for _ in 0..2 {
            for _ in 0..MAX_NESTING_DEPTH {
                bytes.extend_from_slice(&[0x0a, 0x00, 0x00, 0x00, 0x01]);
            }
            bytes.push(0x05);
        }

        let mut d = decoder(&bytes);
        d.decode().unwrap();
        d.decode().unwrap();
        assert_eq!(d.position().unwrap(), bytes.len() as u64);
    }

    #[test]
    fn test_decode_unknown_marker() {
        for marker in [0x04, 0x09, 0x0d, 0x0e, 0x10, 0xff] {
            let err = decoder(&[marker, 0x00, 0x00]).decode().unwrap_err();
            assert!(matches!(err, Amf0ReadError::MalformedValue(m) if m == marker));
        }
    }

    #[test]
    fn test_decode_empty_input() {
        assert!(decoder(&[]).decode().unwrap_err().is_end_of_input());
    }

    #[test]
    fn test_decode_sequence() {
        let bytes = [0x05, 0x06, 0x01, 0x00];
        let mut d = decoder(&bytes);
        assert_eq!(d.decode().unwrap(), Amf0Value::Null);
        assert_eq!(d.decode().unwrap(), Amf0Value::Undefined);
        assert_eq!(d.decode().unwrap(), Amf0Value::Boolean(false));
        assert!(d.decode().unwrap_err().is_end_of_input());
    }
}
