use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, FixedOffset, TimeZone};
use num_derive::FromPrimitive;

use super::object::{Amf0Array, Amf0Object};

/// How many containers may be nested inside each other before decoding or
/// encoding gives up.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Script data value markers.
///
/// Defined in video_file_format_spec_v10.pdf (SCRIPTDATAVALUE) and
/// amf0_spec_121207.pdf section 2.1. Markers that are reserved or unsupported
/// in FLV script data are not listed and fail to decode.
#[derive(Debug, PartialEq, Eq, Clone, Copy, FromPrimitive)]
#[repr(u8)]
pub enum Amf0Marker {
    /// number-marker
    Number = 0x00,
    /// boolean-marker
    Boolean = 0x01,
    /// string-marker
    String = 0x02,
    /// object-marker
    Object = 0x03,
    /// null-marker
    Null = 0x05,
    /// undefined-marker
    Undefined = 0x06,
    /// reference-marker
    Reference = 0x07,
    /// ecma-array-marker
    EcmaArray = 0x08,
    /// object-end-marker, only valid after an empty key
    ObjectEnd = 0x09,
    /// strict-array-marker
    StrictArray = 0x0a,
    /// date-marker
    Date = 0x0b,
    /// long-string-marker
    LongString = 0x0c,
    /// movie clip path
    MovieClip = 0x0f,
}

/// A date value: milliseconds since the unix epoch (UTC) plus the timezone
/// offset, in minutes east of UTC, the value was recorded in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Amf0Date {
    /// Milliseconds since 1970-01-01T00:00:00Z.
    pub millis: f64,
    /// Offset of the local time from UTC in minutes.
    pub timezone_offset: i16,
}

impl Amf0Date {
    /// Creates a date from its wire representation.
    pub const fn new(millis: f64, timezone_offset: i16) -> Self {
        Self {
            millis,
            timezone_offset,
        }
    }

    /// Converts to a timezone-aware datetime. Returns `None` if the instant or
    /// the offset is out of range for `chrono`.
    pub fn to_datetime(&self) -> Option<DateTime<FixedOffset>> {
        if !self.millis.is_finite() {
            return None;
        }
        let offset = FixedOffset::east_opt(self.timezone_offset as i32 * 60)?;
        let utc = DateTime::from_timestamp_millis(self.millis as i64)?;
        Some(utc.with_timezone(&offset))
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Amf0Date {
    fn from(value: DateTime<Tz>) -> Self {
        use chrono::Offset;

        let offset_minutes = value.offset().fix().local_minus_utc() / 60;
        Self {
            millis: value.timestamp_millis() as f64,
            timezone_offset: offset_minutes as i16,
        }
    }
}

impl fmt::Display for Amf0Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "<Date {} {:+}>", self.millis, self.timezone_offset),
        }
    }
}

/// Script data values.
///
/// Strings are kept as raw octets: producers usually write UTF-8 but any
/// byte sequence is carried through unchanged.
#[derive(PartialEq, Clone, Debug)]
pub enum Amf0Value {
    /// Number Type defined section 2.2
    Number(f64),
    /// Boolean Type defined section 2.3
    Boolean(bool),
    /// String Type defined section 2.4, also produced when decoding a
    /// LongString (section 2.14)
    String(Bytes),
    /// Object Type defined section 2.5
    Object(Amf0Object),
    /// Null Type defined section 2.7
    Null,
    /// Undefined Type defined section 2.8
    Undefined,
    /// Reference Type defined section 2.9, an index into the table of
    /// complex values written so far
    Reference(u16),
    /// ECMA Array Type defined section 2.10
    EcmaArray(Amf0Object),
    /// StrictArray Type defined section 2.12
    StrictArray(Amf0Array),
    /// Date Type defined section 2.13
    Date(Amf0Date),
    /// Path of a movie clip
    MovieClip(Bytes),
}

impl Amf0Value {
    /// Get the marker the value is encoded with.
    pub fn marker(&self) -> Amf0Marker {
        match self {
            Self::Number(_) => Amf0Marker::Number,
            Self::Boolean(_) => Amf0Marker::Boolean,
            Self::String(_) => Amf0Marker::String,
            Self::Object(_) => Amf0Marker::Object,
            Self::Null => Amf0Marker::Null,
            Self::Undefined => Amf0Marker::Undefined,
            Self::Reference(_) => Amf0Marker::Reference,
            Self::EcmaArray(_) => Amf0Marker::EcmaArray,
            Self::StrictArray(_) => Amf0Marker::StrictArray,
            Self::Date(_) => Amf0Marker::Date,
            Self::MovieClip(_) => Amf0Marker::MovieClip,
        }
    }

    /// Creates an ECMA array from key-value pairs.
    pub fn ecma_array<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Bytes>,
        V: Into<Amf0Value>,
    {
        Self::EcmaArray(entries.into_iter().collect())
    }

    /// Creates an anonymous object from key-value pairs.
    pub fn object<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Bytes>,
        V: Into<Amf0Value>,
    {
        Self::Object(entries.into_iter().collect())
    }

    /// Creates a strict array from values.
    pub fn strict_array<V: Into<Amf0Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self::StrictArray(values.into_iter().collect())
    }

    /// Returns the number if the value is a `Number`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean if the value is a `Boolean`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the raw octets of a `String` value.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the text of a `String` value if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    /// Returns the properties handle of an `Object` or `EcmaArray`.
    pub fn as_object(&self) -> Option<&Amf0Object> {
        match self {
            Self::Object(o) | Self::EcmaArray(o) => Some(o),
            _ => None,
        }
    }

    /// Returns the elements handle of a `StrictArray`.
    pub fn as_array(&self) -> Option<&Amf0Array> {
        match self {
            Self::StrictArray(a) => Some(a),
            _ => None,
        }
    }

    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Amf0Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::String(s) => write!(f, "{}", String::from_utf8_lossy(s)),
            Self::Null => write!(f, "null"),
            Self::Undefined => write!(f, "<Undefined>"),
            Self::Reference(index) => write!(f, "<Reference to {index}>"),
            Self::Date(date) => write!(f, "{date}"),
            Self::MovieClip(path) => {
                write!(f, "<MovieClip at {}>", String::from_utf8_lossy(path))
            }
            Self::Object(o) => write!(f, "<Object with {} properties>", o.len()),
            Self::EcmaArray(o) => write!(f, "<ECMAArray with {} properties>", o.len()),
            Self::StrictArray(a) => write!(f, "<StrictArray with {} elements>", a.len()),
        }
    }
}

impl From<f64> for Amf0Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

macro_rules! impl_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Amf0Value {
                fn from(value: $ty) -> Self {
                    Self::Number(value as f64)
                }
            }
        )*
    };
}

impl_from_integer!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32);

impl From<bool> for Amf0Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<&str> for Amf0Value {
    fn from(value: &str) -> Self {
        Self::String(Bytes::copy_from_slice(value.as_bytes()))
    }
}

impl From<String> for Amf0Value {
    fn from(value: String) -> Self {
        Self::String(Bytes::from(value))
    }
}

impl From<Bytes> for Amf0Value {
    fn from(value: Bytes) -> Self {
        Self::String(value)
    }
}

impl From<Vec<Amf0Value>> for Amf0Value {
    fn from(value: Vec<Amf0Value>) -> Self {
        Self::StrictArray(value.into())
    }
}

impl From<Amf0Array> for Amf0Value {
    fn from(value: Amf0Array) -> Self {
        Self::StrictArray(value)
    }
}

impl From<Amf0Object> for Amf0Value {
    fn from(value: Amf0Object) -> Self {
        Self::Object(value)
    }
}

impl From<Amf0Date> for Amf0Value {
    fn from(value: Amf0Date) -> Self {
        Self::Date(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Amf0Value {
    fn from(value: DateTime<Tz>) -> Self {
        Self::Date(value.into())
    }
}

impl<T: Into<Amf0Value>> From<Option<T>> for Amf0Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
