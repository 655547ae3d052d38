use std::io;

/// Errors that can occur when decoding AMF0 data.
#[derive(Debug, thiserror::Error)]
pub enum Amf0ReadError {
    /// The input ended before a complete value could be read.
    #[error("unexpected end of input")]
    EndOfInput,
    /// A marker byte that does not start any script data value.
    #[error("malformed value: unknown marker {0}")]
    MalformedValue(u8),
    /// Containers nested deeper than [`crate::MAX_NESTING_DEPTH`].
    #[error("containers nested too deep")]
    NestingTooDeep,
    /// Any other IO error from the underlying reader.
    #[error("io error: {0}")]
    Io(io::Error),
}

impl From<io::Error> for Amf0ReadError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Self::EndOfInput,
            _ => Self::Io(err),
        }
    }
}

impl Amf0ReadError {
    /// Returns true if the error is caused by running out of input.
    pub fn is_end_of_input(&self) -> bool {
        matches!(self, Self::EndOfInput)
    }
}

/// Errors that can occur when encoding AMF0 data.
#[derive(Debug, thiserror::Error)]
pub enum Amf0WriteError {
    /// A string (or key) was longer than the 16-bit length prefix allows.
    #[error("string too long for the short string form: {0} bytes")]
    StringTooLong(usize),
    /// A long string was longer than the 32-bit length prefix allows.
    #[error("string too long for the long string form: {0} bytes")]
    LongStringTooLong(usize),
    /// An array had more elements than a 32-bit count allows.
    #[error("array too long: {0} elements")]
    ArrayTooLong(usize),
    /// Containers nested deeper than [`crate::MAX_NESTING_DEPTH`].
    #[error("containers nested too deep")]
    NestingTooDeep,
    /// More containers than a 16-bit reference index can address.
    #[error("too many object references")]
    TooManyReferences,
    /// An IO error occurred.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
