use std::io;

use amf0::{Amf0ReadError, Amf0WriteError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlvError {
    /// The input ended in the middle of a header, tag or value.
    #[error("Unexpected end of input")]
    EndOfInput,
    /// A container level invariant does not hold. Always raised for a bad
    /// signature, a bad tag type or script data nested too deep, otherwise
    /// only under strict parsing.
    #[error("Malformed FLV: {0}")]
    MalformedContainer(String),
    /// Unknown script data value marker.
    #[error("Malformed script data value: unknown marker {0}")]
    MalformedValue(u8),
    #[error("Script data encode error: {0}")]
    Encode(#[from] Amf0WriteError),
    #[error("I/O error: {0}")]
    Io(io::Error),
}

impl FlvError {
    /// Returns true if the error is caused by running out of input.
    pub fn is_end_of_input(&self) -> bool {
        matches!(self, FlvError::EndOfInput)
    }
}

impl From<io::Error> for FlvError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => FlvError::EndOfInput,
            _ => FlvError::Io(err),
        }
    }
}

impl From<Amf0ReadError> for FlvError {
    fn from(err: Amf0ReadError) -> Self {
        match err {
            Amf0ReadError::EndOfInput => FlvError::EndOfInput,
            Amf0ReadError::MalformedValue(marker) => FlvError::MalformedValue(marker),
            err @ Amf0ReadError::NestingTooDeep => FlvError::MalformedContainer(err.to_string()),
            Amf0ReadError::Io(err) => FlvError::Io(err),
        }
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_from_read_error() {
        assert!(FlvError::from(Amf0ReadError::EndOfInput).is_end_of_input());
        assert!(matches!(
            FlvError::from(Amf0ReadError::MalformedValue(0x0d)),
            FlvError::MalformedValue(0x0d)
        ));
        assert!(matches!(
            FlvError::from(Amf0ReadError::Io(io::Error::other("x"))),
            FlvError::Io(_)
        ));
        assert!(matches!(
            FlvError::from(Amf0ReadError::NestingTooDeep),
            FlvError::MalformedContainer(msg) if msg == "containers nested too deep"
        ));
    }

    #[test]
    fn test_from_io_error() {
        let eof = io::Error::from(io::ErrorKind::UnexpectedEof);
        assert!(FlvError::from(eof).is_end_of_input());

        let other = io::Error::from(io::ErrorKind::PermissionDenied);
        assert!(matches!(FlvError::from(other), FlvError::Io(_)));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            FlvError::MalformedContainer("Invalid tag type: 1".into()).to_string(),
            "Malformed FLV: Invalid tag type: 1"
        );
        assert_eq!(
            FlvError::Encode(Amf0WriteError::TooManyReferences).to_string(),
            "Script data encode error: too many object references"
        );
    }
}
