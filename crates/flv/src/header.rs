use std::fmt::Display;
use std::io::{self, Read, Seek, SeekFrom};

use bytes_util::ReadPrimitivesExt;
use tracing::debug;

use crate::conformance::Conformance;
use crate::error::FlvError;

pub const FLV_SIGNATURE: &[u8; 3] = b"FLV";
pub const FLV_HEADER_SIZE: u32 = 9;

const FLAG_VIDEO: u8 = 0b0000_0001;
const FLAG_AUDIO: u8 = 0b0000_0100;

// Struct representing the FLV file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlvHeader {
    // The version of the FLV file format, usually 0x01
    pub version: u8,
    // Whether the FLV file contains audio tags
    pub has_audio: bool,
    // Whether the FLV file contains video tags
    pub has_video: bool,
    // Offset of the first PreviousTagSize field, 9 in every file seen in the wild
    pub header_size: u32,
}

impl Display for FlvHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "FLV Header: \n\
            Version: {}\n\
            Has Audio: {}\n\
            Has Video: {}\n\
            Header Size: {}",
            self.version, self.has_audio, self.has_video, self.header_size
        )
    }
}

impl FlvHeader {
    /// A version 1 header with the standard size.
    pub fn new(has_audio: bool, has_video: bool) -> Self {
        Self {
            version: 1,
            has_audio,
            has_video,
            header_size: FLV_HEADER_SIZE,
        }
    }

    /// Parses the FLV header from the start of the reader.
    ///
    /// The signature check is unconditional. The reserved flag bits and the
    /// leading PreviousTagSize0 go through `conformance`. The reader is left at
    /// the first tag.
    pub fn parse<R: Read + Seek>(
        reader: &mut R,
        conformance: &mut Conformance,
    ) -> Result<Self, FlvError> {
        reader.seek(SeekFrom::Start(0))?;

        let mut signature = Vec::with_capacity(3);
        reader.by_ref().take(3).read_to_end(&mut signature)?;
        if signature.len() < 3 {
            return Err(FlvError::MalformedContainer(
                "The file is shorter than 3 bytes".to_string(),
            ));
        }

        if signature != FLV_SIGNATURE {
            return Err(FlvError::MalformedContainer(format!(
                "File signature is incorrect: 0x{:X} 0x{:X} 0x{:X}",
                signature[0], signature[1], signature[2]
            )));
        }

        let version = reader.read_ui8()?;
        debug!("File version is {}", version);

        let flags = reader.read_ui8()?;
        conformance.ensure(flags & 0xF8, 0, || {
            format!("First TypeFlagsReserved field non zero: 0x{:X}", flags & 0xF8)
        })?;
        conformance.ensure(flags & 0x2, 0, || {
            format!("Second TypeFlagsReserved field non zero: 0x{:X}", flags & 0x2)
        })?;

        let has_audio = flags & FLAG_AUDIO != 0;
        let has_video = flags & FLAG_VIDEO != 0;
        debug!(has_audio, has_video, "Parsed type flags");

        let header_size = reader.read_ui32()?;
        debug!("Header size is {} bytes", header_size);

        reader.seek(SeekFrom::Start(header_size as u64))?;

        let tag_0_size = reader.read_ui32()?;
        conformance.ensure(tag_0_size, 0, || {
            format!("PreviousTagSize0 non zero: 0x{:08X}", tag_0_size)
        })?;

        Ok(FlvHeader {
            version,
            has_audio,
            has_video,
            header_size,
        })
    }

    /// Type flags byte: bit 0 for video, bit 2 for audio.
    pub fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.has_video {
            flags |= FLAG_VIDEO;
        }
        if self.has_audio {
            flags |= FLAG_AUDIO;
        }
        flags
    }

    /// Serializes the header followed by PreviousTagSize0.
    ///
    /// A nonstandard `header_size` is written as given, padded with zero bytes
    /// up to the declared size. A size below [`FLV_HEADER_SIZE`] cannot hold
    /// the header fields and is written as [`FLV_HEADER_SIZE`].
    pub fn to_bytes(&self) -> Vec<u8> {
        let header_size = self.header_size.max(FLV_HEADER_SIZE);

        let mut buf = Vec::with_capacity(header_size as usize + 4);
        buf.extend_from_slice(FLV_SIGNATURE);
        buf.push(self.version);
        buf.push(self.flags());
        buf.extend_from_slice(&header_size.to_be_bytes());
        buf.resize(header_size as usize, 0);
        // PreviousTagSize0
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf
    }

    pub fn write_to<W: io::Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }
}
