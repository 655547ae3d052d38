//! # FLV Parser Module
//!
//! Synchronous, seekable FLV parser with strict and lenient modes.
//!
//! The parser reads the file header once and then one tag per step. Each tag
//! is validated (stream id, PreviousTagSize, field codes) according to the
//! [`FlvParserConfig`]: strict parsing fails on the first violation, lenient
//! parsing logs a warning and keeps going with the observed values.
//!
//! ## Usage
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! use flv::config::FlvParserConfig;
//! use flv::parser::FlvParser;
//!
//! fn main() -> Result<(), flv::error::FlvError> {
//!     let file = BufReader::new(File::open("input.flv")?);
//!     let mut parser = FlvParser::new(file, FlvParserConfig::default());
//!
//!     for tag in parser.tags() {
//!         println!("{}", tag?);
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::io::{self, Read, Seek, SeekFrom};
use std::iter::FusedIterator;

use bytes_util::ReadPrimitivesExt;
use tracing::debug;

use crate::audio::AudioTagBody;
use crate::config::FlvParserConfig;
use crate::conformance::Conformance;
use crate::error::FlvError;
use crate::header::FlvHeader;
use crate::observer::{TagObserver, notify};
use crate::script::ScriptTagBody;
use crate::tag::{FlvTag, FlvTagBody, FlvTagType, TAG_HEADER_SIZE};
use crate::video::VideoTagBody;

/// Parser over a seekable FLV byte source.
pub struct FlvParser<R> {
    reader: R,
    conformance: Conformance,
    header: Option<FlvHeader>,
}

impl<R: Read + Seek> FlvParser<R> {
    pub fn new(reader: R, config: FlvParserConfig) -> Self {
        Self {
            reader,
            conformance: Conformance::new(&config),
            header: None,
        }
    }

    /// The header, once parsed.
    pub fn header(&self) -> Option<&FlvHeader> {
        self.header.as_ref()
    }

    /// Number of warnings issued so far.
    pub fn warnings(&self) -> usize {
        self.conformance.warnings()
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Parses the file header from the start of the source and leaves the
    /// reader at the first tag.
    pub fn parse_header(&mut self) -> Result<FlvHeader, FlvError> {
        let header = FlvHeader::parse(&mut self.reader, &mut self.conformance)?;
        debug!(
            version = header.version,
            has_audio = header.has_audio,
            has_video = header.has_video,
            "Parsed FLV header"
        );
        self.header = Some(header);
        Ok(header)
    }

    /// Reads the tag starting at the current position.
    ///
    /// Returns `Ok(None)` if the source ends right where a tag would start.
    /// Ending anywhere inside a tag is an `EndOfInput` error.
    pub fn next_tag(&mut self) -> Result<Option<FlvTag>, FlvError> {
        let tag_type = match self.reader.read_ui8() {
            Ok(tag_type) => tag_type,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let offset = self.reader.stream_position()? - 1;
        let tag_type = FlvTagType::try_from(tag_type)?;

        // DataSize
        let size = self.reader.read_ui24()?;
        debug!("Data size is {}", size);

        // Timestamp + TimestampExtended
        let timestamp = self.reader.read_si32_extended()?;
        debug!("Tag timestamp is {}", timestamp);

        if timestamp < 0 {
            self.conformance.warn(format!(
                "The tag at offset 0x{:08X} has negative timestamp: {}",
                offset, timestamp
            ));
        }

        // StreamID
        let stream_id = self.reader.read_ui24()?;
        self.conformance
            .ensure(stream_id, 0, || format!("StreamID non zero: 0x{:06X}", stream_id))?;

        let payload_end = offset + TAG_HEADER_SIZE as u64 + size as u64;

        let body = match tag_type {
            FlvTagType::Audio => {
                FlvTagBody::Audio(AudioTagBody::parse(&mut self.reader, &mut self.conformance)?)
            }
            FlvTagType::Video => {
                FlvTagBody::Video(VideoTagBody::parse(&mut self.reader, &mut self.conformance)?)
            }
            FlvTagType::ScriptData => FlvTagBody::Script(ScriptTagBody::parse(
                &mut self.reader,
                &mut self.conformance,
                payload_end,
            )?),
        };

        // The payload header may have been shorter or longer than the
        // declared size, the trailer is always at the declared end.
        self.reader.seek(SeekFrom::Start(payload_end))?;

        let previous_tag_size = self.reader.read_ui32()?;
        let expected = size + TAG_HEADER_SIZE;
        self.conformance.ensure(previous_tag_size, expected, || {
            format!(
                "PreviousTagSize of {} (0x{:08X}) not equal to actual tag size of {} (0x{:08X})",
                previous_tag_size, previous_tag_size, expected, expected
            )
        })?;

        let tag = FlvTag {
            offset,
            size,
            timestamp,
            body,
        };
        debug!("Found a tag: {}", tag);

        Ok(Some(tag))
    }

    /// Lazily iterates over the tags, parsing the header first if that has
    /// not happened yet.
    pub fn tags(&mut self) -> FlvTagIter<'_, R> {
        FlvTagIter {
            parser: self,
            observer: None,
            seen_media: false,
            done: false,
        }
    }

    /// Like [`FlvParser::tags`], reporting every parsed tag to `observer`.
    pub fn with_observer<'a>(&'a mut self, observer: &'a mut dyn TagObserver) -> FlvTagIter<'a, R> {
        FlvTagIter {
            parser: self,
            observer: Some(observer),
            seen_media: false,
            done: false,
        }
    }

    /// Parses the header and all tags into memory.
    pub fn read_all_tags(&mut self) -> Result<Vec<FlvTag>, FlvError> {
        self.tags().collect()
    }
}

/// Pull-based tag iterator returned by [`FlvParser::tags`].
///
/// Yields `Err` at most once, after which it is exhausted.
pub struct FlvTagIter<'a, R> {
    parser: &'a mut FlvParser<R>,
    observer: Option<&'a mut dyn TagObserver>,
    seen_media: bool,
    done: bool,
}

impl<R: Read + Seek> FlvTagIter<'_, R> {
    fn step(&mut self) -> Result<Option<FlvTag>, FlvError> {
        if self.parser.header.is_none() {
            self.parser.parse_header()?;
        }

        let tag = self.parser.next_tag()?;
        if let (Some(tag), Some(observer)) = (&tag, self.observer.as_deref_mut()) {
            notify(observer, tag, &mut self.seen_media);
        }
        Ok(tag)
    }

    /// Number of warnings issued by the parser so far.
    pub fn warnings(&self) -> usize {
        self.parser.warnings()
    }
}

impl<R: Read + Seek> Iterator for FlvTagIter<'_, R> {
    type Item = Result<FlvTag, FlvError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.step() {
            Ok(Some(tag)) => Some(Ok(tag)),
            Ok(None) => {
                debug!("Reached the end of the tag stream");
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read + Seek> FusedIterator for FlvTagIter<'_, R> {}

/// Parses a whole FLV source, returning the header and all tags.
pub fn read_all_tags<R: Read + Seek>(
    reader: R,
    config: FlvParserConfig,
) -> Result<(FlvHeader, Vec<FlvTag>), FlvError> {
    let mut parser = FlvParser::new(reader, config);
    let header = parser.parse_header()?;
    let tags = parser.read_all_tags()?;
    Ok((header, tags))
}
