use std::io::{Read, Seek};

use crate::config::FlvParserConfig;
use crate::error::FlvError;
use crate::header::FlvHeader;
use crate::parser::FlvParser;
use crate::script::ScriptTagBody;
use crate::tag::{FlvTag, FlvTagBody};

/// An FLV file is a combination of a [`FlvHeader`] followed by the
/// `FLVFileBody` (which is just a series of [`FlvTag`]s)
///
/// The `FLVFileBody` is defined by:
/// - video_file_format_spec_v10.pdf (Chapter 1 - The FLV File Format - Page 8)
#[derive(Debug, Clone, PartialEq)]
pub struct FlvFile {
    pub header: FlvHeader,
    pub tags: Vec<FlvTag>,
    /// Warnings issued by a lenient parse
    pub warnings: usize,
}

impl FlvFile {
    /// Parses a whole file into memory.
    pub fn read<R: Read + Seek>(reader: R, config: FlvParserConfig) -> Result<Self, FlvError> {
        let mut parser = FlvParser::new(reader, config);
        let header = parser.parse_header()?;
        let tags = parser.read_all_tags()?;

        Ok(FlvFile {
            header,
            tags,
            warnings: parser.warnings(),
        })
    }

    /// The first audio or video tag.
    pub fn first_media_tag(&self) -> Option<&FlvTag> {
        self.tags.iter().find(|tag| tag.is_audio() || tag.is_video())
    }

    /// The body of the last `onMetaData` tag.
    pub fn metadata(&self) -> Option<&ScriptTagBody> {
        self.tags.iter().rev().find_map(|tag| match &tag.body {
            FlvTagBody::Script(script) if script.is_metadata() => Some(script),
            _ => None,
        })
    }

    pub fn has_video_tags(&self) -> bool {
        self.tags.iter().any(FlvTag::is_video)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use std::io::Cursor;

    use amf0::Amf0Value;

    use super::*;
    use crate::tag::FlvTagType;
    use crate::writer::{build_file_header, build_raw_tag, build_script_tag};

    fn file() -> Vec<u8> {
        let mut bytes = build_file_header(true, false);
        let metadata = Amf0Value::ecma_array([("duration", 1.5)]);
        bytes.extend(build_script_tag("onMetaData", &metadata, 0).unwrap());
        bytes.extend(build_raw_tag(FlvTagType::Audio, b"\x2f\xff", 0).unwrap());
        bytes.extend(build_raw_tag(FlvTagType::Audio, b"\x2f\xff", 1500).unwrap());
        bytes
    }

    #[test]
    fn test_read() {
        let file = FlvFile::read(Cursor::new(file()), FlvParserConfig::strict()).unwrap();

        assert_eq!(file.header, FlvHeader::new(true, false));
        assert_eq!(file.tags.len(), 3);
        assert_eq!(file.warnings, 0);
        assert!(!file.has_video_tags());

        let first = file.first_media_tag().unwrap();
        assert_eq!(first.offset, file.tags[0].end_offset());

        let metadata = file.metadata().unwrap();
        assert_eq!(
            metadata.variable.as_object().and_then(|m| m.get("duration")),
            Some(Amf0Value::Number(1.5))
        );
    }

    #[test]
    fn test_read_truncated() {
        let mut bytes = file();
        bytes.truncate(bytes.len() - 2);

        let result = FlvFile::read(Cursor::new(bytes), FlvParserConfig::lenient());
        assert!(result.unwrap_err().is_end_of_input());
    }
}
