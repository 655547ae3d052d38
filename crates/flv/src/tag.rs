use std::fmt;

use crate::audio::AudioTagBody;
use crate::error::FlvError;
use crate::script::ScriptTagBody;
use crate::video::VideoTagBody;

/// Bytes before the payload: type (1), data size (3), timestamp (4) and stream id (3).
pub const TAG_HEADER_SIZE: u32 = 11;
/// Size of the PreviousTagSize field after every tag.
pub const PREVIOUS_TAG_SIZE_LEN: u32 = 4;

/// FLV Tag Type
///
/// Defined by:
/// - video_file_format_spec_v10.pdf (Chapter 1 - The FLV File Format - FLV tags)
///
/// The 3 types that are supported are:
/// - Audio(8)
/// - Video(9)
/// - ScriptData(18)
///
/// There is no way to find the payload length of a tag of any other type, so
/// those are always rejected.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlvTagType {
    Audio = 8,
    Video = 9,
    ScriptData = 18,
}

impl TryFrom<u8> for FlvTagType {
    type Error = FlvError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            8 => Ok(FlvTagType::Audio),
            9 => Ok(FlvTagType::Video),
            18 => Ok(FlvTagType::ScriptData),
            _ => Err(FlvError::MalformedContainer(format!(
                "Invalid tag type: {}",
                value
            ))),
        }
    }
}

impl From<FlvTagType> for u8 {
    fn from(value: FlvTagType) -> Self {
        value as u8
    }
}

/// FLV Tag Data
///
/// The parsed payload header, one variant per tag type.
#[derive(Debug, Clone, PartialEq)]
pub enum FlvTagBody {
    Audio(AudioTagBody),
    Video(VideoTagBody),
    Script(ScriptTagBody),
}

/// An FLV Tag
///
/// The tag header fields plus the parsed payload header. Audio and video
/// frame data is not kept, `offset` and `size` locate it in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct FlvTag {
    /// Absolute position of the tag type byte
    pub offset: u64,
    /// Payload size from the tag header
    pub size: u32,
    /// Timestamp in milliseconds, may be negative in broken files
    pub timestamp: i32,
    pub body: FlvTagBody,
}

impl FlvTag {
    pub fn tag_type(&self) -> FlvTagType {
        match self.body {
            FlvTagBody::Audio(_) => FlvTagType::Audio,
            FlvTagBody::Video(_) => FlvTagType::Video,
            FlvTagBody::Script(_) => FlvTagType::ScriptData,
        }
    }

    pub fn is_audio(&self) -> bool {
        matches!(self.body, FlvTagBody::Audio(_))
    }

    pub fn is_video(&self) -> bool {
        matches!(self.body, FlvTagBody::Video(_))
    }

    pub fn is_script(&self) -> bool {
        matches!(self.body, FlvTagBody::Script(_))
    }

    /// A video tag with the keyframe frame type.
    pub fn is_keyframe(&self) -> bool {
        match &self.body {
            FlvTagBody::Video(video) => video.is_keyframe(),
            _ => false,
        }
    }

    /// An `onMetaData` script tag.
    pub fn is_metadata(&self) -> bool {
        match &self.body {
            FlvTagBody::Script(script) => script.is_metadata(),
            _ => false,
        }
    }

    /// Audio or video carrying media data, as opposed to script tags and
    /// AAC / H.264 sequence headers.
    pub fn is_nonheader_media(&self) -> bool {
        match &self.body {
            FlvTagBody::Audio(audio) => !audio.is_sequence_header(),
            FlvTagBody::Video(video) => !video.is_sequence_header(),
            FlvTagBody::Script(_) => false,
        }
    }

    /// Size of the tag header and payload, the expected PreviousTagSize value.
    pub fn tag_size(&self) -> u32 {
        self.size + TAG_HEADER_SIZE
    }

    /// Bytes taken in the file, including the trailing PreviousTagSize.
    pub fn total_size(&self) -> u64 {
        self.size as u64 + (TAG_HEADER_SIZE + PREVIOUS_TAG_SIZE_LEN) as u64
    }

    /// Absolute position of the first payload byte.
    pub fn payload_offset(&self) -> u64 {
        self.offset + TAG_HEADER_SIZE as u64
    }

    /// Absolute position right after the trailing PreviousTagSize, where the
    /// next tag starts.
    pub fn end_offset(&self) -> u64 {
        self.offset + self.total_size()
    }

    pub fn timestamp_seconds(&self) -> f64 {
        self.timestamp as f64 / 1000.0
    }
}

impl fmt::Display for FlvTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            FlvTagBody::Audio(audio) => write!(
                f,
                "<AudioTag at offset 0x{:08X}, time {}, size {}, {}>",
                self.offset, self.timestamp, self.size, audio
            ),
            FlvTagBody::Video(video) => write!(
                f,
                "<VideoTag at offset 0x{:08X}, time {}, size {}, {}>",
                self.offset, self.timestamp, self.size, video
            ),
            FlvTagBody::Script(script) if script.name.is_empty() => write!(
                f,
                "<ScriptTag at offset 0x{:08X}, time {}, size {}>",
                self.offset, self.timestamp, self.size
            ),
            FlvTagBody::Script(script) => write!(
                f,
                "<ScriptTag {} at offset 0x{:08X}, time {}, size {}>",
                String::from_utf8_lossy(&script.name),
                self.offset,
                self.timestamp,
                self.size
            ),
        }
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use amf0::Amf0Value;

    use super::*;

    fn tag(body: FlvTagBody) -> FlvTag {
        FlvTag {
            offset: 9,
            size: 10,
            timestamp: 9823,
            body,
        }
    }

    #[test]
    fn test_tag_type() {
        assert_eq!(FlvTagType::try_from(8).unwrap(), FlvTagType::Audio);
        assert_eq!(FlvTagType::try_from(9).unwrap(), FlvTagType::Video);
        assert_eq!(FlvTagType::try_from(18).unwrap(), FlvTagType::ScriptData);
        assert_eq!(u8::from(FlvTagType::ScriptData), 18);

        let err = FlvTagType::try_from(1).unwrap_err();
        assert!(matches!(err, FlvError::MalformedContainer(msg) if msg == "Invalid tag type: 1"));
    }

    #[test]
    fn test_display() {
        let audio = tag(FlvTagBody::Audio(AudioTagBody::from_flags(0xbb)));
        assert_eq!(
            audio.to_string(),
            "<AudioTag at offset 0x00000009, time 9823, size 10, Speex>"
        );

        let mut aac = AudioTagBody::from_flags(0xaf);
        aac.aac_packet_type = Some(1);
        assert_eq!(
            tag(FlvTagBody::Audio(aac)).to_string(),
            "<AudioTag at offset 0x00000009, time 9823, size 10, AAC, raw>"
        );

        let video = tag(FlvTagBody::Video(VideoTagBody::from_flags(0x11)));
        assert_eq!(
            video.to_string(),
            "<VideoTag at offset 0x00000009, time 9823, size 10, JPEG (keyframe)>"
        );

        let mut avc = VideoTagBody::from_flags(0x27);
        avc.h264_packet_type = Some(1);
        assert_eq!(
            tag(FlvTagBody::Video(avc)).to_string(),
            "<VideoTag at offset 0x00000009, time 9823, size 10, H.264 (interframe), NAL unit>"
        );

        let mut script = tag(FlvTagBody::Script(ScriptTagBody::new("foo", Amf0Value::Null)));
        script.size = 7;
        assert_eq!(
            script.to_string(),
            "<ScriptTag foo at offset 0x00000009, time 9823, size 7>"
        );

        script.body = FlvTagBody::Script(ScriptTagBody::new("", Amf0Value::Null));
        assert_eq!(
            script.to_string(),
            "<ScriptTag at offset 0x00000009, time 9823, size 7>"
        );
    }

    #[test]
    fn test_sizes() {
        let audio = tag(FlvTagBody::Audio(AudioTagBody::from_flags(0x2d)));
        assert_eq!(audio.tag_size(), 21);
        assert_eq!(audio.total_size(), 25);
        assert_eq!(audio.payload_offset(), 20);
        assert_eq!(audio.end_offset(), 34);
        assert_eq!(audio.timestamp_seconds(), 9.823);
    }

    #[test]
    fn test_is_nonheader_media() {
        let mut aac = AudioTagBody::from_flags(0xaf);
        aac.aac_packet_type = Some(0);
        assert!(!tag(FlvTagBody::Audio(aac)).is_nonheader_media());
        aac.aac_packet_type = Some(1);
        assert!(tag(FlvTagBody::Audio(aac)).is_nonheader_media());

        let mp3 = AudioTagBody::from_flags(0x2f);
        assert!(tag(FlvTagBody::Audio(mp3)).is_nonheader_media());

        let mut avc = VideoTagBody::from_flags(0x17);
        avc.h264_packet_type = Some(0);
        let avc_header = tag(FlvTagBody::Video(avc));
        assert!(!avc_header.is_nonheader_media());
        assert!(avc_header.is_keyframe());
        avc.h264_packet_type = Some(1);
        assert!(tag(FlvTagBody::Video(avc)).is_nonheader_media());

        let metadata = tag(FlvTagBody::Script(ScriptTagBody::new("onMetaData", Amf0Value::Null)));
        assert!(!metadata.is_nonheader_media());
        assert!(metadata.is_metadata());
        assert!(metadata.is_script());
    }
}
