//! # FLV Video Module
//!
//! Parsing of the VIDEODATA header of FLV video tags: the frame type and codec
//! id byte and, for H.264, the AVC packet type byte. Frame data is opaque.
//!
//! ## Specifications
//!
//! - video_file_format_spec_v10.pdf (Chapter 1 - The FLV File Format - Video tags)

use std::fmt;
use std::io::Read;

use bytes_util::ReadPrimitivesExt;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::conformance::Conformance;
use crate::error::FlvError;

#[repr(u8)]
#[derive(Debug, Clone, PartialEq, Eq, Copy, FromPrimitive)]
pub enum VideoFrameType {
    KeyFrame = 1,
    InterFrame = 2,
    DisposableInterFrame = 3,
    GeneratedKeyFrame = 4,
    CommandFrame = 5,
}

impl VideoFrameType {
    pub fn name(&self) -> &'static str {
        match self {
            VideoFrameType::KeyFrame => "keyframe",
            VideoFrameType::InterFrame => "interframe",
            VideoFrameType::DisposableInterFrame => "disposable interframe",
            VideoFrameType::GeneratedKeyFrame => "generated keyframe",
            VideoFrameType::CommandFrame => "video info/command frame",
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, PartialEq, Eq, Copy, FromPrimitive)]
pub enum VideoCodecId {
    Jpeg = 1,
    SorensonH263 = 2,
    ScreenVideo = 3,
    On2VP6 = 4,
    On2VP6WithAlphaChannel = 5,
    ScreenVideoVersion2 = 6,
    Avc = 7,
}

impl VideoCodecId {
    pub fn name(&self) -> &'static str {
        match self {
            VideoCodecId::Jpeg => "JPEG",
            VideoCodecId::SorensonH263 => "Sorenson H.263",
            VideoCodecId::ScreenVideo => "Screen video",
            VideoCodecId::On2VP6 => "On2 VP6",
            VideoCodecId::On2VP6WithAlphaChannel => "On2 VP6 with alpha channel",
            VideoCodecId::ScreenVideoVersion2 => "Screen video version 2",
            VideoCodecId::Avc => "H.264",
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, PartialEq, Eq, Copy, FromPrimitive)]
pub enum AvcPacketType {
    SequenceHeader = 0,
    Nalu = 1,
    EndOfSequence = 2,
}

impl AvcPacketType {
    pub fn name(&self) -> &'static str {
        match self {
            AvcPacketType::SequenceHeader => "sequence header",
            AvcPacketType::Nalu => "NAL unit",
            AvcPacketType::EndOfSequence => "sequence end",
        }
    }
}

/// The video tag header fields, as codes read from the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoTagBody {
    // bits 7-4
    pub frame_type: u8,
    // bits 3-0
    pub codec_id: u8,
    /// Only present for H.264
    pub h264_packet_type: Option<u8>,
}

impl VideoTagBody {
    pub fn from_flags(flags: u8) -> Self {
        VideoTagBody {
            frame_type: (flags & 0xF0) >> 4,
            codec_id: flags & 0x0F,
            h264_packet_type: None,
        }
    }

    /// Parses the video header at the start of the tag payload.
    pub fn parse<R: Read>(reader: &mut R, conformance: &mut Conformance) -> Result<Self, FlvError> {
        let mut body = Self::from_flags(reader.read_ui8()?);

        conformance.check_strict(body.frame().is_some(), || {
            format!("Invalid frame type: {}", body.frame_type)
        })?;
        conformance.check_strict(body.codec().is_some(), || {
            format!("Invalid codec ID: {}", body.codec_id)
        })?;

        if body.is_avc() {
            let packet_type = reader.read_ui8()?;
            conformance.check_strict(AvcPacketType::from_u8(packet_type).is_some(), || {
                format!("Invalid H.264 packet type: {}", packet_type)
            })?;
            body.h264_packet_type = Some(packet_type);
        }

        Ok(body)
    }

    pub fn frame(&self) -> Option<VideoFrameType> {
        VideoFrameType::from_u8(self.frame_type)
    }

    pub fn codec(&self) -> Option<VideoCodecId> {
        VideoCodecId::from_u8(self.codec_id)
    }

    pub fn packet_type(&self) -> Option<AvcPacketType> {
        self.h264_packet_type.and_then(AvcPacketType::from_u8)
    }

    pub fn is_avc(&self) -> bool {
        self.codec_id == VideoCodecId::Avc as u8
    }

    pub fn is_keyframe(&self) -> bool {
        self.frame_type == VideoFrameType::KeyFrame as u8
    }

    /// An H.264 sequence header (AVCDecoderConfigurationRecord).
    pub fn is_sequence_header(&self) -> bool {
        self.h264_packet_type == Some(AvcPacketType::SequenceHeader as u8)
    }
}

impl fmt::Display for VideoTagBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.codec() {
            Some(codec) => write!(f, "{}", codec.name())?,
            None => write!(f, "unknown codec {}", self.codec_id)?,
        }
        match self.frame() {
            Some(frame) => write!(f, " ({})", frame.name())?,
            None => write!(f, " (unknown frame type {})", self.frame_type)?,
        }

        if let Some(packet_type) = self.h264_packet_type {
            match AvcPacketType::from_u8(packet_type) {
                Some(packet_type) => write!(f, ", {}", packet_type.name())?,
                None => write!(f, ", unknown packet type {}", packet_type)?,
            }
        }

        Ok(())
    }
}
