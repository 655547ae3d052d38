//! # FLV Audio Module
//!
//! Parsing of the AUDIODATA header of FLV audio tags: the sound flags byte and,
//! for AAC, the packet type byte. The rest of the payload is opaque.
//!
//! ## Specifications
//!
//! - video_file_format_spec_v10.pdf (Chapter 1 - The FLV File Format - Audio tags)

use std::fmt;
use std::io::Read;

use bytes_util::ReadPrimitivesExt;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::conformance::Conformance;
use crate::error::FlvError;

#[repr(u8)]
#[derive(Debug, Clone, PartialEq, Eq, Copy, FromPrimitive)]
pub enum SoundFormat {
    /// Uncompressed PCM audio
    Pcm = 0,
    /// ADPCM compressed audio
    AdPcm = 1,
    Mp3 = 2,
    PcmLe = 3,
    Nellymoser16khzMono = 4,
    Nellymoser8khzMono = 5,
    Nellymoser = 6,
    G711ALaw = 7,
    G711MuLaw = 8,
    Aac = 10,
    Speex = 11,
    Mp38k = 14,
    DeviceSpecific = 15,
}

impl SoundFormat {
    pub fn name(&self) -> &'static str {
        match self {
            SoundFormat::Pcm => "Linear PCM, platform endian",
            SoundFormat::AdPcm => "ADPCM",
            SoundFormat::Mp3 => "MP3",
            SoundFormat::PcmLe => "Linear PCM, little endian",
            SoundFormat::Nellymoser16khzMono => "Nellymoser 16-kHz mono",
            SoundFormat::Nellymoser8khzMono => "Nellymoser 8-kHz mono",
            SoundFormat::Nellymoser => "Nellymoser",
            SoundFormat::G711ALaw => "G.711 A-law logarithmic PCM",
            SoundFormat::G711MuLaw => "G.711 mu-law logarithmic PCM",
            SoundFormat::Aac => "AAC",
            SoundFormat::Speex => "Speex",
            SoundFormat::Mp38k => "MP3 8-kHz",
            SoundFormat::DeviceSpecific => "Device-specific sound",
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, PartialEq, Eq, Copy, FromPrimitive)]
pub enum SoundRate {
    Hz5512 = 0,
    Hz11025 = 1,
    Hz22050 = 2,
    Hz44100 = 3,
}

impl SoundRate {
    pub fn name(&self) -> &'static str {
        match self {
            SoundRate::Hz5512 => "5.5-kHz",
            SoundRate::Hz11025 => "11-kHz",
            SoundRate::Hz22050 => "22-kHz",
            SoundRate::Hz44100 => "44-kHz",
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, PartialEq, Eq, Copy, FromPrimitive)]
pub enum SoundSize {
    Bits8 = 0,
    Bits16 = 1,
}

impl SoundSize {
    pub fn name(&self) -> &'static str {
        match self {
            SoundSize::Bits8 => "snd8Bit",
            SoundSize::Bits16 => "snd16Bit",
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, PartialEq, Eq, Copy, FromPrimitive)]
pub enum SoundType {
    Mono = 0,
    Stereo = 1,
}

impl SoundType {
    pub fn name(&self) -> &'static str {
        match self {
            SoundType::Mono => "sndMono",
            SoundType::Stereo => "sndStereo",
        }
    }
}

#[repr(u8)]
#[derive(Debug, Clone, PartialEq, Eq, Copy, FromPrimitive)]
pub enum AacPacketType {
    SequenceHeader = 0,
    Raw = 1,
}

impl AacPacketType {
    pub fn name(&self) -> &'static str {
        match self {
            AacPacketType::SequenceHeader => "sequence header",
            AacPacketType::Raw => "raw",
        }
    }
}

/// The audio tag header fields.
///
/// Fields hold the codes as read from the file, so a lenient parse can carry
/// values that do not map to any known variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioTagBody {
    // bits 7-4
    pub sound_format: u8,
    // bits 3-2
    pub sound_rate: u8,
    // bit 1
    pub sound_size: u8,
    // bit 0
    pub sound_type: u8,
    /// Only present for AAC
    pub aac_packet_type: Option<u8>,
}

impl AudioTagBody {
    /// Builds a header from the flags byte alone.
    pub fn from_flags(flags: u8) -> Self {
        AudioTagBody {
            sound_format: (flags & 0xF0) >> 4,
            sound_rate: (flags & 0x0C) >> 2,
            sound_size: (flags & 0x02) >> 1,
            sound_type: flags & 0x01,
            aac_packet_type: None,
        }
    }

    /// Parses the audio header at the start of the tag payload.
    ///
    /// Under strict parsing every field must be a known code. AAC audio must
    /// declare 44 kHz stereo, checked through `conformance`.
    pub fn parse<R: Read>(reader: &mut R, conformance: &mut Conformance) -> Result<Self, FlvError> {
        let mut body = Self::from_flags(reader.read_ui8()?);

        conformance.check_strict(body.format().is_some(), || {
            format!("Invalid sound format: {}", body.sound_format)
        })?;
        conformance.check_strict(body.rate().is_some(), || {
            format!("Invalid sound rate: {}", body.sound_rate)
        })?;
        conformance.check_strict(body.size().is_some(), || {
            format!("Invalid sound size type: {}", body.sound_size)
        })?;
        conformance.check_strict(body.channels().is_some(), || {
            format!("Invalid sound type: {}", body.sound_type)
        })?;

        if body.is_aac() {
            // AAC always has sampling rate of 44 kHz
            conformance.ensure(body.sound_rate, SoundRate::Hz44100 as u8, || {
                format!("AAC sound format with incorrect sound rate: {}", body.sound_rate)
            })?;
            // AAC is always stereo
            conformance.ensure(body.sound_type, SoundType::Stereo as u8, || {
                format!("AAC sound format with incorrect sound type: {}", body.sound_type)
            })?;

            let packet_type = reader.read_ui8()?;
            conformance.check_strict(AacPacketType::from_u8(packet_type).is_some(), || {
                format!("Invalid AAC packet type: {}", packet_type)
            })?;
            body.aac_packet_type = Some(packet_type);
        }

        Ok(body)
    }

    pub fn format(&self) -> Option<SoundFormat> {
        SoundFormat::from_u8(self.sound_format)
    }

    pub fn rate(&self) -> Option<SoundRate> {
        SoundRate::from_u8(self.sound_rate)
    }

    pub fn size(&self) -> Option<SoundSize> {
        SoundSize::from_u8(self.sound_size)
    }

    pub fn channels(&self) -> Option<SoundType> {
        SoundType::from_u8(self.sound_type)
    }

    pub fn packet_type(&self) -> Option<AacPacketType> {
        self.aac_packet_type.and_then(AacPacketType::from_u8)
    }

    pub fn is_aac(&self) -> bool {
        self.sound_format == SoundFormat::Aac as u8
    }

    /// An AAC sequence header (AudioSpecificConfig) rather than audio data.
    pub fn is_sequence_header(&self) -> bool {
        self.aac_packet_type == Some(AacPacketType::SequenceHeader as u8)
    }
}

impl fmt::Display for AudioTagBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format() {
            Some(format) => write!(f, "{}", format.name())?,
            None => write!(f, "unknown sound format {}", self.sound_format)?,
        }

        if let Some(packet_type) = self.aac_packet_type {
            match AacPacketType::from_u8(packet_type) {
                Some(packet_type) => write!(f, ", {}", packet_type.name())?,
                None => write!(f, ", unknown packet type {}", packet_type)?,
            }
        }

        Ok(())
    }
}
