//! # FLV Index Module
//!
//! Collects what is needed to rebuild the `onMetaData` keyframe index of a
//! file while streaming through its tags.
//!
//! [`KeyframeIndex`] is a [`TagObserver`]: pass it to
//! [`FlvParser::with_observer`](crate::parser::FlvParser::with_observer) and
//! read the results once iteration is over. Files without video get a
//! synthetic index built from audio tags with [`keyframes_from_audio_tags`].

use amf0::{Amf0Array, Amf0Object, Amf0Value};
use tracing::debug;

use crate::error::FlvError;
use crate::observer::TagObserver;
use crate::script::ON_META_DATA;
use crate::tag::{FlvTag, FlvTagBody};
use crate::writer::build_script_tag;

/// Every N-th tag is considered for the synthetic audio index.
pub const KEYFRAME_DENSITY: usize = 10;

const FILEPOSITIONS: &str = "filepositions";
const TIMES: &str = "times";
const KEYFRAMES: &str = "keyframes";

/// Keyframe positions and metadata location, gathered as tags are parsed.
#[derive(Debug, Clone)]
pub struct KeyframeIndex {
    /// Offset of the first audio or video tag
    pub first_media_tag_offset: Option<u64>,
    /// (file position, time in seconds) of every video keyframe
    pub keyframes: Vec<(u64, f64)>,
    pub has_video: bool,
    /// Variable of the last `onMetaData` tag
    pub metadata: Option<Amf0Value>,
    /// Offset of the `onMetaData` tag
    pub metadata_tag_start: Option<u64>,
    /// Position right after the `onMetaData` tag trailer
    pub metadata_tag_end: Option<u64>,
}

impl Default for KeyframeIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyframeIndex {
    pub fn new() -> Self {
        Self {
            first_media_tag_offset: None,
            keyframes: Vec::new(),
            has_video: false,
            metadata: None,
            metadata_tag_start: None,
            metadata_tag_end: None,
        }
    }

    /// Bytes taken by the original `onMetaData` tag, trailer included, or 0
    /// without one.
    pub fn metadata_tag_size(&self) -> u64 {
        match (self.metadata_tag_start, self.metadata_tag_end) {
            (Some(start), Some(end)) => end - start,
            _ => 0,
        }
    }

    /// The keyframes as an object with `filepositions` and `times` arrays.
    pub fn keyframes_object(&self) -> Amf0Object {
        keyframes_object(self.keyframes.iter().copied())
    }
}

impl TagObserver for KeyframeIndex {
    fn on_tag(&mut self, tag: &FlvTag) {
        if tag.is_video() {
            self.has_video = true;
        }
    }

    fn on_first_media_tag(&mut self, tag: &FlvTag) {
        debug!("First media tag at offset {}", tag.offset);
        self.first_media_tag_offset = Some(tag.offset);
    }

    fn on_keyframe(&mut self, tag: &FlvTag) {
        self.keyframes.push((tag.offset, tag.timestamp_seconds()));
    }

    fn on_metadata(&mut self, tag: &FlvTag) {
        if let FlvTagBody::Script(script) = &tag.body {
            self.metadata = Some(script.variable.clone());
            self.metadata_tag_start = Some(tag.offset);
            self.metadata_tag_end = Some(tag.end_offset());
        }
    }
}

fn keyframes_object(keyframes: impl Iterator<Item = (u64, f64)>) -> Amf0Object {
    let (positions, times): (Vec<_>, Vec<_>) = keyframes.unzip();

    Amf0Object::new()
        .with(FILEPOSITIONS, positions.into_iter().collect::<Amf0Array>())
        .with(TIMES, times.into_iter().collect::<Amf0Array>())
}

/// Fake keyframe index for files without video: every `density`-th tag, if it
/// is an audio tag.
pub fn keyframes_from_audio_tags(tags: &[FlvTag], density: usize) -> Amf0Object {
    let density = density.max(1);
    keyframes_object(
        tags.iter()
            .enumerate()
            .filter(|(i, tag)| i % density == 0 && tag.is_audio())
            .map(|(_, tag)| (tag.offset, tag.timestamp_seconds())),
    )
}

/// Duration in seconds, taken from the timestamp of the last tag.
pub fn duration_from_last_tag(tags: &[FlvTag]) -> Option<f64> {
    tags.last().map(FlvTag::timestamp_seconds)
}

/// Builds an `onMetaData` tag for `metadata` and returns it together with the
/// change in size relative to the tag it replaces.
pub fn filepositions_difference(
    metadata: &Amf0Value,
    original_size: u64,
) -> Result<(Vec<u8>, i64), FlvError> {
    let payload = build_script_tag(ON_META_DATA, metadata, 0)?;
    let difference = payload.len() as i64 - original_size as i64;
    Ok((payload, difference))
}

/// Adds `difference` to every entry of `keyframes.filepositions`.
pub fn shift_filepositions(keyframes: &Amf0Object, difference: i64) {
    map_array(keyframes, FILEPOSITIONS, |position| position + difference as f64);
}

/// Moves `metadata.keyframes.times` earlier by `offset` milliseconds.
///
/// Metadata without a keyframes object is left alone.
pub fn offset_keyframe_times(metadata: &Amf0Value, offset: i32) {
    let Some(keyframes) = metadata
        .as_object()
        .and_then(|metadata| metadata.get(KEYFRAMES))
    else {
        debug!("No keyframes definition in metadata");
        return;
    };

    match keyframes.as_object() {
        Some(keyframes) => {
            debug!("Offsetting metadata by {}", offset);
            map_array(keyframes, TIMES, |time| (time * 1000.0 - offset as f64) / 1000.0);
        }
        None => debug!("Metadata keyframes are not an object"),
    }
}

fn map_array(object: &Amf0Object, key: &str, f: impl Fn(f64) -> f64) {
    let Some(Amf0Value::StrictArray(array)) = object.get(key) else {
        return;
    };

    for value in array.borrow_mut().iter_mut() {
        if let Amf0Value::Number(n) = value {
            *n = f(*n);
        }
    }
}
