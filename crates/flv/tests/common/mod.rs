#![allow(dead_code)]

use flv::{FlvTagType, build_file_header, build_raw_tag};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer() // Write to test output
        .try_init();
}

/// Builds a file from (tag type, payload, timestamp) triples.
pub fn build_file(
    has_audio: bool,
    has_video: bool,
    tags: &[(FlvTagType, &[u8], i32)],
) -> Vec<u8> {
    let mut bytes = build_file_header(has_audio, has_video);
    for (tag_type, payload, timestamp) in tags {
        bytes.extend(build_raw_tag(*tag_type, payload, *timestamp).unwrap());
    }
    bytes
}

/// Appends a tag with a hand-written header and trailer.
pub fn push_raw(
    bytes: &mut Vec<u8>,
    tag_type: u8,
    header: &[u8],
    payload: &[u8],
    trailer: &[u8],
) {
    bytes.push(tag_type);
    bytes.extend_from_slice(header);
    bytes.extend_from_slice(payload);
    bytes.extend_from_slice(trailer);
}
