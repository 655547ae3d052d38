//! FLV container parsing, validation and tag construction.
//!
//! [`FlvParser`] walks a seekable byte source tag by tag. Each tag is checked
//! against the container rules, either failing on the first violation or
//! logging a warning and carrying on, depending on [`FlvParserConfig`].
//! Script tags are decoded with the `amf0` crate.
//!
//! ```
//! use std::io::Cursor;
//!
//! use flv::{FlvParser, FlvParserConfig, build_file_header};
//!
//! # fn main() -> Result<(), flv::FlvError> {
//! let bytes = build_file_header(true, true);
//! let mut parser = FlvParser::new(Cursor::new(bytes), FlvParserConfig::strict());
//! let tags = parser.read_all_tags()?;
//!
//! assert!(tags.is_empty());
//! assert!(parser.header().is_some_and(|header| header.has_audio));
//! # Ok(())
//! # }
//! ```
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(unsafe_code)]

pub mod audio;
pub mod config;
pub mod conformance;
pub mod error;
pub mod file;
pub mod header;
pub mod index;
pub mod observer;
pub mod parser;
pub mod script;
pub mod tag;
pub mod video;
pub mod writer;

// Re-export key components for easier access
pub use config::FlvParserConfig;
pub use error::FlvError;
pub use file::FlvFile;
pub use header::FlvHeader;
pub use index::KeyframeIndex;
pub use observer::{NoopObserver, TagObserver};
pub use parser::{FlvParser, FlvTagIter};
pub use tag::{FlvTag, FlvTagBody, FlvTagType};
pub use writer::{
    FlvWriter, build_file_header, build_raw_tag, build_script_tag, write_retimestamped_tag,
};
