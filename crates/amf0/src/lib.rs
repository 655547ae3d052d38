//! A pure-rust implementation of the AMF0 script data encoder and decoder used
//! by FLV metadata tags.
//!
//! Objects, ECMA arrays and strict arrays are shared handles, so a value graph
//! may contain the same container more than once, or even contain itself. The
//! encoder writes such repeats as `Reference` values.
//!
//! # Examples
//!
//! ```rust
//! # fn test() -> Result<(), Box<dyn std::error::Error>> {
//! use std::io::Cursor;
//!
//! use amf0::{Amf0Decoder, Amf0Encoder, Amf0Value};
//!
//! let metadata = Amf0Value::ecma_array([("duration", 12.5), ("width", 1280.0)]);
//!
//! // Encode a value into a buffer
//! let bytes = Amf0Encoder::encode_to_vec(&metadata)?;
//!
//! // Decode it again
//! let mut reader = Amf0Decoder::new(Cursor::new(bytes));
//! let value = reader.decode()?;
//!
//! assert_eq!(value, metadata);
//! # Ok(())
//! # }
//! # test().expect("test failed");
//! ```
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod decode;
mod define;
mod encode;
mod errors;
mod object;

pub use crate::decode::Amf0Decoder;
pub use crate::define::{Amf0Date, Amf0Marker, Amf0Value, MAX_NESTING_DEPTH};
pub use crate::encode::Amf0Encoder;
pub use crate::errors::{Amf0ReadError, Amf0WriteError};
pub use crate::object::{Amf0Array, Amf0Object, Amf0Properties, Shared};
