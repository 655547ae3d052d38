//! Byte-level helpers shared by the FLV and AMF0 crates.
//!
//! The [`ReadPrimitivesExt`] and [`WritePrimitivesExt`] traits cover every
//! fixed-width big-endian field the two formats use, including the split
//! 24+8 bit signed timestamp.
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or [Apache-2.0](./LICENSE.Apache-2.0) license.
//! You can choose between one of them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod primitives;
mod range_check;

pub use primitives::{ReadPrimitivesExt, UI24_MAX, WritePrimitivesExt};
