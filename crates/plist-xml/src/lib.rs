//! # plist-xml
//!
//! Streaming encoder and decoder for Apple **XML property lists** (plist 1.0).
//!
//! A plist is an XML document holding one top-level `<array>` or `<dict>`
//! built from seven value kinds: string, boolean, integer, real, date, data,
//! and the two containers. This crate reads and writes them without
//! materializing the document, and offers an owned tree and a serde adapter
//! on top.
//!
//! ## Quick start
//!
//! ```rust
//! use plist_xml::{encode_dict_plist, Plist};
//!
//! // Push-style encode
//! let out = encode_dict_plist(Vec::new(), |d| {
//!     d.write_string("name", "Bilbo Baggins")?;
//!     d.write_uint("age", 111)
//! })
//! .unwrap();
//! let xml = String::from_utf8(out).unwrap();
//!
//! // Decode back into a tree
//! let plist: Plist = xml.parse().unwrap();
//! let dict = plist.as_dict().unwrap();
//! assert_eq!(dict.get("name").and_then(Plist::as_str), Some("Bilbo Baggins"));
//! ```
//!
//! ## Modules
//!
//! - [`decoder`]: XML reader → stream of [`Value`] events
//! - [`encoder`]: nested container encoders → XML writer
//! - [`tree`]: owned [`Plist`] / [`Dict`] values and a JSON bridge
//! - [`ser`]: any `serde::Serialize` type → plist document
//! - [`codec`]: text forms of integers, reals, dates and data
//! - [`types`]: [`Value`] events and the tiered [`Integer`] / [`Real`] numbers
//! - [`options`]: decoder configuration
//! - [`error`]: error type shared by every module

pub mod codec;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod options;
pub mod ser;
pub mod tree;
pub mod types;
mod xml;

pub use decoder::PlistDecoder;
pub use encoder::{
    encode_array_plist, encode_dict_plist, ArrayEncoder, DictEncoder, DocumentEncoder,
    EncoderState,
};
pub use error::{PlistError, Result};
pub use options::{DecodeOptions, DuplicateKeys};
pub use ser::{to_string, to_vec, to_writer};
pub use tree::{Dict, Plist};
pub use types::{Integer, Real, Value};
