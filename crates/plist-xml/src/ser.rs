//! serde adapter: encode any `Serialize` type through the container encoders.
//!
//! Dispatch rules:
//!
//! | Rust shape | plist |
//! |---|---|
//! | `Vec`, slices, tuples, tuple structs | `<array>` |
//! | maps with string (or char) keys | `<dict>` |
//! | structs | `<dict>` keyed by field name (`#[serde(rename)]` overrides) |
//! | `bool`, integers, floats, `char`, `&str`, bytes | matching leaf |
//! | `Some(v)` / newtype structs | `v` |
//! | `None`, `()`, enum variants | [`PlistError::Unsupported`] |
//!
//! A map key that is not a string is [`PlistError::Misuse`]. The top-level
//! value must be a sequence, map or struct.
//!
//! ```
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Hobbit {
//!     name: String,
//!     #[serde(rename = "Age")]
//!     age: u32,
//! }
//!
//! let xml = plist_xml::to_string(&Hobbit { name: "Bilbo".into(), age: 111 }).unwrap();
//! assert!(xml.contains("<key>Age</key>\n\t\t<integer>111</integer>"));
//! ```

use std::io::Write;

use serde::ser::{self, Impossible, Serialize};

use crate::encoder::{ArrayEncoder, DictEncoder, DocumentEncoder, Leaf};
use crate::error::{PlistError, Result};
use crate::types::{Integer, Real};

/// Serialize `value` as a plist document into `writer`.
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<W>
where
    W: Write,
    T: Serialize + ?Sized,
{
    let mut document = DocumentEncoder::new(writer)?;
    value.serialize(ValueSerializer {
        slot: Slot::Root(&mut document),
    })?;
    document.finish()
}

pub fn to_vec<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    to_writer(Vec::new(), value)
}

pub fn to_string<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let bytes = to_vec(value)?;
    String::from_utf8(bytes).map_err(|e| PlistError::Utf8(e.utf8_error()))
}

/// Where the next value goes.
enum Slot<'a, 'b, W: Write> {
    Root(&'a mut DocumentEncoder<W>),
    Item(&'a mut ArrayEncoder<'b, W>),
    Entry(&'a mut DictEncoder<'b, W>, String),
}

impl<'a, 'b, W: Write> Slot<'a, 'b, W> {
    fn leaf(self, leaf: Leaf<'_>) -> Result<()> {
        match self {
            Slot::Root(_) => Err(PlistError::Unsupported(
                "the top-level value must be a sequence, map or struct".to_string(),
            )),
            Slot::Item(array) => array.write_leaf(leaf),
            Slot::Entry(dict, key) => dict.write_leaf(&key, leaf),
        }
    }

    fn begin_array(self) -> Result<ArrayEncoder<'a, W>> {
        match self {
            Slot::Root(document) => document.begin_array(),
            Slot::Item(array) => array.begin_array(),
            Slot::Entry(dict, key) => dict.begin_array(&key),
        }
    }

    fn begin_dict(self) -> Result<DictEncoder<'a, W>> {
        match self {
            Slot::Root(document) => document.begin_dict(),
            Slot::Item(array) => array.begin_dict(),
            Slot::Entry(dict, key) => dict.begin_dict(&key),
        }
    }
}

fn unsupported(what: &str) -> PlistError {
    PlistError::Unsupported(format!("{what} has no plist representation"))
}

struct ValueSerializer<'a, 'b, W: Write> {
    slot: Slot<'a, 'b, W>,
}

impl<'a, 'b, W: Write> ser::Serializer for ValueSerializer<'a, 'b, W> {
    type Ok = ();
    type Error = PlistError;
    type SerializeSeq = SeqWriter<'a, W>;
    type SerializeTuple = SeqWriter<'a, W>;
    type SerializeTupleStruct = SeqWriter<'a, W>;
    type SerializeTupleVariant = Impossible<(), PlistError>;
    type SerializeMap = MapWriter<'a, W>;
    type SerializeStruct = StructWriter<'a, W>;
    type SerializeStructVariant = Impossible<(), PlistError>;

    fn serialize_bool(self, v: bool) -> Result<()> {
        self.slot.leaf(Leaf::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<()> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<()> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<()> {
        self.serialize_i64(i64::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<()> {
        self.slot.leaf(Leaf::Integer(&Integer::Signed(v)))
    }

    fn serialize_i128(self, v: i128) -> Result<()> {
        self.slot.leaf(Leaf::Integer(&Integer::from_i128(v)))
    }

    fn serialize_u8(self, v: u8) -> Result<()> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<()> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<()> {
        self.serialize_u64(u64::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<()> {
        self.slot.leaf(Leaf::Integer(&Integer::Unsigned(v)))
    }

    fn serialize_u128(self, v: u128) -> Result<()> {
        self.slot.leaf(Leaf::Integer(&Integer::from_u128(v)))
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.serialize_f64(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        self.slot.leaf(Leaf::Real(&Real::Double(v)))
    }

    fn serialize_char(self, v: char) -> Result<()> {
        let mut buf = [0u8; 4];
        self.serialize_str(v.encode_utf8(&mut buf))
    }

    fn serialize_str(self, v: &str) -> Result<()> {
        self.slot.leaf(Leaf::String(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<()> {
        self.slot.leaf(Leaf::Data(v))
    }

    fn serialize_none(self) -> Result<()> {
        Err(PlistError::Unsupported(
            "an empty Option cannot be encoded; skip the field instead".to_string(),
        ))
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        Err(unsupported("()"))
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<()> {
        Err(unsupported(name))
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<()> {
        Err(unsupported(&format!("enum variant {name}::{variant}")))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _value: &T,
    ) -> Result<()> {
        Err(unsupported(&format!("enum variant {name}::{variant}")))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<SeqWriter<'a, W>> {
        Ok(SeqWriter {
            encoder: self.slot.begin_array()?,
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqWriter<'a, W>> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SeqWriter<'a, W>> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(unsupported(&format!("enum variant {name}::{variant}")))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<MapWriter<'a, W>> {
        Ok(MapWriter {
            encoder: self.slot.begin_dict()?,
            key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<StructWriter<'a, W>> {
        Ok(StructWriter {
            encoder: self.slot.begin_dict()?,
        })
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(unsupported(&format!("enum variant {name}::{variant}")))
    }
}

struct SeqWriter<'a, W: Write> {
    encoder: ArrayEncoder<'a, W>,
}

impl<'a, W: Write> SeqWriter<'a, W> {
    fn element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(ValueSerializer {
            slot: Slot::Item(&mut self.encoder),
        })
    }
}

impl<'a, W: Write> ser::SerializeSeq for SeqWriter<'a, W> {
    type Ok = ();
    type Error = PlistError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.encoder.end()
    }
}

impl<'a, W: Write> ser::SerializeTuple for SeqWriter<'a, W> {
    type Ok = ();
    type Error = PlistError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.encoder.end()
    }
}

impl<'a, W: Write> ser::SerializeTupleStruct for SeqWriter<'a, W> {
    type Ok = ();
    type Error = PlistError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.element(value)
    }

    fn end(self) -> Result<()> {
        self.encoder.end()
    }
}

struct MapWriter<'a, W: Write> {
    encoder: DictEncoder<'a, W>,
    key: Option<String>,
}

impl<'a, W: Write> ser::SerializeMap for MapWriter<'a, W> {
    type Ok = ();
    type Error = PlistError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        self.key = Some(key.serialize(KeySerializer)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        let key = self
            .key
            .take()
            .ok_or_else(|| PlistError::misuse("map value serialized before its key"))?;
        value.serialize(ValueSerializer {
            slot: Slot::Entry(&mut self.encoder, key),
        })
    }

    fn end(self) -> Result<()> {
        self.encoder.end()
    }
}

struct StructWriter<'a, W: Write> {
    encoder: DictEncoder<'a, W>,
}

impl<'a, W: Write> ser::SerializeStruct for StructWriter<'a, W> {
    type Ok = ();
    type Error = PlistError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        value.serialize(ValueSerializer {
            slot: Slot::Entry(&mut self.encoder, key.to_string()),
        })
    }

    fn end(self) -> Result<()> {
        self.encoder.end()
    }
}

/// Accepts only string-like keys.
struct KeySerializer;

fn non_string_key() -> PlistError {
    PlistError::misuse("dictionary keys must be strings")
}

impl ser::Serializer for KeySerializer {
    type Ok = String;
    type Error = PlistError;
    type SerializeSeq = Impossible<String, PlistError>;
    type SerializeTuple = Impossible<String, PlistError>;
    type SerializeTupleStruct = Impossible<String, PlistError>;
    type SerializeTupleVariant = Impossible<String, PlistError>;
    type SerializeMap = Impossible<String, PlistError>;
    type SerializeStruct = Impossible<String, PlistError>;
    type SerializeStructVariant = Impossible<String, PlistError>;

    fn serialize_str(self, v: &str) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_char(self, v: char) -> Result<String> {
        Ok(v.to_string())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<String> {
        value.serialize(self)
    }

    fn serialize_bool(self, _v: bool) -> Result<String> {
        Err(non_string_key())
    }

    fn serialize_i8(self, _v: i8) -> Result<String> {
        Err(non_string_key())
    }

    fn serialize_i16(self, _v: i16) -> Result<String> {
        Err(non_string_key())
    }

    fn serialize_i32(self, _v: i32) -> Result<String> {
        Err(non_string_key())
    }

    fn serialize_i64(self, _v: i64) -> Result<String> {
        Err(non_string_key())
    }

    fn serialize_u8(self, _v: u8) -> Result<String> {
        Err(non_string_key())
    }

    fn serialize_u16(self, _v: u16) -> Result<String> {
        Err(non_string_key())
    }

    fn serialize_u32(self, _v: u32) -> Result<String> {
        Err(non_string_key())
    }

    fn serialize_u64(self, _v: u64) -> Result<String> {
        Err(non_string_key())
    }

    fn serialize_f32(self, _v: f32) -> Result<String> {
        Err(non_string_key())
    }

    fn serialize_f64(self, _v: f64) -> Result<String> {
        Err(non_string_key())
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<String> {
        Err(non_string_key())
    }

    fn serialize_none(self) -> Result<String> {
        Err(non_string_key())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, _value: &T) -> Result<String> {
        Err(non_string_key())
    }

    fn serialize_unit(self) -> Result<String> {
        Err(non_string_key())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<String> {
        Err(non_string_key())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<String> {
        Err(non_string_key())
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String> {
        Err(non_string_key())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(non_string_key())
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(non_string_key())
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct> {
        Err(non_string_key())
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(non_string_key())
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(non_string_key())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(non_string_key())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(non_string_key())
    }
}
