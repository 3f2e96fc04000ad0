//! Owned plist documents.
//!
//! [`Plist`] is a fully materialized value tree, built from the decoder's
//! event stream and written back through the container encoders. [`Dict`]
//! keeps insertion order and unique keys.
//!
//! The tree also bridges to `serde_json::Value`, which is handy for
//! inspecting or producing plists with JSON tooling.

use std::io::{BufRead, Write};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::{Map, Number};

use crate::codec;
use crate::decoder::PlistDecoder;
use crate::encoder::{DocumentEncoder, FlatWriter, Leaf};
use crate::error::{PlistError, Result};
use crate::options::{DecodeOptions, DuplicateKeys};
use crate::types::{Integer, Real, Value};
use crate::xml::Container;

/// A complete plist value.
#[derive(Debug, Clone, PartialEq)]
pub enum Plist {
    String(String),
    Bool(bool),
    Integer(Integer),
    Real(Real),
    Date(DateTime<Utc>),
    Data(Vec<u8>),
    Array(Vec<Plist>),
    Dict(Dict),
}

/// An insertion-ordered dictionary with unique string keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dict {
    entries: Vec<(String, Plist)>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `key` with `value`. A new key goes to the end; an existing
    /// key keeps its position and the previous value is returned.
    pub fn insert(&mut self, key: impl Into<String>, value: Plist) -> Option<Plist> {
        let key = key.into();
        match self.position(&key) {
            Some(index) => Some(std::mem::replace(&mut self.entries[index].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Plist> {
        self.position(key).map(|index| &self.entries[index].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Plist> {
        self.position(key).map(move |index| &mut self.entries[index].1)
    }

    /// Remove `key`, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<Plist> {
        self.position(key).map(|index| self.entries.remove(index).1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Plist)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    /// Insert according to a duplicate-key policy.
    fn insert_with(&mut self, key: String, value: Plist, policy: DuplicateKeys) -> Result<()> {
        match (self.position(&key), policy) {
            (None, _) => self.entries.push((key, value)),
            (Some(_), DuplicateKeys::Reject) => return Err(PlistError::DuplicateKey(key)),
            (Some(_), DuplicateKeys::FirstWins) => {}
            (Some(index), DuplicateKeys::LastWins) => self.entries[index].1 = value,
        }
        Ok(())
    }
}

impl FromIterator<(String, Plist)> for Dict {
    /// Later duplicates replace earlier values in place.
    fn from_iter<I: IntoIterator<Item = (String, Plist)>>(iter: I) -> Self {
        let mut dict = Dict::new();
        for (key, value) in iter {
            dict.insert(key, value);
        }
        dict
    }
}

/// A container being collected while its events stream in.
enum Partial {
    Array(Vec<Plist>),
    Dict(Dict),
}

/// A partial container plus the dict key it will be stored under.
struct Pending {
    container: Partial,
    key: Option<String>,
}

impl Plist {
    /// Decode a whole document with default options.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Plist> {
        Self::from_reader_with_options(reader, &DecodeOptions::default())
    }

    pub fn from_reader_with_options<R: BufRead>(reader: R, options: &DecodeOptions) -> Result<Plist> {
        let mut decoder = PlistDecoder::with_options(reader, options.clone());
        read_tree(&mut decoder, options.duplicate_keys)
    }

    /// Encode as a document. The root must be an array or dict.
    pub fn to_writer<W: Write>(&self, writer: W) -> Result<W> {
        let (kind, children) = match self {
            Plist::Array(items) => (Container::Array, Children::Items(items.iter())),
            Plist::Dict(dict) => (Container::Dict, Children::Entries(dict.entries.iter())),
            _ => {
                return Err(PlistError::Unsupported(
                    "the top-level value of a plist must be an array or dict".to_string(),
                ))
            }
        };
        let mut document = DocumentEncoder::new(writer)?;
        write_tree(&mut document.begin_flat(kind)?, children)?;
        document.finish()
    }

    pub fn to_xml_string(&self) -> Result<String> {
        let bytes = self.to_writer(Vec::new())?;
        String::from_utf8(bytes).map_err(|e| PlistError::Utf8(e.utf8_error()))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Plist::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Plist::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&Integer> {
        match self {
            Plist::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Plist]> {
        match self {
            Plist::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Plist::Dict(dict) => Some(dict),
            _ => None,
        }
    }

    /// Convert to JSON. Dates become RFC 3339 strings, data becomes base64,
    /// and numbers JSON cannot hold (big tiers, non-finite doubles) become
    /// their plist decimal text.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;
        match self {
            Plist::String(s) => Json::String(s.clone()),
            Plist::Bool(b) => Json::Bool(*b),
            Plist::Integer(Integer::Signed(v)) => Json::Number(Number::from(*v)),
            Plist::Integer(Integer::Unsigned(v)) => Json::Number(Number::from(*v)),
            Plist::Integer(big) => Json::String(codec::format_integer(big)),
            Plist::Real(Real::Double(v)) => Number::from_f64(*v)
                .map(Json::Number)
                .unwrap_or_else(|| Json::String(codec::format_real(&Real::Double(*v)))),
            Plist::Real(big) => Json::String(codec::format_real(big)),
            Plist::Date(date) => Json::String(
                codec::format_date(date).unwrap_or_else(|_| date.to_rfc3339()),
            ),
            Plist::Data(bytes) => Json::String(codec::encode_data(bytes)),
            Plist::Array(items) => Json::Array(items.iter().map(Plist::to_json).collect()),
            Plist::Dict(dict) => {
                let map: Map<String, Json> = dict
                    .iter()
                    .map(|(key, value)| (key.to_string(), value.to_json()))
                    .collect();
                Json::Object(map)
            }
        }
    }

    /// Convert from JSON. Integers keep their JSON tier (`i64`, else `u64`);
    /// other numbers become doubles. `null` has no plist form.
    pub fn from_json(json: &serde_json::Value) -> Result<Plist> {
        use serde_json::Value as Json;
        let plist = match json {
            Json::Null => {
                return Err(PlistError::Unsupported(
                    "JSON null has no plist representation".to_string(),
                ))
            }
            Json::Bool(b) => Plist::Bool(*b),
            Json::Number(n) => {
                if let Some(v) = n.as_i64() {
                    Plist::Integer(Integer::Signed(v))
                } else if let Some(v) = n.as_u64() {
                    Plist::Integer(Integer::Unsigned(v))
                } else {
                    let v = n.as_f64().ok_or_else(|| {
                        PlistError::Unsupported(format!("JSON number {n} is not representable"))
                    })?;
                    Plist::Real(Real::Double(v))
                }
            }
            Json::String(s) => Plist::String(s.clone()),
            Json::Array(items) => {
                Plist::Array(items.iter().map(Plist::from_json).collect::<Result<_>>()?)
            }
            Json::Object(map) => {
                let mut dict = Dict::new();
                for (key, value) in map {
                    dict.insert(key.clone(), Plist::from_json(value)?);
                }
                Plist::Dict(dict)
            }
        };
        Ok(plist)
    }
}

impl FromStr for Plist {
    type Err = PlistError;

    fn from_str(xml: &str) -> Result<Plist> {
        Plist::from_reader(xml.as_bytes())
    }
}

impl From<Dict> for Plist {
    fn from(dict: Dict) -> Self {
        Plist::Dict(dict)
    }
}

impl From<Vec<Plist>> for Plist {
    fn from(items: Vec<Plist>) -> Self {
        Plist::Array(items)
    }
}

/// Collect the event stream into a tree. Iterative, so document depth is
/// bounded by memory rather than the call stack.
fn read_tree<R: BufRead>(decoder: &mut PlistDecoder<R>, policy: DuplicateKeys) -> Result<Plist> {
    let mut stack: Vec<Pending> = Vec::new();

    loop {
        let event = decoder
            .next_value()?
            .ok_or_else(|| PlistError::format("document has no top-level array or dict"))?;

        let (key, value) = match event {
            Value::DictEntry { key, value } => (Some(key), *value),
            other => (None, other),
        };

        let finished = match value {
            Value::ArrayStart => {
                stack.push(Pending {
                    container: Partial::Array(Vec::new()),
                    key,
                });
                continue;
            }
            Value::DictStart => {
                stack.push(Pending {
                    container: Partial::Dict(Dict::new()),
                    key,
                });
                continue;
            }
            Value::ContainerEnd => {
                let done = stack
                    .pop()
                    .ok_or_else(|| PlistError::format("container end without a start"))?;
                let plist = match done.container {
                    Partial::Array(items) => Plist::Array(items),
                    Partial::Dict(dict) => Plist::Dict(dict),
                };
                if stack.is_empty() {
                    // Drain the epilogue so trailing garbage is still an error.
                    if let Some(extra) = decoder.next_value()? {
                        return Err(PlistError::format(format!(
                            "unexpected {extra:?} after the top-level container"
                        )));
                    }
                    return Ok(plist);
                }
                (done.key, plist)
            }
            leaf => (key, leaf_to_plist(leaf)?),
        };

        let (key, plist) = finished;
        match stack.last_mut().map(|pending| &mut pending.container) {
            Some(Partial::Array(items)) => items.push(plist),
            Some(Partial::Dict(dict)) => {
                let key = key.ok_or_else(|| PlistError::format("dict value without a key"))?;
                dict.insert_with(key, plist, policy)?;
            }
            None => return Err(PlistError::format("value outside of a container")),
        }
    }
}

fn leaf_to_plist(value: Value) -> Result<Plist> {
    let plist = match value {
        Value::String(s) => Plist::String(s),
        Value::Bool(b) => Plist::Bool(b),
        Value::Integer(i) => Plist::Integer(i),
        Value::Real(r) => Plist::Real(r),
        Value::Date(d) => Plist::Date(d),
        Value::Data(bytes) => Plist::Data(bytes),
        other => return Err(PlistError::format(format!("unexpected event {other:?}"))),
    };
    Ok(plist)
}

/// Remaining children of a container being written.
enum Children<'p> {
    Items(std::slice::Iter<'p, Plist>),
    Entries(std::slice::Iter<'p, (String, Plist)>),
}

/// Write the children of the root container and close it. Open containers
/// live on an explicit stack, so depth is bounded by memory.
fn write_tree<W: Write>(out: &mut FlatWriter<'_, W>, root: Children<'_>) -> Result<()> {
    let mut stack = vec![root];

    while let Some(top) = stack.last_mut() {
        let next = match top {
            Children::Items(items) => items.next().map(|value| (None, value)),
            Children::Entries(entries) => entries
                .next()
                .map(|(key, value)| (Some(key.as_str()), value)),
        };
        let Some((key, value)) = next else {
            out.close()?;
            stack.pop();
            continue;
        };
        if let Some(key) = key {
            out.key(key)?;
        }
        let leaf = match value {
            Plist::Array(items) => {
                out.open(Container::Array)?;
                stack.push(Children::Items(items.iter()));
                continue;
            }
            Plist::Dict(dict) => {
                out.open(Container::Dict)?;
                stack.push(Children::Entries(dict.entries.iter()));
                continue;
            }
            Plist::String(s) => Leaf::String(s),
            Plist::Bool(b) => Leaf::Bool(*b),
            Plist::Integer(i) => Leaf::Integer(i),
            Plist::Real(r) => Leaf::Real(r),
            Plist::Date(d) => Leaf::Date(d),
            Plist::Data(bytes) => Leaf::Data(bytes),
        };
        out.leaf(leaf)?;
    }
    Ok(())
}

/// Dropping moves nested children onto a heap stack so a deep tree does not
/// recurse once per level.
impl Drop for Plist {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        take_children(self, &mut pending);
        while let Some(mut child) = pending.pop() {
            take_children(&mut child, &mut pending);
        }
    }
}

fn take_children(plist: &mut Plist, into: &mut Vec<Plist>) {
    match plist {
        Plist::Array(items) => into.append(items),
        Plist::Dict(dict) => into.extend(
            std::mem::take(&mut dict.entries)
                .into_iter()
                .map(|(_, value)| value),
        ),
        _ => {}
    }
}
