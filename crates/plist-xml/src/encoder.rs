//! Push-style plist encoder.
//!
//! A document is built through nested container encoders that share one
//! token sink. Two styles are offered and can be mixed freely:
//!
//! - **Callbacks**: `write_array(|a| ...)` / `write_dict(|d| ...)` open a
//!   child, run the callback, and close the child when it returns `Ok`.
//! - **Handles**: `begin_array()` / `begin_dict()` return a child encoder that
//!   mutably borrows its parent, so the parent cannot be written to until the
//!   child is gone. `end(self)` closes the child.
//!
//! # Ordering rules
//!
//! Every encoder is in one of three [`EncoderState`]s. Writes are only
//! accepted in `Ready`; anything else returns [`PlistError::Misuse`]:
//!
//! - a child handle dropped without `end` leaves its parent in `ChildOpen`
//!   for good, so the half-written child can never be followed by siblings;
//! - a callback that fails poisons the whole sink: the error propagates, no
//!   closing tag is written, and every encoder reports `Finished`.
//!
//! # Example
//! ```
//! use plist_xml::encode_dict_plist;
//!
//! let mut out = Vec::new();
//! encode_dict_plist(&mut out, |d| {
//!     d.write_string("name", "Bilbo Baggins")?;
//!     d.write_uint("age", 111)?;
//!     d.write_array("friends", |a| a.write_string("Gandalf the Grey"))
//! })
//! .unwrap();
//! let xml = String::from_utf8(out).unwrap();
//! assert!(xml.contains("\t\t<key>age</key>\n\t\t<integer>111</integer>"));
//! ```

use std::io::Write;

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::codec;
use crate::error::{PlistError, Result};
use crate::types::{Integer, Real};
use crate::xml::{Container, TokenSink};

/// Lifecycle of an encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderState {
    /// Accepts writes.
    Ready,
    /// A child container is open; the child must be closed first.
    ChildOpen,
    /// Closed, or unusable after a failed child. Terminal.
    Finished,
}

/// A leaf value on its way to the sink.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Leaf<'v> {
    String(&'v str),
    Bool(bool),
    Integer(&'v Integer),
    Real(&'v Real),
    Date(&'v DateTime<Utc>),
    Data(&'v [u8]),
}

fn write_leaf<W: Write>(sink: &mut TokenSink<W>, leaf: Leaf<'_>) -> Result<()> {
    match leaf {
        Leaf::String(value) => sink.text_element("string", value),
        Leaf::Bool(true) => sink.empty_element("true"),
        Leaf::Bool(false) => sink.empty_element("false"),
        Leaf::Integer(value) => sink.text_element("integer", &codec::format_integer(value)),
        Leaf::Real(value) => sink.text_element("real", &codec::format_real(value)),
        Leaf::Date(value) => sink.text_element("date", &codec::format_date(value)?),
        Leaf::Data(value) => sink.text_element("data", &codec::encode_data(value)),
    }
}

/// The part of a container encoder shared by arrays and dicts: the sink and
/// the sink depth at which this container is the innermost one.
struct Scope<'a, W: Write> {
    sink: &'a mut TokenSink<W>,
    level: usize,
}

impl<'a, W: Write> Scope<'a, W> {
    fn state(&self) -> EncoderState {
        let depth = self.sink.depth();
        if self.sink.is_poisoned() || depth < self.level {
            EncoderState::Finished
        } else if depth > self.level {
            EncoderState::ChildOpen
        } else {
            EncoderState::Ready
        }
    }

    fn ensure_ready(&self) -> Result<()> {
        match self.state() {
            EncoderState::Ready => Ok(()),
            EncoderState::ChildOpen => Err(PlistError::misuse(
                "cannot write to a container while its child container is open",
            )),
            EncoderState::Finished => Err(PlistError::misuse(
                "cannot write to a finished encoder",
            )),
        }
    }

    fn leaf(&mut self, leaf: Leaf<'_>) -> Result<()> {
        self.ensure_ready()?;
        write_leaf(self.sink, leaf)
    }

    fn key(&mut self, key: &str) -> Result<()> {
        self.ensure_ready()?;
        self.sink.text_element("key", key)
    }

    fn child(&mut self, kind: Container) -> Result<Scope<'_, W>> {
        self.ensure_ready()?;
        self.sink.open(kind)?;
        trace!(depth = self.level + 1, container = kind.tag(), "container opened");
        Ok(Scope {
            sink: &mut *self.sink,
            level: self.level + 1,
        })
    }

    fn close(self) -> Result<()> {
        self.ensure_ready()?;
        let kind = self.sink.close()?;
        trace!(depth = self.level, container = kind.tag(), "container closed");
        Ok(())
    }
}

/// Encoder for the elements of an `<array>`.
pub struct ArrayEncoder<'a, W: Write> {
    scope: Scope<'a, W>,
}

impl<'a, W: Write> ArrayEncoder<'a, W> {
    pub fn state(&self) -> EncoderState {
        self.scope.state()
    }

    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.scope.leaf(Leaf::String(value))
    }

    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.scope.leaf(Leaf::Bool(value))
    }

    /// Writes the value in the signed tier.
    pub fn write_int(&mut self, value: i64) -> Result<()> {
        self.scope.leaf(Leaf::Integer(&Integer::Signed(value)))
    }

    /// Writes the value in the unsigned tier.
    pub fn write_uint(&mut self, value: u64) -> Result<()> {
        self.scope.leaf(Leaf::Integer(&Integer::Unsigned(value)))
    }

    pub fn write_integer(&mut self, value: &Integer) -> Result<()> {
        self.scope.leaf(Leaf::Integer(value))
    }

    pub fn write_float(&mut self, value: f64) -> Result<()> {
        self.scope.leaf(Leaf::Real(&Real::Double(value)))
    }

    pub fn write_real(&mut self, value: &Real) -> Result<()> {
        self.scope.leaf(Leaf::Real(value))
    }

    pub fn write_date(&mut self, value: &DateTime<Utc>) -> Result<()> {
        self.scope.leaf(Leaf::Date(value))
    }

    pub fn write_data(&mut self, value: &[u8]) -> Result<()> {
        self.scope.leaf(Leaf::Data(value))
    }

    pub(crate) fn write_leaf(&mut self, leaf: Leaf<'_>) -> Result<()> {
        self.scope.leaf(leaf)
    }

    /// Open a nested array. `self` is unusable until the returned encoder is
    /// dropped; call [`ArrayEncoder::end`] on it to write the closing tag.
    pub fn begin_array(&mut self) -> Result<ArrayEncoder<'_, W>> {
        Ok(ArrayEncoder {
            scope: self.scope.child(Container::Array)?,
        })
    }

    /// Open a nested dict. See [`ArrayEncoder::begin_array`].
    pub fn begin_dict(&mut self) -> Result<DictEncoder<'_, W>> {
        Ok(DictEncoder {
            scope: self.scope.child(Container::Dict)?,
        })
    }

    /// Write a nested array whose contents are produced by `encode`.
    pub fn write_array<F>(&mut self, encode: F) -> Result<()>
    where
        F: FnOnce(&mut ArrayEncoder<'_, W>) -> Result<()>,
    {
        let mut child = self.begin_array()?;
        if let Err(err) = encode(&mut child) {
            child.scope.sink.poison();
            return Err(err);
        }
        child.end()
    }

    /// Write a nested dict whose entries are produced by `encode`.
    pub fn write_dict<F>(&mut self, encode: F) -> Result<()>
    where
        F: FnOnce(&mut DictEncoder<'_, W>) -> Result<()>,
    {
        let mut child = self.begin_dict()?;
        if let Err(err) = encode(&mut child) {
            child.scope.sink.poison();
            return Err(err);
        }
        child.end()
    }

    /// Write `</array>` (or `<array/>` when nothing was written).
    pub fn end(self) -> Result<()> {
        self.scope.close()
    }
}

/// Encoder for the entries of a `<dict>`.
///
/// Every write takes the entry's key, so a `<key>` is always immediately
/// followed by its value.
pub struct DictEncoder<'a, W: Write> {
    scope: Scope<'a, W>,
}

impl<'a, W: Write> DictEncoder<'a, W> {
    pub fn state(&self) -> EncoderState {
        self.scope.state()
    }

    pub fn write_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.write_leaf(key, Leaf::String(value))
    }

    pub fn write_bool(&mut self, key: &str, value: bool) -> Result<()> {
        self.write_leaf(key, Leaf::Bool(value))
    }

    pub fn write_int(&mut self, key: &str, value: i64) -> Result<()> {
        self.write_leaf(key, Leaf::Integer(&Integer::Signed(value)))
    }

    pub fn write_uint(&mut self, key: &str, value: u64) -> Result<()> {
        self.write_leaf(key, Leaf::Integer(&Integer::Unsigned(value)))
    }

    pub fn write_integer(&mut self, key: &str, value: &Integer) -> Result<()> {
        self.write_leaf(key, Leaf::Integer(value))
    }

    pub fn write_float(&mut self, key: &str, value: f64) -> Result<()> {
        self.write_leaf(key, Leaf::Real(&Real::Double(value)))
    }

    pub fn write_real(&mut self, key: &str, value: &Real) -> Result<()> {
        self.write_leaf(key, Leaf::Real(value))
    }

    pub fn write_date(&mut self, key: &str, value: &DateTime<Utc>) -> Result<()> {
        self.write_leaf(key, Leaf::Date(value))
    }

    pub fn write_data(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.write_leaf(key, Leaf::Data(value))
    }

    pub(crate) fn write_leaf(&mut self, key: &str, leaf: Leaf<'_>) -> Result<()> {
        self.scope.key(key)?;
        write_leaf(self.scope.sink, leaf)
    }

    /// Write `key` and open an array as its value.
    pub fn begin_array(&mut self, key: &str) -> Result<ArrayEncoder<'_, W>> {
        self.scope.key(key)?;
        Ok(ArrayEncoder {
            scope: self.scope.child(Container::Array)?,
        })
    }

    /// Write `key` and open a dict as its value.
    pub fn begin_dict(&mut self, key: &str) -> Result<DictEncoder<'_, W>> {
        self.scope.key(key)?;
        Ok(DictEncoder {
            scope: self.scope.child(Container::Dict)?,
        })
    }

    pub fn write_array<F>(&mut self, key: &str, encode: F) -> Result<()>
    where
        F: FnOnce(&mut ArrayEncoder<'_, W>) -> Result<()>,
    {
        let mut child = self.begin_array(key)?;
        if let Err(err) = encode(&mut child) {
            child.scope.sink.poison();
            return Err(err);
        }
        child.end()
    }

    pub fn write_dict<F>(&mut self, key: &str, encode: F) -> Result<()>
    where
        F: FnOnce(&mut DictEncoder<'_, W>) -> Result<()>,
    {
        let mut child = self.begin_dict(key)?;
        if let Err(err) = encode(&mut child) {
            child.scope.sink.poison();
            return Err(err);
        }
        child.end()
    }

    /// Write `</dict>` (or `<dict/>` when nothing was written).
    pub fn end(self) -> Result<()> {
        self.scope.close()
    }
}

/// Document driver: header, exactly one top-level container, footer.
///
/// [`encode_array_plist`] and [`encode_dict_plist`] cover the common case;
/// `DocumentEncoder` is for callers that need the handle style at the root.
pub struct DocumentEncoder<W: Write> {
    sink: TokenSink<W>,
    root_opened: bool,
}

impl<W: Write> DocumentEncoder<W> {
    /// Write the XML declaration, the DOCTYPE and `<plist version="1.0">`.
    pub fn new(writer: W) -> Result<Self> {
        let mut sink = TokenSink::new(writer);
        sink.write_header()?;
        debug!("plist header written");
        Ok(Self {
            sink,
            root_opened: false,
        })
    }

    pub fn state(&self) -> EncoderState {
        if self.sink.is_poisoned() {
            EncoderState::Finished
        } else if self.sink.depth() > 0 {
            EncoderState::ChildOpen
        } else if self.root_opened {
            EncoderState::Finished
        } else {
            EncoderState::Ready
        }
    }

    fn open_root(&mut self, kind: Container) -> Result<Scope<'_, W>> {
        match self.state() {
            EncoderState::Ready => {}
            EncoderState::ChildOpen => {
                return Err(PlistError::misuse("the top-level container is still open"))
            }
            EncoderState::Finished => {
                return Err(PlistError::misuse(
                    "a plist document holds exactly one top-level container",
                ))
            }
        }
        self.sink.open(kind)?;
        self.root_opened = true;
        trace!(depth = 1, container = kind.tag(), "container opened");
        Ok(Scope {
            sink: &mut self.sink,
            level: 1,
        })
    }

    pub fn begin_array(&mut self) -> Result<ArrayEncoder<'_, W>> {
        Ok(ArrayEncoder {
            scope: self.open_root(Container::Array)?,
        })
    }

    pub fn begin_dict(&mut self) -> Result<DictEncoder<'_, W>> {
        Ok(DictEncoder {
            scope: self.open_root(Container::Dict)?,
        })
    }

    pub fn write_array<F>(&mut self, encode: F) -> Result<()>
    where
        F: FnOnce(&mut ArrayEncoder<'_, W>) -> Result<()>,
    {
        let mut root = self.begin_array()?;
        if let Err(err) = encode(&mut root) {
            root.scope.sink.poison();
            return Err(err);
        }
        root.end()
    }

    pub fn write_dict<F>(&mut self, encode: F) -> Result<()>
    where
        F: FnOnce(&mut DictEncoder<'_, W>) -> Result<()>,
    {
        let mut root = self.begin_dict()?;
        if let Err(err) = encode(&mut root) {
            root.scope.sink.poison();
            return Err(err);
        }
        root.end()
    }

    /// Open the top-level container and return a writer that tracks no
    /// nesting of its own. For callers that walk their own explicit stack.
    pub(crate) fn begin_flat(&mut self, kind: Container) -> Result<FlatWriter<'_, W>> {
        let scope = self.open_root(kind)?;
        Ok(FlatWriter { sink: scope.sink })
    }

    /// Write `</plist>`, flush, and hand back the writer.
    pub fn finish(mut self) -> Result<W> {
        if self.sink.is_poisoned() {
            return Err(PlistError::misuse(
                "document is unusable after a failed container write",
            ));
        }
        if self.sink.depth() > 0 {
            return Err(PlistError::misuse("the top-level container was not closed"));
        }
        if !self.root_opened {
            return Err(PlistError::misuse(
                "a plist document requires one top-level array or dict",
            ));
        }
        self.sink.write_footer()?;
        debug!("plist document finished");
        Ok(self.sink.into_inner())
    }
}

/// Raw container events below the root. Balancing opens and closes is the
/// caller's job; `DocumentEncoder::finish` rejects an unbalanced document.
pub(crate) struct FlatWriter<'a, W: Write> {
    sink: &'a mut TokenSink<W>,
}

impl<W: Write> FlatWriter<'_, W> {
    pub(crate) fn open(&mut self, kind: Container) -> Result<()> {
        self.sink.open(kind)?;
        trace!(depth = self.sink.depth(), container = kind.tag(), "container opened");
        Ok(())
    }

    pub(crate) fn close(&mut self) -> Result<()> {
        let depth = self.sink.depth();
        let kind = self.sink.close()?;
        trace!(depth, container = kind.tag(), "container closed");
        Ok(())
    }

    pub(crate) fn key(&mut self, key: &str) -> Result<()> {
        self.sink.text_element("key", key)
    }

    pub(crate) fn leaf(&mut self, leaf: Leaf<'_>) -> Result<()> {
        write_leaf(self.sink, leaf)
    }
}

/// Encode a plist document whose top-level container is an array.
pub fn encode_array_plist<W, F>(writer: W, encode: F) -> Result<W>
where
    W: Write,
    F: FnOnce(&mut ArrayEncoder<'_, W>) -> Result<()>,
{
    let mut document = DocumentEncoder::new(writer)?;
    document.write_array(encode)?;
    document.finish()
}

/// Encode a plist document whose top-level container is a dict.
pub fn encode_dict_plist<W, F>(writer: W, encode: F) -> Result<W>
where
    W: Write,
    F: FnOnce(&mut DictEncoder<'_, W>) -> Result<()>,
{
    let mut document = DocumentEncoder::new(writer)?;
    document.write_dict(encode)?;
    document.finish()
}
