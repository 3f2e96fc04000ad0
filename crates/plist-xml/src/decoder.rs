//! Pull-style plist decoder.
//!
//! [`PlistDecoder::next_value`] turns the XML token stream into a flat
//! sequence of [`Value`] events while tracking nesting on an explicit,
//! index-addressed frame stack:
//!
//! ```text
//! <plist><dict><key>a</key><array><true/></array></dict></plist>
//!
//! DictStart
//! DictEntry { key: "a", value: ArrayStart }
//! Bool(true)
//! ContainerEnd      // </array>
//! ContainerEnd      // </dict>
//! None              // end of input
//! ```
//!
//! # Key design decisions
//!
//! - **One frame per open container**: a frame records its kind and the index
//!   of its parent. The top frame decides the grammar for the next token:
//!   array frames accept any value element, dict frames only `<key>` (followed
//!   by exactly one value) or `</dict>`.
//! - **End tags are checked here**, not by the tokenizer, so a mismatched or
//!   surplus end tag is reported as a plist format error.
//! - **Errors are terminal**: the token stream cannot be rewound, so after the
//!   first error every call fails.
//! - **Bare fragments**: a document whose first element is `<array>` or
//!   `<dict>` (no `<plist>` wrapper) is accepted.

use std::io::BufRead;

use tracing::{debug, trace};

use crate::codec;
use crate::error::{PlistError, Result};
use crate::options::DecodeOptions;
use crate::types::Value;
use crate::xml::{Container, Token, TokenCursor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Before the top-level container: declaration, DOCTYPE, `<plist>`.
    Prologue,
    /// Inside the top-level container.
    Body,
    /// After the top-level container closed: `</plist>`, then end of input.
    Epilogue,
    Done,
    Failed,
}

/// An open container on the decoder's stack.
#[derive(Debug, Clone, Copy)]
struct Frame {
    kind: Container,
    /// Index of the enclosing frame; `None` for the top-level container.
    parent: Option<usize>,
}

/// Streaming decoder over any buffered reader.
///
/// # Example
/// ```
/// use plist_xml::{PlistDecoder, Value};
///
/// let mut decoder = PlistDecoder::new("<array><string>hi</string></array>".as_bytes());
/// assert_eq!(decoder.next_value().unwrap(), Some(Value::ArrayStart));
/// assert_eq!(decoder.next_value().unwrap(), Some(Value::String("hi".into())));
/// assert_eq!(decoder.next_value().unwrap(), Some(Value::ContainerEnd));
/// assert_eq!(decoder.next_value().unwrap(), None);
/// ```
pub struct PlistDecoder<R: BufRead> {
    cursor: TokenCursor<R>,
    frames: Vec<Frame>,
    phase: Phase,
    /// The document opened with `<plist>` and must close with `</plist>`.
    wrapped: bool,
    options: DecodeOptions,
}

impl<R: BufRead> PlistDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, DecodeOptions::default())
    }

    pub fn with_options(reader: R, options: DecodeOptions) -> Self {
        Self {
            cursor: TokenCursor::new(reader),
            frames: Vec::new(),
            phase: Phase::Prologue,
            wrapped: false,
            options,
        }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Number of currently open containers.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Decode the next event. `Ok(None)` means the document ended cleanly.
    pub fn next_value(&mut self) -> Result<Option<Value>> {
        let result = match self.phase {
            Phase::Prologue => self.read_prologue(),
            Phase::Body => self.read_body().map(Some),
            Phase::Epilogue => self.read_epilogue(),
            Phase::Done => Ok(None),
            Phase::Failed => Err(PlistError::format(
                "decoder cannot continue after an error",
            )),
        };
        if result.is_err() {
            self.phase = Phase::Failed;
        }
        result
    }

    fn read_prologue(&mut self) -> Result<Option<Value>> {
        loop {
            let token = self.cursor.next_significant()?;
            match token {
                Token::Directive => {}
                Token::Start(name) if name == "plist" && !self.wrapped => {
                    debug!("entered <plist> root element");
                    self.wrapped = true;
                }
                Token::Start(name) if name == "array" => {
                    self.push(Container::Array)?;
                    return Ok(Some(Value::ArrayStart));
                }
                Token::Start(name) if name == "dict" => {
                    self.push(Container::Dict)?;
                    return Ok(Some(Value::DictStart));
                }
                Token::Eof if !self.wrapped => {
                    self.phase = Phase::Done;
                    return Ok(None);
                }
                Token::End(name) if name == "plist" && self.wrapped => {
                    return Err(PlistError::format(
                        "<plist> contains no top-level array or dict",
                    ))
                }
                other => {
                    return Err(PlistError::format(format!(
                        "expected a top-level <array> or <dict>, found {}",
                        describe(&other)
                    )))
                }
            }
        }
    }

    fn read_body(&mut self) -> Result<Value> {
        let frame = *self
            .frames
            .last()
            .ok_or_else(|| PlistError::format("no open container"))?;
        let value = match frame.kind {
            Container::Array => self.read_item()?,
            Container::Dict => self.read_entry()?,
        };

        if let Some(kind) = opened_container(&value) {
            self.push(kind)?;
        } else if value == Value::ContainerEnd {
            self.pop();
        }
        Ok(value)
    }

    /// Next element of an array frame, or its end.
    fn read_item(&mut self) -> Result<Value> {
        match self.cursor.next_significant()? {
            Token::Start(name) => self.read_element(&name),
            Token::End(name) if name == "array" => Ok(Value::ContainerEnd),
            other => Err(PlistError::format(format!(
                "expected a value or </array>, found {}",
                describe(&other)
            ))),
        }
    }

    /// Next `<key>` + value pair of a dict frame, or its end.
    fn read_entry(&mut self) -> Result<Value> {
        match self.cursor.next_significant()? {
            Token::Start(name) if name == "key" => {
                let key = self.cursor.read_text("key")?;
                match self.cursor.next_significant()? {
                    Token::Start(name) => {
                        let value = self.read_element(&name)?;
                        Ok(Value::entry(key, value))
                    }
                    other => Err(PlistError::format(format!(
                        "key '{key}' is not followed by a value, found {}",
                        describe(&other)
                    ))),
                }
            }
            Token::End(name) if name == "dict" => Ok(Value::ContainerEnd),
            other => Err(PlistError::format(format!(
                "expected <key> or </dict>, found {}",
                describe(&other)
            ))),
        }
    }

    /// Decode the element whose start tag `<name>` was just consumed.
    fn read_element(&mut self, name: &str) -> Result<Value> {
        let value = match name {
            "string" => Value::String(self.cursor.read_text(name)?),
            "true" => {
                self.cursor.skip_to_end(name)?;
                Value::Bool(true)
            }
            "false" => {
                self.cursor.skip_to_end(name)?;
                Value::Bool(false)
            }
            "integer" => Value::Integer(codec::parse_integer(&self.cursor.read_text(name)?)?),
            "real" => Value::Real(codec::parse_real(&self.cursor.read_text(name)?)?),
            "date" => Value::Date(codec::parse_date(&self.cursor.read_text(name)?)?),
            "data" => Value::Data(codec::decode_data(&self.cursor.read_text(name)?)?),
            "array" => Value::ArrayStart,
            "dict" => Value::DictStart,
            other => {
                return Err(PlistError::format(format!("unknown element <{other}>")));
            }
        };
        Ok(value)
    }

    fn read_epilogue(&mut self) -> Result<Option<Value>> {
        let mut root_closed = !self.wrapped;
        loop {
            match self.cursor.next_significant()? {
                Token::End(name) if name == "plist" && !root_closed => root_closed = true,
                Token::Directive => {}
                Token::Eof if root_closed => {
                    debug!("plist document fully decoded");
                    self.phase = Phase::Done;
                    return Ok(None);
                }
                Token::Eof => return Err(PlistError::format("input ended before </plist>")),
                other => {
                    return Err(PlistError::format(format!(
                        "unexpected {} after the top-level container",
                        describe(&other)
                    )))
                }
            }
        }
    }

    fn push(&mut self, kind: Container) -> Result<()> {
        if let Some(limit) = self.options.max_depth {
            if self.frames.len() >= limit {
                return Err(PlistError::format(format!(
                    "nesting exceeds the maximum depth of {limit}"
                )));
            }
        }
        let parent = self.frames.len().checked_sub(1);
        self.frames.push(Frame { kind, parent });
        self.phase = Phase::Body;
        trace!(depth = self.frames.len(), container = kind.tag(), "frame pushed");
        Ok(())
    }

    fn pop(&mut self) {
        if let Some(frame) = self.frames.pop() {
            trace!(depth = self.frames.len(), container = frame.kind.tag(), "frame popped");
            if frame.parent.is_none() {
                self.phase = Phase::Epilogue;
            }
        }
    }
}

impl<R: BufRead> Iterator for PlistDecoder<R> {
    type Item = Result<Value>;

    /// Yields events until end of input; after an error yields it once and
    /// then stops.
    fn next(&mut self) -> Option<Self::Item> {
        if self.phase == Phase::Failed {
            return None;
        }
        self.next_value().transpose()
    }
}

/// The container an event opens, if any.
fn opened_container(value: &Value) -> Option<Container> {
    match value {
        Value::ArrayStart => Some(Container::Array),
        Value::DictStart => Some(Container::Dict),
        Value::DictEntry { value, .. } => opened_container(value),
        _ => None,
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Start(name) => format!("<{name}>"),
        Token::End(name) => format!("</{name}>"),
        Token::Text(text) => format!("text '{}'", text.trim()),
        Token::Comment => "a comment".to_string(),
        Token::Directive => "an XML directive".to_string(),
        Token::Eof => "end of input".to_string(),
    }
}
