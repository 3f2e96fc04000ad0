//! Thin token layer over quick-xml.
//!
//! The decoder sees a document as a flat sequence of [`Token`]s; the encoder
//! writes through [`TokenSink`], which owns the pretty-printing writer and the
//! stack of open containers shared by every encoder handle.

use std::io::{BufRead, Write};

use quick_xml::escape::unescape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{PlistError, Result};

/// One document-ordered token as the decoder consumes it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Start(String),
    End(String),
    /// Character data: text, CDATA and resolved entity references.
    Text(String),
    Comment,
    /// XML declaration, processing instruction or DOCTYPE.
    Directive,
    Eof,
}

impl Token {
    /// Text made only of whitespace carries no plist content.
    pub(crate) fn is_blank(&self) -> bool {
        matches!(self, Token::Text(text) if text.trim().is_empty())
    }
}

/// Shared read position in the XML input.
pub(crate) struct TokenCursor<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
}

impl<R: BufRead> TokenCursor<R> {
    pub(crate) fn new(inner: R) -> Self {
        let mut reader = Reader::from_reader(inner);
        let config = reader.config_mut();
        // `<true/>` and `<true></true>` become the same Start/End pair.
        config.expand_empty_elements = true;
        // End tags are matched against the frame stack so that mismatches
        // surface as plist format errors.
        config.check_end_names = false;
        // Surplus end tags reach the decoder and become format errors too.
        config.allow_unmatched_ends = true;
        Self {
            reader,
            buf: Vec::new(),
        }
    }

    pub(crate) fn next_token(&mut self) -> Result<Token> {
        self.buf.clear();
        let token = match self.reader.read_event_into(&mut self.buf)? {
            Event::Start(start) => Token::Start(utf8(start.name().as_ref())?),
            Event::End(end) => Token::End(utf8(end.name().as_ref())?),
            // Only reachable if empty-element expansion is switched off.
            Event::Empty(start) => {
                return Err(PlistError::format(format!(
                    "unexpanded empty element <{}/>",
                    utf8(start.name().as_ref())?
                )))
            }
            Event::Text(text) => Token::Text(utf8(&text)?),
            Event::CData(data) => Token::Text(utf8(&data)?),
            Event::GeneralRef(reference) => {
                let escaped = format!("&{};", utf8(&reference)?);
                let resolved = unescape(&escaped).map_err(|e| {
                    PlistError::format(format!("cannot resolve entity {escaped}: {e}"))
                })?;
                Token::Text(resolved.into_owned())
            }
            Event::Comment(_) => Token::Comment,
            Event::Decl(_) | Event::PI(_) | Event::DocType(_) => Token::Directive,
            Event::Eof => Token::Eof,
        };
        Ok(token)
    }

    /// Next token that is not a comment or whitespace-only text.
    pub(crate) fn next_significant(&mut self) -> Result<Token> {
        loop {
            let token = self.next_token()?;
            if token == Token::Comment || token.is_blank() {
                continue;
            }
            return Ok(token);
        }
    }

    /// Concatenate character data until `</name>`. Comments are skipped; a
    /// nested element, a different end tag, or end of input is an error.
    pub(crate) fn read_text(&mut self, name: &str) -> Result<String> {
        let mut text = String::new();
        loop {
            match self.next_token()? {
                Token::Text(chunk) => text.push_str(&chunk),
                Token::Comment => {}
                Token::End(end) if end == name => return Ok(text),
                Token::End(end) => {
                    return Err(PlistError::format(format!(
                        "expected </{name}>, found </{end}>"
                    )))
                }
                Token::Start(start) => {
                    return Err(PlistError::format(format!(
                        "unexpected <{start}> inside <{name}>"
                    )))
                }
                Token::Directive => {
                    return Err(PlistError::format(format!(
                        "unexpected directive inside <{name}>"
                    )))
                }
                Token::Eof => {
                    return Err(PlistError::format(format!(
                        "input ended inside <{name}>"
                    )))
                }
            }
        }
    }

    /// Skip everything up to `</name>`, ignoring any character data.
    pub(crate) fn skip_to_end(&mut self, name: &str) -> Result<()> {
        loop {
            match self.next_token()? {
                Token::End(end) if end == name => return Ok(()),
                Token::Eof => {
                    return Err(PlistError::format(format!(
                        "input ended inside <{name}>"
                    )))
                }
                _ => {}
            }
        }
    }
}

fn utf8(bytes: &[u8]) -> Result<String> {
    Ok(std::str::from_utf8(bytes)?.to_string())
}

const DOCTYPE: &str = r#"plist PUBLIC "-//Apple Computer//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd""#;

/// Kind of an open container on the encoder stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Container {
    Array,
    Dict,
}

impl Container {
    pub(crate) fn tag(self) -> &'static str {
        match self {
            Container::Array => "array",
            Container::Dict => "dict",
        }
    }
}

/// An open container. Its start tag is deferred until the first child is
/// written, so that an empty container comes out as `<array/>`.
#[derive(Debug)]
struct OpenContainer {
    kind: Container,
    started: bool,
}

/// Output side: the indenting writer plus the stack of open containers.
pub(crate) struct TokenSink<W: Write> {
    writer: Writer<W>,
    open: Vec<OpenContainer>,
    poisoned: bool,
}

impl<W: Write> TokenSink<W> {
    /// One tab per nesting level.
    pub(crate) fn new(inner: W) -> Self {
        Self {
            writer: Writer::new_with_indent(inner, b'\t', 1),
            open: Vec::new(),
            poisoned: false,
        }
    }

    /// Declaration, DOCTYPE and `<plist version="1.0">`. The writer breaks
    /// the line before each markup event, so each lands on its own line.
    pub(crate) fn write_header(&mut self) -> Result<()> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.writer
            .write_event(Event::DocType(BytesText::from_escaped(DOCTYPE)))?;
        let root = BytesStart::new("plist").with_attributes([("version", "1.0")]);
        self.writer.write_event(Event::Start(root))?;
        Ok(())
    }

    /// `</plist>` followed by the one and only flush.
    pub(crate) fn write_footer(&mut self) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new("plist")))?;
        self.writer.get_mut().flush()?;
        Ok(())
    }

    pub(crate) fn depth(&self) -> usize {
        self.open.len()
    }

    pub(crate) fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub(crate) fn poison(&mut self) {
        self.poisoned = true;
    }

    pub(crate) fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    /// Push a container; its start tag waits for the first child.
    pub(crate) fn open(&mut self, kind: Container) -> Result<()> {
        self.start_pending()?;
        self.open.push(OpenContainer {
            kind,
            started: false,
        });
        Ok(())
    }

    /// Pop the innermost container and write its end tag, or the
    /// self-closing form when it never received a child.
    pub(crate) fn close(&mut self) -> Result<Container> {
        let top = self
            .open
            .pop()
            .ok_or_else(|| PlistError::misuse("no open container to close"))?;
        let tag = top.kind.tag();
        if top.started {
            self.writer.write_event(Event::End(BytesEnd::new(tag)))?;
        } else {
            self.writer.write_event(Event::Empty(BytesStart::new(tag)))?;
        }
        Ok(top.kind)
    }

    /// `<name>text</name>`; the text is escaped.
    pub(crate) fn text_element(&mut self, name: &str, text: &str) -> Result<()> {
        self.start_pending()?;
        self.writer.write_event(Event::Start(BytesStart::new(name)))?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    /// `<name/>`
    pub(crate) fn empty_element(&mut self, name: &str) -> Result<()> {
        self.start_pending()?;
        self.writer.write_event(Event::Empty(BytesStart::new(name)))?;
        Ok(())
    }

    fn start_pending(&mut self) -> Result<()> {
        if let Some(top) = self.open.last_mut() {
            if !top.started {
                top.started = true;
                let tag = top.kind.tag();
                self.writer.write_event(Event::Start(BytesStart::new(tag)))?;
            }
        }
        Ok(())
    }
}
