//! Error types for plist encoding and decoding operations.

use std::fmt::Display;

use thiserror::Error;

/// Errors that can occur during plist encoding or decoding.
///
/// Every variant is terminal: neither the decoder nor the encoder can resume
/// after returning one, because the underlying token stream cannot be rewound.
#[derive(Error, Debug)]
pub enum PlistError {
    /// The underlying reader or writer failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The XML tokenizer rejected the input (malformed markup, bad escapes).
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Token text that is not valid UTF-8.
    #[error("invalid UTF-8 in XML text: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The token stream does not follow the plist grammar: unexpected or unknown
    /// element, a `<key>` without a value, a mismatched end tag, or input that
    /// ends inside a container.
    #[error("plist format error: {0}")]
    Format(String),

    /// Element text that fails every representation tier for its type.
    #[error("invalid <{kind}> value: '{raw}'")]
    InvalidValue { kind: &'static str, raw: String },

    /// The encoder API was driven out of order: writing to a finished
    /// encoder, writing to a parent while a child container is open, a
    /// non-string dictionary key, or a document without exactly one
    /// top-level container.
    #[error("encoder misuse: {0}")]
    Misuse(String),

    /// A value with no plist representation reached the serde adapter.
    #[error("unsupported type: {0}")]
    Unsupported(String),

    /// A dictionary key appeared twice under `DuplicateKeys::Reject`.
    #[error("duplicate dictionary key '{0}'")]
    DuplicateKey(String),

    /// A caller-supplied error, raised from a builder callback or through
    /// `serde::ser::Error::custom`.
    #[error("{0}")]
    Custom(String),
}

impl PlistError {
    /// True for programmer errors in driving the encoder, as opposed to
    /// data or I/O errors.
    pub fn is_misuse(&self) -> bool {
        matches!(self, PlistError::Misuse(_))
    }

    pub(crate) fn format(message: impl Into<String>) -> Self {
        PlistError::Format(message.into())
    }

    pub(crate) fn misuse(message: impl Into<String>) -> Self {
        PlistError::Misuse(message.into())
    }

    pub(crate) fn invalid(kind: &'static str, raw: &str) -> Self {
        PlistError::InvalidValue {
            kind,
            raw: raw.to_string(),
        }
    }
}

impl serde::ser::Error for PlistError {
    fn custom<T: Display>(msg: T) -> Self {
        PlistError::Custom(msg.to_string())
    }
}

/// Convenience alias used throughout plist-xml.
pub type Result<T> = std::result::Result<T, PlistError>;
