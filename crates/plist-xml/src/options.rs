//! Decoder configuration.
//!
//! Options are plain data and derive serde so that applications can embed
//! them in their own configuration files:
//!
//! ```
//! use plist_xml::{DecodeOptions, DuplicateKeys};
//!
//! let options: DecodeOptions =
//!     serde_json::from_str(r#"{"duplicate_keys":"last_wins","max_depth":64}"#).unwrap();
//! assert_eq!(options.duplicate_keys, DuplicateKeys::LastWins);
//! assert_eq!(options.max_depth, Some(64));
//! ```

use serde::{Deserialize, Serialize};

/// What the tree builder does when a dictionary repeats a key.
///
/// The event stream itself never filters entries; this policy applies when
/// events are collected into a [`Dict`](crate::Dict).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKeys {
    /// Fail with `PlistError::DuplicateKey`.
    #[default]
    Reject,
    /// Keep the first value, ignore later ones.
    FirstWins,
    /// Replace the value, keeping the key's original position.
    LastWins,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    pub duplicate_keys: DuplicateKeys,
    /// Maximum container nesting depth; `None` means unlimited.
    pub max_depth: Option<usize>,
}

impl DecodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duplicate_keys(mut self, policy: DuplicateKeys) -> Self {
        self.duplicate_keys = policy;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }
}
