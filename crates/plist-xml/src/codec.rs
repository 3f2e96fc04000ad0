//! Text codecs for plist scalars: integer and real tier fallback, RFC 3339
//! dates, and base64 data blocks.
//!
//! # Integer tiers
//!
//! `parse_integer` tries, in order: `i64`, `u64`, arbitrary precision. The
//! next tier is only attempted after a *range* failure; a syntax error in the
//! `i64` attempt is fatal. Negative literals below `i64::MIN` skip the unsigned
//! tier and land directly in the big tier.
//!
//! # Real tiers
//!
//! `parse_real` tries `f64`, and only when a finite literal overflows to
//! infinity falls back to `BigDecimal`. Explicit `inf`/`infinity`/`nan`
//! literals stay in the `f64` tier.

use std::num::IntErrorKind;
use std::str::FromStr;

use base64::prelude::BASE64_STANDARD;
use base64::Engine;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use num_bigint::BigInt;
use tracing::trace;

use crate::error::{PlistError, Result};
use crate::types::{Integer, Real};

/// Parse `<integer>` text into the lowest tier that holds it.
pub fn parse_integer(raw: &str) -> Result<Integer> {
    let text = raw.trim();

    match text.parse::<i64>() {
        Ok(v) => return Ok(Integer::Signed(v)),
        Err(e) if !is_overflow(e.kind()) => return Err(PlistError::invalid("integer", raw)),
        Err(_) => {}
    }

    if let Ok(v) = text.parse::<u64>() {
        trace!(raw = text, "integer exceeds i64, using unsigned tier");
        return Ok(Integer::Unsigned(v));
    }

    // BigInt accepts `_` separators; plist text never contains them.
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(big) = BigInt::from_str(text) {
            trace!(digits = digits.len(), "integer exceeds 64 bits, using big tier");
            return Ok(Integer::Big(big));
        }
    }

    Err(PlistError::invalid("integer", raw))
}

fn is_overflow(kind: &IntErrorKind) -> bool {
    matches!(kind, IntErrorKind::PosOverflow | IntErrorKind::NegOverflow)
}

/// Canonical decimal text of an integer's tier.
pub fn format_integer(value: &Integer) -> String {
    match value {
        Integer::Signed(v) => v.to_string(),
        Integer::Unsigned(v) => v.to_string(),
        Integer::Big(v) => v.to_string(),
    }
}

/// Parse `<real>` text: `f64` first, arbitrary precision on overflow.
pub fn parse_real(raw: &str) -> Result<Real> {
    let text = raw.trim();
    let value = text
        .parse::<f64>()
        .map_err(|_| PlistError::invalid("real", raw))?;

    if value.is_infinite() && !is_infinity_literal(text) {
        trace!(raw = text, "real overflows f64, using big tier");
        return BigDecimal::from_str(text)
            .map(Real::Big)
            .map_err(|_| PlistError::invalid("real", raw));
    }

    Ok(Real::Double(value))
}

fn is_infinity_literal(text: &str) -> bool {
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    unsigned.eq_ignore_ascii_case("inf") || unsigned.eq_ignore_ascii_case("infinity")
}

/// Format a real for `<real>` text.
///
/// Doubles use the shortest digit string that parses back to the same bits.
/// Plain notation is used for magnitudes in `[1e-5, 1e16)`, exponent notation
/// (`1e300`, `2.5e-7`) outside it. Non-finite values use the spellings Apple's
/// tools write: `nan`, `+infinity`, `-infinity`.
pub fn format_real(value: &Real) -> String {
    match value {
        Real::Double(v) => format_double(*v),
        Real::Big(v) => v.to_string(),
    }
}

fn format_double(v: f64) -> String {
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "+infinity" } else { "-infinity" }.to_string();
    }
    let magnitude = v.abs();
    if magnitude != 0.0 && !(1e-5..1e16).contains(&magnitude) {
        format!("{:e}", v)
    } else {
        v.to_string()
    }
}

/// Parse RFC 3339 `<date>` text, normalized to UTC.
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|date| date.with_timezone(&Utc))
        .map_err(|_| PlistError::invalid("date", raw))
}

/// RFC 3339 in UTC with a `Z` suffix and whole seconds: `2015-08-01T02:03:04Z`.
///
/// RFC 3339 has four-digit years only, so dates outside years 0000 to 9999
/// are rejected instead of being written in a form no reader accepts.
pub fn format_date(value: &DateTime<Utc>) -> Result<String> {
    let text = value.to_rfc3339_opts(SecondsFormat::Secs, true);
    if !(0..=9999).contains(&value.year()) {
        return Err(PlistError::invalid("date", &text));
    }
    Ok(text)
}

/// Decode standard-alphabet base64 `<data>` text. ASCII whitespace between
/// characters is ignored, since Apple tools wrap long blocks across lines.
pub fn decode_data(raw: &str) -> Result<Vec<u8>> {
    let compact: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    BASE64_STANDARD
        .decode(compact.as_bytes())
        .map_err(|_| PlistError::invalid("data", raw))
}

/// Standard base64 on a single line, with padding.
pub fn encode_data(value: &[u8]) -> String {
    BASE64_STANDARD.encode(value)
}
