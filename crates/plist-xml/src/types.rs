//! Plist scalar tiers and the decoder's event type.
//!
//! Integers and reals carry an explicit representation tier. A value is never
//! valid in two tiers at once: `Integer::Signed(5)` and `Integer::Unsigned(5)`
//! are different values as far as equality is concerned, which keeps a decoded
//! document comparable bit-for-bit with what was encoded.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use num_bigint::BigInt;

/// A plist `<integer>` in one of three tiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Integer {
    Signed(i64),
    Unsigned(u64),
    /// Arbitrary precision, for magnitudes outside both 64-bit ranges.
    Big(BigInt),
}

impl Integer {
    /// Move the value to the lowest tier that can hold it.
    ///
    /// This is the form the decoder produces: signed first, then unsigned,
    /// then arbitrary precision.
    pub fn normalize(self) -> Self {
        match self {
            Integer::Unsigned(v) => match i64::try_from(v) {
                Ok(signed) => Integer::Signed(signed),
                Err(_) => Integer::Unsigned(v),
            },
            Integer::Big(big) => {
                if let Ok(signed) = i64::try_from(&big) {
                    Integer::Signed(signed)
                } else if let Ok(unsigned) = u64::try_from(&big) {
                    Integer::Unsigned(unsigned)
                } else {
                    Integer::Big(big)
                }
            }
            signed => signed,
        }
    }

    /// Lowest-tier representation of a 128-bit value.
    pub fn from_i128(value: i128) -> Self {
        Integer::Big(BigInt::from(value)).normalize()
    }

    /// Lowest-tier representation of an unsigned 128-bit value.
    pub fn from_u128(value: u128) -> Self {
        Integer::Big(BigInt::from(value)).normalize()
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Integer::Signed(v) => Some(*v),
            Integer::Unsigned(v) => i64::try_from(*v).ok(),
            Integer::Big(big) => i64::try_from(big).ok(),
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Integer::Signed(v) => u64::try_from(*v).ok(),
            Integer::Unsigned(v) => Some(*v),
            Integer::Big(big) => u64::try_from(big).ok(),
        }
    }
}

impl From<i64> for Integer {
    fn from(value: i64) -> Self {
        Integer::Signed(value)
    }
}

impl From<u64> for Integer {
    fn from(value: u64) -> Self {
        Integer::Unsigned(value)
    }
}

impl From<BigInt> for Integer {
    fn from(value: BigInt) -> Self {
        Integer::Big(value)
    }
}

/// A plist `<real>` in one of two tiers.
#[derive(Debug, Clone, PartialEq)]
pub enum Real {
    Double(f64),
    /// Arbitrary precision, for literals beyond the f64 range.
    Big(BigDecimal),
}

impl Real {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Real::Double(v) => Some(*v),
            Real::Big(_) => None,
        }
    }
}

impl From<f64> for Real {
    fn from(value: f64) -> Self {
        Real::Double(value)
    }
}

impl From<BigDecimal> for Real {
    fn from(value: BigDecimal) -> Self {
        Real::Big(value)
    }
}

/// One event of the decoder's pull stream.
///
/// Containers are not materialized: `ArrayStart`/`DictStart` open a frame,
/// subsequent events belong to it until the matching `ContainerEnd`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Bool(bool),
    Integer(Integer),
    Real(Real),
    Date(DateTime<Utc>),
    Data(Vec<u8>),
    ArrayStart,
    DictStart,
    /// A dictionary entry. The value may itself be `ArrayStart` or
    /// `DictStart`, in which case the entry's contents follow as events.
    DictEntry {
        key: String,
        value: Box<Value>,
    },
    ContainerEnd,
}

impl Value {
    /// True when this event opens a new container frame.
    pub fn is_container_start(&self) -> bool {
        match self {
            Value::ArrayStart | Value::DictStart => true,
            Value::DictEntry { value, .. } => value.is_container_start(),
            _ => false,
        }
    }

    pub(crate) fn entry(key: String, value: Value) -> Self {
        Value::DictEntry {
            key,
            value: Box::new(value),
        }
    }
}
