use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DataType {
    Null,
    Integer,
    Real,
    Text,
    Blob,
}

/// A decoded column value.
///
/// Values order the way the file format sorts index keys: NULL first, then
/// numbers (integers and reals compared numerically), then text (byte-wise,
/// i.e. BINARY collation), then blobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Null,
            Value::Integer(_) => DataType::Integer,
            Value::Real(_) => DataType::Real,
            Value::Text(_) => DataType::Text,
            Value::Blob(_) => DataType::Blob,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    // Storage classes in key order; integers and reals share a class.
    fn storage_class(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Integer(_) | Value::Real(_) => 1,
            Value::Text(_) => 2,
            Value::Blob(_) => 3,
        }
    }

    /// Total order used for index key comparison.
    pub fn key_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a.cmp(b),
            (Value::Integer(a), Value::Real(b)) => int_real_cmp(*a, *b),
            (Value::Real(a), Value::Integer(b)) => int_real_cmp(*b, *a).reverse(),
            (Value::Real(a), Value::Real(b)) => a.total_cmp(b),
            (Value::Text(a), Value::Text(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Value::Blob(a), Value::Blob(b)) => a.cmp(b),
            _ => self.storage_class().cmp(&other.storage_class()),
        }
    }
}

/// Exact comparison of an integer with a real. Converting the integer to
/// f64 would round above 2^53 and make distinct values compare equal.
fn int_real_cmp(int: i64, real: f64) -> Ordering {
    // -2^63 and 2^63 are exactly representable
    const I64_MIN_AS_F64: f64 = -9_223_372_036_854_775_808.0;
    const I64_END_AS_F64: f64 = 9_223_372_036_854_775_808.0;

    if real.is_nan() {
        // NaN sorts above every number, as with f64::total_cmp
        return Ordering::Less;
    }
    if real < I64_MIN_AS_F64 {
        return Ordering::Greater;
    }
    if real >= I64_END_AS_F64 {
        return Ordering::Less;
    }

    let whole = real.trunc() as i64;
    match int.cmp(&whole) {
        // partial_cmp so that a -0.0 fraction counts as equal
        Ordering::Equal => 0.0_f64.partial_cmp(&real.fract()).unwrap_or(Ordering::Equal),
        ordering => ordering,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.key_cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.key_cmp(other))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Text(s) => write!(f, "{}", s),
            Value::Blob(bytes) => {
                write!(f, "X'")?;
                for byte in bytes {
                    write!(f, "{:02X}", byte)?;
                }
                write!(f, "'")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}
