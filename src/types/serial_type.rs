use crate::types::{
    error::{DatabaseError, Result},
    value::Value,
};

/// Storage format of one record column, selected by its serial type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialType {
    Null,
    Int8,
    Int16,
    Int24,
    Int32,
    Int48,
    Int64,
    Float64,
    Zero,
    One,
    Blob(usize),
    Text(usize),
}

impl SerialType {
    pub fn from_code(code: u64) -> Result<Self> {
        match code {
            0 => Ok(Self::Null),
            1 => Ok(Self::Int8),
            2 => Ok(Self::Int16),
            3 => Ok(Self::Int24),
            4 => Ok(Self::Int32),
            5 => Ok(Self::Int48),
            6 => Ok(Self::Int64),
            7 => Ok(Self::Float64),
            8 => Ok(Self::Zero),
            9 => Ok(Self::One),
            10 | 11 => Err(DatabaseError::ReservedSerialType(code)),
            _ if code % 2 == 0 => Ok(Self::Blob(((code - 12) / 2) as usize)),
            _ => Ok(Self::Text(((code - 13) / 2) as usize)),
        }
    }

    pub fn code(&self) -> u64 {
        match *self {
            Self::Null => 0,
            Self::Int8 => 1,
            Self::Int16 => 2,
            Self::Int24 => 3,
            Self::Int32 => 4,
            Self::Int48 => 5,
            Self::Int64 => 6,
            Self::Float64 => 7,
            Self::Zero => 8,
            Self::One => 9,
            Self::Blob(len) => len as u64 * 2 + 12,
            Self::Text(len) => len as u64 * 2 + 13,
        }
    }

    /// Number of body bytes a value of this type occupies.
    pub fn size(&self) -> usize {
        match *self {
            Self::Null | Self::Zero | Self::One => 0,
            Self::Int8 => 1,
            Self::Int16 => 2,
            Self::Int24 => 3,
            Self::Int32 => 4,
            Self::Int48 => 6,
            Self::Int64 | Self::Float64 => 8,
            Self::Blob(len) | Self::Text(len) => len,
        }
    }

    /// Decode a value of this type from `buffer[offset..offset + self.size()]`.
    pub fn decode(&self, buffer: &[u8], offset: usize) -> Result<Value> {
        let size = self.size();
        let truncated = || DatabaseError::truncated(offset, size, buffer.len().saturating_sub(offset));
        let end = offset.checked_add(size).ok_or_else(truncated)?;
        let bytes = buffer.get(offset..end).ok_or_else(truncated)?;

        let value = match *self {
            Self::Null => Value::Null,
            Self::Zero => Value::Integer(0),
            Self::One => Value::Integer(1),
            Self::Int8 | Self::Int16 | Self::Int24 | Self::Int32 | Self::Int48 | Self::Int64 => {
                Value::Integer(read_signed_be(bytes))
            }
            Self::Float64 => {
                let mut raw = [0_u8; 8];
                raw.copy_from_slice(bytes);
                Value::Real(f64::from_be_bytes(raw))
            }
            Self::Blob(_) => Value::Blob(bytes.to_vec()),
            Self::Text(_) => Value::Text(String::from_utf8(bytes.to_vec())?),
        };
        Ok(value)
    }
}

/// Big-endian two's complement integer of 1..=8 bytes, sign extended to i64.
fn read_signed_be(bytes: &[u8]) -> i64 {
    let unsigned = bytes.iter().fold(0_u64, |acc, &b| (acc << 8) | b as u64);
    let shift = 64 - 8 * bytes.len() as u32;
    ((unsigned << shift) as i64) >> shift
}

/// Byte width of the value stored under serial type `code`.
pub fn serial_type_size(code: u64) -> Result<usize> {
    Ok(SerialType::from_code(code)?.size())
}

/// Decode the value stored under serial type `code` at `offset`.
pub fn decode_serial_value(buffer: &[u8], offset: usize, code: u64) -> Result<Value> {
    SerialType::from_code(code)?.decode(buffer, offset)
}
