use crate::types::{
    RowId,
    error::{DatabaseError, Result},
    row::Row,
    serial_type::SerialType,
    value::Value,
    varint::decode_varint,
};

/// Size information read from the front of a cell, before the record itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadPrefix {
    pub payload_size: usize,
    pub row_id: Option<RowId>,
    /// Offset of the first payload byte within the cell.
    pub payload_start: usize,
}

/// Read the payload-length varint and, for table-leaf cells, the row key.
pub fn decode_payload_prefix(cell: &[u8], with_row_id: bool) -> Result<PayloadPrefix> {
    let (payload_size, mut offset) = decode_varint(cell, 0)?;
    let row_id = if with_row_id {
        let (row_id, consumed) = decode_varint(cell, offset)?;
        offset += consumed;
        Some(row_id as RowId)
    } else {
        None
    };
    Ok(PayloadPrefix {
        payload_size: payload_size as usize,
        row_id,
        payload_start: offset,
    })
}

/// Decode a whole cell: payload length, optional row key, then the record.
pub fn decode_record(cell: &[u8], with_row_id: bool) -> Result<Row> {
    let prefix = decode_payload_prefix(cell, with_row_id)?;
    let payload = payload_slice(cell, &prefix)?;
    Ok(Row {
        row_id: prefix.row_id,
        values: decode_payload(payload)?,
    })
}

pub(crate) fn payload_slice<'a>(cell: &'a [u8], prefix: &PayloadPrefix) -> Result<&'a [u8]> {
    let truncated = || {
        DatabaseError::truncated(
            prefix.payload_start,
            prefix.payload_size,
            cell.len().saturating_sub(prefix.payload_start),
        )
    };
    // the payload length is untrusted and may be close to u64::MAX
    let end = prefix
        .payload_start
        .checked_add(prefix.payload_size)
        .ok_or_else(truncated)?;
    cell.get(prefix.payload_start..end).ok_or_else(truncated)
}

/// Serial types listed in a record header.
pub fn decode_record_header(payload: &[u8]) -> Result<(Vec<SerialType>, usize)> {
    let (header_size, mut offset) = decode_varint(payload, 0)?;
    let header_size = header_size as usize;
    if header_size > payload.len() || header_size < offset {
        return Err(DatabaseError::truncated(0, header_size, payload.len()));
    }

    let header = &payload[..header_size];
    let mut serial_types = Vec::new();
    while offset < header_size {
        let (code, consumed) = decode_varint(header, offset)?;
        offset += consumed;
        serial_types.push(SerialType::from_code(code)?);
    }
    Ok((serial_types, header_size))
}

/// Decode a record payload (header + body) into its column values.
pub fn decode_payload(payload: &[u8]) -> Result<Vec<Value>> {
    let (serial_types, header_size) = decode_record_header(payload)?;

    let mut values = Vec::with_capacity(serial_types.len());
    let mut offset = header_size;
    for serial_type in serial_types {
        values.push(serial_type.decode(payload, offset)?);
        offset += serial_type.size();
    }
    Ok(values)
}
