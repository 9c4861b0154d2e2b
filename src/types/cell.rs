use crate::types::{
    CHILD_POINTER_SIZE, PageNumber, RowId,
    error::{DatabaseError, Result},
    page::{PageType, read_u32},
    record::{decode_payload, decode_payload_prefix, payload_slice},
    row::Row,
    varint::decode_varint,
};

/// One b-tree entry, decoded according to the kind of page it lives on.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Row key and record.
    TableLeaf(Row),
    /// Left child and the largest row key stored under it.
    TableInterior { left_child: PageNumber, row_id: RowId },
    /// Index record; the last column is the row key.
    IndexLeaf(Row),
    /// Left child and an index record that sorts after everything in it.
    IndexInterior { left_child: PageNumber, record: Row },
}

impl Cell {
    pub fn decode(page_type: PageType, cell: &[u8], max_local: usize) -> Result<Cell> {
        match page_type {
            PageType::LeafTable => Ok(Cell::TableLeaf(decode_local(cell, true, max_local)?)),
            PageType::InteriorTable => {
                let left_child = read_u32(cell, 0)?;
                let (row_id, _) = decode_varint(cell, CHILD_POINTER_SIZE)?;
                Ok(Cell::TableInterior {
                    left_child,
                    row_id: row_id as RowId,
                })
            }
            PageType::LeafIndex => Ok(Cell::IndexLeaf(decode_local(cell, false, max_local)?)),
            PageType::InteriorIndex => {
                let left_child = read_u32(cell, 0)?;
                let record = decode_local(&cell[CHILD_POINTER_SIZE..], false, max_local)?;
                Ok(Cell::IndexInterior { left_child, record })
            }
        }
    }

    pub fn left_child(&self) -> Option<PageNumber> {
        match self {
            Cell::TableInterior { left_child, .. } | Cell::IndexInterior { left_child, .. } => {
                Some(*left_child)
            }
            _ => None,
        }
    }

    /// Row key for table cells.
    pub fn row_id(&self) -> Option<RowId> {
        match self {
            Cell::TableLeaf(row) => row.row_id,
            Cell::TableInterior { row_id, .. } => Some(*row_id),
            _ => None,
        }
    }
}

fn decode_local(cell: &[u8], with_row_id: bool, max_local: usize) -> Result<Row> {
    let prefix = decode_payload_prefix(cell, with_row_id)?;
    if prefix.payload_size > max_local {
        return Err(DatabaseError::OverflowUnsupported {
            payload_size: prefix.payload_size,
            max_local,
        });
    }
    let values = decode_payload(payload_slice(cell, &prefix)?)?;
    Ok(Row {
        row_id: prefix.row_id,
        values,
    })
}
