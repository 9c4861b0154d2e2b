use serde::{Deserialize, Serialize};

use crate::types::{
    CELL_POINTER_SIZE, HEADER_SIZE, INTERIOR_PAGE_HEADER_SIZE, LEAF_PAGE_HEADER_SIZE, PageNumber,
    cell::Cell,
    error::{DatabaseError, Result},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageType {
    InteriorIndex = 2,
    InteriorTable = 5,
    LeafIndex = 10,
    LeafTable = 13,
}

impl PageType {
    pub fn from_u8(value: u8) -> Result<Self> {
        match value {
            2 => Ok(PageType::InteriorIndex),
            5 => Ok(PageType::InteriorTable),
            10 => Ok(PageType::LeafIndex),
            13 => Ok(PageType::LeafTable),
            _ => Err(DatabaseError::InvalidPageType(value)),
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, PageType::LeafIndex | PageType::LeafTable)
    }

    pub fn is_interior(&self) -> bool {
        !self.is_leaf()
    }

    pub fn is_table(&self) -> bool {
        matches!(self, PageType::InteriorTable | PageType::LeafTable)
    }

    pub fn is_index(&self) -> bool {
        !self.is_table()
    }

    /// Size of the b-tree page header, excluding the cell pointer array.
    pub fn header_size(&self) -> usize {
        if self.is_interior() {
            INTERIOR_PAGE_HEADER_SIZE
        } else {
            LEAF_PAGE_HEADER_SIZE
        }
    }

    /// Largest payload kept entirely on a page of this type before the
    /// remainder would spill into overflow pages.
    pub fn max_local_payload(&self, usable_size: usize) -> usize {
        if self.is_table() {
            usable_size.saturating_sub(35)
        } else {
            (usable_size.saturating_sub(12) * 64 / 255).saturating_sub(23)
        }
    }
}

/*
 * B-tree page layout (all integers big-endian)
 * ┌──────────────────────────────────────────────────────────────────┐
 * │ file header (100 bytes, page 1 only)                             │
 * ├──────────────────────────────────────────────────────────────────┤
 * │ type(1) | first_freeblock(2) | cell_count(2) |                   │
 * │ cell_content_start(2) | fragmented_bytes(1) |                    │
 * │ right_most_pointer(4, interior pages only)                       │
 * ├──────────────────────────────────────────────────────────────────┤
 * │ cell pointer array: cell_count x u16 offsets from page start     │
 * ├──────────────────────────────────────────────────────────────────┤
 * │ unallocated space                                                │
 * ├──────────────────────────────────────────────────────────────────┤
 * │ cell content area                                                │
 * └──────────────────────────────────────────────────────────────────┘
 */

/// Offset of the b-tree page header within a page buffer.
pub fn header_offset(is_page_one: bool) -> usize {
    if is_page_one { HEADER_SIZE } else { 0 }
}

fn read_u16(buffer: &[u8], offset: usize) -> Result<u16> {
    buffer
        .get(offset..offset + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| DatabaseError::truncated(offset, 2, buffer.len().saturating_sub(offset)))
}

pub(crate) fn read_u32(buffer: &[u8], offset: usize) -> Result<u32> {
    buffer
        .get(offset..offset + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| DatabaseError::truncated(offset, 4, buffer.len().saturating_sub(offset)))
}

pub fn read_type(page: &[u8], is_page_one: bool) -> Result<PageType> {
    let offset = header_offset(is_page_one);
    let type_byte = *page
        .get(offset)
        .ok_or_else(|| DatabaseError::truncated(offset, 1, 0))?;
    PageType::from_u8(type_byte)
}

pub fn read_cell_count(page: &[u8], is_page_one: bool) -> Result<u16> {
    read_u16(page, header_offset(is_page_one) + 3)
}

pub fn read_rightmost_child(page: &[u8], is_page_one: bool) -> Result<PageNumber> {
    read_u32(page, header_offset(is_page_one) + 8)
}

/// Cell offsets in on-disk order. The array starts right after the page
/// header: byte 12 on interior pages, byte 8 on leaf pages.
pub fn read_cell_pointers(page: &[u8], is_page_one: bool, is_interior: bool) -> Result<Vec<u16>> {
    let cell_count = read_cell_count(page, is_page_one)? as usize;
    let header_size = if is_interior {
        INTERIOR_PAGE_HEADER_SIZE
    } else {
        LEAF_PAGE_HEADER_SIZE
    };
    let start = header_offset(is_page_one) + header_size;
    (0..cell_count)
        .map(|i| read_u16(page, start + i * CELL_POINTER_SIZE))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeader {
    pub page_type: PageType,
    pub first_freeblock: u16,
    pub cell_count: u16,
    pub cell_content_start: u16,
    pub fragmented_free_bytes: u8,
    pub right_most_pointer: Option<PageNumber>,
}

impl PageHeader {
    pub fn from_bytes(page: &[u8], is_page_one: bool) -> Result<Self> {
        let offset = header_offset(is_page_one);
        let page_type = read_type(page, is_page_one)?;
        let right_most_pointer = if page_type.is_interior() {
            Some(read_rightmost_child(page, is_page_one)?)
        } else {
            None
        };
        let fragmented_free_bytes = *page
            .get(offset + 7)
            .ok_or_else(|| DatabaseError::truncated(offset + 7, 1, 0))?;

        Ok(Self {
            page_type,
            first_freeblock: read_u16(page, offset + 1)?,
            cell_count: read_cell_count(page, is_page_one)?,
            cell_content_start: read_u16(page, offset + 5)?,
            fragmented_free_bytes,
            right_most_pointer,
        })
    }

    pub fn size(&self) -> usize {
        self.page_type.header_size()
    }
}

/// A decoded b-tree page. Holds the whole page buffer so cells can be
/// parsed in place without further reads.
#[derive(Debug, Clone)]
pub struct Page {
    pub page_number: PageNumber,
    pub header: PageHeader,
    pub cell_pointers: Vec<u16>,
    pub data: Vec<u8>,
    pub usable_size: usize,
}

impl Page {
    pub fn from_bytes(page_number: PageNumber, data: Vec<u8>, usable_size: usize) -> Result<Self> {
        if page_number == 0 {
            return Err(DatabaseError::InvalidPageNumber { page_number });
        }
        let is_page_one = page_number == 1;
        let header = PageHeader::from_bytes(&data, is_page_one)?;
        let cell_pointers =
            read_cell_pointers(&data, is_page_one, header.page_type.is_interior())?;

        let usable_size = usable_size.min(data.len());
        let array_end = header_offset(is_page_one) + header.size() + cell_pointers.len() * CELL_POINTER_SIZE;
        if let Some(bad) = cell_pointers
            .iter()
            .find(|&&p| (p as usize) < array_end || p as usize >= usable_size)
        {
            return Err(DatabaseError::CorruptedPage {
                page_number,
                reason: format!("cell pointer {} outside the cell content area", bad),
            });
        }

        Ok(Self {
            page_number,
            header,
            cell_pointers,
            data,
            usable_size,
        })
    }

    pub fn page_type(&self) -> PageType {
        self.header.page_type
    }

    pub fn cell_count(&self) -> usize {
        self.cell_pointers.len()
    }

    pub fn right_most_pointer(&self) -> Result<PageNumber> {
        self.header
            .right_most_pointer
            .ok_or_else(|| DatabaseError::CorruptedPage {
                page_number: self.page_number,
                reason: "leaf page has no right-most child".to_string(),
            })
    }

    /// Bytes from the start of cell `index` to the end of the usable area.
    pub fn cell_bytes(&self, index: usize) -> Result<&[u8]> {
        let pointer = *self
            .cell_pointers
            .get(index)
            .ok_or_else(|| DatabaseError::CorruptedPage {
                page_number: self.page_number,
                reason: format!("cell index {} out of range ({} cells)", index, self.cell_count()),
            })?;
        Ok(&self.data[pointer as usize..self.usable_size])
    }

    pub fn cell(&self, index: usize) -> Result<Cell> {
        let max_local = self.page_type().max_local_payload(self.usable_size);
        Cell::decode(self.page_type(), self.cell_bytes(index)?, max_local)
    }
}
