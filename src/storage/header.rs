use serde::{Deserialize, Serialize};

use crate::{
    storage::DATABASE_MAGIC,
    types::{
        HEADER_SIZE, MAX_PAGE_SIZE, MIN_PAGE_SIZE,
        error::{DatabaseError, Result},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    Utf8,
    Utf16le,
    Utf16be,
}

impl TextEncoding {
    pub fn from_u32(value: u32) -> Result<Self> {
        match value {
            // 0 is left by files that never stored a schema
            0 | 1 => Ok(TextEncoding::Utf8),
            2 => Ok(TextEncoding::Utf16le),
            3 => Ok(TextEncoding::Utf16be),
            _ => Err(DatabaseError::InvalidHeader {
                reason: format!("Invalid text encoding: {}", value),
            }),
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            TextEncoding::Utf8 => 1,
            TextEncoding::Utf16le => 2,
            TextEncoding::Utf16be => 3,
        }
    }
}

/// The 100 byte header at the start of page 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseHeader {
    pub page_size: u32,
    pub file_format_write_version: u8,
    pub file_format_read_version: u8,
    pub reserved_space: u8,
    pub max_embedded_payload_fraction: u8,
    pub min_embedded_payload_fraction: u8,
    pub leaf_payload_fraction: u8,
    pub file_change_counter: u32,
    pub database_size_pages: u32,
    pub freelist_trunk_page: u32,
    pub freelist_pages_count: u32,
    pub schema_cookie: u32,
    pub schema_format_number: u32,
    pub default_page_cache_size: u32,
    pub largest_root_btree_page: u32,
    pub text_encoding: TextEncoding,
    pub user_version: u32,
    pub incremental_vacuum_mode: u32,
    pub application_id: u32,
    pub version_valid_for: u32,
    pub sqlite_version_number: u32,
}

impl DatabaseHeader {
    pub fn new(page_size: u32, database_size_pages: u32) -> Self {
        Self {
            page_size,
            file_format_write_version: 1,
            file_format_read_version: 1,
            reserved_space: 0,
            max_embedded_payload_fraction: 64,
            min_embedded_payload_fraction: 32,
            leaf_payload_fraction: 32,
            file_change_counter: 1,
            database_size_pages,
            freelist_trunk_page: 0,
            freelist_pages_count: 0,
            schema_cookie: 1,
            schema_format_number: 4,
            default_page_cache_size: 0,
            largest_root_btree_page: 0,
            text_encoding: TextEncoding::Utf8,
            user_version: 0,
            incremental_vacuum_mode: 0,
            application_id: 0,
            version_valid_for: 1,
            sqlite_version_number: 3_045_000,
        }
    }

    /// Bytes per page available to b-tree content.
    pub fn usable_size(&self) -> usize {
        self.page_size as usize - self.reserved_space as usize
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(HEADER_SIZE);

        buffer.extend_from_slice(DATABASE_MAGIC);
        // 65536 does not fit in two bytes and is stored as 1
        let stored_page_size = if self.page_size == MAX_PAGE_SIZE {
            1_u16
        } else {
            self.page_size as u16
        };
        buffer.extend_from_slice(&stored_page_size.to_be_bytes());
        buffer.push(self.file_format_write_version);
        buffer.push(self.file_format_read_version);
        buffer.push(self.reserved_space);
        buffer.push(self.max_embedded_payload_fraction);
        buffer.push(self.min_embedded_payload_fraction);
        buffer.push(self.leaf_payload_fraction);
        buffer.extend_from_slice(&self.file_change_counter.to_be_bytes());
        buffer.extend_from_slice(&self.database_size_pages.to_be_bytes());
        buffer.extend_from_slice(&self.freelist_trunk_page.to_be_bytes());
        buffer.extend_from_slice(&self.freelist_pages_count.to_be_bytes());
        buffer.extend_from_slice(&self.schema_cookie.to_be_bytes());
        buffer.extend_from_slice(&self.schema_format_number.to_be_bytes());
        buffer.extend_from_slice(&self.default_page_cache_size.to_be_bytes());
        buffer.extend_from_slice(&self.largest_root_btree_page.to_be_bytes());
        buffer.extend_from_slice(&self.text_encoding.as_u32().to_be_bytes());
        buffer.extend_from_slice(&self.user_version.to_be_bytes());
        buffer.extend_from_slice(&self.incremental_vacuum_mode.to_be_bytes());
        buffer.extend_from_slice(&self.application_id.to_be_bytes());
        buffer.extend_from_slice(&[0_u8; 20]);
        buffer.extend_from_slice(&self.version_valid_for.to_be_bytes());
        buffer.extend_from_slice(&self.sqlite_version_number.to_be_bytes());

        buffer.resize(HEADER_SIZE, 0);
        buffer
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(DatabaseError::InvalidHeader {
                reason: format!("Header too short: {} bytes", bytes.len()),
            });
        }
        if &bytes[..DATABASE_MAGIC.len()] != DATABASE_MAGIC {
            return Err(DatabaseError::InvalidHeader {
                reason: "Invalid magic string".to_string(),
            });
        }

        let be_u32 = |offset: usize| {
            u32::from_be_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ])
        };

        let page_size = match u16::from_be_bytes([bytes[16], bytes[17]]) {
            1 => MAX_PAGE_SIZE,
            size => size as u32,
        };
        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&page_size) || !page_size.is_power_of_two() {
            return Err(DatabaseError::InvalidHeader {
                reason: format!("Unsupported page size: {}", page_size),
            });
        }

        let reserved_space = bytes[20];
        if page_size as usize - (reserved_space as usize) < 480 {
            return Err(DatabaseError::InvalidHeader {
                reason: format!("Reserved space {} leaves too little usable space", reserved_space),
            });
        }

        Ok(Self {
            page_size,
            file_format_write_version: bytes[18],
            file_format_read_version: bytes[19],
            reserved_space,
            max_embedded_payload_fraction: bytes[21],
            min_embedded_payload_fraction: bytes[22],
            leaf_payload_fraction: bytes[23],
            file_change_counter: be_u32(24),
            database_size_pages: be_u32(28),
            freelist_trunk_page: be_u32(32),
            freelist_pages_count: be_u32(36),
            schema_cookie: be_u32(40),
            schema_format_number: be_u32(44),
            default_page_cache_size: be_u32(48),
            largest_root_btree_page: be_u32(52),
            text_encoding: TextEncoding::from_u32(be_u32(56))?,
            user_version: be_u32(60),
            incremental_vacuum_mode: be_u32(64),
            application_id: be_u32(68),
            version_valid_for: be_u32(92),
            sqlite_version_number: be_u32(96),
        })
    }
}
