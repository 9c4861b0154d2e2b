use std::string::FromUtf8Error;

use thiserror::Error;

use crate::{
    planner::error::PlannerError,
    types::{PageNumber, RowId, page::PageType},
};

/// Broad classification of a [`DatabaseError`], used by callers that only
/// care whether something was missing, malformed or failed to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Decode,
    NotFound,
    Io,
    Query,
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Truncated varint at offset {offset}")]
    TruncatedVarint { offset: usize },

    #[error("Buffer too short: need {needed} bytes at offset {offset}, only {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Invalid page type: {0}")]
    InvalidPageType(u8),

    #[error("Unexpected {actual:?} page {page_number} while walking a {expected} b-tree")]
    UnexpectedPageType {
        page_number: PageNumber,
        actual: PageType,
        expected: &'static str,
    },

    #[error("Invalid page number {page_number}")]
    InvalidPageNumber { page_number: PageNumber },

    #[error("Reserved serial type {0}")]
    ReservedSerialType(u64),

    #[error("Invalid text value: {0}")]
    InvalidText(#[from] FromUtf8Error),

    #[error("Invalid database header: {reason}")]
    InvalidHeader { reason: String },

    #[error("Unsupported text encoding: {encoding}")]
    UnsupportedTextEncoding { encoding: String },

    #[error("Corrupted page: page_number={page_number}, reason={reason}")]
    CorruptedPage {
        page_number: PageNumber,
        reason: String,
    },

    #[error(
        "Payload of {payload_size} bytes exceeds the {max_local} bytes stored on the page; overflow pages are not supported"
    )]
    OverflowUnsupported { payload_size: usize, max_local: usize },

    #[error("Invalid index record: {reason}")]
    InvalidIndexRecord { reason: String },

    #[error("Table '{name}' not found")]
    TableNotFound { name: String },

    #[error("Index '{name}' not found")]
    IndexNotFound { name: String },

    #[error("Column '{name}' not found in table '{table}'")]
    ColumnNotFound { name: String, table: String },

    #[error("Row {row_id} not found")]
    RowNotFound { row_id: RowId },

    #[error(transparent)]
    Query(#[from] PlannerError),
}

impl DatabaseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DatabaseError::Io(_) => ErrorKind::Io,
            DatabaseError::TableNotFound { .. }
            | DatabaseError::IndexNotFound { .. }
            | DatabaseError::ColumnNotFound { .. }
            | DatabaseError::RowNotFound { .. } => ErrorKind::NotFound,
            DatabaseError::Query(_) => ErrorKind::Query,
            _ => ErrorKind::Decode,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub(crate) fn truncated(offset: usize, needed: usize, available: usize) -> Self {
        DatabaseError::Truncated {
            offset,
            needed,
            available,
        }
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
