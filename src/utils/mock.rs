//! Synthetic database files for tests and benchmarks.
//!
//! [`MockDatabase`] lays out b-tree pages in the on-disk format from plain
//! rows; [`TempDatabase`] writes the result to a temporary file that is
//! removed on drop.

use std::{
    collections::BTreeMap,
    fs::File,
    io::{Cursor, Write},
    path::Path,
};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::{
    storage::{header::DatabaseHeader, pager::PageReader, storage_manager::StorageManager},
    types::{
        CELL_POINTER_SIZE, HEADER_SIZE, PageNumber, RowId, SCHEMA_ROOT_PAGE,
        error::{DatabaseError, Result},
        page::{Page, PageType, header_offset},
        serial_type::SerialType,
        value::Value,
        varint::encode_varint,
    },
};

/// Failures while laying out or writing a synthetic database.
#[derive(Error, Debug)]
pub enum MockError {
    #[error("Cell {cell_index} does not fit in page {page_number}")]
    PageOverflow {
        page_number: PageNumber,
        cell_index: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub type MockResult<T> = std::result::Result<T, MockError>;

/// Contents of one page, before layout.
#[derive(Debug, Clone)]
pub enum MockPage {
    TableLeaf(Vec<(RowId, Vec<Value>)>),
    TableInterior {
        cells: Vec<(PageNumber, RowId)>,
        right_child: PageNumber,
    },
    IndexLeaf(Vec<Vec<Value>>),
    IndexInterior {
        cells: Vec<(PageNumber, Vec<Value>)>,
        right_child: PageNumber,
    },
}

impl MockPage {
    fn page_type(&self) -> PageType {
        match self {
            MockPage::TableLeaf(_) => PageType::LeafTable,
            MockPage::TableInterior { .. } => PageType::InteriorTable,
            MockPage::IndexLeaf(_) => PageType::LeafIndex,
            MockPage::IndexInterior { .. } => PageType::InteriorIndex,
        }
    }

    fn right_child(&self) -> Option<PageNumber> {
        match self {
            MockPage::TableInterior { right_child, .. }
            | MockPage::IndexInterior { right_child, .. } => Some(*right_child),
            _ => None,
        }
    }

    fn encode_cells(&self) -> Vec<Vec<u8>> {
        match self {
            MockPage::TableLeaf(rows) => rows
                .iter()
                .map(|(row_id, values)| {
                    let payload = encode_record(values);
                    let mut cell = encode_varint(payload.len() as u64);
                    cell.extend(encode_varint(*row_id as u64));
                    cell.extend(payload);
                    cell
                })
                .collect(),
            MockPage::TableInterior { cells, .. } => cells
                .iter()
                .map(|(left_child, row_id)| {
                    let mut cell = left_child.to_be_bytes().to_vec();
                    cell.extend(encode_varint(*row_id as u64));
                    cell
                })
                .collect(),
            MockPage::IndexLeaf(entries) => entries
                .iter()
                .map(|values| {
                    let payload = encode_record(values);
                    let mut cell = encode_varint(payload.len() as u64);
                    cell.extend(payload);
                    cell
                })
                .collect(),
            MockPage::IndexInterior { cells, .. } => cells
                .iter()
                .map(|(left_child, values)| {
                    let payload = encode_record(values);
                    let mut cell = left_child.to_be_bytes().to_vec();
                    cell.extend(encode_varint(payload.len() as u64));
                    cell.extend(payload);
                    cell
                })
                .collect(),
        }
    }

    /// Lay the page out into a `page_size` buffer. Cells fill the content
    /// area from the end of the page, pointers keep the given cell order.
    pub fn to_bytes(&self, page_number: PageNumber, page_size: usize) -> MockResult<Vec<u8>> {
        let mut data = vec![0_u8; page_size];
        let header_start = header_offset(page_number == SCHEMA_ROOT_PAGE);
        let page_type = self.page_type();
        let cells = self.encode_cells();

        let pointer_start = header_start + page_type.header_size();
        let pointer_end = pointer_start + cells.len() * CELL_POINTER_SIZE;
        let mut content_start = page_size;
        for (i, cell) in cells.iter().enumerate() {
            if content_start < pointer_end + cell.len() {
                return Err(MockError::PageOverflow {
                    page_number,
                    cell_index: i,
                });
            }
            content_start -= cell.len();
            data[content_start..content_start + cell.len()].copy_from_slice(cell);
            let pointer = pointer_start + i * CELL_POINTER_SIZE;
            data[pointer..pointer + 2].copy_from_slice(&(content_start as u16).to_be_bytes());
        }

        data[header_start] = page_type.as_u8();
        data[header_start + 3..header_start + 5].copy_from_slice(&(cells.len() as u16).to_be_bytes());
        // 65536 is stored as 0
        let stored_start = if content_start >= 65536 { 0 } else { content_start as u16 };
        data[header_start + 5..header_start + 7].copy_from_slice(&stored_start.to_be_bytes());
        if let Some(right_child) = self.right_child() {
            data[header_start + 8..header_start + 12].copy_from_slice(&right_child.to_be_bytes());
        }
        Ok(data)
    }
}

/// Serial type and body bytes for one value, using the narrowest integer width.
pub fn encode_value(value: &Value) -> (SerialType, Vec<u8>) {
    match value {
        Value::Null => (SerialType::Null, Vec::new()),
        Value::Integer(0) => (SerialType::Zero, Vec::new()),
        Value::Integer(1) => (SerialType::One, Vec::new()),
        Value::Integer(i) => {
            let (serial_type, width) = match *i {
                -0x80..=0x7F => (SerialType::Int8, 1),
                -0x8000..=0x7FFF => (SerialType::Int16, 2),
                -0x80_0000..=0x7F_FFFF => (SerialType::Int24, 3),
                -0x8000_0000..=0x7FFF_FFFF => (SerialType::Int32, 4),
                -0x8000_0000_0000..=0x7FFF_FFFF_FFFF => (SerialType::Int48, 6),
                _ => (SerialType::Int64, 8),
            };
            (serial_type, i.to_be_bytes()[8 - width..].to_vec())
        }
        Value::Real(r) => (SerialType::Float64, r.to_be_bytes().to_vec()),
        Value::Text(s) => (SerialType::Text(s.len()), s.as_bytes().to_vec()),
        Value::Blob(b) => (SerialType::Blob(b.len()), b.clone()),
    }
}

/// Record payload: header (its own length + serial types) then the body.
pub fn encode_record(values: &[Value]) -> Vec<u8> {
    let mut header = Vec::new();
    let mut body = Vec::new();
    for value in values {
        let (serial_type, bytes) = encode_value(value);
        header.extend(encode_varint(serial_type.code()));
        body.extend(bytes);
    }

    // the header length counts its own varint
    let mut header_size = header.len() + 1;
    while encode_varint(header_size as u64).len() + header.len() != header_size {
        header_size = encode_varint(header_size as u64).len() + header.len();
    }

    let mut record = encode_varint(header_size as u64);
    record.extend(header);
    record.extend(body);
    record
}

/// Builder for a complete database file.
///
/// Page 1 always holds the schema table as a single leaf; every other page
/// is either placed explicitly with [`MockDatabase::page`] or laid out by
/// [`MockDatabase::add_table`] / [`MockDatabase::add_index`].
#[derive(Debug, Clone)]
pub struct MockDatabase {
    page_size: u32,
    pages: BTreeMap<PageNumber, MockPage>,
    schema: Vec<(RowId, Vec<Value>)>,
}

impl MockDatabase {
    pub fn new(page_size: u32) -> Self {
        Self {
            page_size,
            pages: BTreeMap::new(),
            schema: Vec::new(),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// First page number not yet in use.
    pub fn next_page_number(&self) -> PageNumber {
        self.pages
            .keys()
            .next_back()
            .map_or(SCHEMA_ROOT_PAGE + 1, |last| last + 1)
    }

    pub fn page(&mut self, page_number: PageNumber, page: MockPage) -> &mut Self {
        self.pages.insert(page_number, page);
        self
    }

    /// Add a row to the schema table.
    pub fn schema_entry(
        &mut self,
        object_type: &str,
        name: &str,
        table_name: &str,
        root_page: PageNumber,
        sql: &str,
    ) -> &mut Self {
        let row_id = self.schema.len() as RowId + 1;
        self.schema.push((
            row_id,
            vec![
                Value::from(object_type),
                Value::from(name),
                Value::from(table_name),
                Value::Integer(root_page as i64),
                Value::from(sql),
            ],
        ));
        self
    }

    /// Lay `rows` out as a table b-tree of at most two levels and register it
    /// in the schema. Returns the root page number.
    pub fn add_table(
        &mut self,
        name: &str,
        sql: &str,
        rows: Vec<(RowId, Vec<Value>)>,
        rows_per_leaf: usize,
    ) -> PageNumber {
        let chunks: Vec<Vec<(RowId, Vec<Value>)>> =
            rows.chunks(rows_per_leaf.max(1)).map(<[_]>::to_vec).collect();

        let root = if chunks.len() <= 1 {
            let root = self.next_page_number();
            self.page(root, MockPage::TableLeaf(chunks.into_iter().next().unwrap_or_default()));
            root
        } else {
            let mut leaves = Vec::with_capacity(chunks.len());
            for chunk in chunks {
                let page_number = self.next_page_number();
                let max_key = chunk.last().map_or(0, |(row_id, _)| *row_id);
                self.page(page_number, MockPage::TableLeaf(chunk));
                leaves.push((page_number, max_key));
            }
            let (right_child, _) = leaves.pop().unwrap_or_default();
            let root = self.next_page_number();
            self.page(
                root,
                MockPage::TableInterior {
                    cells: leaves,
                    right_child,
                },
            );
            root
        };
        self.schema_entry("table", name, name, root, sql);
        root
    }

    /// Lay sorted index `entries` out as an index b-tree of at most two
    /// levels. As in the real format, the last entry of every leaf but the
    /// final one moves up into the interior page as the separator.
    pub fn add_index(
        &mut self,
        name: &str,
        table_name: &str,
        sql: &str,
        entries: Vec<Vec<Value>>,
        entries_per_leaf: usize,
    ) -> PageNumber {
        let chunks: Vec<Vec<Vec<Value>>> = entries
            .chunks(entries_per_leaf.max(1) + 1)
            .map(<[_]>::to_vec)
            .collect();

        let root = if chunks.len() <= 1 {
            let root = self.next_page_number();
            self.page(root, MockPage::IndexLeaf(chunks.into_iter().next().unwrap_or_default()));
            root
        } else {
            let last = chunks.len() - 1;
            let mut cells = Vec::with_capacity(last);
            let mut right_child = 0;
            for (i, mut chunk) in chunks.into_iter().enumerate() {
                let separator = if i < last { chunk.pop() } else { None };
                let page_number = self.next_page_number();
                self.page(page_number, MockPage::IndexLeaf(chunk));
                match separator {
                    Some(separator) => cells.push((page_number, separator)),
                    None => right_child = page_number,
                }
            }
            let root = self.next_page_number();
            self.page(root, MockPage::IndexInterior { cells, right_child });
            root
        };
        self.schema_entry("index", name, table_name, root, sql);
        root
    }

    pub fn to_bytes(&self) -> MockResult<Vec<u8>> {
        let page_size = self.page_size as usize;
        let page_count = self.next_page_number() - 1;

        let header = DatabaseHeader::new(self.page_size, page_count);
        let mut bytes = Vec::with_capacity(page_size * page_count as usize);

        let schema_page = MockPage::TableLeaf(self.schema.clone());
        let mut first = schema_page.to_bytes(SCHEMA_ROOT_PAGE, page_size)?;
        first[..HEADER_SIZE].copy_from_slice(&header.to_bytes());
        bytes.extend(first);

        for page_number in SCHEMA_ROOT_PAGE + 1..=page_count {
            match self.pages.get(&page_number) {
                Some(page) => bytes.extend(page.to_bytes(page_number, page_size)?),
                None => bytes.extend(vec![0_u8; page_size]),
            }
        }
        Ok(bytes)
    }

    pub fn write(&self) -> MockResult<TempDatabase> {
        let mut file = NamedTempFile::new()?;
        file.write_all(&self.to_bytes()?)?;
        file.flush()?;
        Ok(TempDatabase { file })
    }

    pub fn open_in_memory(&self) -> MockResult<StorageManager<Cursor<Vec<u8>>>> {
        Ok(StorageManager::from_reader(Cursor::new(self.to_bytes()?))?)
    }
}

/// A database written to a temporary file, deleted on drop.
pub struct TempDatabase {
    file: NamedTempFile,
}

impl TempDatabase {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn reopen(&self) -> Result<File> {
        Ok(self.file.reopen()?)
    }

    pub fn open(&self) -> Result<StorageManager> {
        StorageManager::open(self.path())
    }
}

/// Page reader that records every page it is asked for.
pub struct RecordingReader<P: PageReader> {
    inner: P,
    pages: Vec<PageNumber>,
}

impl<P: PageReader> RecordingReader<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            pages: Vec::new(),
        }
    }

    /// Page numbers in the order they were read.
    pub fn pages_read(&self) -> &[PageNumber] {
        &self.pages
    }

    pub fn has_read(&self, page_number: PageNumber) -> bool {
        self.pages.contains(&page_number)
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }
}

impl<P: PageReader> PageReader for RecordingReader<P> {
    fn read_page(&mut self, page_number: PageNumber) -> Result<Page> {
        self.pages.push(page_number);
        self.inner.read_page(page_number)
    }

    fn page_size(&self) -> u32 {
        self.inner.page_size()
    }
}
