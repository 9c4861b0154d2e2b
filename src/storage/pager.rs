use std::{
    fs::File,
    io::{Read, Seek, SeekFrom},
    path::Path,
};

use tracing::debug;

use crate::{
    storage::header::DatabaseHeader,
    types::{
        HEADER_SIZE, PageNumber,
        error::{DatabaseError, Result},
        page::Page,
    },
};

/// Source of decoded pages for the b-tree navigators.
pub trait PageReader {
    /// Read and decode the page with the given 1-based number.
    fn read_page(&mut self, page_number: PageNumber) -> Result<Page>;

    fn page_size(&self) -> u32;
}

/// Reads whole pages from a random-access source.
///
/// Every read seeks to `(page_number - 1) * page_size`; nothing is cached,
/// so each traversal step costs one read. The pager owns its handle, which
/// is released when the pager is dropped.
pub struct Pager<R = File> {
    source: R,
    page_size: u32,
    usable_size: usize,
    pages_read: u64,
}

impl Pager<File> {
    /// Open a database file and read its header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<(Self, DatabaseHeader)> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(file)
    }
}

impl<R: Read + Seek> Pager<R> {
    pub fn new(source: R, page_size: u32, usable_size: usize) -> Self {
        Self {
            source,
            page_size,
            usable_size,
            pages_read: 0,
        }
    }

    /// Build a pager from the header stored at the start of `source`.
    pub fn from_reader(mut source: R) -> Result<(Self, DatabaseHeader)> {
        let mut header_buffer = vec![0_u8; HEADER_SIZE];
        source.seek(SeekFrom::Start(0))?;
        source.read_exact(&mut header_buffer)?;
        let header = DatabaseHeader::from_bytes(&header_buffer)?;
        let pager = Self::new(source, header.page_size, header.usable_size());
        Ok((pager, header))
    }

    pub fn page_offset(&self, page_number: PageNumber) -> u64 {
        (page_number as u64 - 1) * self.page_size as u64
    }

    pub fn usable_size(&self) -> usize {
        self.usable_size
    }

    /// Number of pages read since the pager was created.
    pub fn pages_read(&self) -> u64 {
        self.pages_read
    }

    /// Raw bytes of one page.
    pub fn read_page_bytes(&mut self, page_number: PageNumber) -> Result<Vec<u8>> {
        if page_number == 0 {
            return Err(DatabaseError::InvalidPageNumber { page_number });
        }
        let mut buffer = vec![0_u8; self.page_size as usize];
        self.source.seek(SeekFrom::Start(self.page_offset(page_number)))?;
        self.source.read_exact(&mut buffer)?;
        self.pages_read += 1;
        Ok(buffer)
    }

    pub fn into_inner(self) -> R {
        self.source
    }
}

impl<R: Read + Seek> PageReader for Pager<R> {
    fn read_page(&mut self, page_number: PageNumber) -> Result<Page> {
        let buffer = self.read_page_bytes(page_number)?;
        let page = Page::from_bytes(page_number, buffer, self.usable_size)?;
        debug!(
            page_number,
            page_type = ?page.page_type(),
            cells = page.cell_count(),
            "read page"
        );
        Ok(page)
    }

    fn page_size(&self) -> u32 {
        self.page_size
    }
}

impl<P: PageReader + ?Sized> PageReader for &mut P {
    fn read_page(&mut self, page_number: PageNumber) -> Result<Page> {
        (**self).read_page(page_number)
    }

    fn page_size(&self) -> u32 {
        (**self).page_size()
    }
}
