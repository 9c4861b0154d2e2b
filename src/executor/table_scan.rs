use std::collections::HashSet;

use tracing::debug;

use crate::{
    executor::scan::{ScanIterator, Scanner},
    storage::pager::PageReader,
    types::{
        PageNumber, RowId,
        cell::Cell,
        error::{DatabaseError, Result},
        page::{Page, PageType},
        row::Row,
    },
};

/// Position inside one page of the descent.
struct Frame {
    page: Page,
    // Next cell to visit; `cell_count` means the right-most child is next.
    next_cell: usize,
}

enum Step {
    Emit(Row),
    Descend(PageNumber),
    Pop,
    Skip,
}

/// Depth-first walk over a table b-tree.
///
/// Leaf cells are produced in cell pointer order; on interior pages every
/// left child is visited in pointer order before the right-most child. The
/// order therefore follows the page layout, which for files written by a
/// well-behaved writer is ascending row key, but nothing here relies on it.
///
/// With a key set, only rows whose key is in the set are produced and the
/// walk ends as soon as every key has been seen.
pub struct TableScanner<P: PageReader> {
    reader: P,
    root_page: PageNumber,
    keys: Option<HashSet<RowId>>,
    stack: Vec<Frame>,
    matched: usize,
    started: bool,
    exhausted: bool,
}

impl<P: PageReader> TableScanner<P> {
    pub fn new(reader: P, root_page: PageNumber) -> Self {
        Self {
            reader,
            root_page,
            keys: None,
            stack: Vec::new(),
            matched: 0,
            started: false,
            exhausted: false,
        }
    }

    pub fn filtered(reader: P, root_page: PageNumber, keys: HashSet<RowId>) -> Self {
        let mut scanner = Self::new(reader, root_page);
        scanner.keys = Some(keys);
        scanner
    }

    pub fn into_reader(self) -> P {
        self.reader
    }

    fn push_page(&mut self, page_number: PageNumber) -> Result<()> {
        let page = self.reader.read_page(page_number)?;
        if !page.page_type().is_table() {
            return Err(DatabaseError::UnexpectedPageType {
                page_number,
                actual: page.page_type(),
                expected: "table",
            });
        }
        self.stack.push(Frame { page, next_cell: 0 });
        Ok(())
    }

    fn all_keys_found(&self) -> bool {
        self.keys
            .as_ref()
            .is_some_and(|keys| self.matched >= keys.len())
    }

    fn step(&mut self) -> Result<Option<Step>> {
        let Some(frame) = self.stack.last_mut() else {
            return Ok(None);
        };
        let cell_count = frame.page.cell_count();

        let step = match frame.page.page_type() {
            PageType::LeafTable if frame.next_cell < cell_count => {
                let cell = frame.page.cell(frame.next_cell)?;
                frame.next_cell += 1;
                match cell {
                    Cell::TableLeaf(row) => {
                        let wanted = match (&self.keys, row.row_id) {
                            (None, _) => true,
                            (Some(keys), Some(row_id)) => keys.contains(&row_id),
                            (Some(_), None) => false,
                        };
                        if wanted { Step::Emit(row) } else { Step::Skip }
                    }
                    _ => Step::Skip,
                }
            }
            PageType::InteriorTable if frame.next_cell < cell_count => {
                let cell = frame.page.cell(frame.next_cell)?;
                frame.next_cell += 1;
                match cell.left_child() {
                    Some(child) => Step::Descend(child),
                    None => Step::Skip,
                }
            }
            PageType::InteriorTable if frame.next_cell == cell_count => {
                frame.next_cell += 1;
                Step::Descend(frame.page.right_most_pointer()?)
            }
            _ => Step::Pop,
        };
        Ok(Some(step))
    }
}

impl<P: PageReader> Scanner for TableScanner<P> {
    fn scan(&mut self) -> Result<Option<Row>> {
        if self.exhausted {
            return Ok(None);
        }
        if !self.started {
            self.started = true;
            if self.keys.as_ref().is_some_and(|keys| keys.is_empty()) {
                self.exhausted = true;
                return Ok(None);
            }
            self.push_page(self.root_page)?;
        }

        loop {
            match self.step()? {
                None => {
                    self.exhausted = true;
                    return Ok(None);
                }
                Some(Step::Emit(row)) => {
                    if self.keys.is_some() {
                        self.matched += 1;
                        if self.all_keys_found() {
                            debug!(matched = self.matched, "all requested row keys found");
                            self.stack.clear();
                        }
                    }
                    return Ok(Some(row));
                }
                Some(Step::Descend(child)) => self.push_page(child)?,
                Some(Step::Pop) => {
                    self.stack.pop();
                }
                Some(Step::Skip) => {}
            }
        }
    }

    fn scan_batch(&mut self, batch_size: usize) -> Result<Vec<Row>> {
        let mut batch = Vec::with_capacity(batch_size);
        while batch.len() < batch_size {
            match self.scan()? {
                Some(row) => batch.push(row),
                None => break,
            }
        }
        Ok(batch)
    }

    fn reset(&mut self) -> Result<()> {
        self.stack.clear();
        self.matched = 0;
        self.started = false;
        self.exhausted = false;
        Ok(())
    }
}

/// Every row of the table rooted at `root_page`.
pub fn table_scan<P: PageReader>(reader: P, root_page: PageNumber) -> Result<Vec<Row>> {
    ScanIterator::new(TableScanner::new(reader, root_page)).collect()
}

/// Rows whose key is a member of `keys`.
pub fn table_scan_filtered<P: PageReader>(
    reader: P,
    root_page: PageNumber,
    keys: &HashSet<RowId>,
) -> Result<Vec<Row>> {
    ScanIterator::new(TableScanner::filtered(reader, root_page, keys.clone())).collect()
}

/// Point lookup by row key.
///
/// On an interior page the first cell (in pointer order) whose key is at
/// least `row_id` decides the descent into its left child; the remaining
/// cells are not examined. If no cell qualifies the right-most child is
/// searched.
pub fn table_find<P: PageReader>(
    reader: &mut P,
    page_number: PageNumber,
    row_id: RowId,
) -> Result<Option<Row>> {
    let page = reader.read_page(page_number)?;
    match page.page_type() {
        PageType::InteriorTable => {
            for i in 0..page.cell_count() {
                if let Cell::TableInterior {
                    left_child,
                    row_id: max_key,
                } = page.cell(i)?
                {
                    if max_key >= row_id {
                        debug!(page_number, left_child, max_key, row_id, "descending into left child");
                        return table_find(reader, left_child, row_id);
                    }
                }
            }
            let right_child = page.right_most_pointer()?;
            debug!(page_number, right_child, row_id, "descending into right-most child");
            table_find(reader, right_child, row_id)
        }
        PageType::LeafTable => {
            for i in 0..page.cell_count() {
                if let Cell::TableLeaf(row) = page.cell(i)? {
                    if row.row_id == Some(row_id) {
                        return Ok(Some(row));
                    }
                }
            }
            Ok(None)
        }
        actual => Err(DatabaseError::UnexpectedPageType {
            page_number,
            actual,
            expected: "table",
        }),
    }
}

/// Like [`table_find`], but a miss is a [`DatabaseError::RowNotFound`].
pub fn table_lookup<P: PageReader>(
    reader: &mut P,
    root_page: PageNumber,
    row_id: RowId,
) -> Result<Row> {
    table_find(reader, root_page, row_id)?.ok_or(DatabaseError::RowNotFound { row_id })
}
