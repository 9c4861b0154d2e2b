use std::cmp::Ordering;

use tracing::debug;

use crate::{
    storage::pager::PageReader,
    types::{
        PageNumber, RowId,
        cell::Cell,
        error::{DatabaseError, Result},
        page::PageType,
        value::Value,
    },
};

/// Row keys of every index entry whose first column equals `value`.
///
/// Only the first indexed column takes part in the comparison. Results are
/// in key order of the index (left subtrees, then the separating entry,
/// then further cells), which for equal keys is ascending row key.
pub fn index_equality_scan<P: PageReader>(
    reader: &mut P,
    root_page: PageNumber,
    value: &Value,
) -> Result<Vec<RowId>> {
    let mut row_ids = Vec::new();
    scan_index_page(reader, root_page, value, &mut row_ids)?;
    debug!(root_page, matches = row_ids.len(), "index equality scan finished");
    Ok(row_ids)
}

fn scan_index_page<P: PageReader>(
    reader: &mut P,
    page_number: PageNumber,
    value: &Value,
    row_ids: &mut Vec<RowId>,
) -> Result<()> {
    let page = reader.read_page(page_number)?;
    match page.page_type() {
        PageType::LeafIndex => {
            for i in 0..page.cell_count() {
                if let Cell::IndexLeaf(record) = page.cell(i)? {
                    if record.index_key()? == value {
                        row_ids.push(record.index_row_id()?);
                    }
                }
            }
            Ok(())
        }
        PageType::InteriorIndex => {
            for i in 0..page.cell_count() {
                let Cell::IndexInterior { left_child, record } = page.cell(i)? else {
                    continue;
                };
                let ordering = value.key_cmp(record.index_key()?);
                if ordering != Ordering::Greater {
                    scan_index_page(reader, left_child, value, row_ids)?;
                }
                match ordering {
                    // the separating entry is itself an index entry
                    Ordering::Equal => row_ids.push(record.index_row_id()?),
                    // nothing at or after this cell can match, the right-most child included
                    Ordering::Less => {
                        debug!(page_number, pruned_from = i, "pruning remaining index subtrees");
                        return Ok(());
                    }
                    Ordering::Greater => {}
                }
            }
            scan_index_page(reader, page.right_most_pointer()?, value, row_ids)
        }
        actual => Err(DatabaseError::UnexpectedPageType {
            page_number,
            actual,
            expected: "index",
        }),
    }
}
