use crate::types::{error::DatabaseError, row::Row};

/// A pull-based source of rows.
pub trait Scanner {
    fn scan(&mut self) -> Result<Option<Row>, DatabaseError>;
    fn scan_batch(&mut self, batch_size: usize) -> Result<Vec<Row>, DatabaseError>;
    fn reset(&mut self) -> Result<(), DatabaseError>;
}

pub struct ScanIterator<S: Scanner> {
    scanner: S,
    failed: bool,
}

impl<S: Scanner> ScanIterator<S> {
    pub fn new(scanner: S) -> Self {
        Self {
            scanner,
            failed: false,
        }
    }

    pub fn into_inner(self) -> S {
        self.scanner
    }
}

impl<S: Scanner> Iterator for ScanIterator<S> {
    type Item = Result<Row, DatabaseError>;
    fn next(&mut self) -> Option<Self::Item> {
        // a decode error ends the traversal
        if self.failed {
            return None;
        }
        match self.scanner.scan() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
