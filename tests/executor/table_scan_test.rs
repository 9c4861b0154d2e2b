use std::{collections::HashSet, io::Cursor};

use lembar::{
    executor::{
        scan::{ScanIterator, Scanner},
        table_scan::{TableScanner, table_find, table_lookup, table_scan, table_scan_filtered},
    },
    storage::pager::Pager,
    types::{error::DatabaseError, row::Row, value::Value},
    utils::mock::{MockDatabase, MockPage, RecordingReader},
};

const PAGE_SIZE: u32 = 512;

fn leaf(ids: std::ops::RangeInclusive<i64>) -> MockPage {
    MockPage::TableLeaf(
        ids.map(|id| (id, vec![Value::from(format!("row {id}"))]))
            .collect(),
    )
}

fn reader(db: &MockDatabase) -> RecordingReader<Pager<Cursor<Vec<u8>>>> {
    let (pager, _) = Pager::from_reader(Cursor::new(db.to_bytes().unwrap())).unwrap();
    RecordingReader::new(pager)
}

/// Page 2 is a leaf holding rows 1..=3.
fn single_leaf() -> MockDatabase {
    let mut db = MockDatabase::new(PAGE_SIZE);
    db.page(2, leaf(1..=3));
    db
}

/// Root page 4 over leaves 2 (rows 1..=3) and 3 (rows 4..=6).
fn two_level() -> MockDatabase {
    let mut db = MockDatabase::new(PAGE_SIZE);
    db.page(2, leaf(1..=3));
    db.page(3, leaf(4..=6));
    db.page(
        4,
        MockPage::TableInterior {
            cells: vec![(2, 3)],
            right_child: 3,
        },
    );
    db
}

fn ids(rows: &[Row]) -> Vec<i64> {
    rows.iter().map(|r| r.row_id.unwrap()).collect()
}

#[test]
fn test_scan_single_leaf() {
    let mut reader = reader(&single_leaf());
    let rows = table_scan(&mut reader, 2).unwrap();
    assert_eq!(ids(&rows), vec![1, 2, 3]);
    assert_eq!(rows[0].values, vec![Value::from("row 1")]);
}

#[test]
fn test_lookup_in_single_leaf() {
    let mut reader = reader(&single_leaf());
    let row = table_find(&mut reader, 2, 2).unwrap().unwrap();
    assert_eq!(row.values, vec![Value::from("row 2")]);
    assert!(table_find(&mut reader, 2, 5).unwrap().is_none());
    assert!(matches!(
        table_lookup(&mut reader, 2, 5),
        Err(DatabaseError::RowNotFound { row_id: 5 })
    ));
}

#[test]
fn test_scan_two_levels_visits_left_children_first() {
    let mut reader = reader(&two_level());
    let rows = table_scan(&mut reader, 4).unwrap();
    assert_eq!(ids(&rows), vec![1, 2, 3, 4, 5, 6]);
    assert_eq!(reader.pages_read(), &[4, 2, 3]);
}

#[test]
fn test_lookup_descends_only_into_the_covering_child() {
    let mut reader = reader(&two_level());

    let row = table_find(&mut reader, 4, 5).unwrap().unwrap();
    assert_eq!(row.row_id, Some(5));
    assert!(!reader.has_read(2));
    assert_eq!(reader.pages_read(), &[4, 3]);

    reader.clear();
    let row = table_find(&mut reader, 4, 3).unwrap().unwrap();
    assert_eq!(row.row_id, Some(3));
    assert_eq!(reader.pages_read(), &[4, 2]);

    reader.clear();
    assert!(table_find(&mut reader, 4, 7).unwrap().is_none());
    assert_eq!(reader.pages_read(), &[4, 3]);
}

#[test]
fn test_filtered_scan() {
    let mut reader = reader(&two_level());
    let keys: HashSet<_> = [2, 3].into_iter().collect();
    let rows = table_scan_filtered(&mut reader, 4, &keys).unwrap();
    assert_eq!(ids(&rows), vec![2, 3]);
    // every key was found in the first leaf
    assert!(!reader.has_read(3));
}

#[test]
fn test_filtered_scan_with_missing_keys_visits_everything() {
    let mut reader = reader(&two_level());
    let keys: HashSet<_> = [5, 40].into_iter().collect();
    let rows = table_scan_filtered(&mut reader, 4, &keys).unwrap();
    assert_eq!(ids(&rows), vec![5]);
    assert_eq!(reader.pages_read(), &[4, 2, 3]);
}

#[test]
fn test_filtered_scan_with_no_keys_reads_nothing() {
    let mut reader = reader(&two_level());
    let rows = table_scan_filtered(&mut reader, 4, &HashSet::new()).unwrap();
    assert!(rows.is_empty());
    assert!(reader.pages_read().is_empty());
}

#[test]
fn test_scanner_batches_and_reset() {
    let mut scanner = TableScanner::new(reader(&two_level()), 4);

    let first = scanner.scan_batch(4).unwrap();
    assert_eq!(ids(&first), vec![1, 2, 3, 4]);
    let rest = scanner.scan_batch(4).unwrap();
    assert_eq!(ids(&rest), vec![5, 6]);
    assert!(scanner.scan().unwrap().is_none());

    scanner.reset().unwrap();
    assert_eq!(scanner.scan().unwrap().unwrap().row_id, Some(1));
}

#[test]
fn test_scanner_is_lazy() {
    let mut scanner = TableScanner::new(reader(&two_level()), 4);
    assert!(scanner.scan().unwrap().is_some());
    let reader = scanner.into_reader();
    assert_eq!(reader.pages_read(), &[4, 2]);
}

#[test]
fn test_index_root_is_not_a_table() {
    let mut db = MockDatabase::new(PAGE_SIZE);
    db.page(2, MockPage::IndexLeaf(vec![vec![Value::Integer(1), Value::Integer(1)]]));
    let mut reader = reader(&db);

    let result = table_scan(&mut reader, 2);
    assert!(matches!(result, Err(DatabaseError::UnexpectedPageType { page_number: 2, .. })));
    assert!(matches!(
        table_find(&mut reader, 2, 1),
        Err(DatabaseError::UnexpectedPageType { .. })
    ));
}

#[test]
fn test_decode_error_ends_iteration() {
    let mut db = two_level();
    // child page 3 is not a b-tree page
    db.page(3, MockPage::TableLeaf(vec![]));
    let mut bytes = db.to_bytes().unwrap();
    bytes[2 * PAGE_SIZE as usize] = 0x07;

    let (pager, _) = Pager::from_reader(Cursor::new(bytes)).unwrap();
    let mut rows = ScanIterator::new(TableScanner::new(pager, 4));
    for expected in 1..=3 {
        assert_eq!(rows.next().unwrap().unwrap().row_id, Some(expected));
    }
    assert!(matches!(rows.next(), Some(Err(DatabaseError::InvalidPageType(0x07)))));
    assert!(rows.next().is_none());
}
