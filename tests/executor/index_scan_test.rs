use std::io::Cursor;

use lembar::{
    executor::index_scan::index_equality_scan,
    storage::pager::Pager,
    types::{error::DatabaseError, value::Value},
    utils::mock::{MockDatabase, MockPage, RecordingReader},
};

fn entry(key: &str, row_id: i64) -> Vec<Value> {
    vec![Value::from(key), Value::Integer(row_id)]
}

fn reader(db: &MockDatabase) -> RecordingReader<Pager<Cursor<Vec<u8>>>> {
    let (pager, _) = Pager::from_reader(Cursor::new(db.to_bytes().unwrap())).unwrap();
    RecordingReader::new(pager)
}

/// Root page 5 separates leaves 2 (a), 3 (c) and 4 (e, f) with b and d.
fn letters() -> MockDatabase {
    let mut db = MockDatabase::new(512);
    db.page(2, MockPage::IndexLeaf(vec![entry("a", 1)]));
    db.page(3, MockPage::IndexLeaf(vec![entry("c", 3)]));
    db.page(4, MockPage::IndexLeaf(vec![entry("e", 5), entry("f", 6)]));
    db.page(
        5,
        MockPage::IndexInterior {
            cells: vec![(2, entry("b", 2)), (3, entry("d", 4))],
            right_child: 4,
        },
    );
    db
}

#[test]
fn test_match_in_first_leaf_prunes_siblings() {
    let mut reader = reader(&letters());
    let row_ids = index_equality_scan(&mut reader, 5, &Value::from("a")).unwrap();
    assert_eq!(row_ids, vec![1]);
    assert_eq!(reader.pages_read(), &[5, 2]);
    assert!(!reader.has_read(3));
    assert!(!reader.has_read(4));
}

#[test]
fn test_match_in_middle_leaf_skips_left_and_right() {
    let mut reader = reader(&letters());
    let row_ids = index_equality_scan(&mut reader, 5, &Value::from("c")).unwrap();
    assert_eq!(row_ids, vec![3]);
    assert_eq!(reader.pages_read(), &[5, 3]);
}

#[test]
fn test_interior_entry_is_a_match() {
    let mut reader = reader(&letters());
    let row_ids = index_equality_scan(&mut reader, 5, &Value::from("d")).unwrap();
    assert_eq!(row_ids, vec![4]);
    assert!(!reader.has_read(2));
}

#[test]
fn test_key_past_every_separator_reads_right_most_child() {
    let mut reader = reader(&letters());
    let row_ids = index_equality_scan(&mut reader, 5, &Value::from("f")).unwrap();
    assert_eq!(row_ids, vec![6]);
    assert_eq!(reader.pages_read(), &[5, 4]);

    reader.clear();
    let row_ids = index_equality_scan(&mut reader, 5, &Value::from("zzz")).unwrap();
    assert!(row_ids.is_empty());
}

#[test]
fn test_duplicates_spanning_a_separator() {
    let mut db = MockDatabase::new(512);
    db.page(
        2,
        MockPage::IndexLeaf(vec![entry("blue", 1), entry("red", 2), entry("red", 3)]),
    );
    db.page(3, MockPage::IndexLeaf(vec![entry("red", 7), entry("zed", 8)]));
    db.page(
        4,
        MockPage::IndexInterior {
            cells: vec![(2, entry("red", 5))],
            right_child: 3,
        },
    );
    let mut reader = reader(&db);

    let row_ids = index_equality_scan(&mut reader, 4, &Value::from("red")).unwrap();
    assert_eq!(row_ids, vec![2, 3, 5, 7]);
}

#[test]
fn test_only_the_first_column_is_compared() {
    let mut db = MockDatabase::new(512);
    db.page(
        2,
        MockPage::IndexLeaf(vec![
            vec![Value::Integer(3), Value::from("x"), Value::Integer(10)],
            vec![Value::Integer(3), Value::from("y"), Value::Integer(11)],
            vec![Value::Integer(4), Value::from("x"), Value::Integer(12)],
        ]),
    );
    let mut reader = reader(&db);

    let row_ids = index_equality_scan(&mut reader, 2, &Value::Real(3.0)).unwrap();
    assert_eq!(row_ids, vec![10, 11]);
}

#[test]
fn test_index_record_without_row_key_is_an_error() {
    let mut db = MockDatabase::new(512);
    db.page(2, MockPage::IndexLeaf(vec![vec![Value::from("a"), Value::from("b")]]));
    let mut reader = reader(&db);

    let result = index_equality_scan(&mut reader, 2, &Value::from("a"));
    assert!(matches!(result, Err(DatabaseError::InvalidIndexRecord { .. })));
}

#[test]
fn test_table_root_is_not_an_index() {
    let mut db = MockDatabase::new(512);
    db.page(2, MockPage::TableLeaf(vec![(1, vec![Value::from("a")])]));
    let mut reader = reader(&db);

    let result = index_equality_scan(&mut reader, 2, &Value::from("a"));
    assert!(matches!(result, Err(DatabaseError::UnexpectedPageType { page_number: 2, .. })));
}
