#[path = "../common/fixtures.rs"]
mod fixtures;

use std::io::Cursor;

use fixtures::{APPLES_ROOT, COLOR_INDEX_ROOT, fruit_database};
use lembar::{
    executor::query::QueryExecutor,
    planner::{logical_plan::Planner, parser::SqlParser},
    storage::{pager::Pager, schema::Schema},
    types::{error::DatabaseError, value::Value},
    utils::mock::RecordingReader,
};

fn text(values: &[&str]) -> Vec<Value> {
    values.iter().map(|v| Value::from(*v)).collect()
}

#[test]
fn test_select_single_column() {
    let mut storage = fruit_database().open_in_memory().unwrap();
    let result = storage.execute("SELECT name FROM apples").unwrap();

    assert_eq!(result.columns, vec!["name"]);
    assert_eq!(result.rows.len(), 8);
    assert_eq!(result.rows[0], text(&["Granny Smith"]));
    assert_eq!(result.rows[7], text(&["Jazz"]));
}

#[test]
fn test_select_star_reads_alias_from_row_key() {
    let mut storage = fruit_database().open_in_memory().unwrap();
    let result = storage.execute("SELECT * FROM apples").unwrap();

    assert_eq!(result.columns, vec!["id", "name", "color"]);
    assert_eq!(
        result.rows[2],
        vec![Value::Integer(3), Value::from("Honeycrisp"), Value::from("Blush Red")]
    );
}

#[test]
fn test_count_star() {
    let mut storage = fruit_database().open_in_memory().unwrap();
    let result = storage.execute("SELECT COUNT(*) FROM apples").unwrap();
    assert_eq!(result.rows, vec![vec![Value::Integer(8)]]);

    let result = storage
        .execute("SELECT count(*) FROM apples WHERE color = 'Red'")
        .unwrap();
    assert_eq!(result.rows, vec![vec![Value::Integer(4)]]);
}

#[test]
fn test_where_on_indexed_column() {
    let mut storage = fruit_database().open_in_memory().unwrap();
    let result = storage
        .execute("SELECT id, name FROM apples WHERE color = 'Red'")
        .unwrap();

    assert_eq!(
        result.rows,
        vec![
            vec![Value::Integer(2), Value::from("Fuji")],
            vec![Value::Integer(5), Value::from("Gala")],
            vec![Value::Integer(6), Value::from("Braeburn")],
            vec![Value::Integer(8), Value::from("Jazz")],
        ]
    );
}

#[test]
fn test_where_on_plain_column_and_row_key() {
    let mut storage = fruit_database().open_in_memory().unwrap();

    let result = storage
        .execute("SELECT color FROM apples WHERE name = 'Pink Lady'")
        .unwrap();
    assert_eq!(result.rows, vec![text(&["Pink"])]);

    let result = storage.execute("SELECT name FROM apples WHERE id = 4").unwrap();
    assert_eq!(result.rows, vec![text(&["Golden Delicious"])]);

    let result = storage.execute("SELECT name FROM apples WHERE id = 40").unwrap();
    assert!(result.rows.is_empty());
}

#[test]
fn test_query_errors() {
    let mut storage = fruit_database().open_in_memory().unwrap();

    let err = storage.execute("SELECT * FROM pears").unwrap_err();
    assert!(err.is_not_found());

    let err = storage.execute("SELECT weight FROM apples").unwrap_err();
    assert!(matches!(err, DatabaseError::ColumnNotFound { .. }));

    let err = storage.execute("SELECT * FROM apples WHERE color > 'A'").unwrap_err();
    assert!(matches!(err, DatabaseError::Query(_)));
}

#[test]
fn test_index_plan_reads_only_matching_pages() {
    let bytes = fruit_database().to_bytes().unwrap();
    let (pager, _) = Pager::from_reader(Cursor::new(bytes)).unwrap();
    let mut reader = RecordingReader::new(pager);
    let schema = Schema::load(&mut reader).unwrap();
    reader.clear();

    let statement = SqlParser::new()
        .parse_select("SELECT name FROM apples WHERE color = 'Yellow'")
        .unwrap();
    let plan = Planner::new(&schema).plan(&statement).unwrap();
    let result = QueryExecutor::new(&mut reader).execute(&plan).unwrap();
    assert_eq!(result.rows, vec![text(&["Golden Delicious"])]);

    // index root and its last leaf, then the table root and the leaf holding row 4
    assert_eq!(reader.pages_read(), &[COLOR_INDEX_ROOT, 8, APPLES_ROOT, 2, 3]);
}

#[test]
fn test_json_result_shape() {
    let mut storage = fruit_database().open_in_memory().unwrap();
    let result = storage.execute("SELECT id FROM apples WHERE id = 1").unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["columns"][0], "id");
    assert_eq!(json["rows"][0][0]["Integer"], 1);
}
