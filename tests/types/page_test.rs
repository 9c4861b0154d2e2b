use lembar::{
    types::{
        HEADER_SIZE,
        cell::Cell,
        error::DatabaseError,
        page::{Page, PageType, header_offset, read_cell_count, read_cell_pointers, read_type},
        row::Row,
        value::Value,
    },
    utils::mock::{MockError, MockPage},
};

const PAGE_SIZE: usize = 512;

fn leaf(rows: &[(i64, &str)]) -> MockPage {
    MockPage::TableLeaf(
        rows.iter()
            .map(|(id, name)| (*id, vec![Value::from(*name)]))
            .collect(),
    )
}

#[test]
fn test_page_type_bytes() {
    assert_eq!(PageType::from_u8(0x02).unwrap(), PageType::InteriorIndex);
    assert_eq!(PageType::from_u8(0x05).unwrap(), PageType::InteriorTable);
    assert_eq!(PageType::from_u8(0x0A).unwrap(), PageType::LeafIndex);
    assert_eq!(PageType::from_u8(0x0D).unwrap(), PageType::LeafTable);
    assert!(matches!(PageType::from_u8(0x07), Err(DatabaseError::InvalidPageType(0x07))));
    assert!(matches!(PageType::from_u8(0x00), Err(DatabaseError::InvalidPageType(0x00))));
}

#[test]
fn test_header_sizes() {
    assert_eq!(PageType::LeafTable.header_size(), 8);
    assert_eq!(PageType::LeafIndex.header_size(), 8);
    assert_eq!(PageType::InteriorTable.header_size(), 12);
    assert_eq!(PageType::InteriorIndex.header_size(), 12);
}

#[test]
fn test_max_local_payload() {
    assert_eq!(PageType::LeafTable.max_local_payload(4096), 4061);
    assert_eq!(PageType::LeafIndex.max_local_payload(4096), 1002);
    assert_eq!(PageType::InteriorIndex.max_local_payload(512), 102);
}

#[test]
fn test_leaf_page_cells_in_pointer_order() {
    let data = leaf(&[(1, "one"), (2, "two"), (3, "three")])
        .to_bytes(2, PAGE_SIZE)
        .unwrap();
    let page = Page::from_bytes(2, data, PAGE_SIZE).unwrap();

    assert_eq!(page.page_type(), PageType::LeafTable);
    assert_eq!(page.cell_count(), 3);
    assert_eq!(
        page.cell(1).unwrap(),
        Cell::TableLeaf(Row::with_row_id(2, vec![Value::from("two")]))
    );
    assert!(page.right_most_pointer().is_err());
}

#[test]
fn test_page_one_header_starts_after_file_header() {
    let data = leaf(&[(1, "schema")]).to_bytes(1, PAGE_SIZE).unwrap();
    assert_eq!(header_offset(true), HEADER_SIZE);
    assert_eq!(data[HEADER_SIZE], 0x0D);
    assert_eq!(read_type(&data, true).unwrap(), PageType::LeafTable);
    assert_eq!(read_cell_count(&data, true).unwrap(), 1);

    let page = Page::from_bytes(1, data, PAGE_SIZE).unwrap();
    assert_eq!(page.cell(0).unwrap().row_id(), Some(1));
}

#[test]
fn test_interior_page_pointer_array_after_twelve_byte_header() {
    let interior = MockPage::TableInterior {
        cells: vec![(2, 10), (3, 20)],
        right_child: 4,
    };
    let data = interior.to_bytes(5, PAGE_SIZE).unwrap();

    let pointers = read_cell_pointers(&data, false, true).unwrap();
    assert_eq!(pointers.len(), 2);
    assert_eq!(u16::from_be_bytes([data[12], data[13]]), pointers[0]);

    let page = Page::from_bytes(5, data, PAGE_SIZE).unwrap();
    assert_eq!(page.right_most_pointer().unwrap(), 4);
    assert_eq!(
        page.cell(0).unwrap(),
        Cell::TableInterior {
            left_child: 2,
            row_id: 10
        }
    );
    assert_eq!(page.cell(1).unwrap().left_child(), Some(3));
}

#[test]
fn test_index_cells() {
    let interior = MockPage::IndexInterior {
        cells: vec![(7, vec![Value::from("m"), Value::Integer(12)])],
        right_child: 8,
    };
    let data = interior.to_bytes(6, PAGE_SIZE).unwrap();
    let page = Page::from_bytes(6, data, PAGE_SIZE).unwrap();
    assert_eq!(
        page.cell(0).unwrap(),
        Cell::IndexInterior {
            left_child: 7,
            record: Row::new(vec![Value::from("m"), Value::Integer(12)])
        }
    );
    assert_eq!(page.cell(0).unwrap().row_id(), None);
}

#[test]
fn test_unknown_page_type_is_rejected() {
    let mut data = leaf(&[(1, "x")]).to_bytes(2, PAGE_SIZE).unwrap();
    data[0] = 0x07;
    let result = Page::from_bytes(2, data, PAGE_SIZE);
    assert!(matches!(result, Err(DatabaseError::InvalidPageType(0x07))));
}

#[test]
fn test_cell_pointer_outside_content_area_is_corruption() {
    let mut data = leaf(&[(1, "x")]).to_bytes(2, PAGE_SIZE).unwrap();
    // point the only cell into the pointer array itself
    data[8..10].copy_from_slice(&4_u16.to_be_bytes());
    let result = Page::from_bytes(2, data, PAGE_SIZE);
    assert!(matches!(result, Err(DatabaseError::CorruptedPage { page_number: 2, .. })));
}

#[test]
fn test_page_number_zero_is_invalid() {
    let data = leaf(&[]).to_bytes(2, PAGE_SIZE).unwrap();
    let result = Page::from_bytes(0, data, PAGE_SIZE);
    assert!(matches!(result, Err(DatabaseError::InvalidPageNumber { page_number: 0 })));
}

#[test]
fn test_payload_needing_overflow_pages_is_rejected() {
    let long = "x".repeat(480);
    let data = leaf(&[(1, long.as_str())]).to_bytes(2, PAGE_SIZE).unwrap();
    let page = Page::from_bytes(2, data, PAGE_SIZE).unwrap();

    match page.cell(0) {
        Err(DatabaseError::OverflowUnsupported {
            payload_size,
            max_local,
        }) => {
            assert_eq!(max_local, 477);
            assert_eq!(payload_size, 483);
        }
        other => panic!("expected an overflow error, got {other:?}"),
    }
}

#[test]
fn test_fixture_page_that_cannot_hold_its_cells() {
    let rows: Vec<(i64, &str)> = (1..=40).map(|id| (id, "a row that takes some room")).collect();
    let result = leaf(&rows).to_bytes(2, PAGE_SIZE);
    assert!(matches!(
        result,
        Err(MockError::PageOverflow { page_number: 2, .. })
    ));
}
