use std::io::Cursor;

use lembar::{
    storage::{
        header::{DatabaseHeader, TextEncoding},
        pager::{PageReader, Pager},
    },
    types::{HEADER_SIZE, error::DatabaseError},
    utils::mock::{MockDatabase, MockPage},
};

#[test]
fn test_header_round_trip() {
    let mut header = DatabaseHeader::new(4096, 12);
    header.reserved_space = 8;
    header.schema_cookie = 77;

    let bytes = header.to_bytes();
    assert_eq!(bytes.len(), HEADER_SIZE);
    assert_eq!(&bytes[..16], b"SQLite format 3\0");
    assert_eq!(&bytes[16..18], &[0x10, 0x00]);

    let parsed = DatabaseHeader::from_bytes(&bytes).unwrap();
    assert_eq!(parsed, header);
    assert_eq!(parsed.usable_size(), 4088);
    assert_eq!(parsed.text_encoding, TextEncoding::Utf8);
}

#[test]
fn test_page_size_one_means_65536() {
    let bytes = DatabaseHeader::new(65536, 1).to_bytes();
    assert_eq!(&bytes[16..18], &[0x00, 0x01]);
    assert_eq!(DatabaseHeader::from_bytes(&bytes).unwrap().page_size, 65536);
}

#[test]
fn test_bad_magic_is_rejected() {
    let mut bytes = DatabaseHeader::new(4096, 1).to_bytes();
    bytes[0] = b'X';
    assert!(matches!(
        DatabaseHeader::from_bytes(&bytes),
        Err(DatabaseError::InvalidHeader { .. })
    ));
}

#[test]
fn test_page_size_must_be_power_of_two() {
    let mut bytes = DatabaseHeader::new(4096, 1).to_bytes();
    bytes[16..18].copy_from_slice(&1000_u16.to_be_bytes());
    assert!(DatabaseHeader::from_bytes(&bytes).is_err());

    bytes[16..18].copy_from_slice(&256_u16.to_be_bytes());
    assert!(DatabaseHeader::from_bytes(&bytes).is_err());
}

#[test]
fn test_short_header_is_rejected() {
    let bytes = DatabaseHeader::new(4096, 1).to_bytes();
    assert!(DatabaseHeader::from_bytes(&bytes[..50]).is_err());
}

#[test]
fn test_pager_reads_pages_at_their_offsets() {
    let mut db = MockDatabase::new(1024);
    db.page(2, MockPage::TableLeaf(vec![]));
    db.page(3, MockPage::IndexLeaf(vec![]));
    let bytes = db.to_bytes().unwrap();
    assert_eq!(bytes.len(), 3 * 1024);

    let (mut pager, header) = Pager::from_reader(Cursor::new(bytes)).unwrap();
    assert_eq!(header.page_size, 1024);
    assert_eq!(header.database_size_pages, 3);
    assert_eq!(pager.page_size(), 1024);
    assert_eq!(pager.page_offset(1), 0);
    assert_eq!(pager.page_offset(3), 2048);

    let first = pager.read_page(1).unwrap();
    assert_eq!(first.page_type().as_u8(), 0x0D);
    let third = pager.read_page(3).unwrap();
    assert_eq!(third.page_type().as_u8(), 0x0A);
    assert_eq!(pager.pages_read(), 2);
}

#[test]
fn test_pager_rejects_page_zero_and_pages_past_the_end() {
    let bytes = MockDatabase::new(512).to_bytes().unwrap();
    let (mut pager, _) = Pager::from_reader(Cursor::new(bytes)).unwrap();

    assert!(matches!(
        pager.read_page(0),
        Err(DatabaseError::InvalidPageNumber { page_number: 0 })
    ));
    assert!(matches!(pager.read_page(5), Err(DatabaseError::Io(_))));
}
