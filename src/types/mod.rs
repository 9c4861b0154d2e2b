pub mod cell;
pub mod error;
pub mod page;
pub mod record;
pub mod row;
pub mod serial_type;
pub mod value;
pub mod varint;

// Common type aliases
pub type PageNumber = u32;
pub type RowId = i64;

// Constants following the SQLite file format
pub const HEADER_SIZE: usize = 100; // Database header size, only present on page 1
pub const LEAF_PAGE_HEADER_SIZE: usize = 8;
pub const INTERIOR_PAGE_HEADER_SIZE: usize = 12; // leaf header + right-most child pointer
pub const CELL_POINTER_SIZE: usize = 2;
pub const CHILD_POINTER_SIZE: usize = 4;
pub const MAX_VARINT_SIZE: usize = 9;
pub const MIN_PAGE_SIZE: u32 = 512;
pub const MAX_PAGE_SIZE: u32 = 65536;
pub const SCHEMA_ROOT_PAGE: PageNumber = 1;
