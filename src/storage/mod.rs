pub mod header;
pub mod pager;
pub mod schema;
pub mod storage_manager;

pub const DATABASE_MAGIC: &[u8; 16] = b"SQLite format 3\0";
