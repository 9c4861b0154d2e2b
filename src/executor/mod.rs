pub mod index_scan;
pub mod query;
pub mod scan;
pub mod table_scan;
