//! Read-only access to SQLite database files.
//!
//! Pages are decoded into typed cells and records, table and index b-trees
//! are walked with explicit stacks, and a small SQL front end plans single
//! table `SELECT` statements on top of the scanners.

pub mod executor;
pub mod planner;
pub mod storage;
pub mod types;
pub mod utils;
