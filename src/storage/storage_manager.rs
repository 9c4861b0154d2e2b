use std::{
    collections::HashSet,
    fs::File,
    io::{Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use tracing::info;

use crate::{
    executor::{
        index_scan::index_equality_scan,
        query::{QueryExecutor, QueryResult},
        table_scan::{table_lookup, table_scan, table_scan_filtered},
    },
    planner::{logical_plan::Planner, parser::SqlParser},
    storage::{
        header::{DatabaseHeader, TextEncoding},
        pager::Pager,
        schema::Schema,
    },
    types::{
        RowId,
        error::{DatabaseError, Result},
        row::Row,
        value::Value,
    },
};

pub struct DatabaseInfo {
    pub path: Option<PathBuf>,
    pub header: DatabaseHeader,
    pub page_count: u64,
    pub file_size: u64,
}

/// Read-only handle on one database file: header, pager and schema.
pub struct StorageManager<R = File> {
    pub db_info: DatabaseInfo,
    pager: Pager<R>,
    schema: Schema,
}

impl StorageManager<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "opening database");
        let file = File::open(path)?;
        let mut manager = Self::from_reader(file)?;
        manager.db_info.path = Some(path.to_path_buf());
        Ok(manager)
    }
}

impl<R: Read + Seek> StorageManager<R> {
    pub fn from_reader(mut reader: R) -> Result<Self> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        let (mut pager, header) = Pager::from_reader(reader)?;
        if header.text_encoding != TextEncoding::Utf8 {
            return Err(DatabaseError::UnsupportedTextEncoding {
                encoding: format!("{:?}", header.text_encoding),
            });
        }

        let schema = Schema::load(&mut pager)?;
        let page_count = file_size / header.page_size as u64;
        info!(
            page_size = header.page_size,
            page_count,
            schema_entries = schema.entries.len(),
            "database opened"
        );

        Ok(Self {
            db_info: DatabaseInfo {
                path: None,
                header,
                page_count,
                file_size,
            },
            pager,
            schema,
        })
    }

    pub fn header(&self) -> &DatabaseHeader {
        &self.db_info.header
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn pager(&mut self) -> &mut Pager<R> {
        &mut self.pager
    }

    /// User tables, in schema order.
    pub fn table_names(&self) -> Vec<&str> {
        self.schema
            .tables()
            .filter(|t| !t.is_internal())
            .map(|t| t.name.as_str())
            .collect()
    }

    pub fn table_scan(&mut self, table_name: &str) -> Result<Vec<Row>> {
        let root_page = self.schema.table(table_name)?.root_page;
        table_scan(&mut self.pager, root_page)
    }

    pub fn table_scan_filtered(&mut self, table_name: &str, keys: &HashSet<RowId>) -> Result<Vec<Row>> {
        let root_page = self.schema.table(table_name)?.root_page;
        table_scan_filtered(&mut self.pager, root_page, keys)
    }

    pub fn table_lookup(&mut self, table_name: &str, row_id: RowId) -> Result<Row> {
        let root_page = self.schema.table(table_name)?.root_page;
        table_lookup(&mut self.pager, root_page, row_id)
    }

    pub fn index_scan(&mut self, index_name: &str, value: &Value) -> Result<Vec<RowId>> {
        let root_page = self.schema.index(index_name)?.root_page;
        index_equality_scan(&mut self.pager, root_page, value)
    }

    /// Parse, plan and run one SELECT statement.
    pub fn execute(&mut self, sql: &str) -> Result<QueryResult> {
        let statement = SqlParser::new().parse_select(sql)?;
        let plan = Planner::new(&self.schema).plan(&statement)?;
        QueryExecutor::new(&mut self.pager).execute(&plan)
    }
}
