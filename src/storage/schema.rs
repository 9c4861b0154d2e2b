use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    executor::table_scan::table_scan,
    storage::pager::PageReader,
    types::{
        PageNumber, SCHEMA_ROOT_PAGE,
        error::{DatabaseError, Result},
        row::Row,
        value::Value,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaObjectType {
    Table,
    Index,
    View,
    Trigger,
}

impl SchemaObjectType {
    pub fn from_name(value: &str) -> Option<Self> {
        match value {
            "table" => Some(Self::Table),
            "index" => Some(Self::Index),
            "view" => Some(Self::View),
            "trigger" => Some(Self::Trigger),
            _ => None,
        }
    }
}

/// One row of the schema table: type, name, tbl_name, rootpage, sql.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaEntry {
    pub object_type: SchemaObjectType,
    pub name: String,
    pub table_name: String,
    pub root_page: PageNumber,
    pub sql: Option<String>,
}

impl SchemaEntry {
    pub fn from_row(row: &Row) -> Result<Option<Self>> {
        if row.values.len() < 5 {
            return Err(DatabaseError::CorruptedPage {
                page_number: SCHEMA_ROOT_PAGE,
                reason: format!("schema row has {} columns, expected 5", row.values.len()),
            });
        }

        let text = |index: usize| match &row.values[index] {
            Value::Text(s) => Ok(s.clone()),
            other => Err(DatabaseError::CorruptedPage {
                page_number: SCHEMA_ROOT_PAGE,
                reason: format!("schema column {} is not text: {:?}", index, other),
            }),
        };

        let kind = text(0)?;
        let Some(object_type) = SchemaObjectType::from_name(&kind) else {
            warn!(kind = %kind, "skipping schema row of unknown type");
            return Ok(None);
        };

        let root_page = match &row.values[3] {
            Value::Integer(page) => {
                PageNumber::try_from(*page).map_err(|_| DatabaseError::CorruptedPage {
                    page_number: SCHEMA_ROOT_PAGE,
                    reason: format!("schema rootpage {} is not a valid page number", page),
                })?
            }
            // views and triggers have no b-tree
            Value::Null => 0,
            other => {
                return Err(DatabaseError::CorruptedPage {
                    page_number: SCHEMA_ROOT_PAGE,
                    reason: format!("schema rootpage is not an integer: {:?}", other),
                });
            }
        };

        let sql = match &row.values[4] {
            Value::Text(sql) => Some(sql.clone()),
            _ => None,
        };

        Ok(Some(Self {
            object_type,
            name: text(1)?,
            table_name: text(2)?,
            root_page,
            sql,
        }))
    }

    /// Internal objects such as `sqlite_sequence` and autoindexes.
    pub fn is_internal(&self) -> bool {
        self.name.starts_with("sqlite_")
    }
}

/// Contents of the schema table rooted at page 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub entries: Vec<SchemaEntry>,
}

impl Schema {
    /// Read the whole schema table. The schema is itself a table b-tree, so
    /// it is walked like any other table and may span several pages.
    pub fn load<P: PageReader>(reader: P) -> Result<Self> {
        let rows = table_scan(reader, SCHEMA_ROOT_PAGE)?;
        Self::from_rows(&rows)
    }

    pub fn from_rows(rows: &[Row]) -> Result<Self> {
        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(entry) = SchemaEntry::from_row(row)? {
                entries.push(entry);
            }
        }
        Ok(Self { entries })
    }

    fn find(&self, object_type: SchemaObjectType, name: &str) -> Option<&SchemaEntry> {
        self.entries
            .iter()
            .find(|e| e.object_type == object_type && e.name.eq_ignore_ascii_case(name))
    }

    pub fn table(&self, name: &str) -> Result<&SchemaEntry> {
        self.find(SchemaObjectType::Table, name)
            .ok_or_else(|| DatabaseError::TableNotFound {
                name: name.to_string(),
            })
    }

    pub fn index(&self, name: &str) -> Result<&SchemaEntry> {
        self.find(SchemaObjectType::Index, name)
            .ok_or_else(|| DatabaseError::IndexNotFound {
                name: name.to_string(),
            })
    }

    pub fn tables(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.entries
            .iter()
            .filter(|e| e.object_type == SchemaObjectType::Table)
    }

    pub fn indexes(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.entries
            .iter()
            .filter(|e| e.object_type == SchemaObjectType::Index)
    }

    pub fn indexes_on<'a>(&'a self, table_name: &'a str) -> impl Iterator<Item = &'a SchemaEntry> {
        self.indexes()
            .filter(move |e| e.table_name.eq_ignore_ascii_case(table_name))
    }
}
