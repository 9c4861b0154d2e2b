use tracing::{info, warn};

use crate::{
    planner::{
        definition::{IndexDefinition, TableDefinition},
        error::PlannerError,
        parser::{SelectItem, SelectStatement},
    },
    storage::schema::Schema,
    types::{
        PageNumber, RowId,
        error::{DatabaseError, Result},
        row::Row,
        value::Value,
    },
};

/// Where a column value comes from in a table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRef {
    Column(usize),
    /// The row key, either through `rowid` or an `INTEGER PRIMARY KEY` alias.
    RowId,
}

impl ColumnRef {
    pub fn value(&self, row: &Row) -> Value {
        match self {
            ColumnRef::Column(index) => row.values.get(*index).cloned().unwrap_or(Value::Null),
            ColumnRef::RowId => row.row_id.map(Value::Integer).unwrap_or(Value::Null),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AccessPath {
    FullScan,
    RowIdLookup(RowId),
    IndexEquality {
        index_name: String,
        root_page: PageNumber,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Columns(Vec<(String, ColumnRef)>),
    Count,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogicalPlan {
    pub table_name: String,
    pub root_page: PageNumber,
    pub projection: Projection,
    pub filter: Option<(ColumnRef, Value)>,
    pub access: AccessPath,
}

impl LogicalPlan {
    pub fn matches(&self, row: &Row) -> bool {
        match &self.filter {
            Some((column, value)) => column.value(row) == *value,
            None => true,
        }
    }
}

pub struct Planner<'a> {
    schema: &'a Schema,
}

impl<'a> Planner<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    pub fn plan(&self, statement: &SelectStatement) -> Result<LogicalPlan> {
        let entry = self.schema.table(&statement.table)?;
        let sql = entry
            .sql
            .as_deref()
            .ok_or_else(|| PlannerError::MissingDefinition(entry.name.clone()))?;
        let definition = TableDefinition::parse(sql)?;

        let resolve = |name: &str| -> Result<ColumnRef> {
            match definition.column_index(name) {
                Some(index) if definition.columns[index].is_row_id_alias => Ok(ColumnRef::RowId),
                Some(index) => Ok(ColumnRef::Column(index)),
                None if is_row_id_name(name) => Ok(ColumnRef::RowId),
                None => Err(DatabaseError::ColumnNotFound {
                    name: name.to_string(),
                    table: entry.name.clone(),
                }),
            }
        };

        let projection = if statement.projection.contains(&SelectItem::CountStar) {
            if statement.projection.len() != 1 {
                return Err(PlannerError::InvalidQuery(
                    "COUNT(*) cannot be combined with other columns".to_string(),
                )
                .into());
            }
            Projection::Count
        } else {
            let mut columns = Vec::new();
            for item in &statement.projection {
                match item {
                    SelectItem::Wildcard => {
                        for (index, column) in definition.columns.iter().enumerate() {
                            let column_ref = if column.is_row_id_alias {
                                ColumnRef::RowId
                            } else {
                                ColumnRef::Column(index)
                            };
                            columns.push((column.name.clone(), column_ref));
                        }
                    }
                    SelectItem::Column(name) => columns.push((name.clone(), resolve(name)?)),
                    SelectItem::CountStar => {}
                }
            }
            Projection::Columns(columns)
        };

        let filter = match &statement.filter {
            Some(filter) => Some((resolve(&filter.column)?, filter.value.clone())),
            None => None,
        };

        let access = match (&filter, &statement.filter) {
            (Some((ColumnRef::RowId, Value::Integer(row_id))), _) => AccessPath::RowIdLookup(*row_id),
            (Some(_), Some(equality)) => self.index_for(&entry.name, &equality.column),
            _ => AccessPath::FullScan,
        };

        info!(table = %entry.name, access = ?access, "planned query");
        Ok(LogicalPlan {
            table_name: entry.name.clone(),
            root_page: entry.root_page,
            projection,
            filter,
            access,
        })
    }

    /// First index on `table` whose leading column is `column`.
    fn index_for(&self, table: &str, column: &str) -> AccessPath {
        for entry in self.schema.indexes_on(table) {
            let Some(sql) = entry.sql.as_deref() else {
                continue;
            };
            match IndexDefinition::parse(sql) {
                Ok(index) if index
                    .leading_column()
                    .is_some_and(|c| c.eq_ignore_ascii_case(column)) =>
                {
                    return AccessPath::IndexEquality {
                        index_name: entry.name.clone(),
                        root_page: entry.root_page,
                    };
                }
                Ok(_) => {}
                Err(e) => warn!(index = %entry.name, error = %e, "ignoring unparsable index definition"),
            }
        }
        AccessPath::FullScan
    }
}

fn is_row_id_name(name: &str) -> bool {
    ["rowid", "_rowid_", "oid"]
        .iter()
        .any(|alias| alias.eq_ignore_ascii_case(name))
}
