use sqlparser::{
    ast::{
        ColumnOption, CreateIndex, CreateTable, DataType as SqlDataType, Expr, ObjectName,
        Statement, TableConstraint,
    },
    dialect::SQLiteDialect,
    parser::Parser,
};

use crate::planner::error::PlannerError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    pub name: String,
    /// `INTEGER PRIMARY KEY` columns are stored as NULL and read back as the
    /// row key.
    pub is_row_id_alias: bool,
}

/// Column layout of a table, recovered from its `CREATE TABLE` text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    pub fn parse(sql: &str) -> Result<Self, PlannerError> {
        match parse_single(sql)? {
            Statement::CreateTable(CreateTable {
                name,
                columns,
                constraints,
                ..
            }) => {
                // PRIMARY KEY(col) declared as a table constraint
                let table_primary_key: Vec<String> = constraints
                    .iter()
                    .filter_map(|c| match c {
                        TableConstraint::PrimaryKey { columns, .. } => {
                            Some(columns.iter().map(|i| i.value.clone()).collect::<Vec<_>>())
                        }
                        _ => None,
                    })
                    .flatten()
                    .collect();

                let columns = columns
                    .iter()
                    .map(|column| {
                        let is_integer = matches!(column.data_type, SqlDataType::Integer(_));
                        let inline_primary_key = column.options.iter().any(|o| {
                            matches!(o.option, ColumnOption::Unique { is_primary: true, .. })
                        });
                        let constraint_primary_key = table_primary_key.len() == 1
                            && table_primary_key[0].eq_ignore_ascii_case(&column.name.value);
                        ColumnDefinition {
                            name: column.name.value.clone(),
                            is_row_id_alias: is_integer
                                && (inline_primary_key || constraint_primary_key),
                        }
                    })
                    .collect();

                Ok(Self {
                    name: last_part(&name),
                    columns,
                })
            }
            other => Err(PlannerError::UnsupportedStatement(format!(
                "expected CREATE TABLE, got {}",
                other
            ))),
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Indexed columns, recovered from a `CREATE INDEX` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    pub name: String,
    pub table_name: String,
    pub columns: Vec<String>,
}

impl IndexDefinition {
    pub fn parse(sql: &str) -> Result<Self, PlannerError> {
        match parse_single(sql)? {
            Statement::CreateIndex(CreateIndex {
                name,
                table_name,
                columns,
                ..
            }) => Ok(Self {
                name: name.as_ref().map(last_part).unwrap_or_default(),
                table_name: last_part(&table_name),
                columns: columns
                    .iter()
                    .map(|c| match &c.expr {
                        Expr::Identifier(ident) => ident.value.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            }),
            other => Err(PlannerError::UnsupportedStatement(format!(
                "expected CREATE INDEX, got {}",
                other
            ))),
        }
    }

    /// The column the index is ordered by.
    pub fn leading_column(&self) -> Option<&str> {
        self.columns.first().map(String::as_str)
    }
}

fn parse_single(sql: &str) -> Result<Statement, PlannerError> {
    let mut statements = Parser::parse_sql(&SQLiteDialect {}, sql)?;
    if statements.len() != 1 {
        return Err(PlannerError::InvalidQuery(
            "Expected exactly one statement".to_string(),
        ));
    }
    Ok(statements.remove(0))
}

fn last_part(name: &ObjectName) -> String {
    name.0
        .last()
        .map(|ident| ident.value.clone())
        .unwrap_or_default()
}
