use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::{
    executor::{
        index_scan::index_equality_scan,
        table_scan::{table_find, table_scan, table_scan_filtered},
    },
    planner::logical_plan::{AccessPath, LogicalPlan, Projection},
    storage::pager::PageReader,
    types::{error::Result, row::Row, value::Value},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Runs a [`LogicalPlan`] against the pages of one database.
pub struct QueryExecutor<'a, P: PageReader> {
    reader: &'a mut P,
}

impl<'a, P: PageReader> QueryExecutor<'a, P> {
    pub fn new(reader: &'a mut P) -> Self {
        Self { reader }
    }

    pub fn execute(&mut self, plan: &LogicalPlan) -> Result<QueryResult> {
        let mut rows = self.fetch_rows(plan)?;
        rows.retain(|row| plan.matches(row));
        debug!(table = %plan.table_name, rows = rows.len(), "fetched rows");

        let result = match &plan.projection {
            Projection::Count => QueryResult {
                columns: vec!["COUNT(*)".to_string()],
                rows: vec![vec![Value::Integer(rows.len() as i64)]],
            },
            Projection::Columns(columns) => QueryResult {
                columns: columns.iter().map(|(name, _)| name.clone()).collect(),
                rows: rows
                    .iter()
                    .map(|row| columns.iter().map(|(_, column)| column.value(row)).collect())
                    .collect(),
            },
        };
        Ok(result)
    }

    fn fetch_rows(&mut self, plan: &LogicalPlan) -> Result<Vec<Row>> {
        match &plan.access {
            AccessPath::FullScan => table_scan(&mut *self.reader, plan.root_page),
            AccessPath::RowIdLookup(row_id) => {
                Ok(table_find(&mut *self.reader, plan.root_page, *row_id)?.into_iter().collect())
            }
            AccessPath::IndexEquality {
                index_name,
                root_page,
            } => {
                let Some((_, value)) = &plan.filter else {
                    return table_scan(&mut *self.reader, plan.root_page);
                };
                let row_ids: HashSet<_> = index_equality_scan(&mut *self.reader, *root_page, value)?
                    .into_iter()
                    .collect();
                debug!(index = %index_name, matches = row_ids.len(), "index lookup");
                table_scan_filtered(&mut *self.reader, plan.root_page, &row_ids)
            }
        }
    }
}
