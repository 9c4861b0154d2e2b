use serde::{Deserialize, Serialize};

use crate::types::{
    RowId,
    error::{DatabaseError, Result},
    value::Value,
};

/// One decoded record: the out-of-band row key (table cells only) and the
/// column values in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub row_id: Option<RowId>,
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            row_id: None,
            values,
        }
    }

    pub fn with_row_id(row_id: RowId, values: Vec<Value>) -> Self {
        Self {
            row_id: Some(row_id),
            values,
        }
    }

    pub fn get_value(&self, column_index: usize) -> Option<&Value> {
        self.values.get(column_index)
    }

    /// First column of an index record, the value the index is ordered by.
    pub fn index_key(&self) -> Result<&Value> {
        self.values
            .first()
            .ok_or_else(|| DatabaseError::InvalidIndexRecord {
                reason: "record has no columns".to_string(),
            })
    }

    /// Row key carried as the last column of an index record.
    pub fn index_row_id(&self) -> Result<RowId> {
        match self.values.last() {
            Some(Value::Integer(row_id)) if self.values.len() >= 2 => Ok(*row_id),
            Some(other) => Err(DatabaseError::InvalidIndexRecord {
                reason: format!("expected an integer row key in the last column, got {:?}", other),
            }),
            None => Err(DatabaseError::InvalidIndexRecord {
                reason: "record has no columns".to_string(),
            }),
        }
    }
}
