use super::{ClusterError, Result, Value};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column and bind-variable types understood by the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    Int,
    Varchar,
    Boolean,
    Timestamp,
    List(Box<DataType>),
}

impl DataType {
    pub fn list(inner: DataType) -> Self {
        Self::List(Box::new(inner))
    }

    /// NULL is compatible with every type.
    pub fn is_compatible(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::Int, Value::Integer(_)) => true,
            (Self::Varchar, Value::Text(_)) => true,
            (Self::Boolean, Value::Boolean(_)) => true,
            (Self::Timestamp, Value::Timestamp(_)) => true,
            (Self::List(inner), Value::List(items)) => {
                items.iter().all(|item| inner.is_compatible(item))
            }
            _ => false,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Varchar => write!(f, "varchar"),
            Self::Boolean => write!(f, "boolean"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::List(inner) => write!(f, "list<{}>", inner),
        }
    }
}

/// Kind of write that timed out on the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WriteType {
    Simple,
    Batch,
    UnloggedBatch,
    Counter,
    BatchLog,
    Cas,
}

impl fmt::Display for WriteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Simple => "SIMPLE",
            Self::Batch => "BATCH",
            Self::UnloggedBatch => "UNLOGGED_BATCH",
            Self::Counter => "COUNTER",
            Self::BatchLog => "BATCH_LOG",
            Self::Cas => "CAS",
        };
        f.write_str(name)
    }
}

/// A result row with access to cells by column name.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn contains(&self, column: &str) -> bool {
        self.find_column_index(column).is_some()
    }

    pub fn find_column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.eq_ignore_ascii_case(column))
    }

    pub fn get(&self, column: &str) -> Result<&Value> {
        self.find_column_index(column)
            .and_then(|idx| self.values.get(idx))
            .ok_or_else(|| ClusterError::ColumnNotFound(column.to_string()))
    }

    /// Reads a text column; NULL maps to `None`.
    pub fn get_string(&self, column: &str) -> Result<Option<String>> {
        match self.get(column)? {
            Value::Null => Ok(None),
            Value::Text(s) => Ok(Some(s.clone())),
            other => Err(type_mismatch(column, "VARCHAR", other)),
        }
    }

    /// Reads an int column; NULL maps to 0 the way the native driver does.
    pub fn get_int(&self, column: &str) -> Result<i32> {
        match self.get(column)? {
            Value::Null => Ok(0),
            Value::Integer(i) => i32::try_from(*i).map_err(|_| {
                ClusterError::TypeMismatch(format!(
                    "Column '{}' value {} does not fit in an int",
                    column, i
                ))
            }),
            other => Err(type_mismatch(column, "INT", other)),
        }
    }

    pub fn get_timestamp_list(&self, column: &str) -> Result<Option<Vec<DateTime<Utc>>>> {
        let items = match self.get(column)? {
            Value::Null => return Ok(None),
            Value::List(items) => items,
            other => return Err(type_mismatch(column, "LIST<TIMESTAMP>", other)),
        };

        items
            .iter()
            .map(|item| {
                item.as_timestamp()
                    .ok_or_else(|| type_mismatch(column, "TIMESTAMP", item))
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }
}

fn type_mismatch(column: &str, expected: &str, actual: &Value) -> ClusterError {
    ClusterError::TypeMismatch(format!(
        "Column '{}' expects type {}, got {}",
        column,
        expected,
        actual.type_name()
    ))
}
