// ledgerflow-core/src/ports/connector.rs

// This file defines what the application needs from a SQL engine, without knowing which one.

use crate::error::LedgerflowError;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

// Struct simple pour décrire une colonne (indépendant de la DB)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
}

/// A single value read from (or loaded into) the engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Text(String),
    Integer(i64),
    Double(f64),
    Date(NaiveDate),
}

impl CellValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Double(v) => Some(*v),
            CellValue::Integer(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Null => f.write_str("NULL"),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Integer(v) => write!(f, "{}", v),
            CellValue::Double(v) => write!(f, "{}", v),
            CellValue::Date(d) => write!(f, "{}", d),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<Option<String>> for CellValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(CellValue::Null, CellValue::Text)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<Option<f64>> for CellValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(CellValue::Null, CellValue::Double)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

/// Result set of `query_rows`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl QueryResult {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

#[async_trait]
pub trait Connector: Send + Sync {
    /// Runs one or more statements, no result expected.
    async fn execute(&self, query: &str) -> Result<(), LedgerflowError>;

    /// Schema of a table or view, in column order.
    async fn fetch_columns(&self, relation: &str) -> Result<Vec<ColumnSchema>, LedgerflowError>;

    /// First column of the first row, as a count. NULL reads as 0.
    async fn query_scalar(&self, query: &str) -> Result<u64, LedgerflowError>;

    async fn query_rows(&self, query: &str) -> Result<QueryResult, LedgerflowError>;

    /// Appends rows to an existing table, values in column order.
    async fn load_rows(&self, table: &str, rows: &[Vec<CellValue>]) -> Result<u64, LedgerflowError>;

    fn engine_name(&self) -> &str;
}
