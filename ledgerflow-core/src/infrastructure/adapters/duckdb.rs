// ledgerflow-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use duckdb::types::Value;
use duckdb::{Config, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

// Imports Hexagonaux
use crate::domain::compiler::SqlQuoter;
use crate::error::LedgerflowError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::connector::{CellValue, ColumnSchema, Connector, QueryResult};

// Days between 0001-01-01 (CE day 1) and 1970-01-01.
const UNIX_EPOCH_FROM_CE: i32 = 719_163;

pub struct DuckDBConnector {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDBConnector {
    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        let config = Config::default();

        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(db_path, config)?
        };

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self, InfrastructureError> {
        Self::new(":memory:")
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, LedgerflowError> {
        self.conn.lock().map_err(|_| {
            LedgerflowError::Infrastructure(InfrastructureError::Io(std::io::Error::other(
                "DuckDB Mutex Poisoned",
            )))
        })
    }
}

fn to_cell(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Null,
        Value::Boolean(b) => CellValue::Integer(i64::from(b)),
        Value::TinyInt(v) => CellValue::Integer(v.into()),
        Value::SmallInt(v) => CellValue::Integer(v.into()),
        Value::Int(v) => CellValue::Integer(v.into()),
        Value::BigInt(v) => CellValue::Integer(v),
        Value::UTinyInt(v) => CellValue::Integer(v.into()),
        Value::USmallInt(v) => CellValue::Integer(v.into()),
        Value::UInt(v) => CellValue::Integer(v.into()),
        Value::HugeInt(v) => i64::try_from(v)
            .map(CellValue::Integer)
            .unwrap_or(CellValue::Double(v as f64)),
        Value::UBigInt(v) => i64::try_from(v)
            .map(CellValue::Integer)
            .unwrap_or(CellValue::Double(v as f64)),
        Value::Float(v) => CellValue::Double(v.into()),
        Value::Double(v) => CellValue::Double(v),
        Value::Decimal(d) => d
            .to_string()
            .parse::<f64>()
            .map(CellValue::Double)
            .unwrap_or(CellValue::Null),
        Value::Text(s) => CellValue::Text(s),
        Value::Date32(days) => NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_FROM_CE)
            .map(CellValue::Date)
            .unwrap_or(CellValue::Null),
        other => CellValue::Text(format!("{:?}", other)),
    }
}

fn to_value(cell: &CellValue) -> Value {
    match cell {
        CellValue::Null => Value::Null,
        CellValue::Text(s) => Value::Text(s.clone()),
        CellValue::Integer(v) => Value::BigInt(*v),
        CellValue::Double(v) => Value::Double(*v),
        CellValue::Date(d) => Value::Date32(d.num_days_from_ce() - UNIX_EPOCH_FROM_CE),
    }
}

#[async_trait]
impl Connector for DuckDBConnector {
    async fn execute(&self, query: &str) -> Result<(), LedgerflowError> {
        let conn = self.lock()?;
        conn.execute_batch(query)?;
        Ok(())
    }

    async fn fetch_columns(&self, relation: &str) -> Result<Vec<ColumnSchema>, LedgerflowError> {
        let conn = self.lock()?;

        // DESCRIBE works for tables and views alike
        let mut stmt = conn.prepare(&format!("DESCRIBE {}", SqlQuoter::ident(relation)))?;
        let rows = stmt.query_map([], |row| {
            let null: String = row.get(2)?;
            Ok(ColumnSchema {
                name: row.get(0)?,
                data_type: row.get(1)?,
                is_nullable: null == "YES",
            })
        })?;

        let mut columns = Vec::new();
        for row in rows {
            columns.push(row?);
        }

        Ok(columns)
    }

    async fn query_scalar(&self, query: &str) -> Result<u64, LedgerflowError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(query)?;
        let mut rows = stmt.query([])?;

        let row = rows
            .next()?
            .ok_or_else(|| LedgerflowError::InternalError("No scalar value returned".into()))?;

        let value: Option<i64> = row.get(0)?;
        u64::try_from(value.unwrap_or(0)).map_err(|_| {
            LedgerflowError::InternalError(format!("Negative scalar returned by: {}", query))
        })
    }

    async fn query_rows(&self, query: &str) -> Result<QueryResult, LedgerflowError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(query)?;
        let mut rows = stmt.query([])?;

        let columns: Vec<String> = rows
            .as_ref()
            .map(|s| s.column_names())
            .unwrap_or_default();

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                let value: Value = row.get(i)?;
                values.push(to_cell(value));
            }
            out.push(values);
        }

        Ok(QueryResult { columns, rows: out })
    }

    async fn load_rows(&self, table: &str, rows: &[Vec<CellValue>]) -> Result<u64, LedgerflowError> {
        let Some(width) = rows.first().map(Vec::len) else {
            return Ok(0);
        };
        if rows.iter().any(|r| r.len() != width) {
            return Err(LedgerflowError::InternalError(format!(
                "Ragged rows loaded into '{}'",
                table
            )));
        }

        let placeholders = vec!["?"; width].join(", ");
        let sql = format!(
            "INSERT INTO {} VALUES ({})",
            SqlQuoter::ident(table),
            placeholders
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        for row in rows {
            stmt.execute(duckdb::params_from_iter(row.iter().map(to_value)))?;
        }
        Ok(rows.len() as u64)
    }

    fn engine_name(&self) -> &str {
        "duckdb"
    }
}
