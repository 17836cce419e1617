// ledgerflow-core/src/infrastructure/adapters/source_reader.rs

use async_trait::async_trait;
use rusqlite::OpenFlags;
use rusqlite::types::ValueRef;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::domain::catalog::EntityCode;
use crate::domain::compiler::SqlQuoter;
use crate::domain::error::DomainError;
use crate::domain::project::SourceFormat;
use crate::error::LedgerflowError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::connector::{CellValue, Connector};
use crate::ports::source_reader::{RelationalExtract, SourceReader, StagedRelation};

/// (table in the entity store, staged table name)
const RELATIONAL_TABLES: [(&str, &str); 2] = [("project", "projects"), ("expenses", "expenses")];

/// Stages entity inputs inside the DuckDB session: relational stores are
/// ATTACHed read-only, budget files go through `read_csv_auto`.
///
/// SQLite stores need DuckDB's `sqlite` extension. When it cannot be installed
/// (no network, no extension repository) the tables are copied through rusqlite.
pub struct DuckDbSourceReader {
    connector: Arc<dyn Connector>,
    format: SourceFormat,
    sqlite_extension: OnceCell<bool>,
}

impl DuckDbSourceReader {
    pub fn new(connector: Arc<dyn Connector>, format: SourceFormat) -> Self {
        Self {
            connector,
            format,
            sqlite_extension: OnceCell::new(),
        }
    }

    fn staging_name(entity: &EntityCode, table: &str) -> String {
        format!("stg_{}_{}", table, entity.as_str().to_ascii_lowercase())
    }

    /// Replaces any `entity_code` carried by the source with the catalog code.
    async fn tag(&self, relation: &str, entity: &EntityCode) -> Result<u64, LedgerflowError> {
        let ident = SqlQuoter::ident(relation);
        self.connector
            .execute(&format!(
                "ALTER TABLE {ident} DROP COLUMN IF EXISTS entity_code; \
                 ALTER TABLE {ident} ADD COLUMN entity_code VARCHAR DEFAULT {code};",
                ident = ident,
                code = SqlQuoter::literal(entity.as_str())
            ))
            .await?;
        self.connector
            .query_scalar(&format!("SELECT COUNT(*) FROM {}", ident))
            .await
    }

    /// INSTALL + LOAD once per session.
    async fn sqlite_extension_loaded(&self) -> bool {
        *self
            .sqlite_extension
            .get_or_init(|| async {
                match self.connector.execute("INSTALL sqlite; LOAD sqlite;").await {
                    Ok(()) => true,
                    Err(e) => {
                        warn!(error = %e, "DuckDB sqlite extension unavailable, SQLite sources are copied with rusqlite");
                        false
                    }
                }
            })
            .await
    }
}

fn ensure_exists(entity: &EntityCode, kind: &str, path: &Path) -> Result<(), LedgerflowError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(DomainError::InputMissing {
            entity: entity.to_string(),
            kind: kind.to_string(),
            path: path.display().to_string(),
        }
        .into())
    }
}

#[async_trait]
impl SourceReader for DuckDbSourceReader {
    async fn stage_relational(
        &self,
        entity: &EntityCode,
        path: &Path,
    ) -> Result<RelationalExtract, LedgerflowError> {
        ensure_exists(entity, "database", path)?;

        let extract = match self.format {
            SourceFormat::DuckDB => self.stage_attached(entity, path, "").await?,
            SourceFormat::Sqlite => {
                if self.sqlite_extension_loaded().await {
                    self.stage_attached(entity, path, "TYPE sqlite, ").await?
                } else {
                    self.stage_sqlite_copy(entity, path).await?
                }
            }
        };

        debug!(
            entity = %entity,
            projects = extract.projects.rows,
            expenses = extract.expenses.rows,
            "Relational source staged"
        );
        Ok(extract)
    }

    async fn stage_budget(
        &self,
        entity: &EntityCode,
        path: &Path,
    ) -> Result<StagedRelation, LedgerflowError> {
        ensure_exists(entity, "budget", path)?;

        let relation = Self::staging_name(entity, "budgets");
        self.connector
            .execute(&format!(
                "CREATE OR REPLACE TABLE {} AS SELECT * FROM read_csv_auto({}, header = true);",
                SqlQuoter::ident(&relation),
                SqlQuoter::literal(&path.to_string_lossy())
            ))
            .await?;
        let rows = self.tag(&relation, entity).await?;
        Ok(StagedRelation { relation, rows })
    }
}

impl DuckDbSourceReader {
    async fn stage_attached(
        &self,
        entity: &EntityCode,
        path: &Path,
        type_clause: &str,
    ) -> Result<RelationalExtract, LedgerflowError> {
        let alias = format!("src_{}", entity.as_str().to_ascii_lowercase());
        self.connector
            .execute(&format!(
                "ATTACH {} AS {} ({}READ_ONLY);",
                SqlQuoter::literal(&path.to_string_lossy()),
                SqlQuoter::ident(&alias),
                type_clause
            ))
            .await?;

        let staged = self.stage_tables(entity, &alias).await;

        // Detach même en cas d'erreur
        let detached = self
            .connector
            .execute(&format!("DETACH {};", SqlQuoter::ident(&alias)))
            .await;
        let extract = staged?;
        detached?;
        Ok(extract)
    }

    async fn stage_tables(
        &self,
        entity: &EntityCode,
        alias: &str,
    ) -> Result<RelationalExtract, LedgerflowError> {
        let mut staged = Vec::with_capacity(RELATIONAL_TABLES.len());
        for (source_table, table) in RELATIONAL_TABLES {
            let relation = Self::staging_name(entity, table);
            self.connector
                .execute(&format!(
                    "CREATE OR REPLACE TABLE {} AS SELECT * FROM {};",
                    SqlQuoter::ident(&relation),
                    SqlQuoter::qualified(alias, source_table)
                ))
                .await?;
            let rows = self.tag(&relation, entity).await?;
            staged.push(StagedRelation { relation, rows });
        }
        into_extract(staged)
    }

    /// Same staging as `stage_tables`, reading the SQLite file directly.
    async fn stage_sqlite_copy(
        &self,
        entity: &EntityCode,
        path: &Path,
    ) -> Result<RelationalExtract, LedgerflowError> {
        let mut staged = Vec::with_capacity(RELATIONAL_TABLES.len());
        for (source_table, table) in RELATIONAL_TABLES {
            let copy = read_sqlite_table(path, source_table)?;
            let relation = Self::staging_name(entity, table);
            let columns = copy
                .columns
                .iter()
                .map(|(name, ty)| format!("{} {}", SqlQuoter::ident(name), ty))
                .collect::<Vec<_>>()
                .join(", ");
            self.connector
                .execute(&format!(
                    "CREATE OR REPLACE TABLE {} ({});",
                    SqlQuoter::ident(&relation),
                    columns
                ))
                .await?;
            self.connector.load_rows(&relation, &copy.rows).await?;
            let rows = self.tag(&relation, entity).await?;
            staged.push(StagedRelation { relation, rows });
        }
        into_extract(staged)
    }
}

fn into_extract(mut staged: Vec<StagedRelation>) -> Result<RelationalExtract, LedgerflowError> {
    let expenses = staged.pop();
    let projects = staged.pop();
    match (projects, expenses) {
        (Some(projects), Some(expenses)) => Ok(RelationalExtract { projects, expenses }),
        _ => Err(LedgerflowError::InternalError(
            "relational staging produced no tables".into(),
        )),
    }
}

/// One SQLite table, typed for DuckDB.
struct SqliteTable {
    columns: Vec<(String, &'static str)>,
    rows: Vec<Vec<CellValue>>,
}

fn read_sqlite_table(path: &Path, table: &str) -> Result<SqliteTable, InfrastructureError> {
    let conn = rusqlite::Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    let mut stmt = conn.prepare(&format!("SELECT * FROM {}", SqlQuoter::ident(table)))?;
    let mut columns: Vec<(String, &'static str)> = stmt
        .columns()
        .iter()
        .map(|c| (c.name().to_string(), affinity(c.decl_type())))
        .collect();

    let mut rows = Vec::new();
    let mut cursor = stmt.query([])?;
    while let Some(row) = cursor.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            values.push(match row.get_ref(idx)? {
                ValueRef::Null => CellValue::Null,
                ValueRef::Integer(v) => CellValue::Integer(v),
                ValueRef::Real(v) => CellValue::Double(v),
                ValueRef::Text(t) | ValueRef::Blob(t) => {
                    CellValue::Text(String::from_utf8_lossy(t).into_owned())
                }
            });
        }
        rows.push(values);
    }

    // SQLite typing is per value: widen a column to what it actually holds.
    for (idx, (_, ty)) in columns.iter_mut().enumerate() {
        for row in &rows {
            *ty = match (*ty, row.get(idx)) {
                ("BIGINT", Some(CellValue::Double(_))) => "DOUBLE",
                (_, Some(CellValue::Text(_))) => "VARCHAR",
                (current, _) => current,
            };
        }
    }

    Ok(SqliteTable { columns, rows })
}

/// DuckDB type for a declared SQLite column type (SQLite affinity rules).
fn affinity(declared: Option<&str>) -> &'static str {
    let declared = declared.unwrap_or_default().to_ascii_uppercase();
    if declared.contains("INT") {
        "BIGINT"
    } else if ["REAL", "FLOA", "DOUB", "NUM", "DEC"]
        .iter()
        .any(|t| declared.contains(t))
    {
        "DOUBLE"
    } else {
        "VARCHAR"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::duckdb::DuckDBConnector;
    use anyhow::Result;
    use tempfile::tempdir;

    fn code(s: &str) -> EntityCode {
        EntityCode::new_unchecked(s.to_string())
    }

    /// Writes a DuckDB source file with the fixed `project` / `expenses` tables.
    fn seed_source(path: &Path) -> Result<()> {
        let conn = duckdb::Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE project (project_id INTEGER, name VARCHAR, country VARCHAR);
             INSERT INTO project VALUES (1, 'Water', 'Belgium');
             CREATE TABLE expenses (year INTEGER, month INTEGER, department VARCHAR,
                                    category VARCHAR, currency VARCHAR, amount_local DOUBLE);
             INSERT INTO expenses VALUES (2024, 3, ' ops ', 'travel', 'USD', 100.0),
                                         (2024, 3, 'Ops', 'Travel', 'USD', 20.0);",
        )?;
        Ok(())
    }

    #[tokio::test]
    async fn test_stage_relational_tags_rows() -> Result<()> {
        let dir = tempdir()?;
        let db = dir.path().join("BE01.db");
        seed_source(&db)?;

        let connector: Arc<dyn Connector> = Arc::new(DuckDBConnector::in_memory()?);
        let reader = DuckDbSourceReader::new(connector.clone(), SourceFormat::DuckDB);
        let extract = reader.stage_relational(&code("BE01"), &db).await?;

        assert_eq!(extract.projects.rows, 1);
        assert_eq!(extract.expenses.rows, 2);
        assert_eq!(extract.expenses.relation, "stg_expenses_be01");
        let tagged = connector
            .query_scalar("SELECT COUNT(*) FROM stg_expenses_be01 WHERE entity_code = 'BE01'")
            .await?;
        assert_eq!(tagged, 2);

        // The source is detached again
        let attached = connector
            .query_scalar("SELECT COUNT(*) FROM duckdb_databases() WHERE database_name = 'src_be01'")
            .await?;
        assert_eq!(attached, 0);
        Ok(())
    }

    /// Writes a SQLite source file, the format the entity exports actually use.
    fn seed_sqlite_source(path: &Path, amounts: &[&str]) -> Result<()> {
        let conn = rusqlite::Connection::open(path)?;
        conn.execute_batch(
            "CREATE TABLE project (project_id INTEGER, name TEXT, country TEXT);
             INSERT INTO project VALUES (1, 'Wells', 'Burkina Faso');
             CREATE TABLE expenses (year INTEGER, month INTEGER, department TEXT,
                                    category TEXT, currency TEXT, amount_local REAL);",
        )?;
        for amount in amounts {
            conn.execute(
                "INSERT INTO expenses VALUES (2024, 4, 'It', 'Hardware', 'XOF', ?1)",
                [amount],
            )?;
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_stage_sqlite_source() -> Result<()> {
        let dir = tempdir()?;
        let db = dir.path().join("BF02.db");
        seed_sqlite_source(&db, &["1000", "250.5"])?;

        let connector: Arc<dyn Connector> = Arc::new(DuckDBConnector::in_memory()?);
        let reader = DuckDbSourceReader::new(connector.clone(), SourceFormat::Sqlite);
        let extract = reader.stage_relational(&code("BF02"), &db).await?;

        assert_eq!(extract.projects.rows, 1);
        assert_eq!(extract.expenses.rows, 2);
        let total = connector
            .query_rows(
                "SELECT CAST(SUM(amount_local) AS DOUBLE), MIN(entity_code) FROM stg_expenses_bf02",
            )
            .await?;
        assert_eq!(
            total.rows,
            vec![vec![CellValue::Double(1250.5), CellValue::Text("BF02".into())]]
        );
        let names = connector
            .query_rows("SELECT name, country FROM stg_projects_bf02")
            .await?;
        assert_eq!(
            names.rows,
            vec![vec![
                CellValue::Text("Wells".into()),
                CellValue::Text("Burkina Faso".into())
            ]]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_sqlite_copy_without_extension() -> Result<()> {
        let dir = tempdir()?;
        let db = dir.path().join("BF02.db");
        // REAL affinity keeps non-numeric text as text
        seed_sqlite_source(&db, &["1000", "n/a"])?;

        let connector: Arc<dyn Connector> = Arc::new(DuckDBConnector::in_memory()?);
        let reader = DuckDbSourceReader::new(connector.clone(), SourceFormat::Sqlite);
        let extract = reader.stage_sqlite_copy(&code("BF02"), &db).await?;

        assert_eq!(extract.expenses.rows, 2);
        let columns = connector.fetch_columns("stg_expenses_bf02").await?;
        let type_of = |name: &str| {
            columns
                .iter()
                .find(|c| c.name == name)
                .map(|c| c.data_type.clone())
        };
        assert_eq!(type_of("year").as_deref(), Some("BIGINT"));
        assert_eq!(type_of("amount_local").as_deref(), Some("VARCHAR"));
        assert_eq!(type_of("entity_code").as_deref(), Some("VARCHAR"));

        let raw = connector
            .query_rows("SELECT amount_local FROM stg_expenses_bf02 ORDER BY amount_local")
            .await?;
        assert_eq!(
            raw.rows,
            vec![
                vec![CellValue::Text("1000.0".into())],
                vec![CellValue::Text("n/a".into())]
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_non_sqlite_file_is_reported() -> Result<()> {
        let dir = tempdir()?;
        let db = dir.path().join("BF02.db");
        std::fs::write(&db, "year,month\n2024,4\n")?;

        let connector: Arc<dyn Connector> = Arc::new(DuckDBConnector::in_memory()?);
        let reader = DuckDbSourceReader::new(connector, SourceFormat::Sqlite);
        let err = reader
            .stage_sqlite_copy(&code("BF02"), &db)
            .await
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected an error"))?;

        assert!(matches!(
            err,
            LedgerflowError::Infrastructure(InfrastructureError::Sqlite(_))
        ));
        assert!(err.to_string().contains("SQLite"));
        Ok(())
    }

    #[tokio::test]
    async fn test_stage_budget_overrides_entity_code() -> Result<()> {
        let dir = tempdir()?;
        let csv = dir.path().join("BF02_budget.csv");
        std::fs::write(
            &csv,
            "entity_code,year,month,department,category,budget_amount_reporting\n\
             WRONG,2024,3,Ops,Travel,80\n",
        )?;

        let connector: Arc<dyn Connector> = Arc::new(DuckDBConnector::in_memory()?);
        let reader = DuckDbSourceReader::new(connector.clone(), SourceFormat::DuckDB);
        let staged = reader.stage_budget(&code("BF02"), &csv).await?;

        assert_eq!(staged.rows, 1);
        let result = connector
            .query_rows(&format!("SELECT DISTINCT entity_code FROM {}", staged.relation))
            .await?;
        assert_eq!(result.rows, vec![vec![CellValue::Text("BF02".into())]]);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_inputs_are_reported() -> Result<()> {
        let dir = tempdir()?;
        let connector: Arc<dyn Connector> = Arc::new(DuckDBConnector::in_memory()?);
        let reader = DuckDbSourceReader::new(connector, SourceFormat::DuckDB);

        let err = reader
            .stage_relational(&code("SN01"), &dir.path().join("SN01.db"))
            .await
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected an error"))?;
        assert!(err.is_input_missing());

        let err = reader
            .stage_budget(&code("SN01"), &dir.path().join("SN01_budget.csv"))
            .await
            .err()
            .ok_or_else(|| anyhow::anyhow!("expected an error"))?;
        assert!(err.is_input_missing());
        Ok(())
    }
}
