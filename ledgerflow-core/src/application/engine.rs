// ledgerflow-core/src/application/engine.rs

use std::time::Instant;
use tracing::{debug, error, instrument};

use crate::error::LedgerflowError;
use crate::ports::connector::{Connector, QueryResult};

/// Exécute une requête SQL avec instrumentation (logs + timing).
/// Every statement issued by the stages goes through here.
#[instrument(skip(connector, query), fields(query.len = query.len()))]
pub async fn execute_query(connector: &dyn Connector, query: &str) -> Result<(), LedgerflowError> {
    let start = Instant::now();
    debug!("⚡ Executing Query: {}", query);

    let result = connector.execute(query).await;
    let duration = start.elapsed();

    match result {
        Ok(()) => {
            debug!("✅ Query finished in {:.2?}", duration);
            Ok(())
        }
        Err(e) => {
            error!("❌ Query failed after {:.2?}: {}", duration, e);
            Err(e)
        }
    }
}

/// Same instrumentation for queries returning rows.
#[instrument(skip(connector, query), fields(query.len = query.len()))]
pub async fn fetch_rows(
    connector: &dyn Connector,
    query: &str,
) -> Result<QueryResult, LedgerflowError> {
    let start = Instant::now();
    let result = connector.query_rows(query).await;
    match &result {
        Ok(rows) => debug!(rows = rows.rows.len(), "✅ Fetched in {:.2?}", start.elapsed()),
        Err(e) => error!("❌ Query failed after {:.2?}: {}", start.elapsed(), e),
    }
    result
}

/// Single-column text query, NULLs skipped.
pub async fn fetch_strings(
    connector: &dyn Connector,
    query: &str,
) -> Result<Vec<String>, LedgerflowError> {
    let result = fetch_rows(connector, query).await?;
    Ok(result
        .rows
        .into_iter()
        .filter_map(|row| row.into_iter().next())
        .filter_map(|cell| cell.as_str().map(str::to_string))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::duckdb::DuckDBConnector;
    use anyhow::Result;

    #[tokio::test]
    async fn test_execute_and_fetch() -> Result<()> {
        let connector = DuckDBConnector::in_memory()?;
        execute_query(
            &connector,
            "CREATE TABLE t AS SELECT * FROM (VALUES ('b'), (NULL), ('a')) v(x)",
        )
        .await?;

        let values = fetch_strings(&connector, "SELECT x FROM t ORDER BY x").await?;
        assert_eq!(values, vec!["a", "b"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_failure_is_propagated() -> Result<()> {
        let connector = DuckDBConnector::in_memory()?;
        assert!(execute_query(&connector, "DROP TABLE nope").await.is_err());
        Ok(())
    }
}
